//! 数据库管理公共模块
//!
//! Shared pieces used by the data-access core and the HTTP front door:
//! errors, configuration, models, response envelope, utilities and middleware.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
