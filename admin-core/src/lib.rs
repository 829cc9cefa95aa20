//! 数据库管理数据访问核心
//!
//! 会话管理、库表列表、表结构与行操作、农场业务与报表

pub mod driver;
pub mod farm;
pub mod mysql;
pub mod ops;
pub mod outcome;
pub mod reports;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use driver::{Connector, SqlDriver};
pub use mysql::MySqlConnector;
pub use outcome::Outcome;
pub use reports::Report;
pub use session::DbSession;
