//! Utility functions and helpers.

pub mod identifier;

pub use identifier::IdentifierValidator;
