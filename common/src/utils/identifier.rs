//! SQL identifier validator.
//!
//! Table, column and database names are spliced into statements, so they go
//! through an allow-list before interpolation. Values are always bound.

use crate::errors::{AppError, AppResult};

/// Longest identifier MySQL accepts.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Longest column type literal accepted, e.g. `DECIMAL(10,2)`.
pub const MAX_TYPE_LEN: usize = 64;

/// Validates and quotes identifiers and column type literals.
pub struct IdentifierValidator;

impl IdentifierValidator {
    /// Checks that `name` is 1-64 ASCII letters, digits or underscores.
    ///
    /// # Errors
    /// Returns `AppError::InvalidIdentifier` otherwise.
    pub fn validate(name: &str) -> AppResult<()> {
        if name.is_empty() {
            return Err(AppError::InvalidIdentifier("identifier is empty".into()));
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(AppError::InvalidIdentifier(format!(
                "identifier longer than {} characters",
                MAX_IDENTIFIER_LEN
            )));
        }
        if let Some(bad) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(AppError::InvalidIdentifier(format!(
                "`{}` contains forbidden character {:?}",
                name, bad
            )));
        }
        Ok(())
    }

    /// Validates `name` and wraps it in backticks.
    pub fn quote(name: &str) -> AppResult<String> {
        Self::validate(name)?;
        Ok(format!("`{}`", name))
    }

    /// Checks a free-form column type literal such as `VARCHAR(255)`.
    ///
    /// Only letters, digits, underscore, space, parentheses and commas are
    /// allowed, and it must start with a letter.
    pub fn validate_type(type_literal: &str) -> AppResult<()> {
        let literal = type_literal.trim();
        if literal.is_empty() {
            return Err(AppError::Validation("column type is empty".into()));
        }
        if literal.len() > MAX_TYPE_LEN {
            return Err(AppError::Validation(format!(
                "column type longer than {} characters",
                MAX_TYPE_LEN
            )));
        }
        if !literal.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(AppError::Validation(format!(
                "column type `{}` must start with a letter",
                literal
            )));
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '(' | ')' | ',');
        if let Some(bad) = literal.chars().find(|c| !allowed(*c)) {
            return Err(AppError::Validation(format!(
                "column type `{}` contains forbidden character {:?}",
                literal, bad
            )));
        }
        Ok(())
    }
}
