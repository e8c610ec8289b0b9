//! Field-level validation predicates shared by the model constructors.

use warehouse_core::{DomainError, DomainResult};

/// Trim `value` and reject it if nothing is left.
pub fn non_empty(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Reject zero quantities for stock movements.
pub fn positive_quantity(field: &str, value: u64) -> DomainResult<u64> {
    if value == 0 {
        return Err(DomainError::validation(format!("{field} must be positive")));
    }
    Ok(value)
}
