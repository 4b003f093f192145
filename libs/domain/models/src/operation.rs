//! [libs/domain/models/src/operation.rs]
//! Closed registry of pluggable job operations.
//!
//! The source this system was modeled on loads operations at startup via a
//! filesystem scan and reflective import. That is replaced here by a static,
//! compile-time map from operation name to a function pointer: new operations
//! are added by registering them below, never by probing the filesystem.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub type OperationFn = fn(i64, i64) -> Result<i64, OperationError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum OperationError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
}

fn op_sum(a: i64, b: i64) -> Result<i64, OperationError> {
    a.checked_add(b).ok_or(OperationError::Overflow)
}

fn op_difference(a: i64, b: i64) -> Result<i64, OperationError> {
    a.checked_sub(b).ok_or(OperationError::Overflow)
}

fn op_product(a: i64, b: i64) -> Result<i64, OperationError> {
    a.checked_mul(b).ok_or(OperationError::Overflow)
}

fn op_quotient(a: i64, b: i64) -> Result<i64, OperationError> {
    if b == 0 {
        return Err(OperationError::DivisionByZero);
    }
    a.checked_div(b).ok_or(OperationError::Overflow)
}

static REGISTRY: Lazy<HashMap<&'static str, OperationFn>> = Lazy::new(|| {
    let mut registry: HashMap<&'static str, OperationFn> = HashMap::new();
    registry.insert("sum", op_sum as OperationFn);
    registry.insert("difference", op_difference as OperationFn);
    registry.insert("product", op_product as OperationFn);
    registry.insert("quotient", op_quotient as OperationFn);
    registry
});

/// Returns true if `name` names a registered operation.
pub fn is_known_operation(name: &str) -> bool {
    REGISTRY.contains_key(name)
}

/// Looks up and invokes the named operation against `(a, b)`.
pub fn execute(name: &str, a: i64, b: i64) -> Result<i64, OperationError> {
    match REGISTRY.get(name) {
        Some(function) => function(a, b),
        None => Err(OperationError::UnknownOperation(name.to_string())),
    }
}

/// All registered operation names, for advertising in registration responses.
pub fn known_operations() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_adds_operands() {
        assert_eq!(execute("sum", 10, 20).unwrap(), 30);
    }

    #[test]
    fn quotient_rejects_zero_divisor() {
        assert!(matches!(execute("quotient", 10, 0), Err(OperationError::DivisionByZero)));
    }

    #[test]
    fn unknown_operation_is_not_known() {
        assert!(!is_known_operation("bitshift"));
    }

    #[test]
    fn executing_an_unknown_operation_names_it_rather_than_faking_overflow() {
        assert!(matches!(
            execute("bitshift", 1, 2),
            Err(OperationError::UnknownOperation(name)) if name == "bitshift"
        ));
    }
}
