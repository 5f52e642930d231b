use crate::ast::{BinaryOp, PrefixOp};

use super::types::{BuiltinTypes, TypeId};

/// Expected operand type and produced type of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorRule {
    pub operand: TypeId,
    pub result: TypeId,
}

/// Typing rule for a binary operator, or the name of the construct when
/// the operator cannot be typed yet.
///
/// Numeric operands are modelled as `i32` until literal widths are inferred.
pub fn binary_op_rule(op: BinaryOp, builtins: &BuiltinTypes) -> Result<OperatorRule, &'static str> {
    match op {
        BinaryOp::BoolOr | BinaryOp::BoolAnd => Ok(OperatorRule {
            operand: builtins.bool,
            result: builtins.bool,
        }),
        BinaryOp::CmpEq
        | BinaryOp::CmpNotEq
        | BinaryOp::CmpLessThan
        | BinaryOp::CmpGreaterThan
        | BinaryOp::CmpLessOrEq
        | BinaryOp::CmpGreaterOrEq => Ok(OperatorRule {
            operand: builtins.i32,
            result: builtins.bool,
        }),
        BinaryOp::Add | BinaryOp::Sub => Ok(OperatorRule {
            operand: builtins.i32,
            result: builtins.i32,
        }),
        BinaryOp::BinOr => Err("bitwise or"),
        BinaryOp::BinXor => Err("bitwise xor"),
        BinaryOp::BinAnd => Err("bitwise and"),
        BinaryOp::BitShiftLeft => Err("shift left"),
        BinaryOp::BitShiftRight => Err("shift right"),
        BinaryOp::Mult => Err("multiplication"),
        BinaryOp::Div => Err("division"),
        BinaryOp::Mod => Err("modulo"),
    }
}

/// Typing rule for a prefix operator; see [`binary_op_rule`].
pub fn prefix_op_rule(op: PrefixOp, builtins: &BuiltinTypes) -> Result<OperatorRule, &'static str> {
    match op {
        PrefixOp::BoolNot => Ok(OperatorRule {
            operand: builtins.bool,
            result: builtins.bool,
        }),
        PrefixOp::BinNot => Err("bitwise not"),
        PrefixOp::Negation => Err("negation"),
    }
}

/// Whether a value of type `actual` satisfies `expected`.
///
/// The `invalid` sentinel on either side always passes (its error was
/// already reported), as does an `unreachable` value.
pub fn types_compatible(builtins: &BuiltinTypes, expected: TypeId, actual: TypeId) -> bool {
    expected == actual
        || expected == builtins.invalid
        || actual == builtins.invalid
        || actual == builtins.unreachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::types::TypeTable;

    fn builtins() -> BuiltinTypes {
        *TypeTable::new().builtins()
    }

    #[test]
    fn boolean_operators() {
        let b = builtins();
        for op in [BinaryOp::BoolOr, BinaryOp::BoolAnd] {
            assert_eq!(
                binary_op_rule(op, &b),
                Ok(OperatorRule {
                    operand: b.bool,
                    result: b.bool
                })
            );
        }
    }

    #[test]
    fn comparison_returns_bool() {
        let b = builtins();
        let rule = binary_op_rule(BinaryOp::CmpLessThan, &b).unwrap();
        assert_eq!(rule.operand, b.i32);
        assert_eq!(rule.result, b.bool);
    }

    #[test]
    fn additive_returns_i32() {
        let b = builtins();
        assert_eq!(binary_op_rule(BinaryOp::Sub, &b).unwrap().result, b.i32);
    }

    #[test]
    fn unsupported_operators_are_named() {
        let b = builtins();
        assert_eq!(binary_op_rule(BinaryOp::Mult, &b), Err("multiplication"));
        assert_eq!(
            binary_op_rule(BinaryOp::BitShiftRight, &b),
            Err("shift right")
        );
        assert_eq!(prefix_op_rule(PrefixOp::Negation, &b), Err("negation"));
        assert_eq!(prefix_op_rule(PrefixOp::BinNot, &b), Err("bitwise not"));
    }

    #[test]
    fn sentinels_are_compatible() {
        let b = builtins();
        assert!(types_compatible(&b, b.i32, b.i32));
        assert!(types_compatible(&b, b.i32, b.invalid));
        assert!(types_compatible(&b, b.invalid, b.bool));
        assert!(types_compatible(&b, b.bool, b.unreachable));
        assert!(!types_compatible(&b, b.bool, b.i32));
        // `unreachable` is only a wildcard as the actual type.
        assert!(!types_compatible(&b, b.unreachable, b.i32));
    }
}
