//! Heuristics that keep syntactically uninteresting compositions out of the
//! search.
//!
//! All predicates are pure functions of the operands' renderings and node
//! kinds, so the expansion pass can reapply them verbatim after substituting
//! equivalent operands.

use crate::expr::{BinOp, Expr, UnOp};
use crate::value::Kind;

/// Check whether `a` is the negation of `b`, i.e. `a` renders as `-b`.
pub fn is_negation_of(a: &Expr, b: &Expr) -> bool {
    a.negated()
        .is_some_and(|inner| inner.rendering() == b.rendering())
}

/// Check whether `lhs op rhs` is worth building.
///
/// ```
/// use codehint_rs::expr::{BinOp, Expr};
/// use codehint_rs::prune::is_useful_binary;
/// use codehint_rs::value::Value;
///
/// let x = Expr::literal("x", Value::from(1));
/// let y = Expr::literal("y", Value::from(2));
/// assert!(is_useful_binary(BinOp::Add, &x, &y));
/// assert!(!is_useful_binary(BinOp::Add, &y, &x));
/// assert!(!is_useful_binary(BinOp::Sub, &x, &x));
/// assert!(is_useful_binary(BinOp::Mul, &x, &x));
/// ```
pub fn is_useful_binary(op: BinOp, lhs: &Expr, rhs: &Expr) -> bool {
    let (a, b) = (lhs.rendering(), rhs.rendering());
    match op {
        BinOp::Add => {
            if lhs.value().kind() == Kind::String || rhs.value().kind() == Kind::String {
                return true;
            }
            a < b && !lhs.is_negation() && !rhs.is_negation()
        }
        BinOp::Sub => a != b && !rhs.is_negation() && !is_negation_of(lhs, rhs),
        BinOp::Mul => a <= b && !mutual_negation(lhs, rhs) && !both_negated(lhs, rhs),
        BinOp::Div => a != b && !mutual_negation(lhs, rhs) && !both_negated(lhs, rhs),
    }
}

/// Check whether `op operand` is worth building: only atoms are negated.
pub fn is_useful_unary(op: UnOp, operand: &Expr) -> bool {
    match op {
        UnOp::Neg => !operand.is_operator(),
    }
}

fn mutual_negation(a: &Expr, b: &Expr) -> bool {
    is_negation_of(a, b) || is_negation_of(b, a)
}

// (-x) * (-y) is x * y, and likewise for division.
fn both_negated(a: &Expr, b: &Expr) -> bool {
    a.is_negation() && b.is_negation()
}
