//! Expression trees built by the synthesizer.
//!
//! An [`Expr`] is immutable: its rendering, depth and signature are computed
//! once, when the node is built out of already-built children.

use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::value::Value;

pub type ExprRef = Rc<Expr>;

/// Binary arithmetic (and concatenation, for `Add` on strings).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub const ALL: [BinOp; 4] = [BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div];

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }

    /// Whether swapping numeric operands preserves the result.
    pub fn is_commutative(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Mul)
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UnOp {
    Neg,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A seed, rendered as its name.
    Literal { name: String },
    Binary { op: BinOp, lhs: ExprRef, rhs: ExprRef },
    Unary { op: UnOp, operand: ExprRef },
    /// `base[index]`, where `index` is itself an expression.
    Index { base: ExprRef, index: ExprRef },
    /// `base.field`, with a fixed field name.
    Field { base: ExprRef, field: String },
    Call { callee: ExprRef, args: Vec<ExprRef> },
}

impl ExprKind {
    /// Immediate children, left to right.
    pub fn children(&self) -> Vec<&ExprRef> {
        match self {
            ExprKind::Literal { .. } => vec![],
            ExprKind::Binary { lhs, rhs, .. } => vec![lhs, rhs],
            ExprKind::Unary { operand, .. } => vec![operand],
            ExprKind::Index { base, index } => vec![base, index],
            ExprKind::Field { base, .. } => vec![base],
            ExprKind::Call { callee, args } => {
                let mut res = Vec::with_capacity(1 + args.len());
                res.push(callee);
                res.extend(args.iter());
                res
            }
        }
    }
}

/// A synthesized expression together with its computed value.
#[derive(Debug)]
pub struct Expr {
    kind: ExprKind,
    rendering: String,
    value: Value,
    signature: String,
    depth: usize,
}

impl Expr {
    /// Build a node, deriving its signature from `value` (or, for callables
    /// reached through an access, from the access path).
    pub fn new(kind: ExprKind, value: Value) -> Self {
        let signature = slot_signature(&kind, &value);
        Self::with_signature(kind, value, signature)
    }

    /// Build a node with an explicit signature.
    pub fn with_signature(kind: ExprKind, value: Value, signature: String) -> Self {
        let rendering = render(&kind);
        let depth = kind
            .children()
            .iter()
            .map(|c| c.depth + 1)
            .max()
            .unwrap_or(0);
        Self {
            kind,
            rendering,
            value,
            signature,
            depth,
        }
    }

    pub fn literal(name: impl Into<String>, value: Value) -> ExprRef {
        Rc::new(Self::new(ExprKind::Literal { name: name.into() }, value))
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }
    pub fn rendering(&self) -> &str {
        &self.rendering
    }
    pub fn value(&self) -> &Value {
        &self.value
    }
    pub fn signature(&self) -> &str {
        &self.signature
    }
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Check whether this node is a unary negation.
    pub fn is_negation(&self) -> bool {
        matches!(self.kind, ExprKind::Unary { op: UnOp::Neg, .. })
    }

    /// Check whether this node is an operator application (binary or unary).
    pub fn is_operator(&self) -> bool {
        matches!(self.kind, ExprKind::Binary { .. } | ExprKind::Unary { .. })
    }

    /// The negated operand, if this node is a negation.
    pub fn negated(&self) -> Option<&ExprRef> {
        match &self.kind {
            ExprKind::Unary {
                op: UnOp::Neg,
                operand,
            } => Some(operand),
            _ => None,
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rendering)
    }
}

// Operator nodes are parenthesized whenever they appear inside another node,
// except as call arguments and index expressions.
fn operand(e: &Expr) -> Cow<'_, str> {
    if e.is_operator() {
        Cow::Owned(format!("({})", e.rendering))
    } else {
        Cow::Borrowed(&e.rendering)
    }
}

fn render(kind: &ExprKind) -> String {
    match kind {
        ExprKind::Literal { name } => name.clone(),
        ExprKind::Binary { op, lhs, rhs } => {
            format!("{} {} {}", operand(lhs), op, operand(rhs))
        }
        ExprKind::Unary { op, operand: e } => format!("{}{}", op.symbol(), operand(e)),
        ExprKind::Index { base, index } => format!("{}[{}]", operand(base), index.rendering),
        ExprKind::Field { base, field } => format!("{}.{}", operand(base), field),
        ExprKind::Call { callee, args } => {
            let args: Vec<&str> = args.iter().map(|a| a.rendering.as_str()).collect();
            format!("{}({})", operand(callee), args.join(", "))
        }
    }
}

// A callable pulled out of a record or an array loses nothing of its
// identity when keyed by where it came from: `person.live` and `person[s]`
// with `s = "live"` land in one class.
fn slot_signature(kind: &ExprKind, value: &Value) -> String {
    if let Value::Callable(_) = value {
        match kind {
            ExprKind::Field { base, field } => return format!("{}.{}", base.signature, field),
            ExprKind::Index { base, index } => {
                return match (&base.value, index.value.as_str()) {
                    (Value::Record(_), Some(key)) => format!("{}.{}", base.signature, key),
                    _ => format!("{}[{}]", base.signature, index.signature),
                };
            }
            _ => {}
        }
    }
    value.signature()
}
