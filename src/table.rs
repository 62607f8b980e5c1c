//! Equivalence table: signature → ordered set of expressions.
//!
//! The table plays the role of a unique table for values: every expression
//! produced during a run is registered under its signature, the first member
//! of each class is its canonical representative, and the full classes are
//! kept for the expansion pass.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use crate::expr::ExprRef;

/// Outcome of [`EquivTable::register`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Registration {
    /// The signature was unseen; the expression now represents its class.
    NewClass,
    /// The expression joined an existing class.
    Joined,
    /// An expression with the same rendering is already in the class.
    Duplicate,
}

#[derive(Default)]
struct Class {
    members: Vec<ExprRef>,
    renderings: HashSet<String>,
}

#[derive(Default)]
pub struct EquivTable {
    classes: IndexMap<String, Class>,
    /// All registered expressions, in registration order.
    order: Vec<ExprRef>,
}

impl EquivTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of equivalence classes.
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }
    /// Get the total number of registered expressions.
    pub fn size(&self) -> usize {
        self.order.len()
    }
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Register an expression under its signature.
    pub fn register(&mut self, expr: ExprRef) -> Registration {
        let class = self.classes.entry(expr.signature().to_string()).or_default();
        if !class.renderings.insert(expr.rendering().to_string()) {
            return Registration::Duplicate;
        }
        let res = if class.members.is_empty() {
            Registration::NewClass
        } else {
            Registration::Joined
        };
        debug!(
            "register({} = {}) -> {:?}",
            expr.rendering(),
            expr.signature(),
            res
        );
        class.members.push(expr.clone());
        self.order.push(expr);
        res
    }

    /// Get the members of the class with the given signature, in
    /// registration order. Unknown signatures yield an empty slice.
    pub fn class(&self, signature: &str) -> &[ExprRef] {
        self.classes
            .get(signature)
            .map(|c| c.members.as_slice())
            .unwrap_or(&[])
    }

    /// Get the canonical representative of a class.
    pub fn representative(&self, signature: &str) -> Option<&ExprRef> {
        self.class(signature).first()
    }

    /// Iterate over all registered expressions, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ExprRef> {
        self.order.iter()
    }
}
