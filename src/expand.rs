//! Equivalence expansion.
//!
//! Canonicalization forwards a single representative per class, so a result
//! such as `a[two] + two` never shows its sibling `a.length + two`. This pass
//! substitutes every member of each child's class back into the accepted
//! expressions, re-checking the pruning heuristics (and swapping commutative
//! operands where the heuristics demand another order), within the depth
//! bound.
//!
//! Reconstructed nodes reuse the value and signature of the node they were
//! rebuilt from; calls are never re-invoked.

use std::rc::Rc;

use log::{debug, trace};

use crate::debug::Discard;
use crate::table::Registration;
use crate::expr::{BinOp, Expr, ExprKind, ExprRef};
use crate::prune::{is_useful_binary, is_useful_unary};
use crate::synth::Session;
use crate::utils::for_each_tuple;
use crate::value::Kind;

impl Session<'_> {
    /// Expand `expr` into the members of its equivalence class, with every
    /// member rebuilt out of the expanded classes of its children.
    pub(crate) fn expand(&mut self, expr: &ExprRef) -> Vec<ExprRef> {
        let signature = expr.signature();

        if let Some(res) = self.memo.get(signature) {
            return res.clone();
        }
        if self.table.representative(signature).is_none() {
            return vec![expr.clone()];
        }
        if !self.in_progress.insert(signature.to_string()) {
            debug!("expand({}): class {} already in progress", expr, signature);
            return self.table.class(signature).to_vec();
        }

        debug!("expand({})", expr);
        let members = self.table.class(signature).to_vec();
        for member in &members {
            for alt in self.rebuild(member) {
                if self.table.register(alt) != Registration::Duplicate {
                    self.stats.expanded += 1;
                }
            }
        }

        self.in_progress.remove(signature);
        let res = self.table.class(signature).to_vec();
        debug!("expand({}) -> {} member(s)", expr, res.len());
        self.memo.insert(signature.to_string(), res.clone());
        res
    }

    fn rebuild(&mut self, e: &ExprRef) -> Vec<ExprRef> {
        let mut res = Vec::new();
        match e.kind() {
            ExprKind::Literal { .. } => res.push(e.clone()),

            ExprKind::Binary { op, lhs, rhs } => {
                let op = *op;
                let lhss = self.expand(lhs);
                let rhss = self.expand(rhs);
                for l in &lhss {
                    for r in &rhss {
                        let Some((l, r)) = self.order_operands(op, l, r) else {
                            continue;
                        };
                        let kind = ExprKind::Binary {
                            op,
                            lhs: l.clone(),
                            rhs: r.clone(),
                        };
                        res.extend(self.rebuilt(e, kind));
                    }
                }
            }

            ExprKind::Unary { op, operand } => {
                let op = *op;
                for o in self.expand(operand) {
                    if !is_useful_unary(op, &o) {
                        self.stats.discard(Discard::Pruned);
                        continue;
                    }
                    res.extend(self.rebuilt(e, ExprKind::Unary { op, operand: o }));
                }
            }

            ExprKind::Index { base, index } => {
                let bases = self.expand(base);
                let indices = self.expand(index);
                for b in &bases {
                    for i in &indices {
                        let kind = ExprKind::Index {
                            base: b.clone(),
                            index: i.clone(),
                        };
                        res.extend(self.rebuilt(e, kind));
                    }
                }
            }

            ExprKind::Field { base, field } => {
                for b in self.expand(base) {
                    let kind = ExprKind::Field {
                        base: b,
                        field: field.clone(),
                    };
                    res.extend(self.rebuilt(e, kind));
                }
            }

            ExprKind::Call { callee, args } => {
                let callees = self.expand(callee);
                let choices: Vec<Vec<ExprRef>> = args.iter().map(|a| self.expand(a)).collect();
                let mut radices = vec![callees.len()];
                radices.extend(choices.iter().map(Vec::len));

                let mut kinds = Vec::new();
                for_each_tuple(&radices, |tuple| {
                    let args = tuple[1..]
                        .iter()
                        .zip(&choices)
                        .map(|(&i, choice)| choice[i].clone())
                        .collect();
                    kinds.push(ExprKind::Call {
                        callee: callees[tuple[0]].clone(),
                        args,
                    });
                });
                for kind in kinds {
                    res.extend(self.rebuilt(e, kind));
                }
            }
        }
        res
    }

    /// Pick the operand order the heuristics accept, if any.
    fn order_operands<'e>(
        &mut self,
        op: BinOp,
        l: &'e ExprRef,
        r: &'e ExprRef,
    ) -> Option<(&'e ExprRef, &'e ExprRef)> {
        if is_useful_binary(op, l, r) {
            return Some((l, r));
        }
        let numeric = l.value().kind() == Kind::Number && r.value().kind() == Kind::Number;
        if op.is_commutative() && numeric && is_useful_binary(op, r, l) {
            trace!("swap {} {} {}", l, op, r);
            return Some((r, l));
        }
        self.stats.discard(Discard::Pruned);
        None
    }

    /// Build a node with `kind` standing for `template`, within the depth bound.
    fn rebuilt(&mut self, template: &Expr, kind: ExprKind) -> Option<ExprRef> {
        let depth = kind
            .children()
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0);
        if depth > self.config.max_depth {
            self.stats.discard(Discard::OverDepth);
            return None;
        }
        let e = Expr::with_signature(
            kind,
            template.value().clone(),
            template.signature().to_string(),
        );
        Some(Rc::new(e))
    }
}
