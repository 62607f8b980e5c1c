//! Level generator: one more depth of candidates out of the frontier.
//!
//! Composition rules are dispatched on the kind of the left/base operand:
//!
//! | Kind     | Candidates                                                  |
//! |----------|-------------------------------------------------------------|
//! | Number   | `a + b`, `a - b`, `a * b`, `a / b` for Number `b`; `-a`     |
//! | String   | `a + b` for String `b`; `a.length`                          |
//! | Array    | `a[i]` for Number `i` naming a present slot; `a.length`     |
//! | Record   | `a.f` for every field `f`; `a[k]` for String `k` naming one |
//! | Callable | `a(x1, .., xn)` for every n-tuple of the frontier           |
//! | Opaque   | nothing                                                     |
//!
//! Only candidates of depth exactly `d` are built at level `d`: at least one
//! immediate child must come from level `d - 1`, everything else was already
//! built at an earlier level.

use std::rc::Rc;

use log::{debug, trace};

use crate::debug::Discard;
use crate::expr::{BinOp, Expr, ExprKind, ExprRef, UnOp};
use crate::prune::{is_useful_binary, is_useful_unary};
use crate::synth::Session;
use crate::utils::for_each_tuple;
use crate::value::{array_slot, Kind, Value};

/// Field name used for array and string lengths.
pub const LENGTH: &str = "length";

impl Session<'_> {
    /// Generate, register and canonicalize all candidates of depth `depth`.
    pub(crate) fn gen_level(&mut self, depth: usize) {
        debug!("gen_level(depth = {})", depth);
        assert_ne!(depth, 0, "Level 0 holds the seeds");

        let frontier = self.frontier.clone();
        let mut out = Vec::new();
        for a in &frontier {
            match a.value().kind() {
                Kind::Number => self.gen_number(a, &frontier, depth, &mut out),
                Kind::String => self.gen_string(a, &frontier, depth, &mut out),
                Kind::Array => self.gen_array(a, &frontier, depth, &mut out),
                Kind::Record => self.gen_record(a, &frontier, depth, &mut out),
                Kind::Callable => self.gen_call(a, &frontier, depth, &mut out),
                Kind::Opaque => {}
            }
        }
        self.admit(depth, out);
    }

    fn gen_number(&mut self, a: &ExprRef, frontier: &[ExprRef], depth: usize, out: &mut Vec<ExprRef>) {
        let Value::Number(x) = *a.value() else {
            return;
        };
        for b in frontier {
            let Value::Number(y) = *b.value() else {
                continue;
            };
            if !reaches(depth, &[a, b]) {
                continue;
            }
            for op in BinOp::ALL {
                if !is_useful_binary(op, a, b) {
                    self.stats.discard(Discard::Pruned);
                    continue;
                }
                if op == BinOp::Div && y == 0.0 {
                    trace!("discard {} / {}: zero divisor", a, b);
                    self.stats.discard(Discard::ZeroDivisor);
                    continue;
                }
                let res = op.apply(x, y);
                if res.is_nan() {
                    trace!("discard {} {} {}: NaN", a, op, b);
                    self.stats.discard(Discard::NotANumber);
                    continue;
                }
                let kind = ExprKind::Binary {
                    op,
                    lhs: a.clone(),
                    rhs: b.clone(),
                };
                out.push(Rc::new(Expr::new(kind, Value::from(res))));
            }
        }

        if reaches(depth, &[a]) {
            if is_useful_unary(UnOp::Neg, a) {
                let kind = ExprKind::Unary {
                    op: UnOp::Neg,
                    operand: a.clone(),
                };
                out.push(Rc::new(Expr::new(kind, Value::from(-x))));
            } else {
                self.stats.discard(Discard::Pruned);
            }
        }
    }

    fn gen_string(&mut self, a: &ExprRef, frontier: &[ExprRef], depth: usize, out: &mut Vec<ExprRef>) {
        let Some(x) = a.value().as_str() else {
            return;
        };
        for b in frontier {
            let Some(y) = b.value().as_str() else {
                continue;
            };
            if !reaches(depth, &[a, b]) {
                continue;
            }
            if !is_useful_binary(BinOp::Add, a, b) {
                self.stats.discard(Discard::Pruned);
                continue;
            }
            let kind = ExprKind::Binary {
                op: BinOp::Add,
                lhs: a.clone(),
                rhs: b.clone(),
            };
            out.push(Rc::new(Expr::new(kind, Value::from(format!("{}{}", x, y)))));
        }

        if reaches(depth, &[a]) {
            let len = x.chars().count() as f64;
            out.push(field(a, LENGTH, Value::from(len)));
        }
    }

    fn gen_array(&mut self, a: &ExprRef, frontier: &[ExprRef], depth: usize, out: &mut Vec<ExprRef>) {
        let Value::Array(items) = a.value() else {
            return;
        };
        for i in frontier {
            let Value::Number(index) = *i.value() else {
                continue;
            };
            if !reaches(depth, &[a, i]) {
                continue;
            }
            let Some(slot) = array_slot(items.len(), index) else {
                trace!("skip {}[{}]: no slot {}", a, i, index);
                continue;
            };
            let kind = ExprKind::Index {
                base: a.clone(),
                index: i.clone(),
            };
            out.push(Rc::new(Expr::new(kind, bind_to(items[slot].clone(), a.value()))));
        }

        if reaches(depth, &[a]) {
            out.push(field(a, LENGTH, Value::from(items.len() as f64)));
        }
    }

    fn gen_record(&mut self, a: &ExprRef, frontier: &[ExprRef], depth: usize, out: &mut Vec<ExprRef>) {
        let Value::Record(record) = a.value() else {
            return;
        };

        if reaches(depth, &[a]) {
            for (name, value) in record.fields() {
                out.push(field(a, &name, bind_to(value, a.value())));
            }
        }

        // Reflective access through seed-derived keys.
        for k in frontier {
            let Some(key) = k.value().as_str() else {
                continue;
            };
            if !reaches(depth, &[a, k]) {
                continue;
            }
            let Some(value) = record.get(key) else {
                continue;
            };
            let kind = ExprKind::Index {
                base: a.clone(),
                index: k.clone(),
            };
            out.push(Rc::new(Expr::new(kind, bind_to(value, a.value()))));
        }
    }

    fn gen_call(&mut self, a: &ExprRef, frontier: &[ExprRef], depth: usize, out: &mut Vec<ExprRef>) {
        let Value::Callable(callee) = a.value() else {
            return;
        };
        let arity = callee.arity();
        let radices = vec![frontier.len(); arity];

        for_each_tuple(&radices, |tuple| {
            let args: Vec<&ExprRef> = tuple.iter().map(|&i| &frontier[i]).collect();
            let deepest = args.iter().map(|e| e.depth()).max().unwrap_or(0);
            if deepest.max(a.depth()) + 1 != depth {
                return;
            }
            let values: Vec<Value> = args.iter().map(|e| e.value().clone()).collect();
            match callee.invoke(&values) {
                Ok(res) if res.is_nan() => {
                    trace!("discard call {}: NaN", a);
                    self.stats.discard(Discard::NotANumber);
                }
                Ok(res) => {
                    let kind = ExprKind::Call {
                        callee: a.clone(),
                        args: args.into_iter().cloned().collect(),
                    };
                    out.push(Rc::new(Expr::new(kind, res)));
                }
                Err(err) => {
                    trace!("discard call {}: {}", a, err);
                    self.stats.discard(Discard::InvokeFailed);
                }
            }
        });
    }
}

/// Check whether a node built over `children` lands exactly at `depth`.
fn reaches(depth: usize, children: &[&ExprRef]) -> bool {
    children.iter().map(|c| c.depth()).max().map(|d| d + 1) == Some(depth)
}

fn field(base: &ExprRef, name: &str, value: Value) -> ExprRef {
    let kind = ExprKind::Field {
        base: base.clone(),
        field: name.to_string(),
    };
    Rc::new(Expr::new(kind, value))
}

// A callable pulled out of a record or an array keeps the container as its
// receiver. Callables that are already bound keep their receiver.
fn bind_to(value: Value, receiver: &Value) -> Value {
    match value {
        Value::Callable(f) if f.receiver().is_none() => Value::Callable(f.bind(receiver.clone())),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::synth::SynthConfig;
    use crate::value::{Callable, InvokeError, Record};

    fn session_with<'a>(config: &'a SynthConfig, seeds: Vec<(&str, Value)>) -> Session<'a> {
        let mut session = Session::new(config);
        session.seed(seeds);
        session
    }

    fn renderings(session: &Session) -> Vec<String> {
        session.table.iter().map(|e| e.rendering().to_string()).collect()
    }

    #[test]
    fn test_number_level() {
        let config = SynthConfig::default();
        let mut session = session_with(&config, vec![("two", Value::from(2))]);
        session.gen_level(1);
        assert_eq!(renderings(&session), vec!["two", "two * two", "-two"]);

        session.gen_level(2);
        let all = renderings(&session);
        assert!(all.contains(&"two * (two * two)".to_string()));
        assert!(all.contains(&"two + (two * two)".to_string()));
        assert!(!all.contains(&"two - two".to_string()));
        assert!(!all.contains(&"two / two".to_string()));
        assert!(!all.contains(&"(-two) * (-two)".to_string()));
        // Nothing from level 1 is rebuilt at level 2.
        assert_eq!(all.iter().filter(|r| *r == "two * two").count(), 1);
    }

    #[test]
    fn test_zero_divisor_is_never_built() {
        let config = SynthConfig::default();
        let mut session = session_with(&config, vec![("x", Value::from(1)), ("z", Value::from(0))]);
        session.gen_level(1);
        let all = renderings(&session);
        assert!(all.contains(&"z / x".to_string()));
        assert!(!all.contains(&"x / z".to_string()));
        assert_eq!(session.stats.discards(Discard::ZeroDivisor), 1);
    }

    #[test]
    fn test_nan_is_discarded() {
        let config = SynthConfig::default();
        let mut session = session_with(
            &config,
            vec![("inf", Value::from(f64::INFINITY)), ("ninf", Value::from(f64::NEG_INFINITY))],
        );
        session.gen_level(1);
        let all = renderings(&session);
        // inf + ninf is NaN.
        assert!(!all.contains(&"inf + ninf".to_string()));
        assert!(session.stats.discards(Discard::NotANumber) > 0);
        for e in session.table.iter() {
            assert!(!e.value().is_nan());
        }
    }

    #[test]
    fn test_array_level() {
        let config = SynthConfig::default();
        let a = Value::array([Value::from(1), Value::from(2), Value::from(3)]);
        let mut session = session_with(
            &config,
            vec![("a", a), ("two", Value::from(2)), ("half", Value::from(0.5)), ("big", Value::from(7))],
        );
        session.gen_level(1);
        let index = session.table.iter().find(|e| e.rendering() == "a[two]").unwrap();
        assert_eq!(index.value().as_number(), Some(3.0));
        assert_eq!(index.depth(), 1);
        let len = session.table.iter().find(|e| e.rendering() == "a.length").unwrap();
        assert_eq!(len.value().as_number(), Some(3.0));
        let all = renderings(&session);
        assert!(!all.contains(&"a[half]".to_string()));
        assert!(!all.contains(&"a[big]".to_string()));
        // `a.length` joins the class of `a[two]`, so only the latter is admitted.
        assert!(session.frontier.iter().any(|e| e.rendering() == "a[two]"));
        assert!(!session.frontier.iter().any(|e| e.rendering() == "a.length"));
    }

    #[test]
    fn test_string_level() {
        let config = SynthConfig::default();
        let mut session = session_with(&config, vec![("s", Value::from("live")), ("t", Value::from("ly"))]);
        session.gen_level(1);
        let all = renderings(&session);
        for r in ["s + s", "s + t", "t + s", "t + t", "s.length", "t.length"] {
            assert!(all.contains(&r.to_string()), "missing {}", r);
        }
        session.gen_level(2);
        let len = session.table.iter().find(|e| e.rendering() == "(s + s).length").unwrap();
        assert_eq!(len.value().as_number(), Some(8.0));
    }

    #[test]
    fn test_record_level_binds_receiver() {
        let config = SynthConfig::default();
        let live = Callable::new(1, |receiver, args| {
            let record = receiver
                .and_then(Value::as_record)
                .ok_or_else(|| InvokeError::Receiver("unbound".to_string()))?;
            let x = args[0].as_number().ok_or_else(|| InvokeError::thrown("Must give a number."))?;
            let age = record.get("age").and_then(|v| v.as_number()).unwrap_or(0.0) + x;
            record.set("age", age);
            Ok(Value::from(age))
        });
        let person = Record::new().with("age", 42).with("live", live);
        let mut session = session_with(
            &config,
            vec![("person", Value::from(person.clone())), ("two", Value::from(2)), ("s", Value::from("live"))],
        );

        session.gen_level(1);
        let by_field = session.table.iter().find(|e| e.rendering() == "person.live").unwrap().clone();
        let by_key = session.table.iter().find(|e| e.rendering() == "person[s]").unwrap().clone();
        assert_eq!(by_field.signature(), by_key.signature());
        assert!(session.frontier.iter().any(|e| e.rendering() == "person.live"));
        assert!(!session.frontier.iter().any(|e| e.rendering() == "person[s]"));

        session.gen_level(2);
        let call = session.table.iter().find(|e| e.rendering() == "person.live(two)").unwrap();
        assert_eq!(call.value().as_number(), Some(44.0));
        assert_eq!(call.depth(), 2);
        assert!(session.stats.discards(Discard::InvokeFailed) > 0);
        // The call went through the receiver.
        assert!(person.get("age").unwrap().as_number().unwrap() >= 44.0);
    }

    #[test]
    fn test_call_level() {
        let config = SynthConfig::default();
        let pow = Callable::new(2, |_, args| match (args[0].as_number(), args[1].as_number()) {
            (Some(x), Some(y)) => Ok(Value::from(x.powf(y))),
            _ => Err(InvokeError::thrown("Must give a number.")),
        });
        let nan = Callable::new(0, |_, _| Ok(Value::from(f64::NAN)));
        let mut session = session_with(
            &config,
            vec![("two", Value::from(2)), ("exp", Value::from(pow)), ("nan", Value::from(nan))],
        );
        session.gen_level(1);
        let call = session.table.iter().find(|e| e.rendering() == "exp(two, two)").unwrap();
        assert_eq!(call.value().as_number(), Some(4.0));
        assert_eq!(call.depth(), 1);
        assert!(!renderings(&session).contains(&"nan()".to_string()));
        assert_eq!(session.stats.discards(Discard::NotANumber), 1);
        // exp(two, exp), exp(exp, two), ... all throw.
        assert_eq!(session.stats.discards(Discard::InvokeFailed), 8);
    }

    #[test]
    fn test_array_element_binds_receiver() {
        let config = SynthConfig::default();
        let size = Callable::new(0, |receiver, _| match receiver {
            Some(Value::Array(items)) => Ok(Value::from(items.len() as f64)),
            _ => Err(InvokeError::Receiver("unbound".to_string())),
        });
        let a = Value::array([Value::from(size)]);
        let mut session = session_with(&config, vec![("a", a), ("zero", Value::from(0))]);

        session.gen_level(1);
        let elem = session.table.iter().find(|e| e.rendering() == "a[zero]").unwrap().clone();
        let receiver = elem.value().as_callable().and_then(|c| c.receiver());
        assert!(matches!(receiver, Some(Value::Array(_))));

        session.gen_level(2);
        let call = session.table.iter().find(|e| e.rendering() == "a[zero]()").unwrap();
        assert_eq!(call.value().as_number(), Some(1.0));
        assert_eq!(session.stats.discards(Discard::InvokeFailed), 0);
    }

    #[test]
    fn test_call_results_of_any_kind() {
        let config = SynthConfig::default();
        let show = Callable::new(1, |_, args| match args[0].as_number() {
            Some(x) => Ok(Value::from(format!("<{}>", x))),
            None => Err(InvokeError::thrown("Must give a number.")),
        });
        let make = Callable::new(0, |_, _| Ok(Value::from(Record::new().with("x", 7))));
        let adder = Callable::new(0, |_, _| {
            let tenfold = Callable::new(1, |_, args| match args[0].as_number() {
                Some(x) => Ok(Value::from(x * 10.0)),
                None => Err(InvokeError::thrown("Must give a number.")),
            });
            Ok(Value::from(tenfold))
        });
        let mut session = session_with(
            &config,
            vec![
                ("two", Value::from(2)),
                ("show", Value::from(show)),
                ("make", Value::from(make)),
                ("adder", Value::from(adder)),
            ],
        );

        session.gen_level(1);
        let shown = session.table.iter().find(|e| e.rendering() == "show(two)").unwrap();
        assert_eq!(shown.value().as_str(), Some("<2>"));
        let made = session.table.iter().find(|e| e.rendering() == "make()").unwrap();
        assert_eq!(made.value().kind(), Kind::Record);
        let add = session.table.iter().find(|e| e.rendering() == "adder()").unwrap();
        assert_eq!(add.value().kind(), Kind::Callable);

        // Each of them composes further.
        session.gen_level(2);
        let concat = session.table.iter().find(|e| e.rendering() == "show(two) + show(two)").unwrap();
        assert_eq!(concat.value().as_str(), Some("<2><2>"));
        let field = session.table.iter().find(|e| e.rendering() == "make().x").unwrap();
        assert_eq!(field.value().as_number(), Some(7.0));
        let call = session.table.iter().find(|e| e.rendering() == "adder()(two)").unwrap();
        assert_eq!(call.value().as_number(), Some(20.0));
        assert_eq!(call.depth(), 2);
    }

    #[test]
    fn test_opaque_is_terminal() {
        let config = SynthConfig::default();
        let mut session = session_with(&config, vec![("n", Value::Null), ("u", Value::Undefined)]);
        session.gen_level(1);
        assert_eq!(session.table.size(), 2);
        assert_eq!(session.stats.levels.last().unwrap().produced, 0);
    }
}
