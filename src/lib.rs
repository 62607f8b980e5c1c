//! # codehint-rs: enumerative expression synthesis
//!
//! **`codehint-rs`** builds expressions out of a set of named seed values
//! (numbers, strings, arrays, records, callables, null-like values) and
//! returns every distinct expression, up to a bounded composition depth,
//! whose value satisfies an acceptance predicate.
//!
//! ## How it works
//!
//! - **Levels**: expressions of depth `d` are built out of the frontier of
//!   depths `0..d` by type-directed rules: arithmetic on numbers,
//!   concatenation and `length` on strings, indexing and `length` on arrays,
//!   field and reflective access on records, invocation of callables.
//! - **Pruning**: heuristics drop syntactically uninteresting compositions
//!   (`x - x`, `y + x` when `x + y` is built, `-(-x)`, ...) before they enter
//!   the search.
//! - **Canonicalization**: every expression is registered under the
//!   signature of its value; only the first member of each class joins the
//!   frontier, which keeps later levels small.
//! - **Expansion**: after filtering, each accepted expression is rebuilt from
//!   every member of its children's classes, recovering the variants that
//!   canonicalization collapsed.
//!
//! ## Basic Usage
//!
//! ```rust
//! use codehint_rs::synth::Synthesizer;
//! use codehint_rs::value::{Callable, InvokeError, Value};
//!
//! let exp = Callable::new(2, |_, args| match (args[0].as_number(), args[1].as_number()) {
//!     (Some(x), Some(y)) => Ok(Value::from(x.powf(y))),
//!     _ => Err(InvokeError::thrown("Must give a number.")),
//! });
//!
//! let synth = Synthesizer::default();
//! let results = synth.synthesize(
//!     [("two", Value::from(2)), ("exp", Value::from(exp))],
//!     |v| v.as_number() == Some(4.0),
//! );
//!
//! let renderings: Vec<&str> = results.iter().map(|e| e.rendering()).collect();
//! assert!(renderings.contains(&"two * two"));
//! assert!(renderings.contains(&"exp(two, two)"));
//! ```
//!
//! ## Core Components
//!
//! - **[`synth`]**: the [`Synthesizer`][crate::synth::Synthesizer] driver and its configuration.
//! - **[`value`]**: host values and the invocation boundary.
//! - **[`expr`]**: expression trees.
//! - **[`table`]**: the equivalence table.

pub mod cache;
pub mod debug;
mod expand;
pub mod expr;
pub mod level;
pub mod prune;
pub mod synth;
pub mod table;
pub mod utils;
pub mod value;
