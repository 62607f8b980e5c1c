//! The synthesis driver.
//!
//! A [`Synthesizer`] holds the configuration; every call to
//! [`Synthesizer::run`] opens a fresh [`Session`] that owns the equivalence
//! table, the frontier and the expansion memo for exactly that call, and
//! walks through the phases:
//!
//! ```text
//! Seeding -> Leveling(1) -> ... -> Leveling(K) -> Filtering -> Expanding -> Deduplicating -> Done
//! ```
//!
//! No phase can fail: a candidate that cannot be built (division by zero,
//! failed invocation, not-a-number result) is dropped on the spot.
//!
//! # Example
//!
//! ```
//! use codehint_rs::synth::Synthesizer;
//! use codehint_rs::value::Value;
//!
//! let synth = Synthesizer::default();
//! let seeds = [
//!     ("two", Value::from(2)),
//!     ("a", Value::array([Value::from(1), Value::from(2), Value::from(3)])),
//! ];
//! let results = synth.synthesize(seeds, |v| v.as_number() == Some(3.0));
//! let renderings: Vec<&str> = results.iter().map(|e| e.rendering()).collect();
//! assert!(renderings.contains(&"a[two]"));
//! assert!(renderings.contains(&"a.length"));
//! ```

use std::collections::HashSet;
use std::fmt;

use log::debug;

use crate::cache::Cache;
use crate::debug::{LevelStats, SynthStats};
use crate::expr::{Expr, ExprRef};
use crate::table::{EquivTable, Registration};
use crate::value::Value;

/// Tunables of a synthesis run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SynthConfig {
    /// Maximum composition depth `K`.
    pub max_depth: usize,
    /// Run the equivalence expansion pass.
    pub expand: bool,
    /// Cap on the number of frontier members (canonical representatives).
    pub frontier_limit: Option<usize>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            expand: true,
            frontier_limit: None,
        }
    }
}

impl SynthConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_expansion(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    pub fn with_frontier_limit(mut self, limit: usize) -> Self {
        assert!(limit > 0, "Frontier limit should be positive");
        self.frontier_limit = Some(limit);
        self
    }
}

/// Phase of a synthesis run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    Seeding,
    Leveling(usize),
    Filtering,
    Expanding,
    Deduplicating,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Leveling(depth) => write!(f, "Leveling({})", depth),
            _ => write!(f, "{:?}", self),
        }
    }
}

/// Outcome of [`Synthesizer::run`].
#[derive(Debug)]
pub struct Report {
    /// Accepted expressions, distinct by rendering, in discovery order.
    pub results: Vec<ExprRef>,
    pub stats: SynthStats,
}

impl Report {
    /// Find a result by its rendering.
    pub fn get(&self, rendering: &str) -> Option<&ExprRef> {
        self.results.iter().find(|e| e.rendering() == rendering)
    }

    pub fn contains(&self, rendering: &str) -> bool {
        self.get(rendering).is_some()
    }
}

#[derive(Debug, Default, Clone)]
pub struct Synthesizer {
    config: SynthConfig,
}

impl Synthesizer {
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Synthesize expressions out of `seeds` whose value satisfies `predicate`.
    pub fn synthesize<S, P>(&self, seeds: impl IntoIterator<Item = (S, Value)>, predicate: P) -> Vec<ExprRef>
    where
        S: Into<String>,
        P: Fn(&Value) -> bool,
    {
        self.run(seeds, predicate).results
    }

    /// Synthesize every expression reachable from `seeds`.
    pub fn synthesize_all<S>(&self, seeds: impl IntoIterator<Item = (S, Value)>) -> Vec<ExprRef>
    where
        S: Into<String>,
    {
        self.run_all(seeds).results
    }

    /// Like [`Synthesizer::synthesize`], also returning run statistics.
    pub fn run<S, P>(&self, seeds: impl IntoIterator<Item = (S, Value)>, predicate: P) -> Report
    where
        S: Into<String>,
        P: Fn(&Value) -> bool,
    {
        let mut session = Session::new(&self.config);

        session.enter(Phase::Seeding);
        session.seed(seeds);

        for depth in 1..=self.config.max_depth {
            session.enter(Phase::Leveling(depth));
            session.gen_level(depth);
        }

        session.enter(Phase::Filtering);
        let good: Vec<ExprRef> = session
            .table
            .iter()
            .filter(|e| predicate(e.value()))
            .cloned()
            .collect();
        session.stats.accepted = good.len();
        debug!("accepted {} of {} expressions", good.len(), session.table.size());

        session.enter(Phase::Expanding);
        let mut expanded = Vec::with_capacity(good.len());
        if self.config.expand {
            for e in &good {
                expanded.extend(session.expand(e));
            }
        } else {
            expanded = good;
        }

        session.enter(Phase::Deduplicating);
        let mut seen = HashSet::new();
        let results: Vec<ExprRef> = expanded
            .into_iter()
            .filter(|e| predicate(e.value()))
            .filter(|e| seen.insert(e.rendering().to_string()))
            .collect();

        session.enter(Phase::Done);
        let mut stats = session.finish();
        stats.results = results.len();
        Report { results, stats }
    }

    pub fn run_all<S>(&self, seeds: impl IntoIterator<Item = (S, Value)>) -> Report
    where
        S: Into<String>,
    {
        self.run(seeds, |_| true)
    }
}

/// State owned by one synthesis call.
pub(crate) struct Session<'a> {
    pub(crate) config: &'a SynthConfig,
    pub(crate) table: EquivTable,
    /// Canonical representatives admitted so far, in admission order.
    pub(crate) frontier: Vec<ExprRef>,
    pub(crate) memo: Cache<String, Vec<ExprRef>>,
    /// Signatures whose expansion is under way.
    pub(crate) in_progress: HashSet<String>,
    pub(crate) stats: SynthStats,
    phase: Phase,
}

impl<'a> Session<'a> {
    pub(crate) fn new(config: &'a SynthConfig) -> Self {
        Self {
            config,
            table: EquivTable::new(),
            frontier: Vec::new(),
            memo: Cache::new(),
            in_progress: HashSet::new(),
            stats: SynthStats::default(),
            phase: Phase::Seeding,
        }
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        debug!("phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    pub(crate) fn seed<S>(&mut self, seeds: impl IntoIterator<Item = (S, Value)>)
    where
        S: Into<String>,
    {
        let seeds: Vec<ExprRef> = seeds
            .into_iter()
            .map(|(name, value)| Expr::literal(name, value))
            .collect();
        debug!("seed({} bindings)", seeds.len());
        self.admit(0, seeds);
    }

    /// Register the candidates of one depth and extend the frontier with the
    /// classes they create.
    pub(crate) fn admit(&mut self, depth: usize, candidates: Vec<ExprRef>) {
        let produced = candidates.len();
        let mut admitted = 0;
        for e in candidates {
            if self.table.register(e.clone()) != Registration::NewClass {
                continue;
            }
            if let Some(limit) = self.config.frontier_limit {
                if self.frontier.len() >= limit {
                    debug!("frontier limit {} reached, not admitting {}", limit, e);
                    continue;
                }
            }
            self.frontier.push(e);
            admitted += 1;
        }
        debug!(
            "depth {}: produced {}, admitted {}, frontier {}",
            depth,
            produced,
            admitted,
            self.frontier.len()
        );
        self.stats.levels.push(LevelStats {
            depth,
            produced,
            admitted,
            frontier: self.frontier.len(),
        });
    }

    pub(crate) fn finish(self) -> SynthStats {
        let mut stats = self.stats;
        stats.classes = self.table.num_classes();
        stats.memo_hits = self.memo.hits();
        stats.memo_misses = self.memo.misses();
        stats
    }
}
