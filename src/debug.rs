//! Statistics for inspecting a synthesis run.
//!
//! These are primarily useful in tests, benchmarks and during development:
//! they tell how much each level produced, how much canonicalization cut,
//! and why candidates were dropped.

use std::collections::HashMap;
use std::fmt;

/// Why a candidate was not built.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Discard {
    /// Rejected by a pruning heuristic.
    Pruned,
    /// Division by a zero-valued operand.
    ZeroDivisor,
    /// The computed value was not-a-number.
    NotANumber,
    /// The host callable failed.
    InvokeFailed,
    /// Reconstruction during expansion would exceed the depth bound.
    OverDepth,
}

impl Discard {
    pub const ALL: [Discard; 5] = [
        Discard::Pruned,
        Discard::ZeroDivisor,
        Discard::NotANumber,
        Discard::InvokeFailed,
        Discard::OverDepth,
    ];
}

/// Summary of one level of generation.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LevelStats {
    pub depth: usize,
    /// Candidates built at this depth (duplicates included).
    pub produced: usize,
    /// Classes first reached at this depth, i.e. new frontier members.
    pub admitted: usize,
    /// Frontier size after the level.
    pub frontier: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SynthStats {
    pub levels: Vec<LevelStats>,
    /// Number of equivalence classes at the end of the run.
    pub classes: usize,
    /// Expressions accepted by the predicate before expansion.
    pub accepted: usize,
    /// Expressions registered by the expansion pass that were not in the
    /// table before.
    pub expanded: usize,
    pub results: usize,
    pub memo_hits: usize,
    pub memo_misses: usize,
    discards: HashMap<Discard, usize>,
}

impl SynthStats {
    pub fn discard(&mut self, reason: Discard) {
        *self.discards.entry(reason).or_default() += 1;
    }

    /// Get the number of candidates dropped for the given reason.
    pub fn discards(&self, reason: Discard) -> usize {
        self.discards.get(&reason).copied().unwrap_or(0)
    }

    /// Total number of candidates built across all levels.
    pub fn produced(&self) -> usize {
        self.levels.iter().map(|l| l.produced).sum()
    }
}

impl fmt::Display for SynthStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Synthesis stats:")?;
        for level in &self.levels {
            writeln!(
                f,
                "  depth {}: produced={}, admitted={}, frontier={}",
                level.depth, level.produced, level.admitted, level.frontier
            )?;
        }
        writeln!(f, "  classes: {}", self.classes)?;
        writeln!(f, "  accepted: {}", self.accepted)?;
        writeln!(f, "  expanded: +{}", self.expanded)?;
        writeln!(f, "  results: {}", self.results)?;
        writeln!(f, "  memo: {} hits, {} misses", self.memo_hits, self.memo_misses)?;
        for reason in Discard::ALL {
            let n = self.discards(reason);
            if n > 0 {
                writeln!(f, "  discarded ({:?}): {}", reason, n)?;
            }
        }
        Ok(())
    }
}
