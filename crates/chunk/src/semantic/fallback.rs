//! Fallback stages for spans that exceed the token budget.

/// Strategies tried in order on an oversized span.
///
/// Each stage returns pieces; pieces that still exceed the budget continue
/// with the next stage. The cut stage is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Line and table-row packing
    Table,
    /// Greedy sentence packing
    Sentences,
    /// Truncation at a word or protected-span boundary
    Cut,
}

impl Fallback {
    pub const FIRST: Fallback = Fallback::Table;

    pub fn next(self) -> Option<Fallback> {
        match self {
            Fallback::Table => Some(Fallback::Sentences),
            Fallback::Sentences => Some(Fallback::Cut),
            Fallback::Cut => None,
        }
    }
}
