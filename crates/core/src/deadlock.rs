//! Deadlock detection over the wait-for graph.
//!
//! The detector looks for the first cycle in the graph and names its
//! highest transaction id as the victim. Aborting the victim releases its
//! locks, so at least one other member of the cycle can make progress on
//! its next turn.
//!
//! The graph may hold stale edges (a waiter that has since been granted its
//! lock is not removed). A stale cycle can therefore cost an unnecessary
//! abort, but never hides a real one.

use alloc::vec::Vec;

use crate::graph::WaitForGraph;
use crate::transaction::types::TransactionId;

/// A cycle of waiting transactions and the member chosen to break it.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deadlock {
    /// Members of the cycle in wait-for order.
    pub cycle: Vec<TransactionId>,
    pub victim: TransactionId,
}

/// Searches `graph` for a cycle and picks a victim.
///
/// Returns `None` when the graph is acyclic.
#[must_use]
pub fn find_deadlock(graph: &WaitForGraph) -> Option<Deadlock> {
    let cycle = graph.find_cycle()?;
    let victim = cycle.iter().copied().max()?;
    tracing::debug!(?cycle, %victim, "deadlock detected");
    Some(Deadlock { cycle, victim })
}
