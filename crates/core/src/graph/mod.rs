pub mod digraph;

pub use digraph::DiGraph;

use crate::transaction::types::TransactionId;

/// Wait-for graph over the transactions of one run.
pub type WaitForGraph = DiGraph<TransactionId>;
