use thiserror::Error;

/// Reason a route could not be produced.
///
/// Callers that only need the observable contract use
/// [`Router::route`](super::Router::route), which turns any of these into an
/// empty plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnroutableError {
    /// The network holds no nodes, or a query point is not finite.
    #[error("no network node can be matched to the requested point")]
    EmptyNetwork,
    /// The mapped nodes are not connected in the travel direction.
    #[error("no path from node {from} to node {to}")]
    NoPath {
        /// Node nearest the origin.
        from: u64,
        /// Node nearest the destination.
        to: u64,
    },
    /// The search settled its maximum number of nodes before reaching the
    /// destination.
    #[error("search settled {limit} nodes without reaching node {to}")]
    SearchBudgetExhausted {
        /// Configured cap on settled nodes.
        limit: usize,
        /// Node nearest the destination.
        to: u64,
    },
}
