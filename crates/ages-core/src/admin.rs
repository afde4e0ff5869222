//! # Admin Operations
//!
//! Per-session bulk operations over every known age, for an external
//! command layer. Both report how many records changed; nothing changing is
//! an [`AdminError::NothingAffected`] the caller reports to the operator.

use crate::error::AdminError;
use crate::graph::ProgressionGraph;
use crate::primitives::SessionId;
use crate::progress::ProgressStore;
use tracing::info;

/// Revoke every age record from the session, children before parents.
pub fn reset_all<P>(
    graph: &ProgressionGraph,
    progress: &mut P,
    session: SessionId,
) -> Result<usize, AdminError>
where
    P: ProgressStore + ?Sized,
{
    let affected = graph
        .topological_order()
        .into_iter()
        .rev()
        .filter(|node| progress.revoke(session, node.record_id()))
        .count();

    info!(%session, affected, "Reset age progress");
    nonzero(affected)
}

/// Grant every age record to the session, parents before children.
pub fn skip_all<P>(
    graph: &ProgressionGraph,
    progress: &mut P,
    session: SessionId,
) -> Result<usize, AdminError>
where
    P: ProgressStore + ?Sized,
{
    let affected = graph
        .topological_order()
        .into_iter()
        .filter(|node| progress.grant(session, node.record_id()))
        .count();

    info!(%session, affected, "Skipped age progress");
    nonzero(affected)
}

fn nonzero(affected: usize) -> Result<usize, AdminError> {
    if affected == 0 {
        Err(AdminError::NothingAffected)
    } else {
        Ok(affected)
    }
}
