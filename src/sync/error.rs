use crate::event_store::RefKind;
use crate::feed::FeedError;
use thiserror::Error;

/// Errors surfaced by one synchronization pass.
///
/// Every variant aborts the pass; writes only ever happen inside the pass
/// transaction, so a failed pass leaves previously synced data untouched.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Upstream unreachable, non-success status, or undecodable payload.
    /// Raised before any write; retry policy belongs to the caller.
    #[error("failed to fetch show {show_id}: {source}")]
    Fetch {
        show_id: i64,
        #[source]
        source: FeedError,
    },

    /// A (source, upstream id) pair is already bound to a different local
    /// row, or a racing import tripped the reference uniqueness index.
    #[error("conflicting external reference for {kind} {source_tag}/{upstream_id}")]
    Conflict {
        kind: RefKind,
        source_tag: String,
        upstream_id: i64,
    },

    /// Malformed upstream field. The whole pass aborts rather than skipping
    /// the offending entity, so a show is never half-synced.
    #[error("invalid {kind} record: {message}")]
    Validation { kind: RefKind, message: String },

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}
