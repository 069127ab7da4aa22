//! Error type shared by every fallible tree operation.
//!
//! Read-only lookups (`find`, `get`, `lower_bound`, ...) never fail: a missing key
//! yields an end cursor or `None`. The variants below are reserved for direct
//! access (`at`), cursor dereference, node allocation, and structural requests
//! that cannot be carried out.

use thiserror::Error;

/// Errors reported by [`BSTreeMap`](crate::BSTreeMap) and its cursors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// A direct-access lookup such as [`at`](crate::BSTreeMap::at) did not find the key.
    #[error("key not found")]
    KeyNotFound,

    /// A cursor was dereferenced or advanced past the end of its traversal.
    #[error("cursor is out of range")]
    OutOfRange,

    /// The node allocator refused to provide storage for a new node.
    ///
    /// The tree is left exactly as it was before the failed call.
    #[error("node allocation failed")]
    AllocationFailed,

    /// A structural request was impossible, e.g. rotating a node whose required
    /// child is absent. This is a caller error, not a data condition.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// A [`Handle`](crate::Handle) refers to a node that has since been freed.
    #[error("handle refers to a node that no longer exists")]
    StaleHandle,
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
