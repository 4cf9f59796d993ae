//! The "currently active pool" ambient reference (`spec.md` §4.5: "the
//! currently active pool (an external ambient reference supplied by the
//! collaborator)").

use crate::collab::pool::PoolRef;

pub trait ActivePoolProvider: Send + Sync {
    fn current(&self) -> Option<PoolRef>;
}
