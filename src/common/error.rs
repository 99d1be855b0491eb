//! Crate-wide error taxonomy.
//!
//! Most operations in this crate report failure the way the spec they
//! implement does — a `bool` or `Option` (duplicate key, pool exhaustion,
//! directory-full). [`Error`] is reserved for conditions that are actually
//! exceptional: I/O failure, or a caller passing an out-of-range frame id.

use thiserror::Error;

use crate::common::config::{FrameId, PageId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("buffer pool exhausted: no evictable frame available")]
    Full,

    #[error("page {0} not found")]
    NotFound(PageId),

    #[error("frame {0} is out of the replacer's configured range")]
    InvalidFrame(FrameId),

    #[error("frame {0} is not evictable")]
    NonEvictable(FrameId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
