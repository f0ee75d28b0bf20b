//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! unknown attribute ids, unresolvable group indices, billboard queries on non-billboard
//! stems, undersized destination buffers and inconsistent buffer layouts.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid vertex attribute {0}")]
    InvalidAttribute(u32),

    #[error("group index {index} out of range (group count {group_count})")]
    GroupIndexOutOfRange { index: usize, group_count: usize },

    #[error("group {group} is not a billboard")]
    NotABillboard { group: usize },

    #[error("group {group} has no stem model")]
    MissingStemModel { group: usize },

    #[error("destination buffer too small: {required} required, {provided} provided")]
    BufferTooSmall { required: usize, provided: usize },

    #[error("invalid buffer layout: {0}")]
    InvalidLayout(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

/// Fails with [`Error::BufferTooSmall`] unless `provided >= required`.
pub(crate) fn ensure_capacity(required: usize, provided: usize) -> Result<()> {
    if provided < required {
        return Err(Error::BufferTooSmall { required, provided });
    }
    Ok(())
}
