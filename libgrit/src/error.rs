use crate::hash::Oid;
use crate::obj::ObjKind;

pub type GritResult<T> = Result<T, GritError>;

/// The error kinds this core distinguishes. Everything else (I/O, utf8,
/// parse failures from third-party code) is carried in [`GritError::Other`].
#[derive(thiserror::Error, Debug)]
pub enum GritError {
    #[error("object `{0}` not found")]
    NotFound(String),

    #[error("prefix `{prefix}` is ambiguous; candidates: {}", candidates.iter().map(Oid::to_string).collect::<Vec<_>>().join(", "))]
    AmbiguousPrefix { prefix: String, candidates: Vec<Oid> },

    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("corrupt object `{oid}`: {reason}")]
    CorruptObject { oid: Oid, reason: String },

    #[error("object `{oid}` is a {actual}, expected {expected}")]
    KindMismatch { oid: Oid, expected: ObjKind, actual: ObjKind },

    #[error("write-tree does not support nested trees, but path `{0}` contains `/`")]
    NestedTreeUnsupported(String),

    #[error("path `{0}` is too long to be represented in the index")]
    PathTooLong(String),

    #[error("required environment variable `{0}` is not set")]
    MissingEnv(String),

    #[error("object `{0}` is reachable but missing from the object store")]
    MissingObject(Oid),

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("http request failed: {0}")]
    HttpFailure(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for GritError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(err.into())
    }
}

impl From<std::fmt::Error> for GritError {
    fn from(err: std::fmt::Error) -> Self {
        Self::Other(err.into())
    }
}

impl GritError {
    /// `true` for errors that are a normal, expected outcome of a lookup
    /// rather than a structural problem with the repository.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(..) | Self::AmbiguousPrefix { .. })
    }
}
