use std::path::{Path, PathBuf};

use thiserror::Error;

use super::interval::Tier;

#[derive(Error, Debug)]
pub enum TextGridError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a TextGrid document (missing ooTextFile/TextGrid header)")]
    NotATextGrid,
    #[error("malformed TextGrid: {0}")]
    Malformed(String),
    #[error("malformed TextGrid: unexpected end of document")]
    UnexpectedEnd,
}

/// Domain interface for reading a tiered interval-annotation document.
///
/// Implementations produce tiers in file order, each with its intervals in
/// time order, without filtering or validating labels.
pub trait AnnotationReader: Send {
    fn read_tiers(&self, path: &Path) -> Result<Vec<Tier>, TextGridError>;
}
