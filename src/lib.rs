//! Indir expands the includes of AsciiDoc-style documents, and maintains an attribute `indir`
//! that points at the directory of the document currently processed. Nested documents can use
//! it to reference images and other resources relative to their own location.

use std::error::Error;
use std::fmt;

pub mod config;
pub mod files;
pub mod indir;
pub mod preprocess;
mod util;

pub use util::Fallible;

/// Error type for a document that (indirectly) includes itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularIncludeError {
    /// The include target that is already open
    pub target: String,
    /// The root document
    pub root: String,
}

impl Error for CircularIncludeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
impl fmt::Display for CircularIncludeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular include: {} (root: {})", self.target, self.root)
    }
}

/// Error type for includes nested deeper than allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDepthError {
    /// The include target that exceeds the depth
    pub target: String,
    /// The maximum depth
    pub max_depth: usize,
}

impl Error for IncludeDepthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
impl fmt::Display for IncludeDepthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Including {} exceeds the maximum include depth of {}",
            self.target, self.max_depth
        )
    }
}
