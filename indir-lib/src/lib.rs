//! Extension API for include processors of the indir preprocessor.
//!
//! A host expands `include::` directives by calling an [`IncludeProcessor`] in two steps,
//! [`IncludeProcessor::begin_inclusion`] followed by [`IncludeProcessor::get_included_lines`].
//! Processors obtain the raw content of a target through a [`RawIncludeReader`].

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::error::Error;

mod document;
mod error;
mod selector;

pub use document::*;
pub use error::IncludeError;
pub use selector::*;

/// Version of this library
pub const INDIR_VERSION: &str = env!(
    "CARGO_PKG_VERSION",
    "Environmental variable CARGO_PKG_VERSION not found"
);

/// Raw content of an include target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncludeContent {
    /// A single block of text
    Text(String),
    /// Lines, already split
    Lines(Vec<String>),
}

impl IncludeContent {
    /// Splits the content into lines, keeping line terminators.
    /// Content that is already split is returned unchanged.
    pub fn into_lines(self) -> Vec<String> {
        match self {
            IncludeContent::Text(text) => split_lines(&text),
            IncludeContent::Lines(lines) => lines,
        }
    }
}

/// Splits text into lines, keeping the terminator of each line
pub fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_owned).collect()
}

/// Reads the unaugmented content of an include target
pub trait RawIncludeReader {
    /// Reads the target, restricted by the selector
    fn read_lines(&self, target: &str, selector: &Selector)
        -> Result<IncludeContent, Box<dyn Error>>;
}

impl<F> RawIncludeReader for F
where
    F: Fn(&str, &Selector) -> Result<IncludeContent, Box<dyn Error>>,
{
    fn read_lines(
        &self,
        target: &str,
        selector: &Selector,
    ) -> Result<IncludeContent, Box<dyn Error>> {
        self(target, selector)
    }
}

/// Handles include directives on behalf of a host.
///
/// The host calls `begin_inclusion` and then `get_included_lines` for every include directive,
/// strictly in that order and without interleaving other inclusions in between.
pub trait IncludeProcessor {
    /// Whether this processor handles the given target. Defaults to handling every target.
    fn handles(&self, _target: &str) -> bool {
        true
    }

    /// Records the context of the inclusion that is about to be read
    fn begin_inclusion(&mut self, document: &Document, reader: &ReaderState, target: &str);

    /// Returns the lines that replace the include directive
    fn get_included_lines(
        &mut self,
        target: &str,
        selector: &Selector,
    ) -> Result<Vec<String>, IncludeError>;
}
