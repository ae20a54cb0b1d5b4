//! Document attributes and reader state as seen by include processors
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute holding the path of the root document
pub const DOCFILE_ATTRIBUTE: &str = "docfile";

/// A `Document` handle, exposing the document-wide attribute store
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    attributes: BTreeMap<String, String>,
}

impl Document {
    /// Creates a document without attributes
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document for the given root file
    pub fn with_docfile(docfile: &str) -> Self {
        let mut document = Self::new();
        document.set_attribute(DOCFILE_ATTRIBUTE, docfile);
        document
    }

    /// The value of an attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|value| value.as_str())
    }

    /// Whether an attribute is set
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Sets an attribute, returning the previous value
    pub fn set_attribute<N, V>(&mut self, name: N, value: V) -> Option<String>
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.attributes.insert(name.into(), value.into())
    }

    /// Unsets an attribute, returning the previous value
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// All attributes, ordered by name
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Path of the root document, from attribute `docfile`
    pub fn docfile(&self) -> Option<&str> {
        self.attribute(DOCFILE_ATTRIBUTE)
    }
}

/// An open included document on the host's include stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeFrame {
    /// Resolved path of the included document
    pub path: String,
    /// Line of the include directive in the including document
    pub lineno: usize,
}

impl IncludeFrame {
    /// Creates a new frame
    pub fn new<P: Into<String>>(path: P, lineno: usize) -> Self {
        IncludeFrame {
            path: path.into(),
            lineno,
        }
    }
}

/// State of the host's reader.
///
/// The include stack is ordered outermost first. When a processor is asked to handle an
/// inclusion, the frame of the target is already on top of the stack.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderState {
    /// Currently open included documents
    pub include_stack: Vec<IncludeFrame>,
}

impl ReaderState {
    /// Creates a reader state with an empty include stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open included documents
    pub fn depth(&self) -> usize {
        self.include_stack.len()
    }

    /// The frame of the document being included
    pub fn current_frame(&self) -> Option<&IncludeFrame> {
        self.include_stack.last()
    }

    /// The frame of the document that includes the current one, if that one is itself included
    pub fn parent_frame(&self) -> Option<&IncludeFrame> {
        let len = self.include_stack.len();
        if len >= 2 {
            self.include_stack.get(len - 2)
        } else {
            None
        }
    }
}
