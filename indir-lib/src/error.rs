use std::error::Error;
use std::fmt;

/// Errors of include processors
#[derive(Debug)]
pub enum IncludeError {
    /// The raw reader failed. The reader's error is kept unchanged.
    ResourceRead {
        /// The include target
        target: String,
        /// The reader's error
        source: Box<dyn Error>,
    },
    /// Neither an enclosing include nor the root document provide a directory
    DirectoryResolution {
        /// The include target
        target: String,
    },
    /// Lines were requested without a preceding `begin_inclusion`
    NoActiveRequest {
        /// The include target
        target: String,
    },
}

impl IncludeError {
    /// The include target the error refers to
    pub fn target(&self) -> &str {
        match self {
            IncludeError::ResourceRead { target, .. }
            | IncludeError::DirectoryResolution { target }
            | IncludeError::NoActiveRequest { target } => target,
        }
    }
}

impl fmt::Display for IncludeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncludeError::ResourceRead { source, .. } => write!(f, "{}", source),
            IncludeError::DirectoryResolution { target } => write!(
                f,
                "Unable to resolve the directory to restore after including {}: no enclosing include and no docfile attribute",
                target
            ),
            IncludeError::NoActiveRequest { target } => write!(
                f,
                "No active include request for {}: begin_inclusion must be called first",
                target
            ),
        }
    }
}

impl Error for IncludeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            IncludeError::ResourceRead { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_is_unchanged() {
        let error = IncludeError::ResourceRead {
            target: "missing.adoc".to_owned(),
            source: "No such file or directory".into(),
        };
        assert_eq!(error.to_string(), "No such file or directory");
        assert_eq!(
            error.source().map(|err| err.to_string()),
            Some("No such file or directory".to_owned())
        );
        assert_eq!(error.target(), "missing.adoc");
    }
}
