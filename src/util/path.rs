//! Path utilities working on the string form of paths.

use std::path::{is_separator, Path};

use crate::util::Fallible;

/// Directory part of a path, like POSIX `dirname`.
///
/// `"main.adoc"` gives `"."`, `"sub/a.adoc"` gives `"sub"`, `"/a.adoc"` gives `"/"`.
/// Returns `None` for an empty path.
pub fn dirname(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }

    let trimmed = path.trim_end_matches(is_separator);
    if trimmed.is_empty() {
        return Some(path[..1].to_owned());
    }

    match trimmed.rfind(is_separator) {
        None => Some(".".to_owned()),
        Some(pos) => {
            let dir = trimmed[..pos].trim_end_matches(is_separator);
            if dir.is_empty() {
                Some(trimmed[..1].to_owned())
            } else {
                Some(dir.to_owned())
            }
        }
    }
}

/// File name of a path without its extension
pub fn stem(path: &str) -> Option<String> {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str().map(|stem| stem.to_owned()))
}

/// Resolves an include target against the document that contains the directive.
/// Relative targets are relative to that document's directory. The result is normalized.
pub fn resolve_target(including: &str, target: &str) -> Fallible<String> {
    let path = if Path::new(target).is_absolute() {
        Path::new(target).to_path_buf()
    } else {
        let dir = dirname(including)
            .ok_or_else(|| format!("Unable to resolve include target {}", target))?;
        Path::new(&dir).join(target)
    };

    let path = path
        .to_str()
        .ok_or_else(|| format!("Include target is not valid UTF-8: {}", path.display()))?;

    Ok(normalize(path))
}

/// Normalizes a path, with forward slashes as separators
pub fn normalize(path: &str) -> String {
    path_clean::clean(&path.replace("\\", "/"))
}
