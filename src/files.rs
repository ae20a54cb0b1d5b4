//! File access, and the default raw reader for include targets.

use std::collections::HashSet;
use std::error::Error;
use std::fs;
use std::path::Path;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use indir_lib::{IncludeContent, LineRange, RawIncludeReader, Selector};

use crate::util::Fallible;

static TAG_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(tag|end)::(\S+?)\[\]").unwrap());

/// Reads a file to a string, with the path in the error message
pub fn read_file_string(path: &Path) -> Fallible<String> {
    fs::read_to_string(path)
        .map_err(|err| format!("Unable to read file \"{}\": {}", path.display(), err).into())
}

/// Reads include targets from the file system
#[derive(Debug, Default, Clone, Copy)]
pub struct FileReader;

impl FileReader {
    pub fn new() -> Self {
        FileReader
    }
}

impl RawIncludeReader for FileReader {
    fn read_lines(
        &self,
        target: &str,
        selector: &Selector,
    ) -> Result<IncludeContent, Box<dyn Error>> {
        let text = read_file_string(Path::new(target))?;

        Ok(if !selector.lines.is_empty() {
            IncludeContent::Lines(select_lines(&text, &selector.lines))
        } else if !selector.tags.is_empty() {
            IncludeContent::Lines(select_tags(&text, &selector.tags, target))
        } else {
            IncludeContent::Text(text)
        })
    }
}

/// Lines contained in any of the ranges, in file order
fn select_lines(text: &str, ranges: &[LineRange]) -> Vec<String> {
    text.split_inclusive('\n')
        .enumerate()
        .filter(|(index, _)| ranges.iter().any(|range| range.contains(index + 1)))
        .map(|(_, line)| line.to_owned())
        .collect()
}

/// Lines inside the tagged regions, without the tag marker lines
fn select_tags(text: &str, tags: &[String], target: &str) -> Vec<String> {
    let mut open: Vec<&str> = vec![];
    let mut found = HashSet::new();
    let mut lines = vec![];

    for line in text.split_inclusive('\n') {
        if let Some(caps) = TAG_DIRECTIVE.captures(line) {
            let name = caps.get(2).unwrap().as_str();
            if tags.iter().any(|tag| tag == name) {
                if &caps[1] == "tag" {
                    found.insert(name);
                    open.push(name);
                } else if let Some(pos) = open.iter().rposition(|tag| *tag == name) {
                    open.remove(pos);
                }
            }
            continue;
        }
        if !open.is_empty() {
            lines.push(line.to_owned());
        }
    }

    for tag in tags {
        if !found.contains(tag.as_str()) {
            warn!("Tag '{}' not found in include file {}", tag, target);
        }
    }
    if let Some(tag) = open.last() {
        warn!("Unclosed tag '{}' in include file {}", tag, target);
    }

    lines
}
