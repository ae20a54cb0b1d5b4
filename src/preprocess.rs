//! A minimal host for include processors.
//!
//! Expands `include::` directives depth-first, applies attribute entries and single-line
//! `ifdef`/`ifndef` conditionals, and replaces attribute references. Everything else is
//! passed through verbatim.

use std::path::Path;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use indir_lib::{
    split_lines, Document, IncludeFrame, IncludeProcessor, LineRange, ReaderState, Selector,
};

use crate::config::{ATTRIBUTE_NAME_PATTERN, DEFAULT_MAX_DEPTH};
use crate::util::path::{dirname, normalize, resolve_target, stem};
use crate::util::{detect_newline, strip_newline, Fallible, LF_NEWLINE};
use crate::{CircularIncludeError, IncludeDepthError};

static ATTRIBUTE_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^:(!)?({})(!)?:(?:[ \t]+(.*))?$",
        ATTRIBUTE_NAME_PATTERN
    ))
    .unwrap()
});
static ATTRIBUTE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(\\)?\{{({})\}}", ATTRIBUTE_NAME_PATTERN)).unwrap());
static CONDITIONAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(ifn?def)::({})\[(.+)\]$", ATTRIBUTE_NAME_PATTERN)).unwrap()
});
static INCLUDE_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\\)?include::([^\[\s][^\[]*)\[(.*)\]$").unwrap());

/// Expands the includes of root documents
pub struct Preprocessor {
    document: Document,
    processor: Box<dyn IncludeProcessor>,
    reader: ReaderState,
    max_depth: usize,
    newline: &'static str,
}

impl Preprocessor {
    pub fn new(processor: Box<dyn IncludeProcessor>) -> Self {
        Preprocessor {
            document: Document::new(),
            processor,
            reader: ReaderState::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            newline: LF_NEWLINE,
        }
    }

    /// Sets the maximum nesting depth of includes
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets initial document attributes
    pub fn with_attributes<I, N, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        for (name, value) in attributes {
            self.document.set_attribute(name, value);
        }
        self
    }

    /// The document, with the attributes as left by the last processed file
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Line terminator of the last processed root document
    pub fn newline(&self) -> &'static str {
        self.newline
    }

    /// Reads and expands a root document
    pub fn process_file(&mut self, path: &Path) -> Fallible<Vec<String>> {
        let source = crate::files::read_file_string(path)?;
        self.process_str(path, &source)
    }

    /// Expands a root document with the given content, returning the lines without terminators
    pub fn process_str(&mut self, path: &Path, source: &str) -> Fallible<Vec<String>> {
        let docfile = path
            .to_str()
            .ok_or_else(|| format!("Path is not valid UTF-8: {}", path.display()))?
            .to_owned();

        self.document.set_attribute("docfile", docfile.as_str());
        if let Some(docdir) = dirname(&docfile) {
            self.document.set_attribute("docdir", docdir);
        }
        if let Some(docname) = stem(&docfile) {
            self.document.set_attribute("docname", docname);
        }
        self.reader.include_stack.clear();
        self.newline = detect_newline(source);

        debug!("Processing {}", docfile);

        let mut output = vec![];
        self.expand(split_lines(source), &docfile, &mut output)?;
        Ok(output)
    }

    fn expand(&mut self, lines: Vec<String>, file: &str, output: &mut Vec<String>) -> Fallible {
        for (index, line) in lines.iter().enumerate() {
            self.process_line(strip_newline(line), index + 1, file, output)?;
        }
        Ok(())
    }

    fn process_line(
        &mut self,
        line: &str,
        lineno: usize,
        file: &str,
        output: &mut Vec<String>,
    ) -> Fallible {
        if let Some(caps) = CONDITIONAL.captures(line) {
            let defined = self.document.has_attribute(&caps[2]);
            if defined == (&caps[1] == "ifdef") {
                return self.process_line(&caps[3], lineno, file, output);
            }
            return Ok(());
        }

        if let Some(caps) = ATTRIBUTE_ENTRY.captures(line) {
            self.apply_attribute_entry(&caps);
            output.push(line.to_owned());
            return Ok(());
        }

        if let Some(caps) = INCLUDE_DIRECTIVE.captures(line) {
            if caps.get(1).is_some() {
                output.push(line[1..].to_owned());
                return Ok(());
            }
            let target = self.substitute(caps[2].trim_end());
            let selector = parse_selector(&caps[3]).map_err(|err| {
                format!("{} (line {} of {})", err, lineno, file)
            })?;
            return self.include(&target, &selector, line, lineno, file, output);
        }

        output.push(self.substitute(line));
        Ok(())
    }

    fn include(
        &mut self,
        target: &str,
        selector: &Selector,
        directive: &str,
        lineno: usize,
        file: &str,
        output: &mut Vec<String>,
    ) -> Fallible {
        let path = resolve_target(file, target)?;

        if !self.processor.handles(&path) {
            warn!("No include processor for {}, keeping the directive", path);
            output.push(directive.to_owned());
            return Ok(());
        }

        if self.reader.depth() >= self.max_depth {
            return Err(IncludeDepthError {
                target: path,
                max_depth: self.max_depth,
            }
            .into());
        }

        let is_root = self
            .document
            .docfile()
            .map_or(false, |docfile| normalize(docfile) == path);
        if is_root || self.reader.include_stack.iter().any(|frame| frame.path == path) {
            return Err(CircularIncludeError {
                target: path,
                root: self.document.docfile().unwrap_or_default().to_owned(),
            }
            .into());
        }

        self.reader
            .include_stack
            .push(IncludeFrame::new(path.as_str(), lineno));
        self.processor
            .begin_inclusion(&self.document, &self.reader, &path);

        let result = match self.processor.get_included_lines(&path, selector) {
            Ok(lines) => self.expand(lines, &path, output),
            Err(err) => Err(err.into()),
        };

        self.reader.include_stack.pop();
        result
    }

    fn apply_attribute_entry(&mut self, caps: &Captures) {
        let name = &caps[2];
        if caps.get(1).is_some() || caps.get(3).is_some() {
            self.document.remove_attribute(name);
        } else {
            let value = caps
                .get(4)
                .map(|value| self.substitute(value.as_str().trim_end()))
                .unwrap_or_default();
            debug!("Setting attribute {} = {}", name, value);
            self.document.set_attribute(name, value);
        }
    }

    /// Replaces references to defined attributes. Undefined and escaped references are kept.
    fn substitute(&self, text: &str) -> String {
        ATTRIBUTE_REFERENCE
            .replace_all(text, |caps: &Captures| {
                let reference = &caps[0];
                if caps.get(1).is_some() {
                    return reference[1..].to_owned();
                }
                self.document
                    .attribute(&caps[2])
                    .map(|value| value.to_owned())
                    .unwrap_or_else(|| reference.to_owned())
            })
            .into_owned()
    }
}

/// Parses the `lines` and `tag`/`tags` entries of an include's attribute list
fn parse_selector(attrlist: &str) -> Fallible<Selector> {
    let mut selector = Selector::default();
    for (name, value) in split_attrlist(attrlist) {
        match name.as_str() {
            "lines" => selector.lines.extend(LineRange::parse_list(&value)?),
            "tag" | "tags" => selector.tags.extend(
                value
                    .split(|c| c == ';' || c == ',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(|tag| tag.to_owned()),
            ),
            _ => {}
        }
    }
    Ok(selector)
}

/// Splits an attribute list into named entries. Commas inside double quotes don't separate.
fn split_attrlist(attrlist: &str) -> Vec<(String, String)> {
    let mut entries = vec![];
    let mut current = String::new();
    let mut quoted = false;

    for c in attrlist.chars().chain(std::iter::once(',')) {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                if let Some((name, value)) = current.split_once('=') {
                    entries.push((name.trim().to_owned(), value.trim().to_owned()));
                }
                current.clear();
            }
            c => current.push(c),
        }
    }
    entries
}
