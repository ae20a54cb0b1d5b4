//! Include processors.
//!
//! [`IndirIncludeProcessor`] maintains the attribute `indir`, which always points at the
//! directory of the document whose content is currently processed. In contrast to `docfile`,
//! which stays the same throughout an entire document, `indir` follows included documents.
//! A subdocument can then reference its images relative to itself:
//!
//! ```text
//! ifndef::indir[:indir: .]
//! image::{indir}/images/example.svg[]
//! ```
//!
//! The subdocument still compiles standalone, where `indir` falls back to `.`.
//!
//! The processor claims every include. It can't be combined with other include processors
//! on the same host.

use log::{debug, warn};

use indir_lib::{
    Document, IncludeContent, IncludeError, IncludeProcessor, RawIncludeReader, ReaderState,
    Selector,
};

use crate::util::detect_line_terminator;
use crate::util::path::dirname;

/// Name of the directory context attribute
pub const INDIR_ATTRIBUTE: &str = "indir";

/// Context of the inclusion currently being processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRequest {
    /// The resolved include target
    pub target: String,
    /// The root document's `docfile` attribute
    pub docfile: Option<String>,
    /// The host's reader state, with the target's frame on top
    pub reader: ReaderState,
}

impl IncludeRequest {
    pub fn new(document: &Document, reader: &ReaderState, target: &str) -> Self {
        IncludeRequest {
            target: target.to_owned(),
            docfile: document.docfile().map(|docfile| docfile.to_owned()),
            reader: reader.clone(),
        }
    }

    /// Directory of the included document
    pub fn included_dir(&self) -> Result<String, IncludeError> {
        dirname(&self.target).ok_or_else(|| self.resolution_error())
    }

    /// Directory to restore once the included content ends: the including document's
    /// directory if that one is itself included, otherwise the root document's directory.
    pub fn restore_dir(&self) -> Result<String, IncludeError> {
        let parent = match self.reader.parent_frame() {
            Some(frame) => Some(frame.path.as_str()),
            None => self.docfile.as_deref(),
        };
        parent
            .and_then(dirname)
            .ok_or_else(|| self.resolution_error())
    }

    fn resolution_error(&self) -> IncludeError {
        IncludeError::DirectoryResolution {
            target: self.target.clone(),
        }
    }
}

/// Include processor that sets `indir` to the included document's directory on entry,
/// and restores it to the including document's directory on exit.
///
/// Holds a single request slot, filled by `begin_inclusion` and consumed by the following
/// `get_included_lines`. Inclusions must be processed depth-first, one pair at a time.
pub struct IndirIncludeProcessor {
    reader: Box<dyn RawIncludeReader>,
    request: Option<IncludeRequest>,
}

impl IndirIncludeProcessor {
    pub fn new(reader: Box<dyn RawIncludeReader>) -> Self {
        IndirIncludeProcessor {
            reader,
            request: None,
        }
    }

    /// The request recorded by `begin_inclusion`, until `get_included_lines` consumes it
    pub fn request(&self) -> Option<&IncludeRequest> {
        self.request.as_ref()
    }
}

impl IncludeProcessor for IndirIncludeProcessor {
    fn begin_inclusion(&mut self, document: &Document, reader: &ReaderState, target: &str) {
        debug!("Begin inclusion of {} (depth {})", target, reader.depth());
        self.request = Some(IncludeRequest::new(document, reader, target));
    }

    fn get_included_lines(
        &mut self,
        target: &str,
        selector: &Selector,
    ) -> Result<Vec<String>, IncludeError> {
        let request = self
            .request
            .take()
            .ok_or_else(|| IncludeError::NoActiveRequest {
                target: target.to_owned(),
            })?;

        if request.target != target {
            warn!(
                "Include target {} differs from recorded target {}, using the recorded one",
                target, request.target
            );
        }

        let content = self
            .reader
            .read_lines(target, selector)
            .map_err(|source| IncludeError::ResourceRead {
                target: target.to_owned(),
                source,
            })?;
        let is_text = matches!(content, IncludeContent::Text(_));
        let mut lines = content.into_lines();

        let included_dir = request.included_dir()?;
        let restore_dir = request.restore_dir()?;

        let newline = detect_line_terminator(&lines);
        if is_text {
            // an unterminated last line would swallow the following empty line
            if let Some(last) = lines.last_mut() {
                if !newline.is_empty() && !last.ends_with('\n') {
                    last.push_str(newline);
                }
            }
        }

        debug!(
            "Including {}: {} = {}, restoring {}",
            request.target, INDIR_ATTRIBUTE, included_dir, restore_dir
        );

        let mut result = Vec::with_capacity(lines.len() + 4);
        result.push(newline.to_owned());
        result.push(attribute_entry(INDIR_ATTRIBUTE, &included_dir, newline));
        result.append(&mut lines);
        result.push(newline.to_owned());
        result.push(attribute_entry(INDIR_ATTRIBUTE, &restore_dir, newline));

        Ok(result)
    }
}

/// Include processor that returns the raw lines, without directory context
pub struct PlainIncludeProcessor {
    reader: Box<dyn RawIncludeReader>,
}

impl PlainIncludeProcessor {
    pub fn new(reader: Box<dyn RawIncludeReader>) -> Self {
        PlainIncludeProcessor { reader }
    }
}

impl IncludeProcessor for PlainIncludeProcessor {
    fn begin_inclusion(&mut self, _document: &Document, reader: &ReaderState, target: &str) {
        debug!("Begin inclusion of {} (depth {})", target, reader.depth());
    }

    fn get_included_lines(
        &mut self,
        target: &str,
        selector: &Selector,
    ) -> Result<Vec<String>, IncludeError> {
        self.reader
            .read_lines(target, selector)
            .map(|content| content.into_lines())
            .map_err(|source| IncludeError::ResourceRead {
                target: target.to_owned(),
                source,
            })
    }
}

fn attribute_entry(name: &str, value: &str, newline: &str) -> String {
    format!(":{}: {}{}", name, value, newline)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::error::Error;
    use std::rc::Rc;

    use indir_lib::IncludeFrame;

    use super::*;

    fn lines_reader(lines: &'static [&'static str]) -> Box<dyn RawIncludeReader> {
        Box::new(
            move |_: &str, _: &Selector| -> Result<IncludeContent, Box<dyn Error>> {
                Ok(IncludeContent::Lines(
                    lines.iter().map(|line| line.to_string()).collect(),
                ))
            },
        )
    }

    fn text_reader(text: &'static str) -> Box<dyn RawIncludeReader> {
        Box::new(
            move |_: &str, _: &Selector| -> Result<IncludeContent, Box<dyn Error>> {
                Ok(IncludeContent::Text(text.to_owned()))
            },
        )
    }

    fn failing_reader() -> Box<dyn RawIncludeReader> {
        Box::new(
            |target: &str, _: &Selector| -> Result<IncludeContent, Box<dyn Error>> {
                Err(format!("No such file or directory: {}", target).into())
            },
        )
    }

    fn stack(paths: &[&str]) -> ReaderState {
        ReaderState {
            include_stack: paths
                .iter()
                .enumerate()
                .map(|(index, path)| IncludeFrame::new(*path, index + 1))
                .collect(),
        }
    }

    fn include(
        processor: &mut IndirIncludeProcessor,
        document: &Document,
        reader: &ReaderState,
        target: &str,
    ) -> Result<Vec<String>, IncludeError> {
        processor.begin_inclusion(document, reader, target);
        processor.get_included_lines(target, &Selector::default())
    }

    #[test]
    fn outermost_inclusion() {
        let mut processor = IndirIncludeProcessor::new(lines_reader(&["line1\n"]));
        let document = Document::with_docfile("main.adoc");

        let lines = include(
            &mut processor,
            &document,
            &stack(&["sub/sub1.adoc"]),
            "sub/sub1.adoc",
        )
        .unwrap();

        assert_eq!(
            lines,
            vec!["\n", ":indir: sub\n", "line1\n", "\n", ":indir: .\n"]
        );
    }

    #[test]
    fn nested_inclusion_restores_parent_dir() {
        let mut processor = IndirIncludeProcessor::new(lines_reader(&["child\n"]));
        let document = Document::with_docfile("main.adoc");
        let reader = stack(&["parent/parent.adoc", "parent/sub/child.adoc"]);

        let lines = include(&mut processor, &document, &reader, "parent/sub/child.adoc").unwrap();

        assert_eq!(lines[1], ":indir: parent/sub\n");
        assert_eq!(lines[lines.len() - 2], "\n");
        assert_eq!(lines[lines.len() - 1], ":indir: parent\n");
    }

    #[test]
    fn round_trip_follows_stack() {
        let mut processor = IndirIncludeProcessor::new(lines_reader(&["text\n"]));
        let document = Document::with_docfile("a/a.adoc");

        let b = include(&mut processor, &document, &stack(&["a/b/b.adoc"]), "a/b/b.adoc").unwrap();
        let c = include(
            &mut processor,
            &document,
            &stack(&["a/b/b.adoc", "a/b/c/c.adoc"]),
            "a/b/c/c.adoc",
        )
        .unwrap();

        assert_eq!(c[1], ":indir: a/b/c\n");
        assert_eq!(c.last().unwrap(), ":indir: a/b\n");
        assert_eq!(b[1], ":indir: a/b\n");
        assert_eq!(b.last().unwrap(), ":indir: a\n");
    }

    #[test]
    fn split_lines_are_kept() {
        let mut processor =
            IndirIncludeProcessor::new(lines_reader(&["a\nb\n", "c\n", "", "d\n"]));
        let document = Document::with_docfile("main.adoc");

        let lines = include(&mut processor, &document, &stack(&["x.adoc"]), "x.adoc").unwrap();

        assert_eq!(lines.len(), 4 + 4);
        assert_eq!(&lines[2..6], &["a\nb\n", "c\n", "", "d\n"]);
    }

    #[test]
    fn text_is_split() {
        let mut processor = IndirIncludeProcessor::new(text_reader("one\r\ntwo\r\nthree"));
        let document = Document::with_docfile("main.adoc");

        let lines = include(&mut processor, &document, &stack(&["d/x.adoc"]), "d/x.adoc").unwrap();

        assert_eq!(
            lines,
            vec![
                "\r\n",
                ":indir: d\r\n",
                "one\r\n",
                "two\r\n",
                "three\r\n",
                "\r\n",
                ":indir: .\r\n"
            ]
        );
    }

    #[test]
    fn unterminated_lines() {
        let mut processor = IndirIncludeProcessor::new(lines_reader(&["a", "b"]));
        let document = Document::with_docfile("main.adoc");

        let lines = include(&mut processor, &document, &stack(&["x.adoc"]), "x.adoc").unwrap();

        assert_eq!(lines, vec!["", ":indir: .", "a", "b", "", ":indir: ."]);
    }

    #[test]
    fn empty_content() {
        let mut processor = IndirIncludeProcessor::new(text_reader(""));
        let document = Document::with_docfile("main.adoc");

        let lines = include(&mut processor, &document, &stack(&["s/x.adoc"]), "s/x.adoc").unwrap();

        assert_eq!(lines, vec!["\n", ":indir: s\n", "\n", ":indir: .\n"]);
    }

    #[test]
    fn read_failure_is_propagated() {
        let mut processor = IndirIncludeProcessor::new(failing_reader());
        let document = Document::with_docfile("main.adoc");

        let err = include(&mut processor, &document, &stack(&["nope.adoc"]), "nope.adoc")
            .unwrap_err();

        match &err {
            IncludeError::ResourceRead { target, source } => {
                assert_eq!(target, "nope.adoc");
                assert_eq!(source.to_string(), "No such file or directory: nope.adoc");
            }
            other => panic!("Unexpected error: {:?}", other),
        }
        assert_eq!(err.to_string(), "No such file or directory: nope.adoc");
    }

    #[test]
    fn missing_docfile_is_an_error() {
        let mut processor = IndirIncludeProcessor::new(lines_reader(&["a\n"]));

        let err = include(
            &mut processor,
            &Document::new(),
            &stack(&["sub/a.adoc"]),
            "sub/a.adoc",
        )
        .unwrap_err();

        assert!(matches!(err, IncludeError::DirectoryResolution { .. }));
    }

    #[test]
    fn parent_frame_without_docfile() {
        let mut processor = IndirIncludeProcessor::new(lines_reader(&["a\n"]));

        let lines = include(
            &mut processor,
            &Document::new(),
            &stack(&["p/p.adoc", "p/q/a.adoc"]),
            "p/q/a.adoc",
        )
        .unwrap();

        assert_eq!(lines.last().unwrap(), ":indir: p\n");
    }

    #[test]
    fn lines_require_begin() {
        let mut processor = IndirIncludeProcessor::new(lines_reader(&["a\n"]));
        let err = processor
            .get_included_lines("a.adoc", &Selector::default())
            .unwrap_err();
        assert!(matches!(err, IncludeError::NoActiveRequest { .. }));
    }

    #[test]
    fn recorded_target_is_authoritative() {
        let mut processor = IndirIncludeProcessor::new(lines_reader(&["a\n"]));
        let document = Document::with_docfile("main.adoc");

        processor.begin_inclusion(&document, &stack(&["rec/a.adoc"]), "rec/a.adoc");
        let lines = processor
            .get_included_lines("other/a.adoc", &Selector::default())
            .unwrap();

        assert_eq!(lines[1], ":indir: rec\n");
    }

    #[test]
    fn request_is_overwritten() {
        let mut processor = IndirIncludeProcessor::new(lines_reader(&["a\n"]));
        let document = Document::with_docfile("main.adoc");

        processor.begin_inclusion(&document, &stack(&["a/a.adoc"]), "a/a.adoc");
        processor.begin_inclusion(&document, &stack(&["b/b.adoc"]), "b/b.adoc");

        assert_eq!(processor.request().unwrap().target, "b/b.adoc");
    }

    #[test]
    fn request_is_consumed() {
        let mut processor = IndirIncludeProcessor::new(lines_reader(&["a\n"]));
        let document = Document::with_docfile("main.adoc");

        include(&mut processor, &document, &stack(&["a/a.adoc"]), "a/a.adoc").unwrap();
        assert!(processor.request().is_none());

        let err = processor
            .get_included_lines("b/b.adoc", &Selector::default())
            .unwrap_err();
        match err {
            IncludeError::NoActiveRequest { target } => assert_eq!(target, "b/b.adoc"),
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn selector_is_passed_through() {
        let seen = Rc::new(Cell::new(false));
        let seen_by_reader = Rc::clone(&seen);
        let reader = move |_: &str, selector: &Selector| -> Result<IncludeContent, Box<dyn Error>> {
            seen_by_reader.set(selector.tags == vec!["intro".to_owned()]);
            Ok(IncludeContent::Lines(vec![]))
        };
        let mut processor = IndirIncludeProcessor::new(Box::new(reader));
        let document = Document::with_docfile("main.adoc");
        let selector = Selector {
            lines: vec![],
            tags: vec!["intro".to_owned()],
        };

        processor.begin_inclusion(&document, &stack(&["a.adoc"]), "a.adoc");
        processor.get_included_lines("a.adoc", &selector).unwrap();

        assert!(seen.get());
    }

    #[test]
    fn plain_processor() {
        let mut processor = PlainIncludeProcessor::new(text_reader("a\nb\n"));
        processor.begin_inclusion(&Document::new(), &stack(&["x.adoc"]), "x.adoc");
        let lines = processor
            .get_included_lines("x.adoc", &Selector::default())
            .unwrap();
        assert_eq!(lines, vec!["a\n", "b\n"]);
        assert!(processor.handles("anything"));
    }
}
