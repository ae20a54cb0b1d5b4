use std::error::Error;

pub mod path;

pub type Fallible<T = ()> = Result<T, Box<dyn Error>>;

pub const LF_NEWLINE: &str = "\n";
pub const CRLF_NEWLINE: &str = "\r\n";

/// Strips a trailing line terminator
pub fn strip_newline(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .unwrap_or(line)
}

/// Line terminator of a text, judged by its first line
pub fn detect_newline(text: &str) -> &'static str {
    if let Some(pos) = text.find('\n') {
        if text[..pos].ends_with('\r') {
            return CRLF_NEWLINE;
        }
    }

    LF_NEWLINE
}

/// Line terminator used by already split lines, judged by the first line.
/// Empty if the lines carry no terminators.
pub fn detect_line_terminator(lines: &[String]) -> &'static str {
    match lines.first() {
        None => LF_NEWLINE,
        Some(line) if line.ends_with(CRLF_NEWLINE) => CRLF_NEWLINE,
        Some(line) if line.ends_with(LF_NEWLINE) => LF_NEWLINE,
        Some(_) => "",
    }
}
