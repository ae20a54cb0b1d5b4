//! Selection of parts of an include target
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Restricts which lines of an include target are read
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    /// Line ranges to include. Takes precedence over tags.
    pub lines: Vec<LineRange>,
    /// Tagged regions to include
    pub tags: Vec<String>,
}

impl Selector {
    /// Whether the selector selects the entire target
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.tags.is_empty()
    }
}

/// An inclusive range of 1-based line numbers, optionally open ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    /// First line
    pub start: usize,
    /// Last line, `None` for the end of the file
    pub end: Option<usize>,
}

impl LineRange {
    /// Whether the range contains the given line number
    pub fn contains(&self, lineno: usize) -> bool {
        lineno >= self.start && self.end.map_or(true, |end| lineno <= end)
    }

    /// Parses a list of ranges separated by `;` or `,`, like `1..3;7;10..`
    pub fn parse_list(list: &str) -> Result<Vec<LineRange>, String> {
        list.split(|c| c == ';' || c == ',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for LineRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |num: &str| {
            num.trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("Invalid line number '{}' in range '{}'", num, s))
        };

        match s.split_once("..") {
            None => {
                let line = parse(s)?;
                Ok(LineRange {
                    start: line,
                    end: Some(line),
                })
            }
            Some((start, end)) => {
                let start = parse(start)?;
                let end = match end.trim() {
                    "" | "-1" => None,
                    end => Some(parse(end)?),
                };
                if let Some(end) = end {
                    if end < start {
                        return Err(format!("Empty line range '{}'", s));
                    }
                }
                Ok(LineRange { start, end })
            }
        }
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) if end == self.start => write!(f, "{}", self.start),
            Some(end) => write!(f, "{}..{}", self.start, end),
            None => write!(f, "{}..", self.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ranges() {
        let ranges = LineRange::parse_list("1..3;7; 10..").unwrap();
        assert_eq!(
            ranges,
            vec![
                LineRange {
                    start: 1,
                    end: Some(3)
                },
                LineRange {
                    start: 7,
                    end: Some(7)
                },
                LineRange {
                    start: 10,
                    end: None
                },
            ]
        );
        assert_eq!(
            "4..-1".parse::<LineRange>().unwrap(),
            LineRange {
                start: 4,
                end: None
            }
        );
    }

    #[test]
    fn parse_invalid_ranges() {
        assert!("0".parse::<LineRange>().is_err());
        assert!("5..2".parse::<LineRange>().is_err());
        assert!("a..b".parse::<LineRange>().is_err());
    }

    #[test]
    fn contains() {
        let range: LineRange = "2..4".parse().unwrap();
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));

        let open: LineRange = "3..".parse().unwrap();
        assert!(open.contains(1000));
        assert_eq!(open.to_string(), "3..");
    }
}
