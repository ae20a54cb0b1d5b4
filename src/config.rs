//! Config objects, to be read from Indir.toml

use crate::util::Fallible;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use toml::from_str;

pub const DEFAULT_CONFIG: &str = "Indir.toml";
pub const DEFAULT_MAX_DEPTH: usize = 64;

pub const ATTRIBUTE_NAME_PATTERN: &str = r"[A-Za-z0-9_][A-Za-z0-9_-]*";

static ATTRIBUTE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{}$", ATTRIBUTE_NAME_PATTERN)).unwrap());

/// Attributes set by the preprocessor itself
const RESERVED_ATTRIBUTES: [&str; 3] = ["docfile", "docdir", "docname"];

/// Top-level config
#[derive(Deserialize, Default, Debug)]
pub struct Config {
    /// Config for paths
    #[serde(default)]
    pub paths: Paths,
    /// Include processing settings
    #[serde(default)]
    pub include: IncludeSettings,
    /// Initial document attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Fallible<Self> {
        let buf = read_to_string(path)?;
        buf.parse()
    }

    /// Check the validity of the configuration
    pub fn check(&self) -> Fallible {
        self.include.check()?;
        for name in self.attributes.keys() {
            check_attribute_name(name)?;
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = Box<dyn std::error::Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = from_str::<Self>(s)?;
        val.check()?;
        Ok(val)
    }
}

/// Config for paths
#[derive(Deserialize, Default, Debug, Clone)]
pub struct Paths {
    /// The root document(s) as glob pattern(s).
    pub files: Option<Vec<String>>,
    /// Output directory for expanded documents. Prints to STDOUT if not given.
    pub output: Option<PathBuf>,
}

/// Config for include processing
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct IncludeSettings {
    /// Maximum nesting depth of includes. Default: 64.
    pub max_depth: usize,
    /// Expand includes without maintaining the `indir` attribute. Default: false.
    pub plain: bool,
}

impl Default for IncludeSettings {
    fn default() -> Self {
        IncludeSettings {
            max_depth: DEFAULT_MAX_DEPTH,
            plain: false,
        }
    }
}

impl IncludeSettings {
    fn check(&self) -> Fallible {
        if self.max_depth == 0 {
            return Err("Include parameter 'max_depth' must be greater than 0".into());
        }
        Ok(())
    }
}

/// Checks that a user-supplied attribute name is valid and not reserved
pub fn check_attribute_name(name: &str) -> Fallible {
    if !ATTRIBUTE_NAME.is_match(name) {
        return Err(format!("Invalid attribute name '{}'", name).into());
    }
    if RESERVED_ATTRIBUTES.contains(&name) {
        return Err(format!("Attribute '{}' is set by the preprocessor", name).into());
    }
    Ok(())
}
