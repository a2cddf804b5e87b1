// LogRetrieval - core/filter.rs
//
// Line filter applied during the backward scan.
// Both grammars are case-insensitive; which one a deployment uses is a
// configuration choice (`[logs] filter_mode`), never inferred per request.
// Core layer: pure logic, no I/O.

use crate::util::constants::MAX_FILTER_PATTERN_LENGTH;
use crate::util::error::FilterError;
use regex::{Regex, RegexBuilder};
use std::fmt;

/// How a client-supplied `filter` string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Plain case-insensitive substring containment.
    #[default]
    Substring,
    /// Case-insensitive regular expression search (`regex` crate syntax).
    Regex,
}

impl FilterMode {
    /// Parse a mode name as written in config.toml or on the CLI.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "substring" => Some(Self::Substring),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring => f.write_str("substring"),
            Self::Regex => f.write_str("regex"),
        }
    }
}

/// A compiled line filter.
#[derive(Debug, Clone)]
pub enum LineFilter {
    /// Lower-cased needle compared against lower-cased lines.
    Substring(String),
    /// Case-insensitive compiled pattern.
    Regex(Regex),
}

impl LineFilter {
    /// Compile `pattern` under the given mode.
    ///
    /// Returns `Ok(None)` for an empty pattern: an empty filter means "no
    /// filter", matching what clients get when they omit the parameter.
    pub fn compile(pattern: &str, mode: FilterMode) -> Result<Option<Self>, FilterError> {
        if pattern.is_empty() {
            return Ok(None);
        }
        match mode {
            FilterMode::Substring => Ok(Some(Self::Substring(pattern.to_lowercase()))),
            FilterMode::Regex => {
                if pattern.len() > MAX_FILTER_PATTERN_LENGTH {
                    return Err(FilterError::PatternTooLong {
                        length: pattern.len(),
                        max_length: MAX_FILTER_PATTERN_LENGTH,
                    });
                }
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| FilterError::InvalidRegex {
                        pattern: pattern.to_string(),
                        source: e,
                    })?;
                Ok(Some(Self::Regex(regex)))
            }
        }
    }

    /// Returns true if `line` passes the filter.
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Self::Substring(needle) => line.to_lowercase().contains(needle.as_str()),
            Self::Regex(regex) => regex.is_match(line),
        }
    }
}
