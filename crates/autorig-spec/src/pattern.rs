//! Wildcard name patterns (`*_Pelvis_jnt`, `root_?trl`).
//!
//! Used at the scene boundary only: pre-existing node detection, stale
//! controller cleanup and rediscovery of a rig built by an earlier run.

use std::fmt;

use regex::Regex;

use crate::error::SpecError;

/// A compiled wildcard pattern. `*` matches any run of characters, `?` a
/// single character; everything else matches literally.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    /// Compiles a wildcard pattern.
    pub fn new(pattern: &str) -> Result<Self, SpecError> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
            }
        }
        expr.push('$');
        let regex = Regex::new(&expr).map_err(|e| SpecError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Returns true if `name` matches the whole pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Returns the original wildcard text.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
