//! Skill code parsing.

use std::fmt;

/// A skill code split into its prefix and suffix.
///
/// `A.12` has prefix `A` and number 12; `R.new` has prefix `R` and no
/// number; a code without a dot is all prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillCode {
    prefix: String,
    suffix: Option<String>,
}

impl SkillCode {
    pub fn parse(code: &str) -> Self {
        let code = code.trim();
        match code.split_once('.') {
            Some((prefix, suffix)) => Self {
                prefix: prefix.trim().to_string(),
                suffix: Some(suffix.trim().to_string()).filter(|s| !s.is_empty()),
            },
            None => Self {
                prefix: code.to_string(),
                suffix: None,
            },
        }
    }

    /// Category letter(s) or plan section code.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Numeric suffix; `None` for "new" and other non-numeric codes.
    pub fn number(&self) -> Option<u32> {
        self.suffix.as_deref().and_then(|s| s.parse().ok())
    }
}

impl fmt::Display for SkillCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suffix {
            Some(suffix) => write!(f, "{}.{}", self.prefix, suffix),
            None => f.write_str(&self.prefix),
        }
    }
}
