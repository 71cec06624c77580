//! Folder naming: a literal prefix followed by a strftime timestamp, paired
//! with the regex that recognises names produced by earlier runs.
//!
//! The date format and the pattern travel together in [`FolderNaming`]. A
//! pattern is either derived from the format or checked against a rendered
//! sample when the value is built, so the two cannot drift apart silently.

use std::fmt::Write as _;

use chrono::format::{Item, Numeric, Pad, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::NamingError;

/// `YYYYMMDD_hhmmss`; lexicographic order equals chronological order.
pub const DEFAULT_DATE_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Matches names rendered with [`DEFAULT_DATE_FORMAT`].
pub const DEFAULT_PATTERN: &str = "[0-9]{8}_[0-9]{6}";

/// Prefix, date format and matching pattern for rotated folders.
#[derive(Debug, Clone)]
pub struct FolderNaming {
    prefix: String,
    date_format: String,
    pattern: String,
    matcher: Regex,
}

impl FolderNaming {
    /// Pair `date_format` with a pattern derived from its specifiers.
    ///
    /// Only zero-padded numeric fields (`%Y %y %m %d %H %M %S` and the
    /// composites built from them) can be derived; anything else needs
    /// [`FolderNaming::with_pattern`].
    pub fn new(
        prefix: impl Into<String>,
        date_format: impl Into<String>,
    ) -> Result<Self, NamingError> {
        let date_format = date_format.into();
        let pattern = derive_pattern(&date_format)?;
        Self::with_pattern(prefix, date_format, pattern)
    }

    /// Use an explicit pattern. It must match a name rendered with
    /// `date_format`, otherwise [`NamingError::PatternMismatch`].
    pub fn with_pattern(
        prefix: impl Into<String>,
        date_format: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Result<Self, NamingError> {
        let prefix = prefix.into();
        let date_format = date_format.into();
        let pattern = pattern.into();

        check_date_format(&date_format)?;
        let matcher = compile_matcher(&prefix, &pattern)?;
        let naming = Self {
            prefix,
            date_format,
            pattern,
            matcher,
        };

        let sample = naming.folder_name(&sample_timestamp())?;
        if !naming.is_candidate(&sample) {
            return Err(NamingError::PatternMismatch {
                pattern: naming.pattern,
                format: naming.date_format,
                sample,
            });
        }
        Ok(naming)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Full regex applied to folder names (`^escaped-prefix(?:pattern)`).
    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    /// True if `name` begins with the prefix followed by the pattern.
    pub fn is_candidate(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    /// Render `{prefix}{timestamp}` for `now`.
    pub fn folder_name(&self, now: &NaiveDateTime) -> Result<String, NamingError> {
        let mut name = self.prefix.clone();
        write!(name, "{}", now.format(&self.date_format))
            .map_err(|_| NamingError::InvalidDateFormat(self.date_format.clone()))?;
        Ok(name)
    }
}

impl Default for FolderNaming {
    fn default() -> Self {
        Self::with_pattern("", DEFAULT_DATE_FORMAT, DEFAULT_PATTERN)
            .expect("default folder naming is self-consistent")
    }
}

/// Translate a strftime format into a regex for the names it produces.
///
/// Adjacent numeric fields collapse into one run, so the default format
/// derives exactly [`DEFAULT_PATTERN`].
pub fn derive_pattern(date_format: &str) -> Result<String, NamingError> {
    check_date_format(date_format)?;
    let mut pattern = String::new();
    let mut digits = 0usize;
    for item in StrftimeItems::new(date_format) {
        match item {
            Item::Literal(text) | Item::Space(text) => {
                flush_digits(&mut pattern, &mut digits);
                pattern.push_str(&regex::escape(text));
            }
            Item::Numeric(Numeric::Year, Pad::Zero) => digits += 4,
            Item::Numeric(
                Numeric::YearMod100
                | Numeric::Month
                | Numeric::Day
                | Numeric::Hour
                | Numeric::Minute
                | Numeric::Second,
                Pad::Zero,
            ) => digits += 2,
            other => {
                return Err(NamingError::UnsupportedSpecifier {
                    format: date_format.to_string(),
                    specifier: format!("{other:?}"),
                });
            }
        }
    }
    flush_digits(&mut pattern, &mut digits);
    Ok(pattern)
}

fn flush_digits(pattern: &mut String, digits: &mut usize) {
    if *digits > 0 {
        pattern.push_str(&format!("[0-9]{{{digits}}}"));
        *digits = 0;
    }
}

fn check_date_format(date_format: &str) -> Result<(), NamingError> {
    if date_format.is_empty()
        || StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error))
    {
        return Err(NamingError::InvalidDateFormat(date_format.to_string()));
    }
    Ok(())
}

fn compile_matcher(prefix: &str, pattern: &str) -> Result<Regex, NamingError> {
    let full = format!("^{}(?:{})", regex::escape(prefix), pattern);
    Regex::new(&full).map_err(|source| NamingError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn sample_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 58))
        .unwrap_or_default()
}
