//! Parsing helpers for item lines and `Key: value` metadata lines.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use eb_core::EntityKind;
use tracing::warn;

use crate::error::CodecError;

/// Date format used throughout the text format.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
/// Time format used throughout the text format.
pub(crate) const TIME_FORMAT: &str = "%H:%M";

/// Splits an item's leading `N. text` line and checks its ordinal.
///
/// A section header where an item was expected means the section declared
/// more items than it holds.
pub(crate) fn item_text(
    line: usize,
    text: &str,
    kind: EntityKind,
    nth: usize,
    declared: usize,
) -> Result<String, CodecError> {
    if text.starts_with('[') {
        return Err(CodecError::sequence(
            line,
            format!(
                "{} section declared {declared} items but only {} were present",
                kind.section_name(),
                nth - 1
            ),
        ));
    }

    let (ordinal, rest) = text
        .split_once(". ")
        .ok_or_else(|| CodecError::format(line, format!("expected '{nth}. ...', found '{text}'")))?;
    let ordinal: usize = ordinal.trim().parse().map_err(|_| {
        CodecError::format(line, format!("item ordinal '{ordinal}' is not a number"))
    })?;
    if ordinal != nth {
        return Err(CodecError::sequence(
            line,
            format!(
                "{} item {nth} is numbered {ordinal}",
                kind.section_name()
            ),
        ));
    }
    Ok(rest.trim().to_owned())
}

/// Returns `true` if a line looks like an item's leading line.
pub(crate) fn is_item_line(text: &str) -> bool {
    text.split_once(". ")
        .is_some_and(|(ordinal, _)| !ordinal.is_empty() && ordinal.bytes().all(|b| b.is_ascii_digit()))
}

/// Strips a required `prefix` from a line.
pub(crate) fn strip_key<'a>(line: usize, text: &'a str, prefix: &str) -> Result<&'a str, CodecError> {
    text.strip_prefix(prefix)
        .map(str::trim)
        .ok_or_else(|| CodecError::format(line, format!("expected '{prefix}', found '{text}'")))
}

/// Strips the surrounding double quotes from a description line.
pub(crate) fn unquote(line: usize, text: &str) -> Result<String, CodecError> {
    text.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map(str::to_owned)
        .ok_or_else(|| CodecError::format(line, format!("expected a quoted description, found '{text}'")))
}

/// The `Key: value` pairs of one metadata line.
///
/// Pairs are separated by `, `. A segment that does not start with one of
/// the expected keys continues the previous value, so values may contain
/// `, ` themselves.
#[derive(Debug)]
pub(crate) struct Fields {
    line: usize,
    pairs: Vec<(&'static str, String)>,
}

impl Fields {
    /// Parses a metadata line against the keys it may contain.
    pub(crate) fn parse(line: usize, text: &str, keys: &[&'static str]) -> Result<Self, CodecError> {
        let mut pairs: Vec<(&'static str, String)> = Vec::with_capacity(keys.len());

        for segment in text.split(", ") {
            let known = segment.split_once(':').and_then(|(key, value)| {
                keys.iter()
                    .find(|&&k| k == key.trim())
                    .map(|&k| (k, value.trim()))
            });

            if let Some((key, value)) = known {
                pairs.push((key, value.to_owned()));
                continue;
            }

            let Some((previous, value)) = pairs.last_mut() else {
                return Err(CodecError::format(
                    line,
                    format!("expected one of {keys:?} at the start of '{text}'"),
                ));
            };
            if let Some((key, _)) = segment.split_once(": ") {
                warn!(line, key, field = *previous, "Unknown metadata key, kept as part of the previous value");
            }
            value.push_str(", ");
            value.push_str(segment);
        }

        Ok(Self { line, pairs })
    }

    /// Returns a value if its key was present.
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a value, failing if its key was absent.
    pub(crate) fn require(&self, key: &str) -> Result<&str, CodecError> {
        self.get(key)
            .ok_or_else(|| CodecError::format(self.line, format!("missing field '{key}'")))
    }

    /// Parses a required value.
    pub(crate) fn parse_value<T: FromStr>(&self, key: &str) -> Result<T, CodecError> {
        let value = self.require(key)?;
        value
            .parse()
            .map_err(|_| CodecError::format(self.line, format!("invalid {key} '{value}'")))
    }

    /// Parses a required `true`/`false` value.
    pub(crate) fn flag(&self, key: &str) -> Result<bool, CodecError> {
        let value = self.require(key)?;
        parse_bool(value)
            .ok_or_else(|| CodecError::format(self.line, format!("invalid {key} '{value}', expected true or false")))
    }

    /// Parses a required `YYYY-MM-DD` value.
    pub(crate) fn date(&self, key: &str) -> Result<NaiveDate, CodecError> {
        parse_date(self.line, self.require(key)?)
    }

    /// Parses a required `HH:MM` value.
    pub(crate) fn time(&self, key: &str) -> Result<NaiveTime, CodecError> {
        parse_time(self.line, self.require(key)?)
    }

    /// Parses a required `YYYY-MM-DD HH:MM` value.
    pub(crate) fn date_time(&self, key: &str) -> Result<NaiveDateTime, CodecError> {
        let value = self.require(key)?;
        NaiveDateTime::parse_from_str(value, &format!("{DATE_FORMAT} {TIME_FORMAT}"))
            .map_err(|_| CodecError::format(self.line, format!("invalid {key} '{value}'")))
    }

    /// Parses an optional single-character value.
    pub(crate) fn single_char(&self, key: &str) -> Result<Option<char>, CodecError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Some(ch)),
            _ => Err(CodecError::format(
                self.line,
                format!("{key} must be a single character, found '{value}'"),
            )),
        }
    }
}

pub(crate) fn parse_date(line: usize, value: &str) -> Result<NaiveDate, CodecError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| CodecError::format(line, format!("invalid date '{value}', expected YYYY-MM-DD")))
}

pub(crate) fn parse_time(line: usize, value: &str) -> Result<NaiveTime, CodecError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| CodecError::format(line, format!("invalid time '{value}', expected HH:MM")))
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
