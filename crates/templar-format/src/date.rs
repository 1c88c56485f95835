/*
 * date.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Date, time and date-time formatting.
//!
//! A template date value carries an instant plus a subtype that records
//! whether it is a date-only, time-only or full date-time value. Pattern
//! formats use chrono's `%`-patterns; the `iso` and `xs` built-in families
//! share one rendering algorithm with two documented differences: the `xs`
//! flavor never omits the colon in timezone offsets, and it renders years
//! before year 1 off by one relative to strict ISO-8601:2000 (XML-Schema 1.0
//! has no year zero). Both quirks are preserved intentionally.

use std::fmt;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, FixedOffset, Timelike};

use crate::error::{FormatError, FormatResult};

/// The subtype of a date value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateKind {
    /// Calendar date without time of day.
    DateOnly,
    /// Time of day without a calendar date.
    TimeOnly,
    /// Full date and time.
    DateTime,
    /// Subtype not known; subtype-sensitive formats reject these.
    Unknown,
}

impl DateKind {
    /// Human-readable subtype name for error messages.
    pub fn name(self) -> &'static str {
        match self {
            DateKind::DateOnly => "date-only",
            DateKind::TimeOnly => "time-only",
            DateKind::DateTime => "date-time",
            DateKind::Unknown => "unknown-subtype",
        }
    }
}

/// An instant bound to a date subtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValue {
    /// The instant, with its originating UTC offset.
    pub instant: DateTime<FixedOffset>,
    /// Which parts of the instant are meaningful.
    pub kind: DateKind,
}

impl DateValue {
    pub fn new(instant: DateTime<FixedOffset>, kind: DateKind) -> Self {
        Self { instant, kind }
    }
}

/// A formatter from date values to text.
pub trait DateFormat: fmt::Debug + Send + Sync {
    /// Format a date value, rejecting values of an incompatible subtype.
    fn format(&mut self, value: &DateValue) -> FormatResult<String>;

    /// Parse text produced by this format, if supported.
    fn parse(&self, text: &str, kind: DateKind) -> Option<DateValue> {
        let _ = (text, kind);
        None
    }
}

/// A chrono `%`-pattern date format.
///
/// The pattern is validated eagerly at compile time; formatting itself can
/// no longer fail on the pattern.
#[derive(Debug, Clone)]
pub struct PatternDateFormat {
    pattern: String,
    tz: FixedOffset,
}

impl PatternDateFormat {
    pub fn compile(pattern: &str, tz: FixedOffset) -> FormatResult<PatternDateFormat> {
        let items: Vec<Item> = StrftimeItems::new(pattern).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(FormatError::MalformedParameter {
                param: pattern.to_string(),
            });
        }
        Ok(PatternDateFormat {
            pattern: pattern.to_string(),
            tz,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl DateFormat for PatternDateFormat {
    fn format(&mut self, value: &DateValue) -> FormatResult<String> {
        let local = value.instant.with_timezone(&self.tz);
        Ok(local.format(&self.pattern).to_string())
    }
}

/// The shared `iso`/`xs` family.
///
/// `forced_kind` pins the format to one subtype (`iso time` etc.); such a
/// format rejects values of any other subtype instead of producing a
/// misleading partial string.
#[derive(Debug, Clone)]
pub struct IsoLikeDateFormat {
    name: String,
    xs_flavor: bool,
    forced_kind: Option<DateKind>,
    tz: FixedOffset,
}

impl IsoLikeDateFormat {
    pub fn new(
        name: impl Into<String>,
        xs_flavor: bool,
        forced_kind: Option<DateKind>,
        tz: FixedOffset,
    ) -> Self {
        Self {
            name: name.into(),
            xs_flavor,
            forced_kind,
            tz,
        }
    }

    fn effective_kind(&self, value: &DateValue) -> FormatResult<DateKind> {
        match (self.forced_kind, value.kind) {
            (Some(forced), kind) if kind != forced && kind != DateKind::Unknown => {
                Err(FormatError::WrongDateKind {
                    format: self.name.clone(),
                    kind,
                })
            }
            (Some(forced), _) => Ok(forced),
            (None, DateKind::Unknown) => Err(FormatError::WrongDateKind {
                format: self.name.clone(),
                kind: DateKind::Unknown,
            }),
            (None, kind) => Ok(kind),
        }
    }

    fn write_year(&self, out: &mut String, year: i32) {
        // XML-Schema 1.0 has no year zero: astronomical year 0 is "-1",
        // -1 is "-2", and so on. Documented incompatibility, kept as-is.
        let year = if self.xs_flavor && year <= 0 {
            year - 1
        } else {
            year
        };
        if year < 0 {
            out.push('-');
        }
        out.push_str(&format!("{:04}", year.abs()));
    }

    fn write_offset(&self, out: &mut String, offset_seconds: i32) {
        if offset_seconds == 0 {
            out.push('Z');
            return;
        }
        let sign = if offset_seconds < 0 { '-' } else { '+' };
        let abs = offset_seconds.abs();
        let (hours, minutes) = (abs / 3600, (abs % 3600) / 60);
        out.push(sign);
        if self.xs_flavor {
            // xs never omits the offset colon
            out.push_str(&format!("{hours:02}:{minutes:02}"));
        } else {
            out.push_str(&format!("{hours:02}{minutes:02}"));
        }
    }
}

impl DateFormat for IsoLikeDateFormat {
    fn format(&mut self, value: &DateValue) -> FormatResult<String> {
        let kind = self.effective_kind(value)?;
        let local = value.instant.with_timezone(&self.tz);
        let offset = local.offset().local_minus_utc();
        let mut out = String::new();

        if kind == DateKind::DateOnly || kind == DateKind::DateTime {
            self.write_year(&mut out, local.year());
            out.push_str(&format!("-{:02}-{:02}", local.month(), local.day()));
        }
        if kind == DateKind::DateTime {
            out.push('T');
        }
        if kind == DateKind::TimeOnly || kind == DateKind::DateTime {
            out.push_str(&format!(
                "{:02}:{:02}:{:02}",
                local.hour(),
                local.minute(),
                local.second()
            ));
        }
        // The xs flavor attaches the offset to dates too; iso keeps
        // date-only strings zone-less.
        if kind != DateKind::DateOnly || self.xs_flavor {
            self.write_offset(&mut out, offset);
        }
        Ok(out)
    }

    fn parse(&self, text: &str, kind: DateKind) -> Option<DateValue> {
        match kind {
            DateKind::DateTime => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|instant| DateValue::new(instant, kind)),
            DateKind::DateOnly => {
                let date = chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
                let instant = date
                    .and_hms_opt(0, 0, 0)?
                    .and_local_timezone(self.tz)
                    .single()?;
                Some(DateValue::new(instant, kind))
            }
            _ => None,
        }
    }
}

/// UTC as a fixed offset; the default formatting zone.
pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).expect("zero offset is always valid")
}
