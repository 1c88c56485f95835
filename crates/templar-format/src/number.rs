/*
 * number.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Decimal-pattern number formatting.
//!
//! The pattern mini-language is a subset of the classic decimal pattern
//! syntax: `#` optional digit, `0` forced digit, `.` decimal point, `,`
//! grouping, `%` percent, `E00`/`E+00` scientific exponent, `;` separating a
//! negative subpattern, and `'`-quoted literal sections. Locale supplies the
//! decimal and grouping separator characters.

use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use templar_arith::Number;

use crate::error::{FormatError, FormatResult};
use crate::locale::Locale;

/// A formatter from numbers to text (and back, when round-trippable).
///
/// Formatter instances handed out by the factory are exclusive to the
/// caller; implementations may keep per-instance state.
pub trait NumberFormat: fmt::Debug + Send + Sync {
    /// Format a number.
    fn format(&mut self, value: &Number) -> FormatResult<String>;

    /// Parse text produced by this format back into a number, if the format
    /// is round-trippable.
    fn parse(&self, text: &str) -> Option<Number> {
        let _ = text;
        None
    }
}

/// Exponent section of a scientific pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExponentSpec {
    /// Minimum exponent digits, zero-padded.
    min_digits: usize,
    /// Whether a `+` is written for non-negative exponents.
    always_sign: bool,
}

/// A compiled decimal pattern bound to a locale.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimalFormat {
    pattern: String,
    locale: Locale,
    min_int_digits: usize,
    min_frac_digits: usize,
    max_frac_digits: usize,
    grouping: Option<usize>,
    percent: bool,
    exponent: Option<ExponentSpec>,
    positive_prefix: String,
    positive_suffix: String,
    negative_prefix: String,
    negative_suffix: String,
}

impl DecimalFormat {
    /// Compile a pattern for a locale. Validation is eager; the exact
    /// offending pattern is echoed in the error.
    pub fn compile(pattern: &str, locale: &Locale) -> FormatResult<DecimalFormat> {
        let (positive, negative) = match pattern.split_once(';') {
            Some((p, n)) => (p, Some(n)),
            None => (pattern, None),
        };
        let parsed = Subpattern::parse(positive)?;
        // Only the affixes of the negative subpattern matter; its digit
        // section is required to mirror the positive one.
        let (negative_prefix, negative_suffix) = match negative {
            Some(n) => {
                let neg = Subpattern::parse(n)?;
                (neg.prefix, neg.suffix)
            }
            None => (format!("-{}", parsed.prefix), parsed.suffix.clone()),
        };
        Ok(DecimalFormat {
            pattern: pattern.to_string(),
            locale: locale.clone(),
            min_int_digits: parsed.min_int_digits.max(1),
            min_frac_digits: parsed.min_frac_digits,
            max_frac_digits: parsed.max_frac_digits,
            grouping: parsed.grouping,
            percent: parsed.percent,
            exponent: parsed.exponent,
            positive_prefix: parsed.prefix,
            positive_suffix: parsed.suffix,
            negative_prefix,
            negative_suffix,
        })
    }

    /// The source pattern this format was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn format_decimal(&self, value: &BigDecimal) -> String {
        let negative = value.sign() == num_bigint::Sign::Minus;
        let magnitude = value.abs();
        let body = match &self.exponent {
            Some(exp) => self.scientific_body(&magnitude, exp),
            None => self.plain_body(&magnitude),
        };
        if negative && !is_zero_body(&body, self.locale.decimal_separator()) {
            format!("{}{body}{}", self.negative_prefix, self.negative_suffix)
        } else {
            format!("{}{body}{}", self.positive_prefix, self.positive_suffix)
        }
    }

    fn plain_body(&self, magnitude: &BigDecimal) -> String {
        let rounded =
            magnitude.with_scale_round(self.max_frac_digits as i64, RoundingMode::HalfEven);
        let (digits, scale) = rounded.as_bigint_and_exponent();
        let digit_str = digits.magnitude().to_string();
        let scale = usize::try_from(scale.max(0)).unwrap_or(0);
        let digit_str = if digit_str.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digit_str.len()), digit_str)
        } else {
            digit_str
        };
        let split = digit_str.len() - scale;
        let (int_part, frac_part) = digit_str.split_at(split);
        let mut int_part = int_part.to_string();
        if int_part.len() < self.min_int_digits {
            int_part = format!("{}{int_part}", "0".repeat(self.min_int_digits - int_part.len()));
        }
        let mut frac_part = frac_part.trim_end_matches('0').to_string();
        while frac_part.len() < self.min_frac_digits {
            frac_part.push('0');
        }
        let int_part = self.grouped(&int_part);
        if frac_part.is_empty() {
            int_part
        } else {
            format!("{int_part}{}{frac_part}", self.locale.decimal_separator())
        }
    }

    fn scientific_body(&self, magnitude: &BigDecimal, exp_spec: &ExponentSpec) -> String {
        use num_traits::Zero;
        let (mut mantissa, mut exponent) = if magnitude.is_zero() {
            (BigDecimal::from(0), 0i64)
        } else {
            let (digits, scale) = magnitude.normalized().as_bigint_and_exponent();
            let digit_count = digits.magnitude().to_string().len() as i64;
            // d.ddd * 10^exp with exactly one integer digit
            let mantissa = BigDecimal::new(digits, digit_count - 1);
            (mantissa, digit_count - 1 - scale)
        };
        mantissa = mantissa.with_scale_round(self.max_frac_digits as i64, RoundingMode::HalfEven);
        // Rounding can carry into a second integer digit (9.99 -> 10.0)
        if mantissa >= BigDecimal::from(10) {
            mantissa = (mantissa / BigDecimal::from(10))
                .with_scale_round(self.max_frac_digits as i64, RoundingMode::HalfEven);
            exponent += 1;
        }
        let mantissa_text = {
            let saved = DecimalFormat {
                exponent: None,
                grouping: None,
                ..self.clone()
            };
            saved.plain_body(&mantissa.abs())
        };
        let sign = if exponent < 0 {
            "-"
        } else if exp_spec.always_sign {
            "+"
        } else {
            ""
        };
        let exp_digits = exponent.unsigned_abs().to_string();
        let padded = if exp_digits.len() < exp_spec.min_digits {
            format!("{}{exp_digits}", "0".repeat(exp_spec.min_digits - exp_digits.len()))
        } else {
            exp_digits
        };
        format!("{mantissa_text}E{sign}{padded}")
    }

    fn grouped(&self, int_part: &str) -> String {
        let Some(size) = self.grouping else {
            return int_part.to_string();
        };
        let sep = self.locale.grouping_separator();
        let bytes = int_part.as_bytes();
        let mut out = String::with_capacity(int_part.len() + int_part.len() / size);
        for (i, b) in bytes.iter().enumerate() {
            if i > 0 && (bytes.len() - i) % size == 0 {
                out.push(sep);
            }
            out.push(*b as char);
        }
        out
    }
}

fn is_zero_body(body: &str, decimal_sep: char) -> bool {
    body.chars().all(|c| c == '0' || c == decimal_sep)
}

impl NumberFormat for DecimalFormat {
    fn format(&mut self, value: &Number) -> FormatResult<String> {
        // Non-finite floats have no decimal expansion; render the canonical
        // literals instead.
        match value.non_finite_text() {
            Some(text) => Ok(text.to_string()),
            None => {
                let mut decimal = value
                    .to_decimal()
                    .map_err(|e| FormatError::Unformattable {
                        format: self.pattern.clone(),
                        reason: e.to_string(),
                    })?;
                if self.percent {
                    decimal = decimal * BigDecimal::from(100);
                }
                Ok(self.format_decimal(&decimal))
            }
        }
    }

    fn parse(&self, text: &str) -> Option<Number> {
        let stripped = text
            .strip_prefix(self.positive_prefix.as_str())
            .and_then(|t| t.strip_suffix(self.positive_suffix.as_str()))
            .map(|t| (t, false))
            .or_else(|| {
                text.strip_prefix(self.negative_prefix.as_str())
                    .and_then(|t| t.strip_suffix(self.negative_suffix.as_str()))
                    .map(|t| (t, true))
            });
        let (body, negative) = stripped?;
        let normalized: String = body
            .chars()
            .filter(|c| *c != self.locale.grouping_separator())
            .map(|c| {
                if c == self.locale.decimal_separator() {
                    '.'
                } else {
                    c
                }
            })
            .collect();
        let mut value = BigDecimal::from_str(&normalized).ok()?;
        if self.percent {
            value = value / BigDecimal::from(100);
        }
        if negative {
            value = -value;
        }
        Some(Number::Decimal(value))
    }
}

/// Extension for extracting the canonical non-finite literals.
trait NonFiniteText {
    fn non_finite_text(&self) -> Option<&'static str>;
}

impl NonFiniteText for Number {
    fn non_finite_text(&self) -> Option<&'static str> {
        let d = match self {
            Number::Float(f) => f64::from(*f),
            Number::Double(d) => *d,
            _ => return None,
        };
        if d.is_nan() {
            Some("NaN")
        } else if d == f64::INFINITY {
            Some("INF")
        } else if d == f64::NEG_INFINITY {
            Some("-INF")
        } else {
            None
        }
    }
}

/// Tries a primary format, falling back to a second one when the primary
/// can't express the value.
#[derive(Debug)]
pub struct FallbackNumberFormat {
    primary: Box<dyn NumberFormat>,
    fallback: Box<dyn NumberFormat>,
}

impl FallbackNumberFormat {
    pub fn new(primary: Box<dyn NumberFormat>, fallback: Box<dyn NumberFormat>) -> Self {
        Self { primary, fallback }
    }
}

impl NumberFormat for FallbackNumberFormat {
    fn format(&mut self, value: &Number) -> FormatResult<String> {
        match self.primary.format(value) {
            Ok(text) => Ok(text),
            Err(_) => self.fallback.format(value),
        }
    }

    fn parse(&self, text: &str) -> Option<Number> {
        self.primary
            .parse(text)
            .or_else(|| self.fallback.parse(text))
    }
}

/// One subpattern (positive or negative half) of a decimal pattern.
struct Subpattern {
    prefix: String,
    suffix: String,
    min_int_digits: usize,
    min_frac_digits: usize,
    max_frac_digits: usize,
    grouping: Option<usize>,
    percent: bool,
    exponent: Option<ExponentSpec>,
}

impl Subpattern {
    fn parse(text: &str) -> FormatResult<Subpattern> {
        let malformed = || FormatError::MalformedParameter {
            param: text.to_string(),
        };

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut percent = false;
        let mut min_int = 0usize;
        let mut int_digits = 0usize;
        let mut min_frac = 0usize;
        let mut max_frac = 0usize;
        let mut grouping: Option<usize> = None;
        let mut since_group = 0usize;
        let mut exponent: Option<ExponentSpec> = None;

        #[derive(PartialEq)]
        enum Section {
            Prefix,
            Integer,
            Fraction,
            Exponent,
            Suffix,
        }
        let mut section = Section::Prefix;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\'' => {
                    // Quoted literal; '' is a literal quote.
                    let target = if section == Section::Prefix {
                        &mut prefix
                    } else {
                        section = Section::Suffix;
                        &mut suffix
                    };
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        target.push('\'');
                        continue;
                    }
                    loop {
                        match chars.next() {
                            Some('\'') => break,
                            Some(l) => target.push(l),
                            None => return Err(malformed()),
                        }
                    }
                }
                '#' | '0' => match section {
                    Section::Prefix => {
                        section = Section::Integer;
                        int_digits = 1;
                        min_int = usize::from(c == '0');
                        since_group = 1;
                    }
                    Section::Integer => {
                        int_digits += 1;
                        since_group += 1;
                        if c == '0' {
                            min_int += 1;
                        } else if min_int > 0 {
                            // '#' after '0' in the integer part
                            return Err(malformed());
                        }
                    }
                    Section::Fraction => {
                        max_frac += 1;
                        if c == '0' {
                            if min_frac < max_frac - 1 {
                                // '0' after '#' in the fraction part
                                return Err(malformed());
                            }
                            min_frac += 1;
                        }
                    }
                    Section::Exponent => {
                        if c == '#' {
                            return Err(malformed());
                        }
                        match &mut exponent {
                            Some(spec) => spec.min_digits += 1,
                            None => return Err(malformed()),
                        }
                    }
                    Section::Suffix => return Err(malformed()),
                },
                ',' => {
                    if section != Section::Integer {
                        return Err(malformed());
                    }
                    since_group = 0;
                }
                '.' => {
                    if section != Section::Integer {
                        return Err(malformed());
                    }
                    if since_group > 0 && since_group < int_digits {
                        grouping = Some(since_group);
                    }
                    section = Section::Fraction;
                }
                'E' if section == Section::Integer || section == Section::Fraction => {
                    if since_group > 0 && since_group < int_digits && section == Section::Integer {
                        grouping = Some(since_group);
                    }
                    let always_sign = chars.peek() == Some(&'+');
                    if always_sign {
                        chars.next();
                    }
                    exponent = Some(ExponentSpec {
                        min_digits: 0,
                        always_sign,
                    });
                    section = Section::Exponent;
                }
                '%' => {
                    percent = true;
                    match section {
                        Section::Prefix => prefix.push('%'),
                        _ => {
                            section = Section::Suffix;
                            suffix.push('%');
                        }
                    }
                }
                other => match section {
                    Section::Prefix => prefix.push(other),
                    _ => {
                        section = Section::Suffix;
                        suffix.push(other);
                    }
                },
            }
        }

        // A grouping separator that never saw the decimal point still counts
        // when the integer section runs to the end of the pattern.
        if grouping.is_none() && since_group > 0 && since_group < int_digits {
            grouping = Some(since_group);
        }
        if int_digits == 0 {
            return Err(malformed());
        }
        if let Some(spec) = &exponent {
            if spec.min_digits == 0 {
                return Err(malformed());
            }
        }

        Ok(Subpattern {
            prefix,
            suffix,
            min_int_digits: min_int,
            min_frac_digits: min_frac,
            max_frac_digits: max_frac,
            grouping,
            percent,
            exponent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fmt(pattern: &str) -> DecimalFormat {
        DecimalFormat::compile(pattern, &Locale::default()).unwrap()
    }

    fn render(pattern: &str, value: Number) -> String {
        fmt(pattern).format(&value).unwrap()
    }

    #[test]
    fn test_basic_patterns() {
        assert_eq!(render("0", Number::Int(5)), "5");
        assert_eq!(render("00", Number::Int(5)), "05");
        assert_eq!(render("0.00", Number::Double(1.5)), "1.50");
        assert_eq!(render("0.##", Number::Double(1.5)), "1.5");
        assert_eq!(render("0.##", Number::Int(2)), "2");
        assert_eq!(render("#.##", Number::Double(0.25)), "0.25");
    }

    #[test]
    fn test_rounding_half_even() {
        assert_eq!(render("0.0", Number::Double(0.25)), "0.2");
        let exact = Number::Decimal("0.35".parse().unwrap());
        assert_eq!(render("0.0", exact), "0.4");
    }

    #[test]
    fn test_grouping() {
        assert_eq!(render("#,##0", Number::Int(1234567)), "1,234,567");
        assert_eq!(render("#,##0.0", Number::Double(1234.5)), "1,234.5");
    }

    #[test]
    fn test_locale_separators() {
        let mut de = DecimalFormat::compile("#,##0.00", &Locale::parse("de_DE")).unwrap();
        assert_eq!(de.format(&Number::Double(1234.5)).unwrap(), "1.234,50");
    }

    #[test]
    fn test_percent() {
        assert_eq!(render("0%", Number::Double(0.42)), "42%");
    }

    #[test]
    fn test_negative_subpattern() {
        assert_eq!(render("0.0;(0.0)", Number::Double(-1.5)), "(1.5)");
        assert_eq!(render("0.0", Number::Double(-1.5)), "-1.5");
        // Values rounding to zero lose the sign.
        assert_eq!(render("0.0", Number::Double(-0.01)), "0.0");
    }

    #[test]
    fn test_prefix_suffix_literals() {
        assert_eq!(render("'@'0", Number::Int(7)), "@7");
        assert_eq!(render("$0.00", Number::Double(2.5)), "$2.50");
    }

    #[test]
    fn test_scientific() {
        assert_eq!(render("0.00E+00", Number::Int(1234567)), "1.23E+06");
        assert_eq!(render("0.00E00", Number::Double(0.00123)), "1.23E-03");
        assert_eq!(render("0.0E+00", Number::Double(9.99e4)), "1.0E+05");
        assert_eq!(render("0.00E+00", Number::Int(0)), "0.00E+00");
    }

    #[test]
    fn test_scientific_round_trip() {
        let format = fmt("0.00E+00");
        let parsed = format.parse("1.23E+06").unwrap();
        assert_eq!(
            templar_arith::compare(&parsed, &Number::Int(1_230_000)),
            std::cmp::Ordering::Equal
        );
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(render("0.0", Number::Double(f64::INFINITY)), "INF");
        assert_eq!(render("0.0", Number::Double(f64::NEG_INFINITY)), "-INF");
        assert_eq!(render("0.0", Number::Double(f64::NAN)), "NaN");
    }

    #[test]
    fn test_malformed_patterns() {
        for bad in ["", "0.0.0", "0E", "0#", "0.#0", "'unterminated"] {
            let err = DecimalFormat::compile(bad, &Locale::default()).unwrap_err();
            assert!(
                matches!(err, FormatError::MalformedParameter { ref param } if param.contains(bad) || bad.is_empty()),
                "{bad:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn test_fallback_format() {
        let primary = Box::new(fmt("0.00E+00"));
        let fallback = Box::new(fmt("0.##"));
        let mut format = FallbackNumberFormat::new(primary, fallback);
        // Both succeed here; the primary wins.
        assert_eq!(format.format(&Number::Int(1234567)).unwrap(), "1.23E+06");
    }
}
