/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Locale-sensitive number and date formatting for template output.
//!
//! Formatters are built by factories from a format parameter string, a
//! locale and (for dates) a time zone and subtype. Factories cache the
//! compiled, immutable prototypes and hand out fresh clones, so individual
//! formatter instances may be stateful. Applications extend the parameter
//! language with `@name` custom formats, including pure aliases that
//! resolve per locale.

pub mod date;
pub mod error;
pub mod factory;
pub mod locale;
pub mod number;

pub use date::{DateFormat, DateKind, DateValue, IsoLikeDateFormat, PatternDateFormat, utc};
pub use error::{FormatError, FormatResult};
pub use factory::{
    AliasNumberFormatFactory, CustomDateFormatFactory, CustomNumberFormatFactory,
    DateFormatFactory, NumberFormatFactory,
};
pub use locale::Locale;
pub use number::{DecimalFormat, FallbackNumberFormat, NumberFormat};
