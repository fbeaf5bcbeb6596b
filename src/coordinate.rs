//! Coordinate-literal decoding.
//!
//! Grounded in `GERBER::ReadXYCoord` / `ReadIJCoord` (`rs274d.cpp`): a
//! coordinate literal is a run of digits (optionally signed) whose decimal
//! point position is not written in the file but implied by the active
//! `FS` format statement, with either the leading or the trailing zeros of
//! the fixed-width field omitted from the literal.

use crate::command::Unit;

/// One unit is 1/10000 inch, matching the original reader's internal
/// coordinate representation.
pub const UNIT_SCALE_INCH: f64 = 10_000.0;
pub const UNIT_SCALE_MM: f64 = 10_000.0 / 25.4;

/// Internal-units-per-native-unit factor for a unit system, used to scale
/// any file-native length (an aperture macro parameter, an image offset)
/// into the same internal units coordinates are decoded into.
pub fn scale_for(unit: Unit) -> f64 {
    match unit {
        Unit::Inches => UNIT_SCALE_INCH,
        Unit::Millimeters => UNIT_SCALE_MM,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// The coordinate format established by `%FS...*%`.
#[derive(Debug, Clone, Copy)]
pub struct Format {
    pub x_integer_digits: u8,
    pub x_decimal_digits: u8,
    pub y_integer_digits: u8,
    pub y_decimal_digits: u8,
    /// `true` for the `L` (omit leading zeros) flag, `false` for `T`.
    pub omit_leading_zeros: bool,
    /// `true` for the `A` (absolute) flag, `false` for `I` (incremental).
    pub absolute: bool,
}

impl Default for Format {
    fn default() -> Self {
        // Ucamco's de-facto default when no FS has been seen yet.
        Format {
            x_integer_digits: 2,
            x_decimal_digits: 4,
            y_integer_digits: 2,
            y_decimal_digits: 4,
            omit_leading_zeros: true,
            absolute: true,
        }
    }
}

impl Format {
    fn digits(&self, axis: Axis) -> (u8, u8) {
        match axis {
            Axis::X => (self.x_integer_digits, self.x_decimal_digits),
            Axis::Y => (self.y_integer_digits, self.y_decimal_digits),
        }
    }
}

/// Decodes one signed digit-run coordinate literal (as captured by the
/// grammar's `signed_int` rule, e.g. `"-600000"`) into internal units
/// (1 unit = 1/10000 inch) under the given format and unit system.
pub fn decode(raw: &str, format: &Format, axis: Axis, unit: Unit) -> i64 {
    let negative = raw.starts_with('-');
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let (integer_digits, decimal_digits) = format.digits(axis);
    let total = (integer_digits as usize) + (decimal_digits as usize);

    let padded = if digits.len() >= total {
        digits
    } else if format.omit_leading_zeros {
        format!("{:0>width$}", digits, width = total)
    } else {
        format!("{:0<width$}", digits, width = total)
    };

    // `padded` is the fixed-point mantissa with `decimal_digits` implied
    // fractional digits in the active unit system.
    let mantissa: i64 = padded.parse().unwrap_or(0);
    let native_scale = 10f64.powi(decimal_digits as i32);
    let unit_scale = match unit {
        Unit::Inches => UNIT_SCALE_INCH,
        Unit::Millimeters => UNIT_SCALE_MM,
    };

    let value = (mantissa as f64 / native_scale * unit_scale).round() as i64;
    if negative {
        -value
    } else {
        value
    }
}
