//! Wire framing for the measurement protocol.
//!
//! The device reports `Z<setpoint>A<actual>` (e.g. `Z25.0A24.7`) once per
//! sample and accepts `Z<value>` to change the setpoint. Both directions are
//! single text lines; the transport owns the terminator.

use thiserror::Error;

use crate::acquire::data::Measurement;

/// Marker that opens every frame and prefixes the setpoint field.
pub const FRAME_MARKER: char = 'Z';

/// Marker that separates the setpoint field from the actual-value field.
pub const FIELD_MARKER: char = 'A';

/// Why an inbound line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The `Z…A…` structure is absent
    #[error("missing frame marker")]
    MissingMarker,
    /// A field is not a plain decimal number
    #[error("not a number: {0:?}")]
    NotANumber(String),
}

/// Decode one inbound line into a timestamped measurement.
///
/// The line must start with `Z`; the text up to the first `A` is the setpoint
/// and the remainder is the actual value. Either both fields parse or the
/// whole line is rejected.
pub fn parse_line(line: &str) -> Result<Measurement, ParseError> {
    let body = line
        .strip_prefix(FRAME_MARKER)
        .ok_or(ParseError::MissingMarker)?;
    let (setpoint_text, actual_text) = body
        .split_once(FIELD_MARKER)
        .ok_or(ParseError::MissingMarker)?;

    let setpoint = parse_decimal(setpoint_text)?;
    let actual = parse_decimal(actual_text)?;
    Ok(Measurement::now(setpoint, actual))
}

/// Build the outbound payload for a setpoint change. The caller validates the
/// value first; the transport appends the line terminator.
pub fn encode_setpoint(value: &str) -> String {
    format!("{FRAME_MARKER}{value}")
}

/// Strict decimal check shared by inbound fields and outbound commands:
/// ASCII digits with at most one `.` and at least one digit. Signs, exponent
/// notation and non-finite spellings are rejected.
pub fn is_valid_decimal(text: &str) -> bool {
    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in text.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

fn parse_decimal(text: &str) -> Result<f64, ParseError> {
    if !is_valid_decimal(text) {
        return Err(ParseError::NotANumber(text.to_string()));
    }
    text.parse()
        .map_err(|_| ParseError::NotANumber(text.to_string()))
}
