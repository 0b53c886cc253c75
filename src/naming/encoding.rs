// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Validation and encoding of external identifiers.

use std::fmt::Write;

/// Returns true if the given string can be used as an external identifier
/// without changes.
///
/// A valid identifier is not empty, starts with an ASCII letter or `_`, and
/// continues with ASCII letters, digits, `_`, `-` or `.`.
pub(crate) fn is_valid_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Encodes a string into a valid external identifier.
///
/// The result starts with `_`, and every UTF-8 byte outside `[A-Za-z0-9_-]`
/// is written as `.HH`.  Because `.` itself is escaped, two different inputs
/// never give the same output.
pub(crate) fn encode_id(id: &str) -> String {
    let mut encoded = String::with_capacity(id.len() + 1);
    encoded.push('_');
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(byte as char);
        } else {
            // Writing to a String can't fail.
            let _ = write!(encoded, ".{byte:02X}");
        }
    }
    encoded
}
