// Pcheckers — Table source reading
//
// Tables are Latin-1 text. Each byte maps to exactly one char, so decoding
// never fails and the byte-level newline rule can be checked on chars.

use std::path::Path;

use super::FormatError;

/// Read a table file fully and decode it as Latin-1.
pub fn read_latin1(path: &Path) -> Result<String, FormatError> {
    let bytes = std::fs::read(path).map_err(|e| FormatError::Unreadable {
        origin: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(decode_latin1(&bytes))
}

pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// The text must hold at least two chars and end with a single `\n`
/// preceded by a non-blank char. `\r\n` endings and blank tails are rejected.
pub fn check_trailing_newline(text: &str) -> Result<(), FormatError> {
    let mut tail = text.chars().rev();
    let (last, before) = match (tail.next(), tail.next()) {
        (Some(last), Some(before)) => (last, before),
        _ => return Err(FormatError::TooShort),
    };
    if last == '\n' && before > ' ' {
        Ok(())
    } else {
        Err(FormatError::BadTrailingNewline)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
