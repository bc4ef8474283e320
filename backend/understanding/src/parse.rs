//! Parsing of the recognition answer grammar: `INTEGER "," WHITESPACE* NAME`.

use shelfcount_core::{Observation, ParseError};

/// Parse an answer such as `"2, Banana"` into an observation.
///
/// Splits on the first comma only, so names may themselves contain commas.
/// The name is kept exactly as written after trimming.
pub fn parse_answer(text: &str) -> Result<Observation, ParseError> {
    let Some((count, name)) = text.split_once(',') else {
        return Err(ParseError::new(text, "expected \"<count>, <name>\""));
    };

    // Digits only: `u32::from_str` would also take a leading `+`.
    let count = count.trim();
    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(text, format!("{count:?} is not a non-negative integer")));
    }
    let count: u32 = count
        .parse()
        .map_err(|_| ParseError::new(text, format!("count {count} exceeds {}", u32::MAX)))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ParseError::new(text, "object name is empty"));
    }

    Ok(Observation::new(count, name))
}
