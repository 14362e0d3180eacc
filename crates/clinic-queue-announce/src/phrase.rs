//! Spoken form of queue numbers.

use thiserror::Error;

/// Announcement errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnnounceError {
    #[error("Queue number has no digits to announce: {0:?}")]
    NoDigits(String),

    #[error("No announcement locales configured")]
    NoLocales,
}

pub type AnnounceResult<T> = Result<T, AnnounceError>;

/// Word spoken in place of the digit `0`.
pub const ZERO_WORD: &str = "zero";

/// Spell a queue number one digit at a time.
///
/// `"007"` becomes `"zero zero 7"`. Characters other than ASCII digits are
/// dropped.
pub fn spell_queue_number(queue_number: &str) -> AnnounceResult<String> {
    let words: Vec<String> = queue_number
        .chars()
        .filter(|c| c.is_ascii_digit())
        .map(|digit| match digit {
            '0' => ZERO_WORD.to_string(),
            other => other.to_string(),
        })
        .collect();

    if words.is_empty() {
        return Err(AnnounceError::NoDigits(queue_number.to_string()));
    }

    Ok(words.join(" "))
}
