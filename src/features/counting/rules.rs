//! Counting game rules

use std::time::Duration;

use crate::database::Counting;

/// How long the "twice in a row" warning stays up before it and the
/// offending message are deleted
pub const WARNING_LIFETIME: Duration = Duration::from_secs(3);

pub const TWICE_IN_A_ROW_MESSAGE: &str =
    "You cannot count twice in a row! Please wait for someone else to count.";

pub const WRONG_NUMBER_MESSAGE: &str =
    "### Wrong number!\nThe counting has been reset. Please start over by sending the number `1`.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountVerdict {
    /// The author also posted the current number
    SameUserTwice,
    /// Not the next number (or not a number at all)
    Wrong,
    /// The expected next number
    Correct(i64),
}

/// Parse the leading integer of a message
///
/// Leading whitespace and a sign are accepted and anything after the digits
/// is ignored, so "12 go!" counts as 12.
pub fn parse_count(content: &str) -> Option<i64> {
    let trimmed = content.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let value: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Judge a message posted in the counting channel
pub fn evaluate(counting: &Counting, author_id: &str, content: &str) -> CountVerdict {
    if counting.current_number_by.as_deref() == Some(author_id) {
        return CountVerdict::SameUserTwice;
    }
    let expected = counting.current_number + 1;
    match parse_count(content) {
        Some(number) if number == expected => CountVerdict::Correct(number),
        _ => CountVerdict::Wrong,
    }
}
