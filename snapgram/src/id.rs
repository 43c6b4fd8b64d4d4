//! Document identifiers.
//!
//! Ids are at most 36 characters of `[A-Za-z0-9._-]` and start with a letter
//! or digit. Generated ids use a lowercase alphanumeric subset of that.

use nanoid::nanoid;

pub const MAX_ID_LENGTH: usize = 36;

const GENERATED_ID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const GENERATED_ID_LENGTH: usize = 20;

/// Generates an id for a new document.
pub fn unique_id() -> String {
    nanoid!(GENERATED_ID_LENGTH, &GENERATED_ID_ALPHABET)
}

/// Whether `id` can name a document.
pub fn is_valid_id(id: &str) -> bool {
    let mut chars = id.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    id.len() <= MAX_ID_LENGTH
        && first.is_ascii_alphanumeric()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}
