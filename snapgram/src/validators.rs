use email_address::EmailAddress;
use url::Url;

/// Longest caption or bio accepted by the client.
pub const MAX_TEXT_LENGTH: usize = 2200;

/// Returns `true` if the provided string is a syntactically valid email address.
pub fn is_valid_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

/// Returns `true` if the provided string parses as a URL with a scheme.
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

/// Returns `true` when the text fits within [`MAX_TEXT_LENGTH`] characters.
pub fn within_text_limit(value: &str) -> bool {
    value.chars().count() <= MAX_TEXT_LENGTH
}
