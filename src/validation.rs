use crate::config::MIN_HANDLE_LEN;
use crate::error::FormatIssue;
use once_cell::sync::Lazy;
use regex::Regex;

// Allowed handle alphabet
static HANDLE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Check a candidate handle against the length and alphabet rules.
///
/// Length is counted in characters; the alphabet is ASCII only, so any
/// multi-byte character already fails the pattern.
///
/// # Examples
/// ```
/// use operator_claim::validation::validate_handle;
/// assert!(validate_handle("operator_01").is_ok());
/// assert!(validate_handle("ab").is_err());
/// ```
pub fn validate_handle(handle: &str) -> Result<(), FormatIssue> {
    if handle.chars().count() < MIN_HANDLE_LEN {
        return Err(FormatIssue::TooShort);
    }
    if !HANDLE_REGEX.is_match(handle) {
        return Err(FormatIssue::InvalidCharacters);
    }
    Ok(())
}

/// Validate the extended form: a non-blank name and an email with an `@`.
pub fn validate_details(full_name: &str, email: &str) -> Result<(), FormatIssue> {
    if full_name.trim().is_empty() {
        return Err(FormatIssue::MissingName);
    }
    if !email.contains('@') {
        return Err(FormatIssue::InvalidEmail);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_handles_are_rejected() {
        assert_eq!(validate_handle(""), Err(FormatIssue::TooShort));
        assert_eq!(validate_handle("ab"), Err(FormatIssue::TooShort));
        assert_eq!(validate_handle("abc"), Ok(()));
    }

    #[test]
    fn characters_outside_alphabet_are_rejected() {
        for bad in ["has space", "dot.ted", "émile", "semi;colon", "at@sign"] {
            assert_eq!(
                validate_handle(bad),
                Err(FormatIssue::InvalidCharacters),
                "{bad}"
            );
        }
        assert_eq!(validate_handle("Under_score-dash9"), Ok(()));
    }

    #[test]
    fn two_multibyte_chars_count_as_too_short() {
        assert_eq!(validate_handle("éé"), Err(FormatIssue::TooShort));
    }

    #[test]
    fn details_need_name_and_at_sign() {
        assert_eq!(validate_details("  ", "a@b.c"), Err(FormatIssue::MissingName));
        assert_eq!(validate_details("Ada", "nope"), Err(FormatIssue::InvalidEmail));
        assert_eq!(validate_details("Ada", "ada@example.com"), Ok(()));
    }
}
