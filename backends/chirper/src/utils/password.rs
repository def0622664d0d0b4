//! Password strength rules applied at signup and password change.

use std::collections::HashMap;

use validator::ValidationError;

use super::form;

pub const MIN_LENGTH: usize = 8;

/// Similarity ratio at or above which a password is considered derived from
/// a user attribute.
const MAX_SIMILARITY: f64 = 0.7;

/// Lowercased, one per line.
const COMMON_PASSWORDS: &str = include_str!("common_passwords.txt");

/// Runs every rule and returns all failures, in a stable order.
pub fn validate(password: &str, username: &str, email: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (attribute, value) in [("username", username), ("email address", email)] {
        if too_similar(password, value) {
            errors.push(form::error(
                "password_too_similar",
                format!("The password is too similar to the {attribute}."),
            ));
        }
    }

    if password.chars().count() < MIN_LENGTH {
        errors.push(form::error(
            "password_too_short",
            format!("This password is too short. It must contain at least {MIN_LENGTH} characters."),
        ));
    }

    if is_common(password) {
        errors.push(form::error("password_too_common", "This password is too common."));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        errors.push(form::error(
            "password_entirely_numeric",
            "This password is entirely numeric.",
        ));
    }

    errors
}

fn is_common(password: &str) -> bool {
    let password = password.trim().to_lowercase();
    COMMON_PASSWORDS.lines().any(|common| common == password)
}

fn too_similar(password: &str, value: &str) -> bool {
    if value.is_empty() {
        return false;
    }

    let password = password.to_lowercase();
    let value = value.to_lowercase();
    let password_len = password.chars().count();

    value
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|part| !part.is_empty())
        .chain(std::iter::once(value.as_str()))
        .filter(|part| {
            // A short attribute cannot make a much longer password guessable.
            let part_len = part.chars().count();
            let length_bound = MAX_SIMILARITY / 2.0 * password_len as f64;
            !(password_len >= 10 * part_len && (part_len as f64) < length_bound)
        })
        .any(|part| quick_ratio(&password, part) >= MAX_SIMILARITY)
}

/// Upper bound on the matching-blocks ratio: `2 * M / T` where `M` counts the
/// characters the two strings share as multisets.
fn quick_ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }

    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_default() += 1;
    }

    let mut matches = 0;
    for c in a.chars() {
        if let Some(count) = available.get_mut(&c) {
            if *count > 0 {
                *count -= 1;
                matches += 1;
            }
        }
    }

    2.0 * matches as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(password: &str, username: &str, email: &str) -> Vec<String> {
        validate(password, username, email)
            .into_iter()
            .map(|error| error.code.to_string())
            .collect()
    }

    #[test]
    fn accepts_a_reasonable_password() {
        assert!(codes("testpassword", "testuser", "test@test.com").is_empty());
        assert!(codes("s3cret-passw0rd", "alice", "alice@example.com").is_empty());
    }

    #[test]
    fn rejects_short_passwords() {
        assert_eq!(
            codes("short", "testuser", "test@test.com"),
            vec!["password_too_short"]
        );
        let errors = validate("short", "testuser", "");
        assert_eq!(
            errors[0].message.as_deref(),
            Some("This password is too short. It must contain at least 8 characters.")
        );
    }

    #[test]
    fn rejects_numeric_passwords() {
        assert_eq!(
            codes("875329948", "testuser", "test@test.com"),
            vec!["password_entirely_numeric"]
        );
    }

    #[test]
    fn rejects_common_passwords() {
        assert_eq!(
            codes("password1", "alice", "alice@example.com"),
            vec!["password_too_common"]
        );
        assert_eq!(
            codes("Sunshine", "alice", "alice@example.com"),
            vec!["password_too_common"]
        );

        let errors = validate("12345678", "alice", "alice@example.com");
        let messages: Vec<_> = errors.iter().filter_map(|e| e.message.as_deref()).collect();
        assert_eq!(
            messages,
            ["This password is too common.", "This password is entirely numeric."]
        );
    }

    #[test]
    fn rejects_passwords_similar_to_the_username() {
        let errors = validate("testuser1", "testuser", "test@test.com");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message.as_deref(),
            Some("The password is too similar to the username.")
        );
    }

    #[test]
    fn rejects_passwords_similar_to_email_parts() {
        assert_eq!(
            codes("wonderland", "alice", "alice@wonderland.org"),
            vec!["password_too_similar"]
        );
    }

    #[test]
    fn quick_ratio_counts_shared_characters() {
        assert_eq!(quick_ratio("abcd", "abcd"), 1.0);
        assert_eq!(quick_ratio("abcd", "wxyz"), 0.0);
        assert_eq!(quick_ratio("aab", "ab"), 0.8);
    }
}
