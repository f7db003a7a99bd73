use crate::error::LaunchpadError;

const MAX_EMAIL_LEN: usize = 254;

/// Trim + lowercase, then a structural check (`local@domain.tld`, no whitespace).
pub fn normalize_email(raw: &str) -> Result<String, LaunchpadError> {
    let email = raw.trim().to_ascii_lowercase();
    let invalid = || LaunchpadError::validation("INVALID_EMAIL", "Please enter a valid email address.");

    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || domain.contains("..")
    {
        return Err(invalid());
    }
    Ok(email)
}

/// Trim, drop empties and cap length for free-form attribution fields.
pub fn clean_optional(raw: Option<String>, max_len: usize) -> Option<String> {
    raw.map(|s| s.trim().chars().take(max_len).collect::<String>())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Alice@Example.COM ").unwrap(), "alice@example.com");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "alice", "alice@", "@example.com", "a@b", "a@@b.io", "a b@c.io", "a@b..io", "a@.b.io"] {
            assert!(normalize_email(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn clean_optional_drops_blank_values() {
        assert_eq!(clean_optional(Some("  ".into()), 10), None);
        assert_eq!(clean_optional(Some(" twitter ".into()), 3).as_deref(), Some("twi"));
    }
}
