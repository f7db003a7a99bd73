use rand::Rng;

/// Uppercase letters and digits without the look-alikes `I`, `O`, `0`, `1`.
pub const REFERRAL_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const REFERRAL_CODE_LEN: usize = 8;

pub fn generate_referral_code() -> String {
    let mut rng = rand::rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| char::from(REFERRAL_ALPHABET[rng.random_range(0..REFERRAL_ALPHABET.len())]))
        .collect()
}

/// Trim and uppercase a visitor-supplied code; `None` if it cannot be one of ours.
pub fn normalize_referral_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    (code.len() == REFERRAL_CODE_LEN && code.bytes().all(|b| REFERRAL_ALPHABET.contains(&b)))
        .then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_use_the_unambiguous_alphabet() {
        for _ in 0..200 {
            let code = generate_referral_code();
            assert_eq!(code.len(), REFERRAL_CODE_LEN);
            assert!(code.bytes().all(|b| REFERRAL_ALPHABET.contains(&b)), "{code}");
            assert!(normalize_referral_code(&code).is_some());
        }
    }

    #[test]
    fn normalize_accepts_lowercase_and_rejects_look_alikes() {
        assert_eq!(
            normalize_referral_code(" abcd2345 ").as_deref(),
            Some("ABCD2345")
        );
        assert!(normalize_referral_code("ABCD0345").is_none());
        assert!(normalize_referral_code("ABC").is_none());
        assert!(normalize_referral_code("").is_none());
    }
}
