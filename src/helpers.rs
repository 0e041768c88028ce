// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! String normalisation and identifier generation.

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lowercase the input, then uppercase the first letter of each space-separated word.
pub fn first_letter_uppercase(value: &str) -> String {
    value
        .to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn lower_case(value: &str) -> String {
    value.to_lowercase()
}

/// Random decimal string of exactly `len` digits. The leading digit is never zero.
pub fn generate_random_integers(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|i| {
            let digit = if i == 0 {
                rng.gen_range(1..=9)
            } else {
                rng.gen_range(0..=9)
            };
            char::from(b'0' + digit)
        })
        .collect()
}

/// New 24-character hex identifier: 4-byte big-endian seconds timestamp
/// followed by 8 random bytes, so ids sort roughly by creation time.
pub fn new_object_id() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or_default();
    let tail: [u8; 8] = rand::thread_rng().gen();

    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&secs.to_be_bytes());
    bytes[4..].copy_from_slice(&tail);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_cases_each_word() {
        assert_eq!(first_letter_uppercase("danny"), "Danny");
        assert_eq!(first_letter_uppercase("mANNy dAN"), "Manny Dan");
        assert_eq!(first_letter_uppercase(""), "");
        assert_eq!(first_letter_uppercase("a  b"), "A  B");
    }

    #[test]
    fn lower_cases_email() {
        assert_eq!(lower_case("Danny@Example.COM"), "danny@example.com");
    }

    #[test]
    fn random_integers_have_exact_length() {
        for _ in 0..200 {
            let value = generate_random_integers(12);
            assert_eq!(value.len(), 12);
            assert!(!value.starts_with('0'));
            assert!(value.parse::<u64>().is_ok());
        }
    }

    #[test]
    fn object_ids_are_unique_hex() {
        let a = new_object_id();
        let b = new_object_id();
        assert_eq!(a.len(), 24);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
