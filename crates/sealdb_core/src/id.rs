//! Random identifier generation.

use rand::Rng;

const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a random identifier of `length` characters drawn from
/// digits and ASCII letters.
///
/// When `delimiter` is non-empty it is appended after every character,
/// including the last, so `generate_id(4, "-")` yields text like
/// `"a-7-Q-c-"`.
#[must_use]
pub fn generate_id(length: usize, delimiter: &str) -> String {
    let mut rng = rand::thread_rng();
    let mut id = String::with_capacity(length * (1 + delimiter.len()));
    for _ in 0..length {
        let index = rng.gen_range(0..CHARSET.len());
        id.push(CHARSET[index] as char);
        id.push_str(delimiter);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ids_have_the_requested_length() {
        let id = generate_id(16, "");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn delimiter_follows_every_character() {
        let id = generate_id(4, "-");
        assert_eq!(id.len(), 8);
        assert!(id.ends_with('-'));
        for (i, c) in id.chars().enumerate() {
            if i % 2 == 1 {
                assert_eq!(c, '-');
            } else {
                assert!(c.is_ascii_alphanumeric());
            }
        }
    }

    #[test]
    fn zero_length_is_empty() {
        assert_eq!(generate_id(0, "-"), "");
    }
}
