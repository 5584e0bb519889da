#![forbid(unsafe_code)]

//! Placeholder text for demos, benches, and tests.

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud \
exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat. Duis aute irure dolor in \
reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla pariatur. Excepteur sint \
occaecat cupidatat non proident, sunt in culpa qui officia deserunt mollit anim id est laborum. ";

/// `num_chars` characters of lorem ipsum starting at `start` (wrapping).
///
/// The start is moved forward past spaces and punctuation, a trailing space
/// becomes `.`, and with `capitalize` the first character is upper-cased
/// (or replaced by `M` when it is not a letter).
#[must_use]
pub fn lorem_ipsum(num_chars: usize, start: usize, capitalize: bool) -> String {
    let bytes = LOREM.as_bytes();
    let n = bytes.len();
    let mut spot = start % n;
    while matches!(bytes[spot], b' ' | b'.' | b',' | b':' | b';' | b'!' | b'?') {
        spot = (spot + 1) % n;
    }

    let mut out: Vec<u8> = bytes[spot..]
        .iter()
        .chain(&bytes[..spot])
        .cycle()
        .take(num_chars)
        .copied()
        .collect();

    if let Some(last) = out.last_mut()
        && *last == b' '
    {
        *last = b'.';
    }
    if capitalize && let Some(first) = out.first_mut() {
        let upper = first.to_ascii_uppercase();
        *first = if upper.is_ascii_uppercase() { upper } else { b'M' };
    }

    // LOREM is ASCII, so every byte is a char.
    out.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_length() {
        assert_eq!(lorem_ipsum(200, 50, true).len(), 200);
        assert_eq!(lorem_ipsum(2_000, 0, false).len(), 2_000);
        assert_eq!(lorem_ipsum(0, 3, true), "");
    }

    #[test]
    fn starts_on_a_word_and_capitalizes() {
        assert!(lorem_ipsum(11, 0, true).starts_with("Lorem ipsum"));
        // index 5 is a space; start moves to "ipsum"
        assert_eq!(lorem_ipsum(5, 5, true), "Ipsum");
        assert_eq!(lorem_ipsum(5, 5, false), "ipsum");
    }

    #[test]
    fn never_ends_with_space() {
        // "Lorem " is 6 chars
        assert_eq!(lorem_ipsum(6, 0, true), "Lorem.");
    }
}
