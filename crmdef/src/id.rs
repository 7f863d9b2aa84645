use nanoid::nanoid;

/// Canonical alphabet for identifiers (no ambiguous glyphs).
const ID_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    '2', '3', '4', '5', '6', '7', '8', '9',
];
/// Length of the random part; with the 3-char key prefix ids are 18 chars long.
const ID_BODY_LENGTH: usize = 15;

pub const OBJECT_KEY_PREFIX: &str = "01I";
pub const FIELD_KEY_PREFIX: &str = "00N";
pub const RECORD_KEY_PREFIX: &str = "a0R";

fn generate_with_prefix(prefix: &str) -> String {
    let body = nanoid!(ID_BODY_LENGTH, ID_ALPHABET);
    format!("{prefix}{body}")
}

pub fn generate_object_id() -> String {
    generate_with_prefix(OBJECT_KEY_PREFIX)
}

pub fn generate_field_id() -> String {
    generate_with_prefix(FIELD_KEY_PREFIX)
}

pub fn generate_record_id() -> String {
    generate_with_prefix(RECORD_KEY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_prefix_length_and_charset() {
        for (id, prefix) in [
            (generate_object_id(), OBJECT_KEY_PREFIX),
            (generate_field_id(), FIELD_KEY_PREFIX),
            (generate_record_id(), RECORD_KEY_PREFIX),
        ] {
            assert_eq!(id.len(), 18);
            assert!(id.starts_with(prefix));
            assert!(id[3..].chars().all(|c| ID_ALPHABET.contains(&c)));
        }
    }

    #[test]
    fn ids_are_distinct() {
        assert_ne!(generate_field_id(), generate_field_id());
    }
}
