//! Table and column identifier validation.
//!
//! Store adapters interpolate table and column names into SQL and URLs, so every
//! identifier must match `^[A-Za-z_][A-Za-z0-9_]*$` and stay within Postgres' 63-byte limit.

use std::sync::LazyLock;

use regex::Regex;

const MAX_IDENTIFIER_LENGTH: usize = 63;

static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid identifier '{0}': expected letters, digits, or underscore, starting with a letter or underscore")]
pub struct InvalidIdentifier(pub String);

pub fn validate_identifier(name: &str) -> Result<(), InvalidIdentifier> {
    if name.len() > MAX_IDENTIFIER_LENGTH || !IDENTIFIER_PATTERN.is_match(name) {
        return Err(InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(validate_identifier("files").is_ok());
        assert!(validate_identifier("activity_logs").is_ok());
        assert!(validate_identifier("_private2").is_ok());
    }

    #[test]
    fn rejects_injection_shapes() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("files; drop table x").is_err());
        assert!(validate_identifier("\"files\"").is_err());
        assert!(validate_identifier("1files").is_err());
        assert!(validate_identifier("a b").is_err());
        assert!(validate_identifier(&"a".repeat(64)).is_err());
    }
}
