//! Validation helpers for DTOs.

use validator::ValidationError;

/// Characters a client-supplied passcode may contain. Matches the generation
/// alphabet in [`crate::config`] plus nothing else; lowercase input is
/// normalised before validation, not here.
const PASSCODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRTUVWXYZ2346789";

/// Validates that a passcode is non-empty and uses only the passcode alphabet.
pub fn validate_passcode(passcode: &str) -> Result<(), ValidationError> {
    if passcode.is_empty() || passcode.len() > 32 {
        let mut err = ValidationError::new("passcode_length");
        err.message = Some("Passcode must be between 1 and 32 characters".into());
        return Err(err);
    }

    if !passcode.chars().all(|c| PASSCODE_ALPHABET.contains(c)) {
        let mut err = ValidationError::new("passcode_format");
        err.message =
            Some("Passcode may only contain the letters and digits used by generated codes".into());
        return Err(err);
    }

    Ok(())
}

/// Rejects values that trim to nothing. Length limits alone let a run of
/// spaces through, which the services would then trim down to an empty
/// name or answer.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must contain something other than whitespace".into());
        return Err(err);
    }
    Ok(())
}

/// Normalise a passcode the way players type them: trimmed and uppercased.
pub fn normalize_passcode(input: &str) -> String {
    input.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_generated_style_codes() {
        assert!(validate_passcode("ABCDEFGH24").is_ok());
        assert!(validate_passcode("W").is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(validate_passcode("").is_err());
        assert!(validate_passcode(&"A".repeat(33)).is_err());
    }

    #[test]
    fn rejects_characters_outside_the_alphabet() {
        assert!(validate_passcode("abcdefgh24").is_err()); // lowercase
        assert!(validate_passcode("ABCDEFGH05").is_err()); // ambiguous digits
        assert!(validate_passcode("ABCD EFGH2").is_err()); // space
    }

    #[test]
    fn blank_check_sees_through_whitespace() {
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("\t\n").is_err());
        assert!(validate_not_blank(" Quizzards ").is_ok());
    }

    #[test]
    fn normalisation_makes_typed_codes_comparable() {
        assert_eq!(normalize_passcode("  abcdefgh24 "), "ABCDEFGH24");
        assert!(validate_passcode(&normalize_passcode("abcdefgh24")).is_ok());
    }
}
