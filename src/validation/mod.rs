use std::fmt;

pub const BANK_NAME_MAX_LEN: usize = 64;
pub const REFERENCE_ID_MAX_LEN: usize = 255;
pub const AUTHORITY_ID_MAX_LEN: usize = 255;
pub const METHOD_NAME_MAX_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_bank_name(bank_name: &str) -> ValidationResult {
    validate_required("bank_name", bank_name)?;
    validate_max_len("bank_name", bank_name, BANK_NAME_MAX_LEN)
}

pub fn validate_reference_id(ref_id: &str) -> ValidationResult {
    validate_max_len("ref_id", ref_id, REFERENCE_ID_MAX_LEN)
}

pub fn validate_authority_id(authority_id: &str) -> ValidationResult {
    validate_max_len("authority_id", authority_id, AUTHORITY_ID_MAX_LEN)
}

pub fn validate_method_name(method_name: &str) -> ValidationResult {
    validate_required("method_name", method_name)?;
    validate_max_len("method_name", method_name, METHOD_NAME_MAX_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len_in_chars() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
        // multi-byte characters count once
        assert!(validate_max_len("field", "ملت", 3).is_ok());
    }

    #[test]
    fn validates_bank_name() {
        assert!(validate_bank_name("Mellat").is_ok());
        assert!(validate_bank_name("").is_err());
        assert!(validate_bank_name(&"B".repeat(BANK_NAME_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn validates_gateway_identifiers() {
        assert!(validate_reference_id("GW-555").is_ok());
        assert!(validate_reference_id(&"R".repeat(REFERENCE_ID_MAX_LEN + 1)).is_err());
        assert!(validate_authority_id(&"A".repeat(AUTHORITY_ID_MAX_LEN)).is_ok());
        assert!(validate_authority_id(&"A".repeat(AUTHORITY_ID_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn validates_method_name() {
        assert!(validate_method_name("verifyTransaction").is_ok());
        assert!(validate_method_name(" ").is_err());
    }
}
