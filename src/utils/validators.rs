// Validation utilities shared across handlers and services.

/// Phone number validator.
/// Supports international formats: +39 123 456 7890, +1-555-123-4567, etc.
pub struct PhoneValidator;

impl PhoneValidator {
    /// Validate phone number format.
    /// Accepts: +XX XXX XXX XXXX, +XX-XXX-XXX-XXXX, +XXXXXXXXXXXX, etc.
    pub fn validate(phone: &str) -> bool {
        let cleaned: String = phone
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();

        if !cleaned.starts_with('+') {
            return false;
        }

        let digits = &cleaned[1..];
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }

        let length = digits.len();
        length >= 10 && length <= 15
    }

    /// Normalize phone number to E.164 format (+XXXXXXXXXXXX)
    pub fn normalize(phone: &str) -> Option<String> {
        if !Self::validate(phone) {
            return None;
        }

        let normalized: String = phone
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();

        Some(normalized)
    }
}

/// Email validator (additional checks beyond the `validator` crate's format check).
pub struct EmailValidator;

impl EmailValidator {
    /// True if the email's domain is a known disposable-address provider.
    pub fn is_disposable(email: &str) -> bool {
        let disposable_domains = [
            "tempmail.com",
            "throwaway.email",
            "guerrillamail.com",
            "mailinator.com",
            "10minutemail.com",
            "trashmail.com",
            "fakeinbox.com",
            "yopmail.com",
            "maildrop.cc",
        ];

        let domain = email.split('@').nth(1).unwrap_or("");
        disposable_domains.contains(&domain)
    }
}

/// UUID validator function for use with the `validator` crate.
/// Used with `#[validate(custom(function = "validate_uuid"))]`.
pub fn validate_uuid(value: &str) -> Result<(), validator::ValidationError> {
    use std::str::FromStr;
    use uuid::Uuid;

    match Uuid::from_str(value) {
        Ok(_) => Ok(()),
        Err(_) => Err(validator::ValidationError::new("invalid_uuid")),
    }
}

/// Positive-quantity validator for cart/sale line items.
pub fn validate_positive_quantity(value: i32) -> Result<(), validator::ValidationError> {
    if value > 0 {
        Ok(())
    } else {
        Err(validator::ValidationError::new("quantity_must_be_positive"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_valid() {
        assert!(PhoneValidator::validate("+39 123 456 7890"));
        assert!(PhoneValidator::validate("+1-555-123-4567"));
        assert!(PhoneValidator::validate("+442071234567"));
        assert!(PhoneValidator::validate("+39 3401234567"));
    }

    #[test]
    fn test_phone_invalid() {
        assert!(!PhoneValidator::validate("123456789")); // no country code
        assert!(!PhoneValidator::validate("+39 123")); // too short
        assert!(!PhoneValidator::validate("+39 123 456 7890 1234 5678")); // too long
        assert!(!PhoneValidator::validate("39 123 456 7890")); // missing +
        assert!(!PhoneValidator::validate("+39abc123456")); // letters
    }

    #[test]
    fn test_phone_normalize() {
        assert_eq!(
            PhoneValidator::normalize("+39 123 456 7890"),
            Some("+391234567890".to_string())
        );
        assert_eq!(
            PhoneValidator::normalize("+1-555-123-4567"),
            Some("+15551234567".to_string())
        );
    }

    #[test]
    fn test_disposable_email() {
        assert!(EmailValidator::is_disposable("test@tempmail.com"));
        assert!(EmailValidator::is_disposable("user@mailinator.com"));
        assert!(!EmailValidator::is_disposable("user@gmail.com"));
        assert!(!EmailValidator::is_disposable("pharmacist@example-pharmacy.com"));
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_positive_quantity() {
        assert!(validate_positive_quantity(1).is_ok());
        assert!(validate_positive_quantity(0).is_err());
        assert!(validate_positive_quantity(-1).is_err());
    }
}
