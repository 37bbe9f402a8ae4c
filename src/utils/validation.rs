use mongodb::bson::oid::ObjectId;
use regex::Regex;
use validator::Validate;

use crate::utils::ApiError;

pub fn validate_phone(phone: &str) -> bool {
    let re = Regex::new(r"^\+?[0-9]{10,15}$").unwrap();
    re.is_match(phone)
}

/// Runs the DTO's `validator` rules, turning failures into a 400.
pub fn validated<T: Validate>(dto: T) -> Result<T, ApiError> {
    dto.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(dto)
}

pub fn parse_object_id(raw: &str, label: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid {} ID", label)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_shapes() {
        assert!(validate_phone("9876543210"));
        assert!(validate_phone("+919876543210"));
        assert!(!validate_phone("12345"));
        assert!(!validate_phone("98765-43210"));
    }

    #[test]
    fn object_ids_are_checked() {
        assert!(parse_object_id("65f1c0ffee0000000000abcd", "worker").is_ok());
        let err = parse_object_id("nope", "worker").unwrap_err();
        assert_eq!(err.message, "Invalid worker ID");
    }
}
