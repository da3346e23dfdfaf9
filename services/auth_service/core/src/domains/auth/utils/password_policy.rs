//! Password policy checks
//!
//! End-user passwords: 8-72 chars with at least one lowercase, one uppercase
//! and one digit. Admin passwords: 12-72 chars. The 72-char ceiling is the
//! bcrypt input limit.

/// Validate an end-user password against the policy
pub fn validate_user_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if password.len() > 72 {
        return Err("Password must be at most 72 characters".to_string());
    }

    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_lowercase || !has_uppercase || !has_digit {
        return Err(
            "Password must contain lowercase, uppercase and numeric characters".to_string(),
        );
    }

    Ok(())
}

/// Validate an admin password (length only, stricter minimum)
pub fn validate_admin_password(password: &str) -> Result<(), String> {
    if password.len() < 12 {
        return Err("Admin password must be at least 12 characters".to_string());
    }
    if password.len() > 72 {
        return Err("Admin password must be at most 72 characters".to_string());
    }
    Ok(())
}
