//! Project id derivation and SQL identifier sanitizing

/// Derive a project id (slug) from a display name
///
/// Pipeline: lowercase, trim, collapse runs of characters outside `[a-z0-9]`
/// to a single `_`, strip leading/trailing `_`. Returns `None` when nothing
/// survives; callers must reject that as a validation error.
pub fn generate_project_id(name: &str) -> Option<String> {
    let slug = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Strip every character outside `[a-zA-Z0-9_]`
///
/// Every identifier interpolated into dynamic SQL passes through here.
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Name of the dedicated user table for a project id
pub fn user_table_name(project_id: &str) -> String {
    format!("{}_users", sanitize_identifier(project_id))
}

/// Validate a project display name: 3-50 chars from `[a-zA-Z0-9_ -]`
pub fn validate_project_name(name: &str) -> Result<(), String> {
    if name.len() < 3 || name.len() > 50 {
        return Err("Project name must be 3-50 characters".to_string());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ' || c == '-')
    {
        return Err(
            "Project name may only contain letters, digits, underscores, spaces and hyphens"
                .to_string(),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_project_id_normalizes() {
        assert_eq!(generate_project_id("My-Cool App!").as_deref(), Some("my_cool_app"));
        assert_eq!(generate_project_id("API v2.0").as_deref(), Some("api_v2_0"));
        assert_eq!(
            generate_project_id("Test'; DROP TABLE users; --").as_deref(),
            Some("test_drop_table_users")
        );
    }

    #[test]
    fn test_generate_project_id_empty_rejected() {
        assert_eq!(generate_project_id("!@#$%"), None);
        assert_eq!(generate_project_id(""), None);
        assert_eq!(generate_project_id("   "), None);
    }

    #[test]
    fn test_generate_project_id_idempotent() {
        for name in ["My-Cool App!", "API v2.0", "acme", "a_b_c"] {
            let once = generate_project_id(name).unwrap();
            let twice = generate_project_id(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("acme_users"), "acme_users");
        assert_eq!(sanitize_identifier("acme; DROP TABLE x"), "acmeDROPTABLEx");
        assert_eq!(sanitize_identifier("a\"b'c"), "abc");
    }

    #[test]
    fn test_user_table_name() {
        assert_eq!(user_table_name("acme"), "acme_users");
        assert_eq!(user_table_name("my_cool_app"), "my_cool_app_users");
    }

    #[test]
    fn test_validate_project_name() {
        assert!(validate_project_name("My App").is_ok());
        assert!(validate_project_name("ab").is_err());
        assert!(validate_project_name(&"a".repeat(51)).is_err());
        assert!(validate_project_name("bad!name").is_err());
        assert!(validate_project_name("ok-name_1").is_ok());
    }
}
