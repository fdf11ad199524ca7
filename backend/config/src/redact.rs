//! Secret masking for configuration values.

/// Mask a secret for display, keeping a short prefix as a hint.
///
/// Values of eight characters or fewer are fully masked.
pub fn redact_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    if secret.chars().count() > 8 {
        let hint: String = secret.chars().take(4).collect();
        format!("{hint}***")
    } else {
        "***".to_string()
    }
}
