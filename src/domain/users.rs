//! Account name rules.

/// Account names are at least three ASCII letters, digits or underscores.
pub fn is_valid_account_name(name: &str) -> bool {
    name.len() >= 3
        && name
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}
