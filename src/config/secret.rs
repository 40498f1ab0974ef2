//! Session cookie values held as secrets
//!
//! Cookie values authenticate the browser session against the dashboard, so
//! they are wrapped in `secrecy::Secret`: zeroed on drop, redacted in `Debug`,
//! and only readable through `expose_secret()`.
//!
//! ```rust
//! use dashport::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("abc123".to_string());
//! assert_eq!(token.expose_secret().as_ref(), "abc123");
//! assert!(!format!("{token:?}").contains("abc123"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Cookie value payload
///
/// Serializes as a bare string so it reads and writes like any other field.
#[derive(Clone, Zeroize, Serialize, Deserialize)]
#[serde(transparent)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl SecretValue {
    /// Whether the cookie value is blank
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// A secret string (cookie values)
pub type SecretString = Secret<SecretValue>;

/// Wrap a string as a secret
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("cookie-value".to_string());
        assert_eq!(secret.expose_secret(), "cookie-value");
        assert!(!secret.expose_secret().is_blank());
        assert!(secret_string("  ".to_string()).expose_secret().is_blank());
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("sensitive-cookie".to_string());
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("sensitive-cookie"));
    }

    #[test]
    fn test_secret_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Cookie {
            value: SecretString,
        }

        let cookie: Cookie = toml::from_str("value = \"abc\"").unwrap();
        assert_eq!(cookie.value.expose_secret().as_ref(), "abc");
    }
}
