//! The platform secret keying the outcome HMAC.
//!
//! A missing or empty secret is a configuration failure at process startup.
//! It is never surfaced per-request: everything downstream receives a
//! validated [`PlatformSecret`] by reference.

use chipduel_types::{constants, ChipduelError, Result};

/// The HMAC key. Guaranteed non-empty once constructed.
#[derive(Clone)]
pub struct PlatformSecret(Vec<u8>);

impl PlatformSecret {
    /// Load the secret from `CHIPDUEL_PLATFORM_SECRET`.
    ///
    /// # Errors
    /// Returns `Configuration` if the variable is unset or blank.
    pub fn from_env() -> Result<Self> {
        match std::env::var(constants::PLATFORM_SECRET_ENV) {
            Ok(value) => Self::from_bytes(value.into_bytes()),
            Err(_) => Err(ChipduelError::Configuration(format!(
                "{} is not set",
                constants::PLATFORM_SECRET_ENV
            ))),
        }
    }

    /// Construct from raw key bytes.
    ///
    /// # Errors
    /// Returns `Configuration` if the key is empty.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ChipduelError::Configuration(
                "platform secret must not be empty".to_string(),
            ));
        }
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Key material never reaches logs.
impl std::fmt::Debug for PlatformSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PlatformSecret(<{} bytes>)", self.0.len())
    }
}
