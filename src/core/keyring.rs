use std::error::Error;
use std::fmt;

use keyring::Entry;
use tracing::debug;

use crate::core::providers::{CredentialSource, ProviderKind};

pub const KEYRING_SERVICE: &str = "palaver";

/// Describes failures when attempting to access the system keyring.
///
/// Recoverable errors indicate that the credential backend was
/// temporarily unavailable (for example when the keychain service is
/// locked or inaccessible). Permanent errors surface the underlying
/// cause directly so callers can report them to the user.
#[derive(Debug)]
pub enum KeyringAccessError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Recoverable(err) | KeyringAccessError::Permanent(err) => err,
        }
    }

    /// Returns true when the error represents a temporary outage of the
    /// platform keyring backend.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner())
    }
}

impl Error for KeyringAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// API keys stored in the platform keyring, one entry per provider id.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringCredentials;

impl KeyringCredentials {
    pub fn store(&self, provider: ProviderKind, api_key: &str) -> Result<(), KeyringAccessError> {
        let entry = Entry::new(KEYRING_SERVICE, provider.id())?;
        entry.set_password(api_key)?;
        Ok(())
    }

    /// Removes the stored key. Returns false when nothing was stored.
    pub fn remove(&self, provider: ProviderKind) -> Result<bool, KeyringAccessError> {
        let entry = Entry::new(KEYRING_SERVICE, provider.id())?;
        match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

impl CredentialSource for KeyringCredentials {
    fn api_key(&self, provider: ProviderKind) -> Result<Option<String>, KeyringAccessError> {
        let entry = Entry::new(KEYRING_SERVICE, provider.id())?;
        match entry.get_password() {
            Ok(key) => {
                debug!(provider = provider.id(), "Loaded API key from keyring");
                Ok(Some(key))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
