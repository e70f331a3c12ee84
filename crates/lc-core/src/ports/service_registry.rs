use thiserror::Error;

use crate::network::ServiceRecord;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("service name `{0}` is already in use")]
    NameInUse(String),

    #[error("service registration failed: {0}")]
    Backend(String),
}

/// Announces this node on the LAN service-discovery mechanism.
pub trait ServiceRegistryPort: Send + Sync {
    /// Register `record`. Fails with [`RegistrationError::NameInUse`] when
    /// another instance already owns the name.
    fn register(&self, record: &ServiceRecord) -> Result<(), RegistrationError>;

    /// Release a (possibly partial) registration. Unknown records are ignored.
    fn unregister(&self, record: &ServiceRecord) -> Result<(), RegistrationError>;
}
