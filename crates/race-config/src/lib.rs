//! Configuration tree and the credential store: the core's only
//! persistent state, plus a generic pending-request map used to bound
//! in-flight auth/wire exchanges.

mod config;
mod credentials;
mod error;
mod pending;

pub use config::{AuthenticatorAttachment, Config, CredentialPolicy, UserVerification};
pub use credentials::{CredentialRecord, CredentialStore};
pub use error::ConfigError;
pub use pending::PendingStore;
