mod auth;
pub mod store;

pub use auth::{Credential, TokenManager, TokenState};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
