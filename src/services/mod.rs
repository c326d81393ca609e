//! Service layer modules for external integrations.
//!
//! Contains the assessment service client and session draft storage.

pub mod api_client;
pub mod session_store;

pub use api_client::ApiClient;
pub use session_store::{Draft, DraftStore, MemorySessionStore, SessionStore};
