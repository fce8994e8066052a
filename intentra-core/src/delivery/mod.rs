//! Scan delivery
//!
//! Delivery is best-effort: each scan is sent once, with bounded timeouts and
//! no retries. Failures are logged and never surface to the host tool.
//!
//! ## Configuration
//!
//! The primary API needs no configuration beyond a stored credential. A
//! self-hosted server is configured in `~/.config/intentra/config.toml`:
//!
//! ```toml
//! [server]
//! enabled = true
//! endpoint = "https://intentra.example.com/api/v1"
//! auth_mode = "hmac"
//! key_id = "team-laptops"
//! secret = "..."
//! ```

pub mod client;
pub mod coordinator;
pub mod credentials;
pub mod server;
pub mod signer;

pub use client::{ApiClient, SessionEndUpdate};
pub use coordinator::{DeliveryCoordinator, DeliveryOutcome};
pub use credentials::{CredentialSource, FileCredentials, StaticCredentials};
pub use server::ServerClient;
pub use signer::HmacSigner;
