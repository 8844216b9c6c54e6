pub mod client;
pub mod errors;
pub mod identity;
pub mod pacing;
pub mod params;
pub mod proxy;
pub mod signer;

pub use client::{BrowserPage, BrowserlessClient, PlatformSession};
pub use errors::NetworkError;
pub use identity::SessionIdentity;
pub use pacing::RequestPacer;
pub use params::build_session_params;
pub use proxy::ProxyPool;
pub use signer::{NodeSigner, SignatureError, Signer};
