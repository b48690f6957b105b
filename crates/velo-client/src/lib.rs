pub mod auth_service;
pub mod cache;
pub mod client;
pub mod error;
pub mod goal_service;
pub mod http_client;
pub mod memory;
pub mod session;
pub mod task_service;
pub mod transport;

pub use cache::{CacheKey, QueryCache};
pub use client::Velo;
pub use error::ClientError;
pub use session::{Gated, SessionGate, SessionSnapshot, SessionState};
pub use transport::{LoginOutcome, SignupOutcome, VeloTransport};
