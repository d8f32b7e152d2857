//! Control-plane client subsystem.
//!
//! # Data Flow
//! ```text
//! RuntimeConfiguration
//!     → builder.rs (pick credential source, apply rate limits)
//!     → credentials.rs (kubeconfig file or in-cluster discovery)
//!     → ClientHandle (shared read-only with the controller)
//!
//! Every outbound request:
//!     kube client → layer.rs (token bucket wait, request metrics) → API server
//! ```
//!
//! # Design Decisions
//! - Explicit kubeconfig path always wins over ambient credentials
//! - No retries and no network calls during construction
//! - Rate limiting is client-side: burst = bucket size, qps = refill rate

pub mod builder;
pub mod credentials;
pub mod layer;
pub mod rate_limit;

pub use builder::{ClientBuilder, ClientHandle};
pub use credentials::{CredentialLoader, KubeCredentials};
pub use layer::{RequestLimitLayer, RequestLimitService};
pub use rate_limit::{RequestLimiter, TokenBucket};
