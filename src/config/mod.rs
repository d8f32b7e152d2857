//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line
//!     → flags.rs (clap derive, documented defaults)
//!     → validation.rs (semantic checks)
//!     → resolver.rs (typed conversion)
//!     → RuntimeConfiguration (validated, immutable)
//!     → shared by reference with the client builder and controller
//! ```
//!
//! # Design Decisions
//! - No process-wide flag state: flags are parsed into one value and
//!   resolved exactly once at startup
//! - Config is immutable once resolved; there is no reload path
//! - Validation separates syntactic (clap) from semantic checks

pub mod flags;
pub mod resolver;
pub mod schema;
pub mod validation;

pub use flags::Args;
pub use resolver::{parse_bind_address, resolve, ConfigError};
pub use schema::{BindAddress, ConfigSnapshot, CredentialsSource, RateLimit, RuntimeConfiguration};
pub use validation::ValidationError;
