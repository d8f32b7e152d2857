//! Control-plane agent library.
//!
//! Resolves configuration, builds a rate-limited control-plane client,
//! starts the controller subsystem and a debug endpoint, and shuts both down
//! in order when the process is asked to terminate.

pub mod client;
pub mod config;
pub mod controller;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use client::{ClientBuilder, ClientHandle};
pub use config::{Args, RuntimeConfiguration};
pub use controller::{Controller, ControllerRuntime, StopHandle};
pub use lifecycle::{Orchestrator, Shutdown, StartupError};
