//! Warden Kernel - authenticated order dispatch
//!
//! Takes raw orders from the management dashboard, runs them through the
//! protocol's validation and handshake, executes the requested action
//! against the host platform and shapes the outcome into a response
//! envelope. Transport is somebody else's problem; this crate starts at a
//! JSON body and ends at a JSON reply.

pub mod action;
pub mod actions;
pub mod config;
pub mod error;
pub mod host;
pub mod kernel;
pub mod response;

pub use action::{bind_parameters, Action, ActionRegistry, ParameterSpec};
pub use actions::{builtin_registry, DisableComponents, EnableComponents, InstallFromUrl};
pub use config::KernelConfig;
pub use error::{KernelError, Result};
pub use host::{HostPlatform, NullHostPlatform, UserRecord};
pub use kernel::DispatchKernel;
pub use response::{rot13, ErrorLog, LogEntry, ResponseEnvelope, WireException};
