//! Control and observation of the running PBX engine
//!
//! Two backends implement [`EngineControl`]: the [`AmiClient`] speaks the
//! structured management protocol, the [`CliInvoker`] runs the engine's
//! command-line interface as a subprocess. The [`ReloadCoordinator`] tries
//! them in that order and reports the outcome without ever failing the
//! caller. The [`StatusMonitor`] answers endpoint queries and degrades to
//! cached state when the engine cannot be reached.

pub mod ami;
pub mod cli;
pub mod control;
pub mod coordinator;
pub mod error;
pub mod monitor;
pub mod scope;

pub use ami::{AmiClient, AmiConfig, AmiMessage};
pub use cli::{CliConfig, CliInvoker};
pub use control::{EndpointDetail, EndpointStatus, EngineControl, EngineQuery};
pub use coordinator::{ReloadCoordinator, ReloadOutcome};
pub use error::{Error, Result};
pub use monitor::{Availability, DetailReport, EndpointReport, StatusMonitor};
pub use scope::ReloadScope;
