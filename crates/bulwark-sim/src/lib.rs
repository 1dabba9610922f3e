//! Wave orchestration for BULWARK.
//!
//! Runs the Shop → Preparation → Combat → Completed cycle over a runtime
//! wave list, admits enemies through the host's spawn collaborators and
//! tracks run statistics. Headless and tick-driven, so every scenario is
//! reproducible in tests.

pub mod admission;
pub mod collaborators;
pub mod coordinator;
pub mod notify;
pub mod stats;
pub mod store;

pub use bulwark_core as core;
pub use collaborators::Collaborators;
pub use coordinator::{WaveCoordinator, WaveDiagnostics};
