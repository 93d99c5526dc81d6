// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs the target command once per run and watches it until
//! it finishes or times out.
//!
//! - [`launcher`] starts the child with its output wired to the run's logs.
//! - [`bridge`] turns SIGCHLD into a wakeup the supervisor can await.
//! - [`supervisor`] is the bounded, tick-based wait for one child, plus
//!   the timeout kill.
//! - [`handler`] runs the external failure handler.
//! - [`backend`] provides the `RunBackend` trait and the `ProcessBackend`
//!   that chains all of the above into one run. Tests can swap in a fake
//!   backend that doesn't spawn processes.

pub mod backend;
pub mod bridge;
pub mod handler;
pub mod launcher;
pub mod supervisor;

pub use backend::{ProcessBackend, RunBackend, RunReport};
pub use bridge::ChildExitBridge;
pub use handler::FailureHandler;
pub use launcher::LaunchSpec;
