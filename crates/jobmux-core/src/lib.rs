//! Core library for jobmux.
//!
//! A job is a small text file describing commands to run side by side. This
//! crate parses that file ([`spec`]), tags every launched command so its
//! processes can be found later ([`tag`]), and drives the session and process
//! capabilities that materialise and tear down a job ([`lifecycle`]).
//! Job files on disk are found through the [`registry`].

pub mod config;
pub mod error;
pub mod handoff;
pub mod lifecycle;
pub mod registry;
pub mod spec;
pub mod tag;
pub mod tmux;

pub use error::{JobError, SpecError, SpecErrorKind};
pub use lifecycle::{ProcessControl, RunOptions, SessionControl, SessionLifecycleManager};
pub use registry::JobRegistry;
pub use spec::{JobSpec, Window, WindowKind};
