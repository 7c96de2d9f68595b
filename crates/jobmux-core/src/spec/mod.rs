//! The job-file language.
//!
//! A job file is line oriented. Blank lines and `#` comments are skipped; every
//! other line is a directive:
//!
//! ```text
//! # optional first-line description, shown by `ls`
//! param <name> <variant> <fragment...>
//! shared <fragment...>
//! shared(<key>) <fragment...>
//! raw <windowName> <fragment...>
//! run <param1=variant1> <param2=variant2> ...
//! vprof <param1=variant1> ...
//! ```
//!
//! [`parse_job`] turns the text into a [`JobSpec`] whose windows carry fully
//! composed, tagged commands.

mod compose;
mod directive;
mod parser;
mod types;

pub use compose::{compose, resolve_variants, Composed, LaunchMode, LaunchTemplate};
pub use directive::{Directive, Selection};
pub use parser::{description, JobParser};
pub use types::{JobSpec, Window, WindowKind};

use crate::error::SpecError;

/// Parse the text of job `job_name`
pub fn parse_job(job_name: &str, text: &str, template: &LaunchTemplate) -> Result<JobSpec, SpecError> {
    JobParser::new(job_name, template).parse(text)
}
