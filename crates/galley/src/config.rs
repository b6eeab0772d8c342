//! Pipeline configuration and its validation.

use crate::{Error, Result};
use core::time::Duration;
use std::collections::HashSet;

/// Requester names used by the reference restaurant scenario.
pub const DEFAULT_REQUESTERS: [&str; 10] = [
    "Ani", "Bai", "Cat", "Dao", "Eve", "Fay", "Gus", "Hua", "Iza", "Jai",
];

/// Worker names used by the reference restaurant scenario.
pub const DEFAULT_WORKERS: [&str; 3] = ["Remy", "Colette", "Linguini"];

/// Everything the [`Coordinator`](crate::Coordinator) needs to run one
/// pipeline.
///
/// [`Default`] yields the reference scenario: 10 requesters, 3 workers, a
/// queue of 3, 5 completions per requester, and a 7 second admission timeout.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Maximum number of items waiting in the admission queue.
    pub capacity: usize,
    /// How long a requester waits for a free slot before abandoning an item.
    pub admit_timeout: Duration,
    /// Successful replies each requester consumes before it terminates.
    pub completion_target: usize,
    /// One requester task is started per name.
    pub requesters: Vec<String>,
    /// One worker task is started per name.
    pub workers: Vec<String>,
    /// Base duration of the work function.
    pub work_base: Duration,
    /// Base duration a requester spends consuming a reply.
    pub consume_base: Duration,
    /// Base duration a requester spends after abandoning an item.
    pub abandon_base: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            admit_timeout: Duration::from_secs(7),
            completion_target: 5,
            requesters: DEFAULT_REQUESTERS.iter().map(ToString::to_string).collect(),
            workers: DEFAULT_WORKERS.iter().map(ToString::to_string).collect(),
            work_base: Duration::from_secs(10),
            consume_base: Duration::from_secs(2),
            abandon_base: Duration::from_secs(5),
        }
    }
}

impl PipelineConfig {
    /// Checks that the pipeline can make progress and that task names are
    /// unambiguous.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(invalid("capacity must be greater than 0"));
        }
        if self.workers.is_empty() {
            return Err(invalid("at least one worker is required"));
        }
        if self.requesters.is_empty() {
            return Err(invalid("at least one requester is required"));
        }
        if self.completion_target == 0 {
            return Err(invalid("completion target must be greater than 0"));
        }
        check_names("worker", &self.workers)?;
        check_names("requester", &self.requesters)?;
        Ok(())
    }
}

fn check_names(kind: &str, names: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if name.trim().is_empty() {
            return Err(invalid(format!("{kind} names must not be empty")));
        }
        if !seen.insert(name.as_str()) {
            return Err(invalid(format!("duplicate {kind} name `{name}`")));
        }
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        reason: reason.into(),
    }
}
