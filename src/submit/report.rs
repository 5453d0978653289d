use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

/// What happened to one ensemble
///
/// Only the outcome of the launch itself is recorded. Whatever the scheduler does with a job after
/// qsub accepts it is not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    /// Launch process exited 0
    Submitted,
    /// Command built and printed, launcher didn't execute it
    DryRun,
    /// Building or launching failed
    Failed,
    /// Not attempted because an earlier ensemble failed and the policy is to stop
    Skipped,
}

impl SubmissionState {
    pub fn to_string(&self) -> &str {
        match self {
            SubmissionState::Submitted => "submitted",
            SubmissionState::DryRun => "dry run",
            SubmissionState::Failed => "failed",
            SubmissionState::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// Position in the ensemble file, from 0
    pub index: usize,
    pub stream: Option<String>,
    pub command: Option<String>,
    /// Job id printed by the scheduler, scheduler mode only
    pub job_id: Option<String>,
    pub state: SubmissionState,
    pub error: Option<String>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    pub started: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
    pub outcomes: Vec<Outcome>,
}

impl SubmissionReport {
    pub fn new() -> SubmissionReport {
        SubmissionReport { started: Utc::now(), finished: None, outcomes: Vec::new() }
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome.state {
            SubmissionState::Failed => warn!(
                "Ensemble {} {}: {}",
                outcome.index,
                outcome.state.to_string(),
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
            _ => info!(
                "Ensemble {} {}{}",
                outcome.index,
                outcome.state.to_string(),
                outcome.job_id.as_deref().map(|id| format!(" as job {id}")).unwrap_or_default()
            ),
        }
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished = Some(Utc::now());
    }

    pub fn count(&self, state: SubmissionState) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.state == state).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|outcome| outcome.state == SubmissionState::Failed)
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Log a one line summary followed by every failure
    pub fn summarise(&self) {
        info!(
            "{} ensemble(s): {} submitted, {} dry run, {} failed, {} skipped",
            self.outcomes.len(),
            self.count(SubmissionState::Submitted),
            self.count(SubmissionState::DryRun),
            self.count(SubmissionState::Failed),
            self.count(SubmissionState::Skipped),
        );
        for failure in self.failures() {
            warn!(
                "Ensemble {} ({}) failed: {}",
                failure.index,
                failure.stream.as_deref().unwrap_or("no stream name"),
                failure.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    /// Write the report as pretty JSON
    pub fn write(&self, out_path: &Path) -> Result<(), io::Error> {
        info!("Writing submission report to {}", out_path.display());
        let json = serde_json::to_string_pretty(self)?;
        fs::write(out_path, json)
    }
}
