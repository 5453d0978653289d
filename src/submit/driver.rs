use chrono::Utc;
use log::info;

use crate::command::CommandBuilder;
use crate::ensemble::read::Ensemble;
use crate::mode::FailurePolicy;
use crate::submit::launch::Launcher;
use crate::submit::report::{Outcome, SubmissionReport, SubmissionState};

/// Build and launch every ensemble in order
///
/// Each command is printed to stdout before it's launched, so it can be copied and re-issued by
/// hand whatever the outcome. Build failures (a missing lattice field) never reach the launcher.
pub fn submit_all<L: Launcher>(
    ensembles: &[Ensemble],
    builder: &CommandBuilder,
    launcher: &mut L,
    policy: FailurePolicy,
) -> SubmissionReport {
    let mut report = SubmissionReport::new();
    let mut stopped = false;

    for (index, ensemble) in ensembles.iter().enumerate() {
        if stopped {
            report.record(Outcome {
                index,
                stream: None,
                command: None,
                job_id: None,
                state: SubmissionState::Skipped,
                error: None,
                time: Utc::now(),
            });
            continue;
        }

        let outcome = submit_one(index, ensemble, builder, launcher);
        if outcome.state == SubmissionState::Failed && policy == FailurePolicy::Stop {
            info!("--fail-fast set, skipping remaining ensembles");
            stopped = true;
        }
        report.record(outcome);
    }

    report.finish();
    report
}

fn submit_one<L: Launcher>(index: usize, ensemble: &Ensemble, builder: &CommandBuilder, launcher: &mut L) -> Outcome {
    let command = match ensemble.build(builder) {
        Ok(command) => command,
        Err(err) => {
            return Outcome {
                index,
                stream: None,
                command: None,
                job_id: None,
                state: SubmissionState::Failed,
                error: Some(err.to_string()),
                time: Utc::now(),
            };
        }
    };

    println!("{command}");
    info!("Launching stream {} with arguments {}", command.stream, command.args);

    let (state, job_id, error) = match launcher.launch(&command.line) {
        Ok(job_id) if launcher.executes() => (SubmissionState::Submitted, job_id, None),
        Ok(_) => (SubmissionState::DryRun, None, None),
        Err(err) => (SubmissionState::Failed, None, Some(err.to_string())),
    };

    Outcome {
        index,
        stream: Some(command.stream),
        command: Some(command.line),
        job_id,
        state,
        error,
        time: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::command::LaunchConfig;
    use crate::submit::launch::{DryRunLauncher, SubmitError};

    /// Remembers every command, fails the ones containing a marker and hands out job ids
    #[derive(Default)]
    struct RecordingLauncher {
        commands: Vec<String>,
        fail_on: Option<String>,
        job_ids: bool,
    }

    impl Launcher for RecordingLauncher {
        fn launch(&mut self, command: &str) -> Result<Option<String>, SubmitError> {
            self.commands.push(command.to_string());
            match &self.fail_on {
                Some(marker) if command.contains(marker.as_str()) => {
                    Err(SubmitError::ExitStatus { code: Some(1) })
                }
                _ => Ok(self.job_ids.then(|| format!("{}.pbsserver", 4240 + self.commands.len()))),
            }
        }
    }

    fn ensemble(beta: &str) -> Ensemble {
        serde_json::from_value(json!({
            "lattice": {"nx": 16, "nt": 32, "beta": beta, "k4": "0.1290", "k6": "0.1308"}
        }))
        .unwrap()
    }

    fn broken_ensemble() -> Ensemble {
        serde_json::from_value(json!({"lattice": {"nx": 16, "nt": 32, "beta": "7.60", "k6": "0.1308"}})).unwrap()
    }

    fn builder() -> CommandBuilder {
        CommandBuilder::new(LaunchConfig::default())
    }

    #[test]
    fn launches_every_ensemble_in_order() {
        let ensembles = vec![ensemble("7.50"), ensemble("7.55")];
        let mut launcher = RecordingLauncher::default();
        let report = submit_all(&ensembles, &builder(), &mut launcher, FailurePolicy::Continue);

        assert_eq!(launcher.commands.len(), 2);
        assert!(launcher.commands[0].ends_with("hmc_7.50_0.1290_0.1308"));
        assert!(launcher.commands[1].ends_with("hmc_7.55_0.1290_0.1308"));
        assert_eq!(report.count(SubmissionState::Submitted), 2);
        assert_eq!(report.failures().count(), 0);
        assert!(report.finished.is_some());
    }

    #[test]
    fn continue_policy_attempts_the_rest() {
        let ensembles = vec![ensemble("7.50"), ensemble("7.55"), ensemble("7.60")];
        let mut launcher = RecordingLauncher { fail_on: Some("7.50".to_string()), ..Default::default() };
        let report = submit_all(&ensembles, &builder(), &mut launcher, FailurePolicy::Continue);

        assert_eq!(launcher.commands.len(), 3);
        assert_eq!(report.count(SubmissionState::Failed), 1);
        assert_eq!(report.count(SubmissionState::Submitted), 2);
        assert_eq!(report.outcomes[0].error.as_deref(), Some("process exited with status 1"));
    }

    #[test]
    fn stop_policy_skips_the_rest() {
        let ensembles = vec![ensemble("7.50"), ensemble("7.55"), ensemble("7.60")];
        let mut launcher = RecordingLauncher { fail_on: Some("7.55".to_string()), ..Default::default() };
        let report = submit_all(&ensembles, &builder(), &mut launcher, FailurePolicy::Stop);

        assert_eq!(launcher.commands.len(), 2);
        let states: Vec<SubmissionState> = report.outcomes.iter().map(|o| o.state).collect();
        assert_eq!(states, vec![SubmissionState::Submitted, SubmissionState::Failed, SubmissionState::Skipped]);
    }

    #[test]
    fn missing_field_never_reaches_launcher() {
        let ensembles = vec![broken_ensemble(), ensemble("7.50")];
        let mut launcher = RecordingLauncher::default();
        let report = submit_all(&ensembles, &builder(), &mut launcher, FailurePolicy::Continue);

        assert_eq!(launcher.commands.len(), 1);
        assert_eq!(report.outcomes[0].state, SubmissionState::Failed);
        assert_eq!(report.outcomes[0].error.as_deref(), Some("missing lattice field 'k4'"));
        assert!(report.outcomes[0].command.is_none());
        assert_eq!(report.outcomes[1].state, SubmissionState::Submitted);
    }

    #[test]
    fn dry_run_records_commands_without_submitting() {
        let ensembles = vec![ensemble("7.50")];
        let mut launcher = DryRunLauncher;
        let report = submit_all(&ensembles, &builder(), &mut launcher, FailurePolicy::Stop);

        assert_eq!(report.count(SubmissionState::DryRun), 1);
        assert_eq!(report.count(SubmissionState::Submitted), 0);
        assert!(report.outcomes[0].command.as_deref().unwrap().starts_with("run_gauge.sh 16 32 7.50 "));
    }

    #[test]
    fn scheduler_job_ids_are_recorded() {
        let ensembles = vec![ensemble("7.50"), ensemble("7.55")];
        let mut launcher = RecordingLauncher { job_ids: true, ..Default::default() };
        let report = submit_all(&ensembles, &builder(), &mut launcher, FailurePolicy::Continue);

        let job_ids: Vec<Option<&str>> = report.outcomes.iter().map(|o| o.job_id.as_deref()).collect();
        assert_eq!(job_ids, vec![Some("4241.pbsserver"), Some("4242.pbsserver")]);
    }

    #[test]
    fn failed_launch_has_no_job_id() {
        let ensembles = vec![ensemble("7.50")];
        let mut launcher = RecordingLauncher { job_ids: true, fail_on: Some("7.50".to_string()), ..Default::default() };
        let report = submit_all(&ensembles, &builder(), &mut launcher, FailurePolicy::Continue);
        assert_eq!(report.outcomes[0].job_id, None);
        assert_eq!(report.outcomes[0].state, SubmissionState::Failed);
    }

    #[test]
    fn empty_ensemble_list() {
        let mut launcher = RecordingLauncher::default();
        let report = submit_all(&[], &builder(), &mut launcher, FailurePolicy::Continue);
        assert!(report.outcomes.is_empty());
        assert!(launcher.commands.is_empty());
    }
}
