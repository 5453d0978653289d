use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{info, warn};

use crate::mode::SubmissionMode;

#[derive(Debug)]
pub enum SubmitError {
    /// The process couldn't be started at all
    Launch(String),
    /// The process ran and exited non-zero, `None` if it was killed by a signal
    ExitStatus { code: Option<i32> },
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SubmitError::Launch(err) => write!(f, "failed to launch process: {err}"),
            SubmitError::ExitStatus { code: Some(code) } => write!(f, "process exited with status {code}"),
            SubmitError::ExitStatus { code: None } => write!(f, "process terminated by signal"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Something that can run a complete command line
pub trait Launcher {
    /// Whether launching actually runs anything (false for dry runs)
    fn executes(&self) -> bool {
        true
    }

    /// Run the command, returning the scheduler job id when one is known
    fn launch(&mut self, command: &str) -> Result<Option<String>, SubmitError>;
}

/// Runs command lines through `sh -c`, like typing them at a prompt
///
/// A shell is needed because scheduler commands carry their payload as one quoted argument.
/// The child shares our stdin and stderr. Its stdout is passed straight through too, except when
/// submitting to the scheduler: then the (short) qsub output is read, echoed and kept as the job id.
pub struct ShellLauncher {
    pub shell: PathBuf,
    pub capture_job_id: bool,
}

impl ShellLauncher {
    pub fn for_mode(mode: SubmissionMode) -> ShellLauncher {
        ShellLauncher {
            capture_job_id: mode == SubmissionMode::Scheduler,
            ..ShellLauncher::default()
        }
    }

    fn run_captured(&self, cmd: &mut Command) -> Result<Option<String>, SubmitError> {
        let output = cmd.stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|err| self.launch_error(err))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        print!("{stdout}");
        check_status(output.status)?;

        let job_id = stdout.trim();
        match job_id.is_empty() {
            true => {
                warn!("Scheduler accepted the job but printed no job id");
                Ok(None)
            }
            false => {
                info!("Scheduler job id: {job_id}");
                Ok(Some(job_id.to_string()))
            }
        }
    }

    fn run_inherited(&self, cmd: &mut Command) -> Result<Option<String>, SubmitError> {
        let status = cmd.status().map_err(|err| self.launch_error(err))?;
        check_status(status)?;
        Ok(None)
    }

    fn launch_error(&self, err: std::io::Error) -> SubmitError {
        warn!("Can't start {}: {}", self.shell.display(), err);
        SubmitError::Launch(err.to_string())
    }
}

fn check_status(status: std::process::ExitStatus) -> Result<(), SubmitError> {
    match status.success() {
        true => Ok(()),
        false => {
            warn!("Launch process failed with {status}");
            Err(SubmitError::ExitStatus { code: status.code() })
        }
    }
}

impl Default for ShellLauncher {
    fn default() -> Self {
        ShellLauncher { shell: PathBuf::from("/bin/sh"), capture_job_id: false }
    }
}

impl Launcher for ShellLauncher {
    fn launch(&mut self, command: &str) -> Result<Option<String>, SubmitError> {
        let mut process = Command::new(&self.shell);
        let cmd = process.arg("-c").arg(command);
        info!("Running launch process");
        info!("{:?}", &cmd);

        match self.capture_job_id {
            true => self.run_captured(cmd),
            false => self.run_inherited(cmd),
        }
    }
}

/// Logs commands instead of running them
#[derive(Debug, Default)]
pub struct DryRunLauncher;

impl Launcher for DryRunLauncher {
    fn executes(&self) -> bool {
        false
    }

    fn launch(&mut self, command: &str) -> Result<Option<String>, SubmitError> {
        info!("--dry-run set, not running: {command}");
        Ok(None)
    }
}
