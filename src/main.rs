use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use crate::command::{CommandBuilder, LaunchConfig};
use crate::ensemble::read::EnsembleSource;
use crate::mode::{FailurePolicy, StreamNamePolicy, SubmissionMode};
use crate::submit::driver::submit_all;
use crate::submit::launch::{DryRunLauncher, ShellLauncher};
use crate::submit::report::SubmissionReport;

mod command;
mod ensemble;
mod mode;
mod submit;

/// Launch lattice QCD streams, one per ensemble, directly or through qsub
#[derive(Parser, Debug)]
#[command(name = "qcdlaunch", version, about, long_about = None)]
struct Args {
    /// JSON file listing the ensembles to launch
    #[arg(short, long)]
    input: PathBuf,
    /// Run the script directly or submit it with qsub
    #[arg(short, long, value_enum, default_value_t = SubmissionMode::Direct)]
    mode: SubmissionMode,
    /// Rule for deriving the stream name (qsub -N) when an ensemble doesn't set one
    #[arg(long, value_enum, default_value_t = StreamNamePolicy::ScriptStyle)]
    stream_name: StreamNamePolicy,
    /// Parent directory of each stream's rootstore
    #[arg(long, default_value = "/lqcdproj/multirep/wjay")]
    store_root: String,
    /// Run script that receives the positional arguments
    #[arg(long, default_value = "run_gauge.sh")]
    script: String,
    /// Allocation charged for scheduler jobs (qsub -A)
    #[arg(long, default_value = "multirep")]
    allocation: String,
    /// Scheduler submission binary
    #[arg(long, default_value = "qsub")]
    qsub: String,
    /// Print commands without running them
    #[arg(long)]
    dry_run: bool,
    /// Stop at the first ensemble that fails instead of trying the rest
    #[arg(long)]
    fail_fast: bool,
    /// Write a JSON submission report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    fn launch_config(&self) -> LaunchConfig {
        LaunchConfig {
            mode: self.mode,
            stream_policy: self.stream_name,
            store_root: self.store_root.clone(),
            script: self.script.clone(),
            allocation: self.allocation.clone(),
            qsub: self.qsub.clone(),
        }
    }

    fn failure_policy(&self) -> FailurePolicy {
        match self.fail_fast {
            true => FailurePolicy::Stop,
            false => FailurePolicy::Continue,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    info!("starting up :)");

    let args = Args::parse();
    info!("Mode {}, stream names {}", args.mode, args.stream_name);

    let source = EnsembleSource::new(&args.input)?;
    let ensembles = source.read()
        .with_context(|| format!("Loading ensembles from {}", args.input.display()))?;

    let builder = CommandBuilder::new(args.launch_config());
    let policy = args.failure_policy();

    let report = match args.dry_run {
        true => {
            info!("--dry-run set, commands will only be printed");
            submit_all(&ensembles, &builder, &mut DryRunLauncher, policy)
        }
        false => submit_all(&ensembles, &builder, &mut ShellLauncher::for_mode(args.mode), policy),
    };

    finish(&args, &report)
}

fn finish(args: &Args, report: &SubmissionReport) -> Result<()> {
    report.summarise();

    if let Some(path) = &args.report {
        report.write(path)
            .with_context(|| format!("Writing submission report to {}", path.display()))?;
    }

    if report.has_failures() {
        warn!("Some ensembles failed, see above");
        bail!("{} of {} ensemble(s) failed", report.failures().count(), report.outcomes.len());
    }

    info!("All done, bye :)");
    Ok(())
}
