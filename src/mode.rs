use std::fmt;
use clap::ValueEnum;

/// How a built command reaches the run script
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum SubmissionMode {
    /// Call the run script directly with positional arguments
    Direct,
    /// Wrap the run script in a qsub submission, arguments passed with -F
    Scheduler,
}

impl fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SubmissionMode::Direct => write!(f, "direct"),
            SubmissionMode::Scheduler => write!(f, "scheduler")
        }
    }
}

/// Rule used to derive the stream (job) name when no scheduler parameters are given
///
/// The launch scripts historically used two incompatible rules, neither is canonical:
/// - script style: `hmc_7.50_0.1290_0.1308`
/// - derived style: `g7_50_1290_1308`
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum StreamNamePolicy {
    ScriptStyle,
    DerivedStyle,
}

impl fmt::Display for StreamNamePolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StreamNamePolicy::ScriptStyle => write!(f, "script-style"),
            StreamNamePolicy::DerivedStyle => write!(f, "derived-style")
        }
    }
}

/// What the driver does after an ensemble fails to build or submit
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and attempt the remaining ensembles
    Continue,
    /// Record the failure and skip the remaining ensembles
    Stop,
}
