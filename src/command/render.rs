use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::command::{BuildError, LaunchConfig};
use crate::ensemble::params::SchedulerParams;
use crate::mode::SubmissionMode;

/// included direct launch template
static DIRECT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/direct.txt"));

/// included qsub template, the payload goes inside -F "..."
static QSUB: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/qsub.txt"));

/// Rendering context for both templates
#[derive(Serialize)]
struct CommandContext<'a> {
    qsub: &'a str,
    allocation: &'a str,
    stream: &'a str,
    script: &'a str,
    args: &'a str,
}

/// Render the command line for the configured submission mode
///
/// Values are inserted unescaped: the command goes to a shell, not a web page.
pub fn render_command(config: &LaunchConfig, scheduler: &SchedulerParams, args: &str) -> Result<String, BuildError> {
    // editors like to leave a newline at the end of template files
    let (name, template) = match config.mode {
        SubmissionMode::Direct => ("direct", DIRECT.trim_end()),
        SubmissionMode::Scheduler => ("qsub", QSUB.trim_end()),
    };

    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template(name, template)
        .map_err(|err| BuildError::RenderError(err.to_string()))?;

    let context = CommandContext {
        qsub: &config.qsub,
        allocation: &scheduler.allocation,
        stream: &scheduler.stream,
        script: &config.script,
        args,
    };

    tt.render(name, &context)
        .map_err(|err| BuildError::RenderError(err.to_string()))
}
