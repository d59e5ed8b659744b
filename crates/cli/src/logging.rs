// Log output setup.
//
// Library crates log through the `log` facade; the subscriber installed here
// picks those records up via tracing-subscriber's log bridge.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Where log lines go.
pub enum LogTarget<'a> {
    /// Standard error (headless commands)
    Stderr,
    /// Append to a file
    File(&'a Path),
    /// Discard (interactive UI without `--log-file`; the terminal belongs to the UI)
    Off,
}

/// Install the global subscriber. `level` is a filter directive such as
/// "warn" or "tesisview_core=debug,info".
pub fn init(level: &str, target: LogTarget<'_>) -> Result<(), String> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| format!("invalid log level \"{}\": {}", level, e))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("cannot open log file {}: {}", path.display(), e))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
    };

    installed.map_err(|e| format!("failed to install logger: {}", e))
}
