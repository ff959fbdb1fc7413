use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Verbose,
    Debug,
    Info,
    #[value(alias = "warn")]
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    fn priority(self) -> u8 {
        match self {
            LogLevel::Trace => 0,
            LogLevel::Verbose => 1,
            LogLevel::Debug => 2,
            LogLevel::Info => 3,
            LogLevel::Warning => 4,
            LogLevel::Error => 5,
            LogLevel::Critical => 6,
        }
    }

    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Verbose | LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }

    /// Filter for our crates plus a floor of `warn` for the AWS and HTTP stacks,
    /// which are very chatty at debug.
    pub fn filter_directives(self) -> String {
        if self == LogLevel::Trace {
            return "trace".to_string();
        }
        let deps = if self.priority() < LogLevel::Warning.priority() {
            LogLevel::Warning.as_directive()
        } else {
            self.as_directive()
        };
        format!(
            "{0},aws_config={1},aws_smithy_runtime={1},aws_smithy_runtime_api={1},hyper={1},hyper_util={1},reqwest={1},rustls={1}",
            self.as_directive(),
            deps
        )
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub json_output: bool,
    pub json_only: bool,
}

/// Installs the global subscriber on stderr. `--json-only` without
/// `--json-output` silences logging so stdout/stderr stay machine-readable.
pub fn init(config: LoggerConfig) {
    if config.json_only && !config.json_output {
        return;
    }
    let filter = EnvFilter::new(config.level.filter_directives());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = if config.json_output {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiets_dependencies_below_warning() {
        let directives = LogLevel::Debug.filter_directives();
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("aws_smithy_runtime=warn"));
    }

    #[test]
    fn error_level_applies_everywhere() {
        let directives = LogLevel::Critical.filter_directives();
        assert!(directives.starts_with("error,"));
        assert!(directives.contains("hyper=error"));
        assert!(!directives.contains("warn"));
    }

    #[test]
    fn trace_is_unfiltered() {
        assert_eq!(LogLevel::Trace.filter_directives(), "trace");
    }
}
