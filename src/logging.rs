use std::env;

use crate::interface::cli::DemoConfig;

/// Filter used when nothing else picks one.
const DEFAULT_FILTER: &str = "info";

/// What the log filter is built from. Filters use the `env_logger` syntax, e.g.
/// `"info,glkit::trace=debug"`.
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    /// `--log`, which beats everything else.
    pub filter: Option<String>,
    /// Set for demos that trace their OpenGL calls, so the trace shows without extra flags.
    pub trace_level: Option<log::Level>,
}

impl LogSettings {
    pub fn for_demo(config: &DemoConfig) -> Self {
        Self {
            filter: config.log_filter.clone(),
            trace_level: config.demo.trace_level(),
        }
    }

    /// `--log`, then `RUST_LOG`, then the call trace at its level on top of `info`, then `info`.
    pub fn resolve(&self, rust_log: Option<&str>) -> String {
        if let Some(filter) = self.filter.as_deref().or(rust_log) {
            return filter.to_string();
        }
        match self.trace_level {
            Some(level) => format!("{},glkit::trace={}", DEFAULT_FILTER, level.as_str().to_lowercase()),
            None => DEFAULT_FILTER.to_string(),
        }
    }
}

/// Installs the global logger. Only the first call has any effect.
pub fn init_logging(settings: &LogSettings) {
    let rust_log = env::var("RUST_LOG").ok();
    let filter = settings.resolve(rust_log.as_deref());

    let installed = env_logger::Builder::new()
        .parse_filters(&filter)
        .format_timestamp_millis()
        .try_init();

    match installed {
        Ok(()) => log::debug!("logging with filter `{}`", filter),
        Err(_) => log::debug!("logger already installed, ignoring `{}`", filter),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn traced(level: log::Level) -> LogSettings {
        LogSettings { filter: None, trace_level: Some(level) }
    }

    #[test]
    fn plain_demos_log_at_info() {
        assert_eq!(LogSettings::default().resolve(None), "info");
    }

    #[test]
    fn traced_demo_shows_its_calls_by_default() {
        assert_eq!(traced(log::Level::Debug).resolve(None), "info,glkit::trace=debug");
        assert_eq!(traced(log::Level::Trace).resolve(None), "info,glkit::trace=trace");
    }

    #[test]
    fn rust_log_beats_the_trace_default() {
        assert_eq!(traced(log::Level::Debug).resolve(Some("warn")), "warn");
    }

    #[test]
    fn explicit_filter_beats_rust_log() {
        let settings = LogSettings { filter: Some(String::from("error")), trace_level: Some(log::Level::Info) };
        assert_eq!(settings.resolve(Some("warn")), "error");
    }

    #[test]
    fn settings_follow_the_command_line() {
        let config = crate::interface::cli::parse_from(["glsteps", "traced", "--trace-level", "info"]).unwrap();
        let settings = LogSettings::for_demo(&config);
        assert_eq!(settings.filter, None);
        assert_eq!(settings.resolve(None), "info,glkit::trace=info");

        let config = crate::interface::cli::parse_from(["glsteps", "--log", "debug", "cube"]).unwrap();
        assert_eq!(LogSettings::for_demo(&config).resolve(None), "debug");
    }
}
