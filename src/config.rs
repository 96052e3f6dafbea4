use std::fmt;
use std::time::Duration;

/// Diagnostic logging switch handed to each component at construction
///
/// Errors and template anomalies are always logged; this only gates the
/// step-by-step trace of what the engine is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Emit diagnostic trace lines
    pub enabled: bool,

    /// Level the trace lines are logged at
    pub level: log::Level,
}

impl LogConfig {
    /// Trace logging turned off
    pub fn disabled() -> Self {
        Self { enabled: false, level: log::Level::Debug }
    }

    /// Trace logging at the given level
    pub fn at(level: log::Level) -> Self {
        Self { enabled: true, level }
    }

    /// Log a trace line if enabled
    pub fn emit(&self, args: fmt::Arguments<'_>) {
        if self.enabled {
            log::log!(self.level, "[retitle] {}", args);
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Options for the content extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractorOptions {
    /// Upper bound on the wait for all selectors to resolve; `None` waits for as long as the page lives
    pub timeout: Option<Duration>,
}

impl ExtractorOptions {
    /// Bounded wait
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout: Some(timeout) }
    }

    /// Wait until the page goes away
    pub fn unbounded() -> Self {
        Self { timeout: None }
    }
}

/// Configuration for the rule engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// URL prefixes the engine never touches (browser-internal pages)
    pub ignored_schemes: Vec<String>,

    /// How content extraction waits for dynamic pages
    pub extractor: ExtractorOptions,

    /// Diagnostic logging
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ignored_schemes: vec!["chrome://".to_string(), "chrome-extension://".to_string()],
            extractor: ExtractorOptions::default(),
            log: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new EngineConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a scheme prefix to ignore
    pub fn ignore_scheme(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_schemes.push(prefix.into());
        self
    }

    /// Builder method: replace the ignored scheme list
    pub fn ignored_schemes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_schemes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method: bound the wait for selectors
    pub fn extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extractor.timeout = Some(timeout);
        self
    }

    /// Builder method: set logging
    pub fn log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Whether the engine should leave this URL alone
    pub fn is_ignored(&self, url: &str) -> bool {
        self.ignored_schemes.iter().any(|prefix| url.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ignores_browser_pages() {
        let config = EngineConfig::default();
        assert!(config.is_ignored("chrome://settings"));
        assert!(config.is_ignored("chrome-extension://abcdef/options.html"));
        assert!(!config.is_ignored("https://example.com/chrome://"));
        assert!(config.extractor.timeout.is_none());
        assert!(!config.log.enabled);
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new()
            .ignored_schemes(["about:"])
            .ignore_scheme("edge://")
            .extraction_timeout(Duration::from_secs(5))
            .log(LogConfig::at(log::Level::Info));

        assert!(config.is_ignored("about:blank"));
        assert!(config.is_ignored("edge://flags"));
        assert!(!config.is_ignored("chrome://settings"));
        assert_eq!(config.extractor.timeout, Some(Duration::from_secs(5)));
        assert!(config.log.enabled);
        assert_eq!(config.log.level, log::Level::Info);
    }
}
