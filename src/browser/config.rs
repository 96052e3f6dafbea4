use std::path::PathBuf;
use std::time::Duration;

/// Options for launching a new browser instance
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window
    pub headless: bool,

    /// Browser window width in pixels
    pub window_width: u32,

    /// Browser window height in pixels
    pub window_height: u32,

    /// Path to a Chrome/Chromium binary (auto-detected when `None`)
    pub chrome_path: Option<PathBuf>,

    /// Persistent profile directory
    pub user_data_dir: Option<PathBuf>,

    /// Enable the Chrome sandbox
    pub sandbox: bool,

    /// How often the page's change counter is polled
    pub mutation_poll_interval: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 800,
            chrome_path: None,
            user_data_dir: None,
            sandbox: true,
            mutation_poll_interval: Duration::from_millis(100),
        }
    }
}

impl LaunchOptions {
    /// Create new LaunchOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Builder method: set window size
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Builder method: set Chrome binary path
    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    /// Builder method: set user data directory
    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    /// Builder method: set sandbox mode
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Builder method: set the change-counter poll interval
    pub fn mutation_poll_interval(mut self, interval: Duration) -> Self {
        self.mutation_poll_interval = interval;
        self
    }
}

/// Options for connecting to an already running browser
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// DevTools WebSocket URL
    pub ws_url: String,

    /// Connection timeout in milliseconds
    pub timeout: u64,

    /// How often the page's change counter is polled
    pub mutation_poll_interval: Duration,
}

impl ConnectionOptions {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            timeout: 30_000,
            mutation_poll_interval: Duration::from_millis(100),
        }
    }

    /// Builder method: set connection timeout
    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_options_builder() {
        let opts = LaunchOptions::new()
            .headless(false)
            .window_size(800, 600)
            .sandbox(false)
            .mutation_poll_interval(Duration::from_millis(25));

        assert!(!opts.headless);
        assert_eq!(opts.window_width, 800);
        assert_eq!(opts.window_height, 600);
        assert!(!opts.sandbox);
        assert_eq!(opts.mutation_poll_interval, Duration::from_millis(25));
    }

    #[test]
    fn test_connection_options() {
        let opts = ConnectionOptions::new("ws://localhost:9222").timeout(5000);

        assert_eq!(opts.ws_url, "ws://localhost:9222");
        assert_eq!(opts.timeout, 5000);
    }
}
