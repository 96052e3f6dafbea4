use crate::browser::config::{ConnectionOptions, LaunchOptions};
use crate::browser::document::TabDocument;
use crate::error::{RetitleError, Result};
use headless_chrome::{Browser, Tab};
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// Browser session that owns a Chrome/Chromium instance and one working tab
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// Tab that pages are loaded into
    tab: Arc<Tab>,

    /// Poll interval handed to attached documents
    mutation_poll_interval: Duration,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Pages may take a while to hydrate; keep the browser alive meanwhile
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| RetitleError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| RetitleError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser, tab, mutation_poll_interval: options.mutation_poll_interval })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect(options.ws_url).map_err(|e| RetitleError::ConnectionFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| RetitleError::ConnectionFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser, tab, mutation_poll_interval: options.mutation_poll_interval })
    }

    /// The working tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate the working tab and wait for the load to finish, returning the final URL
    pub fn navigate(&self, url: &str) -> Result<String> {
        self.tab
            .navigate_to(url)
            .map_err(|e| RetitleError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| RetitleError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(self.tab.get_url())
    }

    /// Attach a [`TabDocument`] to the page currently loaded in the working tab
    pub async fn document(&self) -> Result<TabDocument> {
        TabDocument::attach(self.tab.clone(), self.mutation_poll_interval).await
    }

    /// Close the working tab; the browser exits when the session is dropped
    pub fn close(&self) -> Result<()> {
        self.tab
            .close(true)
            .map_err(|e| RetitleError::NavigationFailed(format!("Failed to close tab: {}", e)))?;
        Ok(())
    }
}
