//! Chrome DevTools Protocol host for the rule engine
//!
//! Launches or connects to Chrome, loads a URL into a tab and exposes the
//! loaded page as a [`crate::dom::Document`].

pub mod config;
pub mod document;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use document::TabDocument;
pub use session::BrowserSession;
