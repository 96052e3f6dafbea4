//! # tab-retitle
//!
//! Rewrites page titles from user-defined rules. A rule names a URL condition,
//! a set of CSS selectors and a title template; when a page matching the
//! condition has loaded, the text behind each selector is dropped into the
//! template's `{{placeholders}}` and the result becomes the page title.
//!
//! ## Features
//!
//! - **Rule Engine**: matches rules against a navigation, drives extraction and title updates
//! - **Content Extraction**: waits (optionally bounded) for dynamic content before reading it
//! - **Verification Flow**: asks the user to confirm new titles once, then applies them silently
//! - **Rule Stores**: in-memory and JSON file stores with atomic per-rule updates
//! - **Chrome Host**: runs the engine against a live tab via the Chrome DevTools Protocol
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tab_retitle::{EngineConfig, MemoryDocument, MemoryRuleStore, NavigationEvent, RuleDraft, RuleEngine};
//! use tab_retitle::engine::{PromptChoice, RecordingEditor, ScriptedPrompt};
//! use tab_retitle::dom::ElementNode;
//!
//! # async fn run() -> tab_retitle::Result<()> {
//! let rule = RuleDraft::new("contains", "example.com/orders", "Order {{order}}")
//!     .selector("order", "#order-id")
//!     .into_rule()?;
//!
//! let engine = RuleEngine::new(
//!     Arc::new(MemoryRuleStore::with_rules(vec![rule])),
//!     Arc::new(ScriptedPrompt::always(PromptChoice::Confirm)),
//!     Arc::new(RecordingEditor::new()),
//!     EngineConfig::default(),
//! );
//!
//! let page = MemoryDocument::with_body(
//!     "Orders",
//!     ElementNode::new("body").with_child(ElementNode::new("span").with_id("order-id").with_text("42")),
//! );
//! let report = engine.on_navigation(&NavigationEvent::complete("https://example.com/orders/42"), &page).await?;
//! assert_eq!(report.applied_titles(), vec!["Order 42"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`rule`]: rule records, selector sets and authoring validation
//! - [`matcher`]: URL conditions
//! - [`template`]: `{{placeholder}}` expansion
//! - [`dom`]: the document interface and an in-memory document
//! - [`extractor`]: wait-then-extract for a rule's selectors
//! - [`engine`]: the per-navigation orchestrator and verification flow
//! - [`store`]: rule persistence, import and export
//! - [`browser`]: Chrome session and live-tab document
//! - [`config`]: engine configuration
//! - [`error`]: error types and result aliases

pub mod browser;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod matcher;
pub mod rule;
pub mod store;
pub mod template;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions, TabDocument};
pub use config::{EngineConfig, ExtractorOptions, LogConfig};
pub use dom::{Document, MemoryDocument};
pub use engine::{NavigationEvent, PageReport, RuleEngine, RuleState};
pub use error::{RetitleError, Result};
pub use extractor::ContentExtractor;
pub use rule::{MatchType, Rule, RuleDraft, RuleId, RuleSummary, SelectorSet};
pub use store::{JsonFileRuleStore, MemoryRuleStore, RuleStore};
