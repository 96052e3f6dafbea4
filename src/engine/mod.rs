//! Rule engine: runs the stored rules against a freshly loaded page
//!
//! For every navigation that finished loading, the engine:
//! 1. loads the rules from the [`RuleStore`]
//! 2. keeps the ones whose URL condition holds
//! 3. for each, waits for its selectors, renders its template and sets the title
//! 4. asks the user to confirm titles of rules that are not verified yet
//!
//! Matched rules run concurrently on the calling task. Extraction waits finish
//! in whatever order the page allows, but title writes are ordered: a rule
//! never overwrites the title of a rule that comes after it in the store, so
//! the last matching rule in store order has the final say.

pub mod prompt;
pub mod state;

pub use prompt::{PromptChoice, RecordingEditor, RuleEditor, ScriptedPrompt, VerificationPrompt};
pub use state::{IgnoreReason, PageReport, RuleReport, RuleState};

use crate::config::EngineConfig;
use crate::dom::Document;
use crate::error::Result;
use crate::extractor::ContentExtractor;
use crate::rule::Rule;
use crate::store::RuleStore;
use crate::template;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Serializes title writes within one navigation
///
/// Holds the 1-based store position of the rule whose title is on the page,
/// 0 while no rule has written yet.
#[derive(Debug, Default)]
struct TitleGate {
    latest: Mutex<usize>,
}

/// A page finished (or started) loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub url: String,
    pub load_complete: bool,
}

impl NavigationEvent {
    /// Navigation whose page has finished loading
    pub fn complete(url: impl Into<String>) -> Self {
        Self { url: url.into(), load_complete: true }
    }

    /// Navigation still in progress
    pub fn loading(url: impl Into<String>) -> Self {
        Self { url: url.into(), load_complete: false }
    }
}

/// Applies title rules to pages
pub struct RuleEngine {
    store: Arc<dyn RuleStore>,
    prompt: Arc<dyn VerificationPrompt>,
    editor: Arc<dyn RuleEditor>,
    extractor: ContentExtractor,
    config: EngineConfig,
}

impl RuleEngine {
    pub fn new(
        store: Arc<dyn RuleStore>,
        prompt: Arc<dyn VerificationPrompt>,
        editor: Arc<dyn RuleEditor>,
        config: EngineConfig,
    ) -> Self {
        let extractor = ContentExtractor::new(config.extractor, config.log);
        Self { store, prompt, editor, extractor, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    /// Rules whose URL condition holds for `url`, in store order
    pub async fn matching_rules(&self, url: &str) -> Result<Vec<Rule>> {
        Ok(self.store.load().await?.into_iter().filter(|rule| rule.matches_url(url)).collect())
    }

    /// Cheap check before attaching to a page at all
    pub async fn has_matching_rule(&self, url: &str) -> Result<bool> {
        if self.config.is_ignored(url) {
            return Ok(false);
        }
        Ok(self.store.load().await?.iter().any(|rule| rule.matches_url(url)))
    }

    /// Handle one navigation against `document`
    ///
    /// Fails only when the rules cannot be loaded; per-rule failures are
    /// recorded in the report and do not affect other rules.
    pub async fn on_navigation(&self, event: &NavigationEvent, document: &dyn Document) -> Result<PageReport> {
        if !event.load_complete {
            return Ok(PageReport::ignored(&event.url, IgnoreReason::NotLoaded));
        }
        if self.config.is_ignored(&event.url) {
            self.config.log.emit(format_args!("Ignoring internal page {}", event.url));
            return Ok(PageReport::ignored(&event.url, IgnoreReason::IgnoredScheme));
        }

        let rules = self.store.load().await.inspect_err(|e| {
            log::error!("Error loading rules from storage: {}", e);
        })?;
        self.config.log.emit(format_args!("Current URL: {} ({} rules)", event.url, rules.len()));

        let gate = TitleGate::default();
        let runs = rules.iter().enumerate().map(|(index, rule)| self.run_rule(rule, index, &event.url, document, &gate));
        let reports = join_all(runs).await;

        Ok(PageReport { url: event.url.clone(), ignored: None, rules: reports })
    }

    async fn run_rule(
        &self,
        rule: &Rule,
        index: usize,
        url: &str,
        document: &dyn Document,
        gate: &TitleGate,
    ) -> RuleReport {
        let mut report = RuleReport::new(rule.id.clone());

        if !rule.matches_url(url) {
            report.advance(RuleState::Skipped);
            return report;
        }
        report.advance(RuleState::Matched);

        report.advance(RuleState::Extracting);
        let values = match self.extractor.wait_and_extract(document, &rule.selectors).await {
            Ok(values) => values,
            Err(e) => {
                log::error!("Error processing rule {}: {}", rule.id, e);
                report.error = Some(e.to_string());
                report.advance(RuleState::Failed);
                return report;
            }
        };

        let title = template::render(&rule.title_change, &values);
        let unresolved = template::unresolved(&title);
        if !unresolved.is_empty() {
            log::warn!("Rule {} left placeholders unresolved: {:?}", rule.id, unresolved);
        }

        {
            let mut latest = gate.latest.lock().await;
            if *latest > index + 1 {
                self.config.log.emit(format_args!("Rule {} finished after a later rule; keeping its title", rule.id));
            } else {
                if let Err(e) = document.set_title(&title).await {
                    log::error!("Error setting title for rule {}: {}", rule.id, e);
                    report.error = Some(e.to_string());
                    report.advance(RuleState::Failed);
                    return report;
                }
                *latest = index + 1;
                self.config.log.emit(format_args!("Set new page title: {}", title));
            }
        }
        report.title = Some(title.clone());
        report.advance(RuleState::Applied);

        if rule.verified_title {
            report.advance(RuleState::Verified);
            return report;
        }

        report.advance(RuleState::AwaitingVerification);
        self.verify(rule, &title, &mut report).await;
        report
    }

    async fn verify(&self, rule: &Rule, title: &str, report: &mut RuleReport) {
        match self.prompt.ask(title, &rule.id).await {
            PromptChoice::Confirm => match self.store.mark_verified(&rule.id).await {
                Ok(()) => {
                    self.config.log.emit(format_args!("Title marked as verified: {}", title));
                    report.advance(RuleState::Verified);
                }
                Err(e) => {
                    log::error!("Error saving verification state for rule {}: {}", rule.id, e);
                    report.error = Some(e.to_string());
                }
            },
            PromptChoice::ReportProblem => {
                self.config.log.emit(format_args!("User reported title issue for rule {}", rule.id));
                if let Err(e) = self.editor.open(&rule.id).await {
                    log::error!("Error opening editor for rule {}: {}", rule.id, e);
                    report.error = Some(e.to_string());
                }
            }
            PromptChoice::Dismissed => {
                self.config.log.emit(format_args!("Verification prompt dismissed for rule {}", rule.id));
            }
        }
    }
}
