use crate::rule::RuleId;
use serde::Serialize;
use std::fmt;

/// Where a rule is in its pipeline for one page load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleState {
    Pending,
    Matched,
    Extracting,
    Applied,
    AwaitingVerification,
    Verified,
    Skipped,
    Failed,
}

impl RuleState {
    /// Whether `next` is a legal step from this state
    pub fn can_advance_to(self, next: RuleState) -> bool {
        use RuleState::*;
        matches!(
            (self, next),
            (Pending, Matched)
                | (Pending, Skipped)
                | (Matched, Extracting)
                | (Extracting, Applied)
                | (Extracting, Failed)
                | (Applied, Verified)
                | (Applied, AwaitingVerification)
                | (Applied, Failed)
                | (AwaitingVerification, Verified)
        )
    }

    /// No further transitions happen during this page load
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RuleState::Verified | RuleState::AwaitingVerification | RuleState::Skipped | RuleState::Failed
        )
    }
}

impl fmt::Display for RuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleState::Pending => "PENDING",
            RuleState::Matched => "MATCHED",
            RuleState::Extracting => "EXTRACTING",
            RuleState::Applied => "APPLIED",
            RuleState::AwaitingVerification => "AWAITING_VERIFICATION",
            RuleState::Verified => "VERIFIED",
            RuleState::Skipped => "SKIPPED",
            RuleState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Outcome of one rule on one page load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub rule_id: RuleId,
    pub state: RuleState,
    /// Title this rule wrote, if it got that far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Why the rule failed or why verification was not recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuleReport {
    pub(crate) fn new(rule_id: RuleId) -> Self {
        Self { rule_id, state: RuleState::Pending, title: None, error: None }
    }

    /// Move to `next`, logging a warning for an out-of-order step
    pub(crate) fn advance(&mut self, next: RuleState) {
        if !self.state.can_advance_to(next) {
            log::warn!("Rule {}: unexpected transition {} -> {}", self.rule_id, self.state, next);
        }
        self.state = next;
    }
}

/// Why a navigation was not processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Page has not finished loading
    NotLoaded,
    /// Browser-internal page
    IgnoredScheme,
}

/// Result of handling one navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<IgnoreReason>,
    /// One entry per stored rule, in store order
    pub rules: Vec<RuleReport>,
}

impl PageReport {
    pub(crate) fn ignored(url: &str, reason: IgnoreReason) -> Self {
        Self { url: url.to_string(), ignored: Some(reason), rules: Vec::new() }
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored.is_some()
    }

    /// Report for a specific rule
    pub fn rule(&self, id: &RuleId) -> Option<&RuleReport> {
        self.rules.iter().find(|report| &report.rule_id == id)
    }

    /// State reached by a specific rule
    pub fn state_of(&self, id: &RuleId) -> Option<RuleState> {
        self.rule(id).map(|report| report.state)
    }

    /// Rules that matched the URL
    pub fn matched(&self) -> impl Iterator<Item = &RuleReport> {
        self.rules.iter().filter(|report| report.state != RuleState::Skipped)
    }

    /// Titles written to the document, in store order
    pub fn applied_titles(&self) -> Vec<&str> {
        self.rules.iter().filter_map(|report| report.title.as_deref()).collect()
    }
}
