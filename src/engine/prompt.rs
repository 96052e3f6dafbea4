use crate::rule::RuleId;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// What the user answered when asked whether an applied title looks right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    /// "Looks good"
    Confirm,
    /// "Something's wrong"; the rule should be opened for editing
    ReportProblem,
    /// The prompt went away without an answer
    Dismissed,
}

/// Surface that asks the user to confirm a freshly applied title
#[async_trait]
pub trait VerificationPrompt: Send + Sync {
    async fn ask(&self, title: &str, rule_id: &RuleId) -> PromptChoice;
}

/// Entry point that opens the rule editor on a specific rule
#[async_trait]
pub trait RuleEditor: Send + Sync {
    async fn open(&self, rule_id: &RuleId) -> crate::Result<()>;
}

/// Prompt that answers from a fixed script and records what it was shown
///
/// Once the script runs out every further prompt gets the fallback answer.
#[derive(Debug)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<PromptChoice>>,
    fallback: PromptChoice,
    shown: Mutex<Vec<(String, RuleId)>>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = PromptChoice>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            fallback: PromptChoice::Dismissed,
            shown: Mutex::new(Vec::new()),
        }
    }

    /// Always answer `choice`
    pub fn always(choice: PromptChoice) -> Self {
        Self { fallback: choice, ..Self::new([]) }
    }

    /// (title, rule id) pairs shown so far
    pub fn shown(&self) -> Vec<(String, RuleId)> {
        self.shown.lock().map(|shown| shown.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VerificationPrompt for ScriptedPrompt {
    async fn ask(&self, title: &str, rule_id: &RuleId) -> PromptChoice {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push((title.to_string(), rule_id.clone()));
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .unwrap_or(self.fallback)
    }
}

/// Editor hand-off that only records which rules were reported
#[derive(Debug, Default)]
pub struct RecordingEditor {
    opened: Mutex<Vec<RuleId>>,
}

impl RecordingEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<RuleId> {
        self.opened.lock().map(|opened| opened.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RuleEditor for RecordingEditor {
    async fn open(&self, rule_id: &RuleId) -> crate::Result<()> {
        log::info!("Rule {} reported as rendering incorrectly", rule_id);
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(rule_id.clone());
        }
        Ok(())
    }
}
