//! Persistence for the ordered rule collection
//!
//! Rules are kept in insertion order. Edits replace in place and deletes remove
//! by position, so the order a user sees never reshuffles.
//!
//! Every mutation goes through [`RuleStore::modify`], which implementations
//! must run atomically with respect to other calls on the same store. That
//! closes the lost-update window of a plain `load` then `save` cycle.

pub mod file;
pub mod memory;
pub mod transfer;

pub use file::JsonFileRuleStore;
pub use memory::MemoryRuleStore;
pub use transfer::{export_rules, import_rules};

use crate::error::{RetitleError, Result};
use crate::rule::{Rule, RuleDraft, RuleId};
use async_trait::async_trait;

/// An edit applied to the full rule list inside one atomic store operation
///
/// Returning an error aborts the edit and nothing is written.
pub type RuleEdit<'a> = Box<dyn for<'r> FnOnce(&'r mut Vec<Rule>) -> Result<()> + Send + 'a>;

/// An edit applied to a single rule
pub type RuleUpdate<'a> = Box<dyn for<'r> FnOnce(&'r mut Rule) + Send + 'a>;

#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Read all rules in stored order
    async fn load(&self) -> Result<Vec<Rule>>;

    /// Overwrite the stored rules
    async fn save(&self, rules: Vec<Rule>) -> Result<()>;

    /// Atomically read, edit and write back the rule list
    async fn modify(&self, edit: RuleEdit<'_>) -> Result<()>;

    /// Atomically edit the rule with the given id, wherever it currently sits
    async fn update_rule(&self, id: &RuleId, update: RuleUpdate<'_>) -> Result<()> {
        self.modify(Box::new(move |rules: &mut Vec<Rule>| {
            let rule = rules
                .iter_mut()
                .find(|rule| &rule.id == id)
                .ok_or_else(|| RetitleError::RuleNotFound(id.to_string()))?;
            update(rule);
            Ok(())
        }))
        .await
    }

    /// Record that the user confirmed the rule's title
    async fn mark_verified(&self, id: &RuleId) -> Result<()> {
        self.update_rule(id, Box::new(|rule: &mut Rule| rule.verified_title = true)).await
    }

    /// Append a rule
    async fn add(&self, rule: Rule) -> Result<()> {
        self.modify(Box::new(move |rules: &mut Vec<Rule>| {
            if rules.iter().any(|existing| existing.id == rule.id) {
                return Err(RetitleError::StoreWrite(format!("duplicate rule id {}", rule.id)));
            }
            rules.push(rule);
            Ok(())
        }))
        .await
    }

    /// Validate a draft and replace the rule with the given id in place, keeping its id
    async fn edit(&self, id: &RuleId, draft: RuleDraft) -> Result<Rule> {
        let mut edited = None;
        let slot = &mut edited;
        self.modify(Box::new(move |rules: &mut Vec<Rule>| {
            let rule = rules
                .iter_mut()
                .find(|rule| &rule.id == id)
                .ok_or_else(|| RetitleError::RuleNotFound(id.to_string()))?;
            *rule = draft.apply_to(rule)?;
            *slot = Some(rule.clone());
            Ok(())
        }))
        .await?;
        edited.ok_or_else(|| RetitleError::RuleNotFound(id.to_string()))
    }

    /// Remove the rule at `index`, returning it
    async fn remove_at(&self, index: usize) -> Result<Rule> {
        let mut removed = None;
        let slot = &mut removed;
        self.modify(Box::new(move |rules: &mut Vec<Rule>| {
            if index >= rules.len() {
                return Err(RetitleError::RuleIndexOutOfRange { index, len: rules.len() });
            }
            *slot = Some(rules.remove(index));
            Ok(())
        }))
        .await?;
        removed.ok_or(RetitleError::RuleIndexOutOfRange { index, len: 0 })
    }

    /// Find a rule by id
    async fn find(&self, id: &RuleId) -> Result<Option<Rule>> {
        Ok(self.load().await?.into_iter().find(|rule| &rule.id == id))
    }
}
