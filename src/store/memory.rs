use crate::error::{RetitleError, Result};
use crate::rule::Rule;
use crate::store::{RuleEdit, RuleStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Rule store held in memory
///
/// Read and write failures can be switched on to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: Mutex<Vec<Rule>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules: Mutex::new(rules), ..Self::default() }
    }

    /// Make subsequent reads fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RetitleError::StoreRead("memory store read disabled".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RetitleError::StoreWrite("memory store write disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn load(&self) -> Result<Vec<Rule>> {
        self.check_read()?;
        Ok(self.rules.lock().await.clone())
    }

    async fn save(&self, rules: Vec<Rule>) -> Result<()> {
        self.check_write()?;
        *self.rules.lock().await = rules;
        Ok(())
    }

    async fn modify(&self, edit: RuleEdit<'_>) -> Result<()> {
        self.check_read()?;
        let mut guard = self.rules.lock().await;
        let mut next = guard.clone();
        edit(&mut next)?;
        self.check_write()?;
        *guard = next;
        Ok(())
    }
}
