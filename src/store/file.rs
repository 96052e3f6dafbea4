use crate::error::{RetitleError, Result};
use crate::rule::Rule;
use crate::store::{RuleEdit, RuleStore, export_rules};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Rule store backed by a JSON array on disk
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// reader never sees a half-written file. All operations on one store value
/// are serialized, which makes [`RuleStore::modify`] atomic in-process.
#[derive(Debug)]
pub struct JsonFileRuleStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_unlocked(&self) -> Result<Vec<Rule>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RetitleError::StoreRead(format!("{}: {}", self.path.display(), e))),
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&text)
            .map_err(|e| RetitleError::StoreRead(format!("{}: {}", self.path.display(), e)))
    }

    async fn write_unlocked(&self, rules: &[Rule]) -> Result<()> {
        let json = export_rules(rules)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RetitleError::StoreWrite(format!("{}: {}", parent.display(), e)))?;
        }

        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| RetitleError::StoreWrite(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| RetitleError::StoreWrite(format!("{}: {}", self.path.display(), e)))?;

        log::debug!("Saved {} rules to {}", rules.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl RuleStore for JsonFileRuleStore {
    async fn load(&self) -> Result<Vec<Rule>> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    async fn save(&self, rules: Vec<Rule>) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(&rules).await
    }

    async fn modify(&self, edit: RuleEdit<'_>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut rules = self.read_unlocked().await?;
        edit(&mut rules)?;
        self.write_unlocked(&rules).await
    }
}
