use crate::dom::{Document, MutationFeed};
use crate::error::{RetitleError, Result};
use async_trait::async_trait;
use headless_chrome::Tab;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Installs a page-side MutationObserver that counts child-list changes under
/// `document.body` and returns the current count. Safe to run more than once.
const INSTALL_OBSERVER_JS: &str = r#"
(function() {
    if (!window.__tabRetitle) {
        window.__tabRetitle = { mutations: 0 };
        new MutationObserver(function() {
            window.__tabRetitle.mutations += 1;
        }).observe(document.body, { childList: true, subtree: true });
    }
    return window.__tabRetitle.mutations;
})()
"#;

/// Live browser tab seen through the [`Document`] interface
///
/// Structural changes are counted in the page by a MutationObserver; a
/// background task polls that counter and forwards each change as a batch.
/// The feed closes when the tab stops answering (navigated away or closed).
pub struct TabDocument {
    tab: Arc<Tab>,
    mutations: watch::Receiver<u64>,
    poller: JoinHandle<()>,
}

impl TabDocument {
    /// Attach to a loaded tab; must be called inside a tokio runtime
    pub async fn attach(tab: Arc<Tab>, poll_interval: Duration) -> Result<Self> {
        let initial = read_counter(tab.clone()).await?;
        let (tx, rx) = watch::channel(initial);

        let poll_tab = tab.clone();
        let poller = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            let mut seen = initial;
            loop {
                ticker.tick().await;
                match read_counter(poll_tab.clone()).await {
                    Ok(count) if count != seen => {
                        seen = count;
                        if tx.send(count).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        log::debug!("Stopped watching tab for changes: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self { tab, mutations: rx, poller })
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Run a script in the tab on the blocking pool
    async fn evaluate(&self, script: String) -> Result<Option<Value>> {
        evaluate(self.tab.clone(), script).await
    }
}

impl Drop for TabDocument {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

async fn evaluate(tab: Arc<Tab>, script: String) -> Result<Option<Value>> {
    tokio::task::spawn_blocking(move || {
        tab.evaluate(&script, false)
            .map(|remote| remote.value)
            .map_err(|e| RetitleError::EvaluationFailed(e.to_string()))
    })
    .await
    .map_err(|e| RetitleError::Document(format!("evaluation task failed: {}", e)))?
}

async fn read_counter(tab: Arc<Tab>) -> Result<u64> {
    let value = evaluate(tab, INSTALL_OBSERVER_JS.to_string()).await?;
    value
        .as_ref()
        .and_then(Value::as_u64)
        .ok_or_else(|| RetitleError::EvaluationFailed(format!("unexpected change counter: {:?}", value)))
}

/// Embed a Rust string as a JavaScript string literal
fn js_string(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

#[async_trait]
impl Document for TabDocument {
    async fn title(&self) -> Result<String> {
        match self.evaluate("document.title".to_string()).await? {
            Some(Value::String(title)) => Ok(title),
            _ => Ok(String::new()),
        }
    }

    async fn set_title(&self, title: &str) -> Result<()> {
        let script = format!("(function() {{ document.title = {}; return true; }})()", js_string(title)?);
        self.evaluate(script).await?;
        Ok(())
    }

    async fn query_text(&self, selector: &str) -> Result<Option<String>> {
        let script = format!(
            "(function() {{ var el = document.querySelector({}); return el === null ? null : el.textContent; }})()",
            js_string(selector)?
        );
        match self.evaluate(script).await? {
            Some(Value::String(text)) => Ok(Some(text)),
            _ => Ok(None),
        }
    }

    fn subscribe(&self) -> MutationFeed {
        MutationFeed::from(self.mutations.clone())
    }
}
