use crate::config::{ExtractorOptions, LogConfig};
use crate::dom::Document;
use crate::error::{RetitleError, Result};
use crate::rule::SelectorSet;
use indexmap::IndexMap;
use tokio::time::Instant;

/// Waits for a rule's selectors to appear on a page and reads their text
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentExtractor {
    options: ExtractorOptions,
    log: LogConfig,
}

impl ContentExtractor {
    pub fn new(options: ExtractorOptions, log: LogConfig) -> Self {
        Self { options, log }
    }

    pub fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    /// Wait until every selector resolves, then extract field name → trimmed text
    pub async fn wait_and_extract(&self, document: &dyn Document, selectors: &SelectorSet) -> Result<IndexMap<String, String>> {
        self.wait_for(document, selectors).await?;
        self.extract(document, selectors).await
    }

    /// Wait until every selector matches at least one element
    ///
    /// Re-checks the whole set after each batch of structural changes. Honors
    /// the configured timeout; without one this only returns once the
    /// selectors resolve or the document goes away.
    pub async fn wait_for(&self, document: &dyn Document, selectors: &SelectorSet) -> Result<()> {
        let started = Instant::now();
        let wait = self.wait_unbounded(document, selectors);

        let Some(limit) = self.options.timeout else {
            return wait.await;
        };

        match tokio::time::timeout(limit, wait).await {
            Ok(result) => result,
            Err(_) => {
                let pending = self.pending(document, selectors).await.unwrap_or_default();
                Err(RetitleError::ExtractionTimeout { waited_ms: started.elapsed().as_millis(), pending })
            }
        }
    }

    async fn wait_unbounded(&self, document: &dyn Document, selectors: &SelectorSet) -> Result<()> {
        // Subscribe before the first check so a change between the two is not lost.
        let mut feed = document.subscribe();
        let mut batches = 0u64;

        loop {
            let pending = self.pending(document, selectors).await?;
            if pending.is_empty() {
                self.log.emit(format_args!("All {} selectors resolved after {} change batches", selectors.len(), batches));
                return Ok(());
            }
            self.log.emit(format_args!("Waiting on selectors: {:?}", pending));

            if !feed.changed().await {
                return Err(RetitleError::DocumentDetached);
            }
            batches += 1;
        }
    }

    /// Selectors that currently match nothing
    async fn pending(&self, document: &dyn Document, selectors: &SelectorSet) -> Result<Vec<String>> {
        let mut pending = Vec::new();
        for selector in selectors.selectors() {
            if !document.exists(selector).await? {
                pending.push(selector.to_string());
            }
        }
        Ok(pending)
    }

    /// Read the trimmed text of the first element for each selector
    pub async fn extract(&self, document: &dyn Document, selectors: &SelectorSet) -> Result<IndexMap<String, String>> {
        let mut values = IndexMap::with_capacity(selectors.len());
        for (field, selector) in selectors.iter() {
            let text = document.query_text(selector).await?.ok_or_else(|| RetitleError::ExtractionFailed {
                field: field.to_string(),
                selector: selector.to_string(),
            })?;
            values.insert(field.to_string(), text.trim().to_string());
        }
        Ok(values)
    }
}
