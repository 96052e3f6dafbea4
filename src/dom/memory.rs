use crate::dom::{Document, ElementNode, MutationFeed, MutationSource, parse_selector};
use crate::error::{RetitleError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// Document held in memory
///
/// Mutating the body (`append`, `remove`, `set_text`) notifies subscribers the
/// same way a page's mutation observer would. `detach` simulates the page
/// being torn down.
#[derive(Debug)]
pub struct MemoryDocument {
    title: Mutex<String>,
    body: Mutex<ElementNode>,
    mutations: Mutex<Option<MutationSource>>,
}

impl MemoryDocument {
    /// Empty `<body>` with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_body(title, ElementNode::new("body"))
    }

    pub fn with_body(title: impl Into<String>, body: ElementNode) -> Self {
        Self {
            title: Mutex::new(title.into()),
            body: Mutex::new(body),
            mutations: Mutex::new(Some(MutationSource::new())),
        }
    }

    fn lock_err<T>(e: std::sync::PoisonError<T>) -> RetitleError {
        RetitleError::Document(format!("document lock poisoned: {}", e))
    }

    fn notify(&self) -> Result<()> {
        if let Some(source) = self.mutations.lock().map_err(Self::lock_err)?.as_ref() {
            source.notify();
        }
        Ok(())
    }

    /// Append `node` under the first element matching `parent` (the body itself when `None`)
    pub fn append(&self, parent: Option<&str>, node: ElementNode) -> Result<()> {
        {
            let mut body = self.body.lock().map_err(Self::lock_err)?;
            let target = match parent {
                Some(selector) => {
                    let parsed = parse_selector(selector)?;
                    body.query_selector_mut(&parsed)
                        .ok_or_else(|| RetitleError::Document(format!("no element matches '{}'", selector)))?
                }
                None => &mut *body,
            };
            target.children.push(node);
        }
        self.notify()
    }

    /// Remove every element matching `selector`, returning how many went away
    pub fn remove(&self, selector: &str) -> Result<usize> {
        let parsed = parse_selector(selector)?;
        let removed = self.body.lock().map_err(Self::lock_err)?.remove_matching(&parsed);
        if removed > 0 {
            self.notify()?;
        }
        Ok(removed)
    }

    /// Replace the own text of the first element matching `selector`
    pub fn set_text(&self, selector: &str, text: impl Into<String>) -> Result<()> {
        let parsed = parse_selector(selector)?;
        {
            let mut body = self.body.lock().map_err(Self::lock_err)?;
            let node = body
                .query_selector_mut(&parsed)
                .ok_or_else(|| RetitleError::Document(format!("no element matches '{}'", selector)))?;
            node.text = Some(text.into());
        }
        self.notify()
    }

    /// Drop the change feed; waiting subscribers see the document go away
    pub fn detach(&self) -> Result<()> {
        self.mutations.lock().map_err(Self::lock_err)?.take();
        Ok(())
    }

    /// Number of change batches delivered so far
    pub fn mutation_batches(&self) -> u64 {
        self.mutations
            .lock()
            .ok()
            .and_then(|source| source.as_ref().map(MutationSource::batches))
            .unwrap_or(0)
    }
}

#[async_trait]
impl Document for MemoryDocument {
    async fn title(&self) -> Result<String> {
        Ok(self.title.lock().map_err(Self::lock_err)?.clone())
    }

    async fn set_title(&self, title: &str) -> Result<()> {
        *self.title.lock().map_err(Self::lock_err)? = title.to_string();
        Ok(())
    }

    async fn query_text(&self, selector: &str) -> Result<Option<String>> {
        let parsed = parse_selector(selector)?;
        let body = self.body.lock().map_err(Self::lock_err)?;
        Ok(body.query_selector(&parsed).map(ElementNode::text_content))
    }

    fn subscribe(&self) -> MutationFeed {
        match self.mutations.lock() {
            Ok(guard) => guard.as_ref().map(MutationSource::subscribe).unwrap_or_else(MutationFeed::closed),
            Err(_) => MutationFeed::closed(),
        }
    }
}
