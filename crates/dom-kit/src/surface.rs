use async_trait::async_trait;

use crate::errors::DomError;

/// Opaque reference to one rendered element.
///
/// Handles are minted per query and are only valid until the next action
/// that mutates the view; after any click or navigation the caller must
/// re-query instead of holding a handle across the suspension point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn selector(&self) -> &str {
        &self.0
    }
}

/// The driver primitives the orchestration layer consumes.
///
/// Implemented by [`crate::ScriptDom`] against the live page and by fake
/// surfaces in tests. All methods observe or act on the current render; none
/// of them wait. Waiting is [`crate::Waits`]' job.
#[async_trait]
pub trait DomSurface: Send + Sync {
    /// All elements currently matching a CSS selector, in document order.
    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, DomError>;

    /// Elements matching `selector` inside the subtree rooted at `scope`.
    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, DomError>;

    /// Visible text content, trimmed.
    async fn text(&self, handle: &ElementHandle) -> Result<String, DomError>;

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DomError>;

    async fn is_displayed(&self, handle: &ElementHandle) -> Result<bool, DomError>;

    async fn is_enabled(&self, handle: &ElementHandle) -> Result<bool, DomError>;

    async fn click(&self, handle: &ElementHandle) -> Result<(), DomError>;

    async fn type_text(&self, handle: &ElementHandle, text: &str) -> Result<(), DomError>;

    async fn current_url(&self) -> Result<String, DomError>;
}
