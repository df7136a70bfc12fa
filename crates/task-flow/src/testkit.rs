//! In-memory [`DomSurface`] for routine tests.
//!
//! Nodes are registered with the exact selector the routine will query
//! with; handles are `@index` tokens into the node table. Clicks are
//! recorded, not interpreted. Tests that need the page to change state
//! mutate the fake between assertions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dom_kit::{DomError, DomSurface, ElementHandle};

#[derive(Clone, Debug)]
struct FakeNode {
    selector: String,
    text: String,
    attrs: HashMap<String, String>,
    displayed: bool,
    enabled: bool,
    parent: Option<usize>,
    removed: bool,
}

pub struct FakeDom {
    nodes: Mutex<Vec<FakeNode>>,
    clicks: Mutex<Vec<usize>>,
    typed: Mutex<Vec<(usize, String)>>,
    url: Mutex<String>,
}

impl FakeDom {
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(Vec::new()),
            clicks: Mutex::new(Vec::new()),
            typed: Mutex::new(Vec::new()),
            url: Mutex::new("https://companion.example/app".to_string()),
        }
    }

    pub fn add_node(&self, selector: &str) -> usize {
        self.insert(selector, "", None)
    }

    pub fn add_node_with_text(&self, selector: &str, text: &str) -> usize {
        self.insert(selector, text, None)
    }

    pub fn add_child(&self, parent: usize, selector: &str) -> usize {
        self.insert(selector, "", Some(parent))
    }

    pub fn add_child_with_text(&self, parent: usize, selector: &str, text: &str) -> usize {
        self.insert(selector, text, Some(parent))
    }

    pub fn set_attr(&self, node: usize, name: &str, value: &str) {
        let mut nodes = self.nodes.lock().unwrap();
        nodes[node].attrs.insert(name.to_string(), value.to_string());
    }

    pub fn set_text(&self, node: usize, text: &str) {
        self.nodes.lock().unwrap()[node].text = text.to_string();
    }

    pub fn remove(&self, node: usize) {
        self.nodes.lock().unwrap()[node].removed = true;
    }

    pub fn clicks(&self) -> Vec<usize> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn typed(&self) -> Vec<(usize, String)> {
        self.typed.lock().unwrap().clone()
    }

    pub fn set_url(&self, url: &str) {
        *self.url.lock().unwrap() = url.to_string();
    }

    fn insert(&self, selector: &str, text: &str, parent: Option<usize>) -> usize {
        let mut nodes = self.nodes.lock().unwrap();
        nodes.push(FakeNode {
            selector: selector.to_string(),
            text: text.to_string(),
            attrs: HashMap::new(),
            displayed: true,
            enabled: true,
            parent,
            removed: false,
        });
        nodes.len() - 1
    }

    fn resolve(&self, handle: &ElementHandle) -> Result<usize, DomError> {
        let idx: usize = handle
            .selector()
            .strip_prefix('@')
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| DomError::Protocol(format!("bad fake handle {}", handle.selector())))?;
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(idx) {
            Some(node) if !node.removed => Ok(idx),
            _ => Err(DomError::StaleHandle(handle.selector().to_string())),
        }
    }

    fn matching(&self, selector: &str, scope: Option<usize>) -> Vec<usize> {
        // Handles double as selectors, like the live surface's attribute
        // tokens do.
        if let Some(idx) = selector.strip_prefix('@').and_then(|s| s.parse::<usize>().ok()) {
            let nodes = self.nodes.lock().unwrap();
            if nodes.get(idx).map(|n| !n.removed).unwrap_or(false) {
                return vec![idx];
            }
            return vec![];
        }

        // "A + B" resolves B among A's siblings.
        if let Some((left, right)) = selector.split_once(" + ") {
            let anchors = self.matching(left.trim(), scope);
            let nodes = self.nodes.lock().unwrap();
            return anchors
                .into_iter()
                .flat_map(|anchor| {
                    let parent = nodes[anchor].parent;
                    nodes
                        .iter()
                        .enumerate()
                        .filter(move |(i, n)| {
                            !n.removed && *i != anchor && n.parent == parent && n.selector == right.trim()
                        })
                        .map(|(i, _)| i)
                        .collect::<Vec<_>>()
                })
                .collect();
        }

        let nodes = self.nodes.lock().unwrap();
        nodes
            .iter()
            .enumerate()
            .filter(|(i, n)| {
                !n.removed
                    && n.selector == selector
                    && scope.map(|s| self.has_ancestor(&nodes, *i, s)).unwrap_or(true)
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn has_ancestor(&self, nodes: &[FakeNode], mut idx: usize, ancestor: usize) -> bool {
        while let Some(parent) = nodes[idx].parent {
            if parent == ancestor {
                return true;
            }
            idx = parent;
        }
        false
    }
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DomSurface for FakeDom {
    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, DomError> {
        Ok(self
            .matching(selector, None)
            .into_iter()
            .map(|i| ElementHandle(format!("@{i}")))
            .collect())
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, DomError> {
        let scope = self.resolve(scope)?;
        Ok(self
            .matching(selector, Some(scope))
            .into_iter()
            .map(|i| ElementHandle(format!("@{i}")))
            .collect())
    }

    async fn text(&self, handle: &ElementHandle) -> Result<String, DomError> {
        let idx = self.resolve(handle)?;
        Ok(self.nodes.lock().unwrap()[idx].text.clone())
    }

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DomError> {
        let idx = self.resolve(handle)?;
        Ok(self.nodes.lock().unwrap()[idx].attrs.get(name).cloned())
    }

    async fn is_displayed(&self, handle: &ElementHandle) -> Result<bool, DomError> {
        let idx = self.resolve(handle)?;
        Ok(self.nodes.lock().unwrap()[idx].displayed)
    }

    async fn is_enabled(&self, handle: &ElementHandle) -> Result<bool, DomError> {
        let idx = self.resolve(handle)?;
        Ok(self.nodes.lock().unwrap()[idx].enabled)
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), DomError> {
        let idx = self.resolve(handle)?;
        self.clicks.lock().unwrap().push(idx);
        Ok(())
    }

    async fn type_text(&self, handle: &ElementHandle, text: &str) -> Result<(), DomError> {
        let idx = self.resolve(handle)?;
        self.typed.lock().unwrap().push((idx, text.to_string()));
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DomError> {
        Ok(self.url.lock().unwrap().clone())
    }
}
