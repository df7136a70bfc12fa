use std::sync::Arc;

use dom_kit::{DomSurface, Waits};

use crate::selectors::Selectors;

/// Everything a routine needs to drive the page.
///
/// Cloning is cheap; routines hold their own copy so solvers can be built
/// from a factory function.
#[derive(Clone)]
pub struct SolveCtx {
    pub dom: Arc<dyn DomSurface>,
    pub waits: Waits,
    pub selectors: Arc<Selectors>,
}

impl SolveCtx {
    pub fn new(dom: Arc<dyn DomSurface>, selectors: Arc<Selectors>) -> Self {
        let waits = Waits::new(dom.clone());
        Self {
            dom,
            waits,
            selectors,
        }
    }
}
