//! Polling waits against the remote page.
//!
//! A wait observes state until a condition holds or a bound elapses; it
//! never retries the action that should produce the state. Handles are
//! re-queried on every poll so a re-render between polls cannot strand the
//! wait on a stale reference.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::errors::DomError;
use crate::surface::{DomSurface, ElementHandle};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Clone)]
pub struct Waits {
    dom: Arc<dyn DomSurface>,
    default_timeout: Duration,
    poll_interval: Duration,
}

impl Waits {
    pub fn new(dom: Arc<dyn DomSurface>) -> Self {
        Self {
            dom,
            default_timeout: DEFAULT_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    fn bound(&self, timeout: Option<Duration>) -> Duration {
        timeout.unwrap_or(self.default_timeout)
    }

    /// Wait until at least one element matches `selector`; returns the first.
    pub async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Option<Duration>,
    ) -> Result<ElementHandle, DomError> {
        let bound = self.bound(timeout);
        let started = Instant::now();

        loop {
            let handles = self.dom.query(selector).await?;
            if let Some(handle) = handles.into_iter().next() {
                return Ok(handle);
            }
            if started.elapsed() >= bound {
                return Err(DomError::WaitTimeout {
                    selector: selector.to_string(),
                    waited_ms: bound.as_millis() as u64,
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Existence, then visibility, each within its own window.
    pub async fn wait_for_visible(
        &self,
        selector: &str,
        timeout: Option<Duration>,
    ) -> Result<ElementHandle, DomError> {
        let bound = self.bound(timeout);
        self.wait_for_element(selector, Some(bound)).await?;

        let started = Instant::now();
        loop {
            // Re-query every poll; the element may have been re-rendered.
            let handles = self.dom.query(selector).await?;
            for handle in handles {
                if self.dom.is_displayed(&handle).await.unwrap_or(false) {
                    return Ok(handle);
                }
            }
            if started.elapsed() >= bound {
                return Err(DomError::ConditionTimeout {
                    what: format!("element \"{selector}\" visible"),
                    waited_ms: bound.as_millis() as u64,
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Existence, visibility, then enabled-state.
    pub async fn wait_for_clickable(
        &self,
        selector: &str,
        timeout: Option<Duration>,
    ) -> Result<ElementHandle, DomError> {
        let bound = self.bound(timeout);
        self.wait_for_visible(selector, Some(bound)).await?;

        let started = Instant::now();
        loop {
            let handles = self.dom.query(selector).await?;
            for handle in handles {
                let displayed = self.dom.is_displayed(&handle).await.unwrap_or(false);
                let enabled = self.dom.is_enabled(&handle).await.unwrap_or(false);
                if displayed && enabled {
                    return Ok(handle);
                }
            }
            if started.elapsed() >= bound {
                return Err(DomError::ConditionTimeout {
                    what: format!("element \"{selector}\" clickable"),
                    waited_ms: bound.as_millis() as u64,
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Wait until the current location matches `pattern`.
    pub async fn wait_for_url(
        &self,
        pattern: &Regex,
        timeout: Option<Duration>,
    ) -> Result<(), DomError> {
        let bound = self.bound(timeout);
        let started = Instant::now();

        loop {
            let url = self.dom.current_url().await?;
            if pattern.is_match(&url) {
                return Ok(());
            }
            if started.elapsed() >= bound {
                return Err(DomError::UrlTimeout {
                    pattern: pattern.as_str().to_string(),
                    waited_ms: bound.as_millis() as u64,
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Poll an arbitrary predicate; `what` names the condition in the error.
    pub async fn wait_until<F, Fut>(
        &self,
        what: &str,
        timeout: Option<Duration>,
        mut condition: F,
    ) -> Result<(), DomError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, DomError>>,
    {
        let bound = self.bound(timeout);
        let started = Instant::now();

        loop {
            if condition().await? {
                return Ok(());
            }
            if started.elapsed() >= bound {
                debug!(condition = what, "wait_until timed out");
                return Err(DomError::ConditionTimeout {
                    what: what.to_string(),
                    waited_ms: bound.as_millis() as u64,
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Unconditional delay; used to absorb animation time that has no
    /// completion signal.
    pub async fn sleep(&self, ms: u64) {
        sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Surface where the element appears after a fixed number of queries.
    struct AppearingSurface {
        appears_after: usize,
        queries: AtomicUsize,
    }

    #[async_trait]
    impl DomSurface for AppearingSurface {
        async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, DomError> {
            let n = self.queries.fetch_add(1, Ordering::SeqCst);
            if n >= self.appears_after {
                Ok(vec![ElementHandle(selector.to_string())])
            } else {
                Ok(vec![])
            }
        }

        async fn query_within(
            &self,
            _scope: &ElementHandle,
            selector: &str,
        ) -> Result<Vec<ElementHandle>, DomError> {
            self.query(selector).await
        }

        async fn text(&self, _handle: &ElementHandle) -> Result<String, DomError> {
            Ok(String::new())
        }

        async fn attribute(
            &self,
            _handle: &ElementHandle,
            _name: &str,
        ) -> Result<Option<String>, DomError> {
            Ok(None)
        }

        async fn is_displayed(&self, _handle: &ElementHandle) -> Result<bool, DomError> {
            Ok(true)
        }

        async fn is_enabled(&self, _handle: &ElementHandle) -> Result<bool, DomError> {
            Ok(true)
        }

        async fn click(&self, _handle: &ElementHandle) -> Result<(), DomError> {
            Ok(())
        }

        async fn type_text(&self, _handle: &ElementHandle, _text: &str) -> Result<(), DomError> {
            Ok(())
        }

        async fn current_url(&self) -> Result<String, DomError> {
            Ok("https://companion.example/app#challenges".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_once_element_appears() {
        let dom = Arc::new(AppearingSurface {
            appears_after: 3,
            queries: AtomicUsize::new(0),
        });
        let waits = Waits::new(dom.clone());

        let handle = waits.wait_for_element(".ut-tab-bar", None).await.unwrap();
        assert_eq!(handle.selector(), ".ut-tab-bar");
        assert!(dom.queries.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_error_names_selector_and_bound() {
        let dom = Arc::new(AppearingSurface {
            appears_after: usize::MAX,
            queries: AtomicUsize::new(0),
        });
        let waits = Waits::new(dom);

        let err = waits
            .wait_for_element("div.missing", Some(Duration::from_millis(600)))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("div.missing"));
        assert!(message.contains("600"));
    }

    #[tokio::test(start_paused = true)]
    async fn url_wait_matches_pattern() {
        let dom = Arc::new(AppearingSurface {
            appears_after: 0,
            queries: AtomicUsize::new(0),
        });
        let waits = Waits::new(dom);

        let pattern = Regex::new("#challenges$").unwrap();
        waits.wait_for_url(&pattern, None).await.unwrap();

        let wrong = Regex::new("#store$").unwrap();
        let err = waits
            .wait_for_url(&wrong, Some(Duration::from_millis(300)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("#store"));
    }
}
