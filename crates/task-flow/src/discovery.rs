//! Scanning the challenges screen for solvable tasks.

use tracing::debug;

use crate::context::SolveCtx;
use crate::errors::PilotError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateTask {
    pub name: String,
}

pub struct TaskDiscovery {
    ctx: SolveCtx,
}

impl TaskDiscovery {
    pub fn new(ctx: SolveCtx) -> Self {
        Self { ctx }
    }

    /// All open tasks on the current screen, in render order.
    ///
    /// Tiles carrying a `disabled` or `complete` class are skipped; a tile
    /// that goes stale mid-scan is skipped rather than failing the scan.
    pub async fn discover(&self) -> Result<Vec<CandidateTask>, PilotError> {
        self.ctx.waits.sleep(1000).await;

        let selectors = &self.ctx.selectors.sbc;
        let tiles = self.ctx.dom.query(&selectors.tile).await?;
        let mut tasks = Vec::new();

        for tile in &tiles {
            let class = match self.ctx.dom.attribute(tile, "class").await {
                Ok(class) => class.unwrap_or_default(),
                Err(_) => continue,
            };
            if class.contains("disabled") || class.contains("complete") {
                debug!(target: "task_flow", "skipping closed tile");
                continue;
            }

            let titles = match self.ctx.dom.query_within(tile, &selectors.tile_title).await {
                Ok(titles) => titles,
                Err(_) => continue,
            };
            let Some(title) = titles.first() else {
                continue;
            };
            if let Ok(name) = self.ctx.dom.text(title).await {
                let name = name.trim();
                if !name.is_empty() {
                    tasks.push(CandidateTask {
                        name: name.to_string(),
                    });
                }
            }
        }

        debug!(target: "task_flow", count = tasks.len(), "tasks discovered");
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::Selectors;
    use crate::testkit::FakeDom;
    use std::sync::Arc;

    fn discovery(dom: Arc<FakeDom>) -> TaskDiscovery {
        TaskDiscovery::new(SolveCtx::new(dom, Arc::new(Selectors::default())))
    }

    fn add_tile(dom: &FakeDom, name: &str, class: &str) {
        let tile = dom.add_node("div.ut-sbc-set-tile-view");
        dom.set_attr(tile, "class", class);
        dom.add_child_with_text(tile, "h1.tileTitle", name);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_tiles_are_skipped() {
        let dom = Arc::new(FakeDom::new());
        add_tile(&dom, "Daily Bronze Upgrade", "ut-sbc-set-tile-view");
        add_tile(&dom, "Daily Silver Upgrade", "ut-sbc-set-tile-view disabled");
        add_tile(&dom, "Marquee Matchups", "ut-sbc-set-tile-view complete");
        add_tile(&dom, "League Challenge", "ut-sbc-set-tile-view");

        let tasks = discovery(dom).discover().await.unwrap();
        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Daily Bronze Upgrade", "League Challenge"]);
    }

    #[tokio::test(start_paused = true)]
    async fn untitled_tiles_are_ignored() {
        let dom = Arc::new(FakeDom::new());
        let bare = dom.add_node("div.ut-sbc-set-tile-view");
        dom.set_attr(bare, "class", "ut-sbc-set-tile-view");
        add_tile(&dom, "  Daily Bronze Upgrade  ", "ut-sbc-set-tile-view");

        let tasks = discovery(dom).discover().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Daily Bronze Upgrade");
    }
}
