//! The daily control loop.
//!
//! Each round re-navigates to the challenges screen, re-discovers what is
//! open, solves the single highest-priority daily and opens the packs it
//! earned. Solving changes the screen state, so only one task is taken per
//! round; the loop ends when a round discovers no dailies.

use tracing::info;

use crate::context::SolveCtx;
use crate::discovery::{CandidateTask, TaskDiscovery};
use crate::errors::PilotError;
use crate::navigation::Navigator;
use crate::packs::PackOpeningRoutine;
use crate::solvers::SolverRegistry;

/// Cheapest upgrades first; they feed the more expensive ones.
const PRIORITY_ORDER: [&str; 4] = [
    "Daily Bronze Upgrade",
    "Daily Silver Upgrade",
    "Daily Common Gold Upgrade",
    "Daily Rare Gold Upgrade",
];

pub struct DailyTaskLoop {
    ctx: SolveCtx,
    navigator: Navigator,
    discovery: TaskDiscovery,
    packs: PackOpeningRoutine,
    registry: SolverRegistry,
}

impl DailyTaskLoop {
    pub fn new(ctx: SolveCtx, registry: SolverRegistry) -> Self {
        Self {
            navigator: Navigator::new(ctx.clone()),
            discovery: TaskDiscovery::new(ctx.clone()),
            packs: PackOpeningRoutine::new(ctx.clone()),
            ctx,
            registry,
        }
    }

    /// Run until no dailies remain; returns how many were solved.
    pub async fn run(&self) -> Result<u32, PilotError> {
        let mut solved = 0u32;

        loop {
            self.navigator.to_challenges_filter("All").await?;

            let all = self.discovery.discover().await?;
            let mut dailies: Vec<CandidateTask> = all
                .into_iter()
                .filter(|task| task.name.to_lowercase().contains("daily"))
                .collect();
            info!(target: "task_flow", count = dailies.len(), "daily tasks open");

            if dailies.is_empty() {
                info!(target: "task_flow", solved, "all dailies completed");
                return Ok(solved);
            }

            sort_by_priority(&mut dailies);
            let task = &dailies[0];

            // An unsolvable daily would be rediscovered every round, so it
            // ends the run instead of being skipped.
            let solver = self
                .registry
                .get_solver(&task.name, self.ctx.clone())
                .ok_or_else(|| PilotError::NoSolver(task.name.clone()))?;

            info!(target: "task_flow", task = %task.name, "solving");
            solver.solve().await?;
            solved += 1;

            // A broken store screen would otherwise be masked round after
            // round; pack failures end the run like solver failures do.
            self.packs.open_all().await?;
        }
    }
}

/// Stable sort: known dailies in [`PRIORITY_ORDER`] first, everything else
/// after them in discovery order.
pub fn sort_by_priority(tasks: &mut [CandidateTask]) {
    tasks.sort_by_key(|task| {
        PRIORITY_ORDER
            .iter()
            .position(|name| *name == task.name)
            .unwrap_or(usize::MAX)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::Selectors;
    use crate::solvers::Solver;
    use crate::testkit::FakeDom;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct IdleSolver;

    #[async_trait]
    impl Solver for IdleSolver {
        async fn solve(&self) -> Result<(), PilotError> {
            Ok(())
        }
    }

    fn task(name: &str) -> CandidateTask {
        CandidateTask {
            name: name.to_string(),
        }
    }

    fn seed_challenges_screen(dom: &FakeDom) {
        dom.add_node(".ut-tab-bar");
        dom.add_node("button.icon-sbc");
        dom.add_node_with_text("h1.title", "SBC");
        dom.add_node_with_text("button.ea-filter-bar-item-view", "All");
    }

    fn add_tile(dom: &FakeDom, name: &str) {
        let tile = dom.add_node("div.ut-sbc-set-tile-view");
        dom.set_attr(tile, "class", "ut-sbc-set-tile-view");
        dom.add_child_with_text(tile, "h1.tileTitle", name);
    }

    #[test]
    fn priority_sort_keeps_unknowns_in_order() {
        let mut tasks = vec![
            task("Unknown A"),
            task("Daily Silver Upgrade"),
            task("Daily Bronze Upgrade"),
            task("Unknown B"),
        ];
        sort_by_priority(&mut tasks);
        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Daily Bronze Upgrade",
                "Daily Silver Upgrade",
                "Unknown A",
                "Unknown B",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_discovery_ends_the_run() {
        let dom = Arc::new(FakeDom::new());
        seed_challenges_screen(&dom);
        add_tile(&dom, "Marquee Matchups");

        let ctx = SolveCtx::new(dom, Arc::new(Selectors::default()));
        let run = DailyTaskLoop::new(ctx, SolverRegistry::builtin());
        assert_eq!(run.run().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_daily_is_fatal_before_packs() {
        let dom = Arc::new(FakeDom::new());
        seed_challenges_screen(&dom);
        add_tile(&dom, "Daily Mystery Upgrade");

        let ctx = SolveCtx::new(dom.clone(), Arc::new(Selectors::default()));
        let run = DailyTaskLoop::new(ctx, SolverRegistry::builtin());

        let err = run.run().await.unwrap_err();
        assert!(matches!(err, PilotError::NoSolver(name) if name == "Daily Mystery Upgrade"));
        // Only the tab and filter were clicked; the pack routine never ran.
        assert_eq!(dom.clicks().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pack_failure_aborts_the_run() {
        let dom = Arc::new(FakeDom::new());
        seed_challenges_screen(&dom);
        add_tile(&dom, "Daily Bronze Upgrade");
        // No store tab anywhere, so opening packs after the solve fails.

        let ctx = SolveCtx::new(dom, Arc::new(Selectors::default()));
        let mut registry = SolverRegistry::empty();
        registry.insert("Daily Bronze Upgrade", |_| Box::new(IdleSolver));
        let run = DailyTaskLoop::new(ctx, registry);

        let err = run.run().await.unwrap_err();
        assert!(matches!(err, PilotError::Dom(_)));
    }
}
