//! Per-task solving state machines.
//!
//! A solver owns the whole flow for one named task, starting from the
//! challenges screen with the task tile visible. New tasks get a solver
//! struct here and a registry entry in [`SolverRegistry::builtin`].

mod bronze;
mod common_gold;
mod rare_gold;
mod silver;
mod steps;

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

pub use bronze::BronzeUpgradeSolver;
pub use common_gold::CommonGoldUpgradeSolver;
pub use rare_gold::RareGoldUpgradeSolver;
pub use silver::SilverUpgradeSolver;

use crate::context::SolveCtx;
use crate::errors::PilotError;

#[async_trait]
pub trait Solver: Send + Sync {
    async fn solve(&self) -> Result<(), PilotError>;
}

pub type SolverFactory = fn(SolveCtx) -> Box<dyn Solver>;

pub struct SolverRegistry {
    solvers: HashMap<String, SolverFactory>,
}

impl SolverRegistry {
    pub fn empty() -> Self {
        Self {
            solvers: HashMap::new(),
        }
    }

    /// Registry with every shipped solver.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.insert("Daily Bronze Upgrade", |ctx| {
            Box::new(BronzeUpgradeSolver::new(ctx))
        });
        registry.insert("Daily Silver Upgrade", |ctx| {
            Box::new(SilverUpgradeSolver::new(ctx))
        });
        registry.insert("Daily Common Gold Upgrade", |ctx| {
            Box::new(CommonGoldUpgradeSolver::new(ctx))
        });
        registry.insert("Daily Rare Gold Upgrade", |ctx| {
            Box::new(RareGoldUpgradeSolver::new(ctx))
        });
        registry
    }

    pub fn insert(&mut self, task: impl Into<String>, factory: SolverFactory) {
        self.solvers.insert(task.into(), factory);
    }

    pub fn has_solver(&self, task: &str) -> bool {
        self.solvers.contains_key(task)
    }

    pub fn get_solver(&self, task: &str, ctx: SolveCtx) -> Option<Box<dyn Solver>> {
        match self.solvers.get(task) {
            Some(factory) => Some(factory(ctx)),
            None => {
                warn!(target: "task_flow", task, "no solver registered");
                None
            }
        }
    }

    pub fn supported_tasks(&self) -> Vec<String> {
        let mut tasks: Vec<_> = self.solvers.keys().cloned().collect();
        tasks.sort();
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_the_daily_upgrades() {
        let registry = SolverRegistry::builtin();
        for task in [
            "Daily Bronze Upgrade",
            "Daily Silver Upgrade",
            "Daily Common Gold Upgrade",
            "Daily Rare Gold Upgrade",
        ] {
            assert!(registry.has_solver(task), "missing solver for {task}");
        }
        assert!(!registry.has_solver("Marquee Matchups"));
    }

    #[test]
    fn supported_tasks_are_sorted() {
        let registry = SolverRegistry::builtin();
        let tasks = registry.supported_tasks();
        let mut sorted = tasks.clone();
        sorted.sort();
        assert_eq!(tasks, sorted);
        assert_eq!(tasks.len(), 4);
    }
}
