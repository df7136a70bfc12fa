use async_trait::async_trait;
use tracing::info;

use super::steps;
use super::Solver;
use crate::context::SolveCtx;
use crate::errors::PilotError;
use crate::helpers::SolveHelpers;

/// Solver for "Daily Rare Gold Upgrade": the two-pass flow of the common
/// gold upgrade, one quality band higher (silver, then gold).
pub struct RareGoldUpgradeSolver {
    ctx: SolveCtx,
    helpers: SolveHelpers,
}

impl RareGoldUpgradeSolver {
    pub fn new(ctx: SolveCtx) -> Self {
        let helpers = SolveHelpers::new(ctx.clone());
        Self { ctx, helpers }
    }
}

#[async_trait]
impl Solver for RareGoldUpgradeSolver {
    async fn solve(&self) -> Result<(), PilotError> {
        self.helpers
            .click_task_tile("Daily Rare Gold Upgrade")
            .await?;

        steps::build_with_quality(&self.ctx, &self.helpers, "Silver").await?;
        steps::recycle_bench_players(&self.helpers, 5).await?;
        steps::build_with_quality(&self.ctx, &self.helpers, "Gold").await?;

        steps::claim_rewards(&self.ctx, &self.helpers).await?;
        info!(target: "task_flow", "Daily Rare Gold Upgrade solved");
        Ok(())
    }
}
