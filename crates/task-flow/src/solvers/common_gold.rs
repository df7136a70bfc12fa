use async_trait::async_trait;
use tracing::info;

use super::steps;
use super::Solver;
use crate::context::SolveCtx;
use crate::errors::PilotError;
use crate::helpers::SolveHelpers;

/// Solver for "Daily Common Gold Upgrade".
///
/// Two builder passes: build with bronze, recycle five bench players into
/// the club so the builder can reuse the slots, then build again with
/// silver and claim.
pub struct CommonGoldUpgradeSolver {
    ctx: SolveCtx,
    helpers: SolveHelpers,
}

impl CommonGoldUpgradeSolver {
    pub fn new(ctx: SolveCtx) -> Self {
        let helpers = SolveHelpers::new(ctx.clone());
        Self { ctx, helpers }
    }
}

#[async_trait]
impl Solver for CommonGoldUpgradeSolver {
    async fn solve(&self) -> Result<(), PilotError> {
        self.helpers
            .click_task_tile("Daily Common Gold Upgrade")
            .await?;

        steps::build_with_quality(&self.ctx, &self.helpers, "Bronze").await?;
        steps::recycle_bench_players(&self.helpers, 5).await?;
        steps::build_with_quality(&self.ctx, &self.helpers, "Silver").await?;

        steps::claim_rewards(&self.ctx, &self.helpers).await?;
        info!(target: "task_flow", "Daily Common Gold Upgrade solved");
        Ok(())
    }
}
