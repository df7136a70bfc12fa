use async_trait::async_trait;
use tracing::info;

use super::steps;
use super::Solver;
use crate::context::SolveCtx;
use crate::errors::PilotError;
use crate::helpers::SolveHelpers;

/// Solver for "Daily Silver Upgrade": same single-pass flow as the bronze
/// upgrade, built from silver players.
pub struct SilverUpgradeSolver {
    ctx: SolveCtx,
    helpers: SolveHelpers,
}

impl SilverUpgradeSolver {
    pub fn new(ctx: SolveCtx) -> Self {
        let helpers = SolveHelpers::new(ctx.clone());
        Self { ctx, helpers }
    }
}

#[async_trait]
impl Solver for SilverUpgradeSolver {
    async fn solve(&self) -> Result<(), PilotError> {
        self.helpers.click_task_tile("Daily Silver Upgrade").await?;
        steps::build_with_quality(&self.ctx, &self.helpers, "Silver").await?;
        steps::claim_rewards(&self.ctx, &self.helpers).await?;
        info!(target: "task_flow", "Daily Silver Upgrade solved");
        Ok(())
    }
}
