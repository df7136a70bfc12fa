use async_trait::async_trait;
use tracing::info;

use super::steps;
use super::Solver;
use crate::context::SolveCtx;
use crate::errors::PilotError;
use crate::helpers::SolveHelpers;

/// Solver for the "Daily Bronze Upgrade" task: a single squad-builder pass
/// over bronze players, then claim.
pub struct BronzeUpgradeSolver {
    ctx: SolveCtx,
    helpers: SolveHelpers,
}

impl BronzeUpgradeSolver {
    pub fn new(ctx: SolveCtx) -> Self {
        let helpers = SolveHelpers::new(ctx.clone());
        Self { ctx, helpers }
    }
}

#[async_trait]
impl Solver for BronzeUpgradeSolver {
    async fn solve(&self) -> Result<(), PilotError> {
        self.helpers.click_task_tile("Daily Bronze Upgrade").await?;
        steps::build_with_quality(&self.ctx, &self.helpers, "Bronze").await?;
        steps::claim_rewards(&self.ctx, &self.helpers).await?;
        info!(target: "task_flow", "Daily Bronze Upgrade solved");
        Ok(())
    }
}
