//! Steps shared by the daily upgrade solvers.

use crate::context::SolveCtx;
use crate::errors::PilotError;
use crate::helpers::SolveHelpers;

/// Run the squad builder with the standard daily-upgrade settings and the
/// given quality, then build.
pub(super) async fn build_with_quality(
    ctx: &SolveCtx,
    helpers: &SolveHelpers,
    quality: &str,
) -> Result<(), PilotError> {
    let button = ctx.selectors.sbc.standard_button.clone();

    helpers.click_button_by_text(&button, "Use Squad Builder").await?;
    helpers.set_toggle("Exclude Active Squad Players", true).await?;
    helpers.set_toggle("Ignore Position", true).await?;
    helpers.select_dropdown_option("Sort By", "Rating Low to High").await?;
    helpers.select_quality_filter(quality).await?;
    helpers.click_button_by_text(&button, "Build").await?;
    Ok(())
}

/// Open the rewards popup and claim.
pub(super) async fn claim_rewards(
    ctx: &SolveCtx,
    helpers: &SolveHelpers,
) -> Result<(), PilotError> {
    let button = ctx.selectors.sbc.standard_button.clone();
    helpers.click_action_tab().await?;
    helpers.click_button_by_text(&button, "Claim Rewards").await?;
    Ok(())
}

/// Pull the cheapest players out of the built squad into the club, so the
/// next build phase can draw on a different quality band. Opens the bench
/// slot, sends `count` players and closes the drawer.
pub(super) async fn recycle_bench_players(
    helpers: &SolveHelpers,
    count: usize,
) -> Result<(), PilotError> {
    helpers.click_squad_slot("10").await?;
    helpers.send_players_to_club(count).await?;
    helpers.close_sidebar().await?;
    Ok(())
}
