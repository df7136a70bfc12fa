//! Tab-bar navigation between the app's main screens.

use tracing::{debug, info};

use crate::context::SolveCtx;
use crate::errors::PilotError;

pub struct Navigator {
    ctx: SolveCtx,
}

impl Navigator {
    pub fn new(ctx: SolveCtx) -> Self {
        Self { ctx }
    }

    /// Switch to the challenges screen and verify the landmark title.
    pub async fn to_challenges(&self) -> Result<(), PilotError> {
        let nav = self.ctx.selectors.navigation.clone();

        // Tab bar present means we are logged in.
        self.ctx.waits.wait_for_element(&nav.tab_bar, None).await?;

        let tab = self.ctx.waits.wait_for_clickable(&nav.sbc_tab, None).await?;
        self.ctx.dom.click(&tab).await?;
        self.ctx.waits.sleep(2000).await;

        let title = self
            .ctx
            .waits
            .wait_for_element(&self.ctx.selectors.sbc.page_title, None)
            .await?;
        let text = self.ctx.dom.text(&title).await?;
        if !text.contains("SBC") {
            return Err(PilotError::Landmark {
                expected: "challenges screen".to_string(),
                found: text,
            });
        }
        debug!(target: "task_flow", "on challenges screen");
        Ok(())
    }

    /// Switch to the challenges screen and activate the named filter tab
    /// (e.g. "All" or "Favourites").
    pub async fn to_challenges_filter(&self, filter: &str) -> Result<(), PilotError> {
        self.to_challenges().await?;
        self.ctx.waits.sleep(1000).await;

        let selector = &self.ctx.selectors.sbc.filter_bar_item;
        let items = self.ctx.dom.query(selector).await?;
        for item in &items {
            if let Ok(text) = self.ctx.dom.text(item).await {
                if text == filter {
                    self.ctx.dom.click(item).await?;
                    self.ctx.waits.sleep(2000).await;
                    info!(target: "task_flow", filter, "challenges filter selected");
                    return Ok(());
                }
            }
        }
        Err(PilotError::label_not_found(filter, selector))
    }

    pub async fn to_club(&self) -> Result<(), PilotError> {
        let nav = self.ctx.selectors.navigation.clone();
        self.ctx.waits.wait_for_element(&nav.tab_bar, None).await?;

        let tab = self.ctx.waits.wait_for_clickable(&nav.club_tab, None).await?;
        self.ctx.dom.click(&tab).await?;
        self.ctx.waits.sleep(2000).await;
        Ok(())
    }

    pub async fn to_store(&self) -> Result<(), PilotError> {
        let nav = self.ctx.selectors.navigation.clone();
        self.ctx.waits.wait_for_element(&nav.tab_bar, None).await?;

        let tab = self.ctx.waits.wait_for_clickable(&nav.store_tab, None).await?;
        self.ctx.dom.click(&tab).await?;
        self.ctx.waits.sleep(2000).await;
        Ok(())
    }

    /// Block until no loading shield is visible. A screen with no shield at
    /// all counts as ready.
    pub async fn wait_for_page_ready(&self) -> Result<(), PilotError> {
        let shield = self.ctx.selectors.loading.click_shield.clone();
        let dom = self.ctx.dom.clone();

        self.ctx
            .waits
            .wait_until("loading shield gone", None, || {
                let dom = dom.clone();
                let shield = shield.clone();
                async move {
                    let shields = dom.query(&shield).await?;
                    for handle in &shields {
                        if dom.is_displayed(handle).await.unwrap_or(false) {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
            })
            .await?;
        Ok(())
    }
}
