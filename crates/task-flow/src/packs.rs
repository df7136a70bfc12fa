//! Pack opening and item storage.
//!
//! After a solved task the store holds earned packs. The routine opens
//! every pack under the "My Packs" filter and drains the items screen:
//! store all in club first, overflow into challenge storage (confirming
//! the popup), quick-sell whatever still remains.

use dom_kit::ElementHandle;
use tracing::{debug, info, warn};

use crate::context::SolveCtx;
use crate::errors::PilotError;
use crate::navigation::Navigator;

pub struct PackOpeningRoutine {
    ctx: SolveCtx,
    navigator: Navigator,
}

impl PackOpeningRoutine {
    pub fn new(ctx: SolveCtx) -> Self {
        let navigator = Navigator::new(ctx.clone());
        Self { ctx, navigator }
    }

    /// Open every available pack; returns how many were opened.
    pub async fn open_all(&self) -> Result<u32, PilotError> {
        self.navigator.to_store().await?;
        self.click_packs_tile().await?;

        let mut opened = 0u32;
        loop {
            if !self.select_my_packs_filter().await? {
                debug!(target: "task_flow", "no pack filter, store is empty");
                break;
            }

            let Some(open_button) = self.find_open_button().await? else {
                debug!(target: "task_flow", "no packs left to open");
                break;
            };

            opened += 1;
            info!(target: "task_flow", pack = opened, "opening pack");
            self.ctx.dom.click(&open_button).await?;
            self.ctx.waits.sleep(2000).await;

            self.wait_for_items_screen().await?;
            self.store_all_in_club().await?;
            self.drain_remaining_items().await?;

            // Back to the pack list for the next round.
            self.navigator.to_store().await?;
            self.click_packs_tile().await?;
        }

        info!(target: "task_flow", total = opened, "pack opening finished");
        Ok(opened)
    }

    async fn click_packs_tile(&self) -> Result<(), PilotError> {
        let store = &self.ctx.selectors.store;
        let tiles = self.ctx.dom.query(&store.tile).await?;

        for tile in &tiles {
            let headers = self.ctx.dom.query_within(tile, &store.tile_header).await?;
            let Some(header) = headers.first() else {
                continue;
            };
            if let Ok(text) = self.ctx.dom.text(header).await {
                if text == "Packs" {
                    self.ctx.dom.click(tile).await?;
                    self.ctx.waits.sleep(2000).await;
                    return Ok(());
                }
            }
        }
        Err(PilotError::label_not_found("Packs", &store.tile))
    }

    /// Activate the "My Packs" filter; absent filter means no packs at all.
    async fn select_my_packs_filter(&self) -> Result<bool, PilotError> {
        let store = &self.ctx.selectors.store;
        let Some(menu) = self.ctx.dom.query(&store.menu_container).await?.into_iter().next() else {
            return Ok(false);
        };

        let buttons = self.ctx.dom.query_within(&menu, &store.filter_bar_item).await?;
        for button in &buttons {
            if let Ok(text) = self.ctx.dom.text(button).await {
                if text == "My Packs" {
                    self.ctx.dom.click(button).await?;
                    self.ctx.waits.sleep(1000).await;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn find_open_button(&self) -> Result<Option<ElementHandle>, PilotError> {
        let store = &self.ctx.selectors.store;
        let buttons = self.ctx.dom.query(&store.primary_button).await?;

        for button in &buttons {
            let spans = self.ctx.dom.query_within(button, &store.button_text).await?;
            for span in &spans {
                if let Ok(text) = self.ctx.dom.text(span).await {
                    if text == "Open" {
                        return Ok(Some(button.clone()));
                    }
                }
            }
        }
        Ok(None)
    }

    async fn wait_for_items_screen(&self) -> Result<(), PilotError> {
        let packs = self.ctx.selectors.packs.clone();
        let dom = self.ctx.dom.clone();

        self.ctx
            .waits
            .wait_until("items screen", None, || {
                let dom = dom.clone();
                let packs = packs.clone();
                async move {
                    let headers = dom.query(&packs.section_header).await?;
                    for header in &headers {
                        let titles = dom.query_within(header, &packs.title).await?;
                        for title in &titles {
                            if dom.text(title).await.unwrap_or_default() == "Items" {
                                return Ok(true);
                            }
                        }
                    }
                    Ok(false)
                }
            })
            .await?;
        Ok(())
    }

    async fn store_all_in_club(&self) -> Result<(), PilotError> {
        self.open_items_menu().await?;
        self.click_modal_button(|text| text == "Store All in Club").await?;
        self.ctx.waits.sleep(2000).await;
        Ok(())
    }

    /// Move leftovers to challenge storage, quick-selling what does not fit.
    /// The items screen disappearing at any point means everything was
    /// stored.
    async fn drain_remaining_items(&self) -> Result<(), PilotError> {
        if !self.items_menu_present().await? {
            return Ok(());
        }

        self.open_items_menu().await?;
        if self
            .click_modal_button(|text| text.to_lowercase().contains("sbc storage"))
            .await
            .is_ok()
        {
            self.ctx.waits.sleep(1000).await;
            self.confirm_storage_popup().await?;
            self.ctx.waits.sleep(1000).await;
        }

        if !self.items_menu_present().await? {
            return Ok(());
        }

        warn!(target: "task_flow", "items left over, quick selling");
        self.open_items_menu().await?;
        if self
            .click_modal_button(|text| text.to_lowercase().contains("quick sell"))
            .await
            .is_err()
        {
            warn!(target: "task_flow", "quick sell unavailable, items may remain");
        }
        self.ctx.waits.sleep(2000).await;
        Ok(())
    }

    async fn items_menu_present(&self) -> Result<bool, PilotError> {
        let packs = &self.ctx.selectors.packs;
        let headers = self.ctx.dom.query(&packs.section_header).await?;
        for header in &headers {
            let ellipses = self
                .ctx
                .dom
                .query_within(header, &packs.ellipsis_button)
                .await?;
            if !ellipses.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn open_items_menu(&self) -> Result<(), PilotError> {
        let packs = &self.ctx.selectors.packs;
        let header = self
            .ctx
            .dom
            .query(&packs.section_header)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PilotError::label_not_found("items header", &packs.section_header))?;
        let ellipsis = self
            .ctx
            .dom
            .query_within(&header, &packs.ellipsis_button)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PilotError::label_not_found("menu button", &packs.ellipsis_button))?;
        self.ctx.dom.click(&ellipsis).await?;
        self.ctx.waits.sleep(1000).await;
        Ok(())
    }

    async fn click_modal_button(
        &self,
        matches: impl Fn(&str) -> bool,
    ) -> Result<(), PilotError> {
        let packs = &self.ctx.selectors.packs;
        let modal = self
            .ctx
            .dom
            .query(&packs.modal)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PilotError::label_not_found("modal", &packs.modal))?;

        let buttons = self.ctx.dom.query_within(&modal, "button").await?;
        for button in &buttons {
            let spans = self.ctx.dom.query_within(button, &packs.button_text).await?;
            for span in &spans {
                if let Ok(text) = self.ctx.dom.text(span).await {
                    if matches(&text) {
                        self.ctx.dom.click(button).await?;
                        return Ok(());
                    }
                }
            }
        }
        Err(PilotError::label_not_found("modal action", &packs.modal))
    }

    /// Click "Yes" in the storage confirmation popup if one appears, then
    /// wait for it to leave the screen.
    async fn confirm_storage_popup(&self) -> Result<(), PilotError> {
        let packs = self.ctx.selectors.packs.clone();
        let popups = self.ctx.dom.query(&packs.confirmation_popup).await?;
        let Some(popup) = popups.first() else {
            return Ok(());
        };

        let buttons = self
            .ctx
            .dom
            .query_within(popup, &packs.confirmation_button)
            .await?;
        let mut confirmed = false;
        for button in &buttons {
            if self.ctx.dom.text(button).await.unwrap_or_default() == "Yes" {
                self.ctx.waits.sleep(500).await;
                self.ctx.dom.click(button).await?;
                confirmed = true;
                break;
            }
        }
        if !confirmed {
            warn!(target: "task_flow", "confirmation popup had no Yes button");
            return Ok(());
        }

        let dom = self.ctx.dom.clone();
        let selector = packs.confirmation_popup.clone();
        self.ctx
            .waits
            .wait_until("confirmation popup gone", None, || {
                let dom = dom.clone();
                let selector = selector.clone();
                async move {
                    let popups = dom.query(&selector).await?;
                    for popup in &popups {
                        if dom.is_displayed(popup).await.unwrap_or(false) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::Selectors;
    use crate::testkit::FakeDom;
    use std::sync::Arc;

    fn routine(dom: Arc<FakeDom>) -> PackOpeningRoutine {
        PackOpeningRoutine::new(SolveCtx::new(dom, Arc::new(Selectors::default())))
    }

    fn seed_store(dom: &FakeDom) {
        dom.add_node(".ut-tab-bar");
        dom.add_node("button.icon-store");
        let tile = dom.add_node("div.tile");
        dom.add_child_with_text(tile, "h1.tileHeader", "Packs");
    }

    #[tokio::test(start_paused = true)]
    async fn no_pack_filter_means_nothing_to_open() {
        let dom = Arc::new(FakeDom::new());
        seed_store(&dom);
        // No menu container on the packs screen.

        let opened = routine(dom).open_all().await.unwrap();
        assert_eq!(opened, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn no_open_button_means_nothing_to_open() {
        let dom = Arc::new(FakeDom::new());
        seed_store(&dom);
        let menu = dom.add_node("div.menu-container");
        dom.add_child_with_text(menu, "button.ea-filter-bar-item-view", "My Packs");
        // Filter exists but no pack carries an Open button.
        let buy = dom.add_node("button.primary");
        dom.add_child_with_text(buy, "span.text", "Buy");

        let opened = routine(dom).open_all().await.unwrap();
        assert_eq!(opened, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn storage_confirmation_is_accepted() {
        let dom = Arc::new(FakeDom::new());
        let popup = dom.add_node("div.ut-action-confirmation-popup-view");
        dom.add_child_with_text(popup, "button.btn-standard", "No");
        let yes = dom.add_child_with_text(popup, "button.btn-standard", "Yes");

        let r = routine(dom.clone());
        // Popup disappears once confirmed.
        let handle = tokio::spawn(async move { r.confirm_storage_popup().await });
        tokio::task::yield_now().await;
        dom.remove(popup);
        handle.await.unwrap().unwrap();
        assert!(dom.clicks().contains(&yes));
    }
}
