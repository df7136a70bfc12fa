//! Shared interaction helpers for solvers.
//!
//! The app re-renders aggressively, so every helper re-queries its targets
//! and identifies them by visible text rather than position. Mutating
//! helpers absorb the follow-up animation with a short sleep.

use dom_kit::ElementHandle;
use tracing::debug;

use crate::context::SolveCtx;
use crate::errors::PilotError;

pub struct SolveHelpers {
    ctx: SolveCtx,
}

impl SolveHelpers {
    pub fn new(ctx: SolveCtx) -> Self {
        Self { ctx }
    }

    /// Click the button matching `selector` whose trimmed text equals `text`.
    pub async fn click_button_by_text(&self, selector: &str, text: &str) -> Result<(), PilotError> {
        let buttons = self.ctx.dom.query(selector).await?;
        for button in &buttons {
            let label = match self.ctx.dom.text(button).await {
                Ok(label) => label,
                Err(_) => continue,
            };
            if label == text {
                self.ctx.dom.click(button).await?;
                self.ctx.waits.sleep(1000).await;
                return Ok(());
            }
        }
        Err(PilotError::label_not_found(text, selector))
    }

    /// Drive the toggle labelled `label` to the requested state.
    ///
    /// Idempotent: the current state is read first and a toggle already in
    /// the requested state is not clicked.
    pub async fn set_toggle(&self, label: &str, on: bool) -> Result<(), PilotError> {
        let selectors = &self.ctx.selectors.sbc;
        let cells = self.ctx.dom.query(&selectors.toggle_cell).await?;

        for cell in &cells {
            if !self.contains_span_text(cell, label).await? {
                continue;
            }

            let toggled = !self
                .ctx
                .dom
                .query_within(cell, &selectors.toggled_state)
                .await?
                .is_empty();

            if toggled != on {
                debug!(target: "task_flow", toggle = label, on, "flipping toggle");
                self.ctx.dom.click(cell).await?;
                self.ctx.waits.sleep(500).await;
            }
            return Ok(());
        }
        Err(PilotError::label_not_found(label, &selectors.toggle_cell))
    }

    /// Pick `option` from the dropdown sitting under the header `header`.
    pub async fn select_dropdown_option(
        &self,
        header: &str,
        option: &str,
    ) -> Result<(), PilotError> {
        let selectors = &self.ctx.selectors.sbc;
        let headers = self.ctx.dom.query(&selectors.sort_header).await?;

        for handle in &headers {
            let text = match self.ctx.dom.text(handle).await {
                Ok(text) => text,
                Err(_) => continue,
            };
            if text != header {
                continue;
            }

            // The control is the header's next sibling.
            let control_selector = format!("{} + {}", handle.selector(), selectors.dropdown_control);
            let control = self
                .ctx
                .dom
                .query(&control_selector)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| PilotError::label_not_found(header, &selectors.dropdown_control))?;

            self.ctx.dom.click(&control).await?;
            self.ctx.waits.sleep(500).await;

            // The control re-renders open; re-query before reading options.
            let control = self
                .ctx
                .dom
                .query(&control_selector)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| PilotError::label_not_found(header, &selectors.dropdown_control))?;
            return self.click_list_option(&control, &selectors.dropdown_list, option).await;
        }
        Err(PilotError::label_not_found(header, &selectors.sort_header))
    }

    /// Pick a quality (Bronze, Silver, Gold, Special) from the quality
    /// filter. The filter has no stable identifier; it is recognized by its
    /// current label being one of the quality names.
    pub async fn select_quality_filter(&self, quality: &str) -> Result<(), PilotError> {
        const QUALITY_LABELS: [&str; 5] = ["Quality", "Bronze", "Silver", "Gold", "Special"];

        let selectors = &self.ctx.selectors.sbc;
        let controls = self.ctx.dom.query(&selectors.search_filter_control).await?;

        for control in &controls {
            let labels = self
                .ctx
                .dom
                .query_within(control, &selectors.filter_label)
                .await?;

            let mut is_quality_filter = false;
            for label in &labels {
                if let Ok(text) = self.ctx.dom.text(label).await {
                    if QUALITY_LABELS.contains(&text.as_str()) {
                        is_quality_filter = true;
                        break;
                    }
                }
            }
            if !is_quality_filter {
                continue;
            }

            self.ctx.dom.click(control).await?;
            self.ctx.waits.sleep(500).await;
            return self.click_list_option(control, &selectors.filter_list, quality).await;
        }
        Err(PilotError::label_not_found(
            quality,
            &selectors.search_filter_control,
        ))
    }

    /// Open the task tile with the given title.
    pub async fn click_task_tile(&self, name: &str) -> Result<(), PilotError> {
        let selectors = &self.ctx.selectors.sbc;
        let tiles = self.ctx.dom.query(&selectors.tile).await?;

        for tile in &tiles {
            let titles = self
                .ctx
                .dom
                .query_within(tile, &selectors.tile_title)
                .await?;
            let Some(title) = titles.first() else {
                continue;
            };
            if let Ok(text) = self.ctx.dom.text(title).await {
                if text == name {
                    self.ctx.dom.click(tile).await?;
                    self.ctx.waits.sleep(2000).await;
                    return Ok(());
                }
            }
        }
        Err(PilotError::label_not_found(name, &selectors.tile))
    }

    /// Open the rewards popup via the action tab.
    pub async fn click_action_tab(&self) -> Result<(), PilotError> {
        let selector = self.ctx.selectors.sbc.action_tab.clone();
        let tab = self.ctx.waits.wait_for_clickable(&selector, None).await?;
        self.ctx.dom.click(&tab).await?;
        self.ctx.waits.sleep(2000).await;
        Ok(())
    }

    /// Click the squad slot carrying the given `index` attribute.
    pub async fn click_squad_slot(&self, index: &str) -> Result<(), PilotError> {
        let selectors = &self.ctx.selectors.sbc;
        let slots = self.ctx.dom.query(&selectors.squad_slot).await?;

        for slot in &slots {
            if self.ctx.dom.attribute(slot, "index").await?.as_deref() == Some(index) {
                self.ctx.dom.click(slot).await?;
                self.ctx.waits.sleep(1000).await;
                return Ok(());
            }
        }
        Err(PilotError::label_not_found(
            format!("slot index {index}"),
            &selectors.squad_slot,
        ))
    }

    /// Send `count` players to the club, advancing the detail carousel after
    /// each one.
    pub async fn send_players_to_club(&self, count: usize) -> Result<(), PilotError> {
        let selectors = self.ctx.selectors.sbc.clone();

        for sent in 0..count {
            let panel = self
                .ctx
                .waits
                .wait_for_element(&selectors.detail_panel, None)
                .await?;

            let buttons = self.ctx.dom.query_within(&panel, "button").await?;
            let mut send_button = None;
            for button in &buttons {
                if self.contains_span(button, &selectors.button_text, "Send to My Club").await? {
                    send_button = Some(button.clone());
                    break;
                }
            }
            let send_button = send_button.ok_or_else(|| {
                PilotError::label_not_found("Send to My Club", &selectors.detail_panel)
            })?;

            self.ctx.dom.click(&send_button).await?;
            self.ctx.waits.sleep(500).await;

            debug!(target: "task_flow", sent = sent + 1, of = count, "player sent to club");

            let carousel = self
                .ctx
                .dom
                .query(&selectors.carousel)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| PilotError::label_not_found("carousel", &selectors.carousel))?;
            let next = self
                .ctx
                .dom
                .query_within(&carousel, &selectors.carousel_next)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| PilotError::label_not_found("next", &selectors.carousel_next))?;
            self.ctx.dom.click(&next).await?;
            self.ctx.waits.sleep(500).await;
        }
        Ok(())
    }

    /// Close the right-hand detail drawer.
    pub async fn close_sidebar(&self) -> Result<(), PilotError> {
        let selectors = &self.ctx.selectors.sbc;
        let sidebar = self
            .ctx
            .dom
            .query(&selectors.sidebar)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PilotError::label_not_found("sidebar", &selectors.sidebar))?;
        let button = self
            .ctx
            .dom
            .query_within(&sidebar, &selectors.sidebar_nav_button)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                PilotError::label_not_found("close button", &selectors.sidebar_nav_button)
            })?;
        self.ctx.dom.click(&button).await?;
        self.ctx.waits.sleep(1000).await;
        Ok(())
    }

    async fn click_list_option(
        &self,
        scope: &ElementHandle,
        list_selector: &str,
        option: &str,
    ) -> Result<(), PilotError> {
        let list = self
            .ctx
            .dom
            .query_within(scope, list_selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PilotError::label_not_found(option, list_selector))?;

        let items = self.ctx.dom.query_within(&list, "li").await?;
        for item in &items {
            if let Ok(text) = self.ctx.dom.text(item).await {
                if text == option {
                    self.ctx.dom.click(item).await?;
                    self.ctx.waits.sleep(500).await;
                    return Ok(());
                }
            }
        }
        Err(PilotError::label_not_found(option, list_selector))
    }

    async fn contains_span_text(
        &self,
        scope: &ElementHandle,
        text: &str,
    ) -> Result<bool, PilotError> {
        self.contains_span(scope, "span", text).await
    }

    async fn contains_span(
        &self,
        scope: &ElementHandle,
        span_selector: &str,
        text: &str,
    ) -> Result<bool, PilotError> {
        let spans = self.ctx.dom.query_within(scope, span_selector).await?;
        for span in &spans {
            if let Ok(span_text) = self.ctx.dom.text(span).await {
                if span_text == text {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::FakeDom;
    use std::sync::Arc;

    fn ctx(dom: Arc<FakeDom>) -> SolveCtx {
        SolveCtx::new(dom, Arc::new(crate::selectors::Selectors::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_already_on_is_not_clicked() {
        let dom = Arc::new(FakeDom::new());
        let cell = dom.add_node("div.ut-toggle-cell-view");
        dom.add_child_with_text(cell, "span", "Ignore Position");
        dom.add_child(cell, "div.ut-toggle-control--toggled");

        let helpers = SolveHelpers::new(ctx(dom.clone()));
        helpers.set_toggle("Ignore Position", true).await.unwrap();
        assert!(dom.clicks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_in_wrong_state_is_clicked_once() {
        let dom = Arc::new(FakeDom::new());
        let cell = dom.add_node("div.ut-toggle-cell-view");
        dom.add_child_with_text(cell, "span", "Ignore Position");
        dom.add_child(cell, "div.ut-toggle-control--toggled");

        let helpers = SolveHelpers::new(ctx(dom.clone()));
        helpers.set_toggle("Ignore Position", false).await.unwrap();
        assert_eq!(dom.clicks().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn click_by_text_skips_other_buttons() {
        let dom = Arc::new(FakeDom::new());
        dom.add_node_with_text("button.btn-standard", "Cancel");
        let build = dom.add_node_with_text("button.btn-standard", "Build");

        let helpers = SolveHelpers::new(ctx(dom.clone()));
        helpers
            .click_button_by_text("button.btn-standard", "Build")
            .await
            .unwrap();
        assert_eq!(dom.clicks(), vec![build]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_label_is_reported() {
        let dom = Arc::new(FakeDom::new());
        let helpers = SolveHelpers::new(ctx(dom));

        let err = helpers
            .click_button_by_text("button.btn-standard", "Claim Rewards")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Claim Rewards"));
    }
}
