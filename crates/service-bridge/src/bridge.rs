//! Typed front-end over the injected shim.
//!
//! [`ServiceBridge`] owns the session lifecycle: probe the page's service
//! layer, inject the shim, and re-inject transparently when a reload wipes
//! the marker. Every wrapper resolves to a [`ResultEnvelope`]; only channel
//! breakage surfaces as `Err`.

use std::sync::Arc;

use cdp_channel::{ChannelError, PageChannel};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::envelope::{codes, RequestDescriptor, ResultEnvelope};
use crate::script;
use crate::shim::COMPANION_SHIM_JS;
use crate::types::{
    AuctionDuration, ClubSearchCriteria, ItemPile, NotificationKind, StorageSearchCriteria,
    TransferSearchCriteria,
};

#[derive(Debug, Default)]
struct SessionState {
    initialized: bool,
}

pub struct ServiceBridge {
    channel: Arc<dyn PageChannel>,
    state: Mutex<SessionState>,
}

impl ServiceBridge {
    pub fn new(channel: Arc<dyn PageChannel>) -> Self {
        Self {
            channel,
            state: Mutex::new(SessionState::default()),
        }
    }

    async fn probe_bool(&self, script: &str) -> Result<bool, ChannelError> {
        let value = self.channel.execute(script).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Inject the shim if the page does not already carry it.
    ///
    /// Failures of the page, not the channel, come back as failure
    /// envelopes: [`codes::SERVICES_UNAVAILABLE`] when the private service
    /// layer is unreachable, [`codes::INIT_FAILED`] when injection ran but
    /// the probe afterwards still fails.
    pub async fn initialize(&self) -> Result<ResultEnvelope<bool>, ChannelError> {
        let mut state = self.state.lock().await;

        if state.initialized {
            // The page may have reloaded underneath us.
            if self.probe_bool(&script::initialization_check()).await? {
                return Ok(ResultEnvelope::ok(true));
            }
            debug!(target: "service_bridge", "shim marker lost, re-injecting");
            state.initialized = false;
        }

        if !self.probe_bool(&script::services_probe()).await? {
            return Ok(ResultEnvelope::err(
                codes::SERVICES_UNAVAILABLE,
                "page service layer not reachable; ensure the app is loaded and logged in",
            ));
        }

        self.channel.execute(COMPANION_SHIM_JS).await?;

        if !self.probe_bool(&script::availability_check()).await? {
            return Ok(ResultEnvelope::err(
                codes::INIT_FAILED,
                "shim injected but availability probe failed",
            ));
        }

        state.initialized = true;
        info!(target: "service_bridge", "shim installed");
        Ok(ResultEnvelope::ok(true))
    }

    pub async fn is_initialized(&self) -> Result<bool, ChannelError> {
        self.probe_bool(&script::initialization_check()).await
    }

    async fn ensure_initialized(&self) -> Result<Option<ResultEnvelope<Value>>, ChannelError> {
        let needs_init = !self.state.lock().await.initialized;
        if needs_init {
            let init = self.initialize().await?;
            if !init.success {
                return Ok(Some(ResultEnvelope {
                    success: false,
                    data: None,
                    error: init.error,
                }));
            }
        }
        Ok(None)
    }

    /// Run one namespaced method call through the shim.
    pub async fn call<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<ResultEnvelope<T>, ChannelError> {
        if let Some(failed) = self.ensure_initialized().await? {
            return Ok(ResultEnvelope {
                success: false,
                data: None,
                error: failed.error,
            });
        }

        let name = request.qualified_name();
        let rendered = script::method_call(&request);
        let raw = if request.sync {
            self.channel.execute(&rendered).await?
        } else {
            self.channel.execute_async(&rendered).await?
        };

        let envelope: ResultEnvelope<T> = serde_json::from_value(raw).map_err(|e| {
            ChannelError::Internal(format!("malformed envelope from {name}: {e}"))
        })?;

        if envelope.error_code() == Some(codes::NOT_INITIALIZED) {
            // Page reloaded between calls; the next call re-injects.
            warn!(target: "service_bridge", call = %name, "shim marker gone, session reset");
            self.state.lock().await.initialized = false;
        } else if !envelope.success {
            debug!(
                target: "service_bridge",
                call = %name,
                code = envelope.error_code().unwrap_or("?"),
                "service call failed"
            );
        }

        Ok(envelope)
    }

    /// Per-namespace availability map, or `Null` when the shim is absent.
    pub async fn available_services(&self) -> Result<Value, ChannelError> {
        if let Some(failed) = self.ensure_initialized().await? {
            return Ok(json!({ "error": failed.error }));
        }
        self.channel.execute(&script::available_services()).await
    }

    // ---- sbc ----------------------------------------------------------

    pub async fn request_sets(&self) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("sbc", "requestSets", vec![]))
            .await
    }

    pub async fn request_challenges_for_set(
        &self,
        set: Value,
    ) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("sbc", "requestChallengesForSet", vec![set]))
            .await
    }

    pub async fn load_challenge(&self, challenge: Value) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("sbc", "loadChallenge", vec![challenge]))
            .await
    }

    pub async fn save_challenge(&self, challenge: Value) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("sbc", "saveChallenge", vec![challenge]))
            .await
    }

    pub async fn submit_challenge(
        &self,
        challenge: Value,
        set: Value,
    ) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("sbc", "submitChallenge", vec![challenge, set]))
            .await
    }

    pub async fn get_cached_squads(&self) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::sync_call("sbc", "getCachedSquads", vec![]))
            .await
    }

    pub async fn reset_sbc_cache(&self) -> Result<ResultEnvelope<bool>, ChannelError> {
        self.call(RequestDescriptor::sync_call("sbc", "resetCache", vec![]))
            .await
    }

    // ---- item ---------------------------------------------------------

    pub async fn search_transfer_market(
        &self,
        criteria: &TransferSearchCriteria,
        page: u32,
    ) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call(
            "item",
            "searchTransferMarket",
            vec![serde_json::to_value(criteria).unwrap_or(Value::Null), json!(page)],
        ))
        .await
    }

    pub async fn bid(&self, item: Value, price: u32) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("item", "bid", vec![item, json!(price)]))
            .await
    }

    pub async fn list_item(
        &self,
        item: Value,
        starting_bid: u32,
        buy_now: u32,
        duration: AuctionDuration,
    ) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call(
            "item",
            "list",
            vec![item, json!(starting_bid), json!(buy_now), json!(duration.seconds())],
        ))
        .await
    }

    pub async fn move_items(
        &self,
        items: Vec<Value>,
        pile: ItemPile,
    ) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call(
            "item",
            "move",
            vec![Value::Array(items), serde_json::to_value(pile).unwrap_or(Value::Null)],
        ))
        .await
    }

    pub async fn get_transfer_list(&self) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("item", "requestTransferItems", vec![]))
            .await
    }

    pub async fn get_watched_items(&self) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("item", "requestWatchedItems", vec![]))
            .await
    }

    pub async fn refresh_auctions(&self, items: Vec<Value>) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("item", "refreshAuctions", vec![Value::Array(items)]))
            .await
    }

    pub async fn relist_expired_auctions(&self) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("item", "relistExpiredAuctions", vec![]))
            .await
    }

    pub async fn remove_from_watchlist(
        &self,
        items: Vec<Value>,
    ) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("item", "untarget", vec![Value::Array(items)]))
            .await
    }

    pub async fn get_market_data(&self, item: Value) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("item", "requestMarketData", vec![item]))
            .await
    }

    pub async fn get_unassigned_items(&self) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("item", "requestUnassignedItems", vec![]))
            .await
    }

    pub async fn search_storage(
        &self,
        criteria: &StorageSearchCriteria,
    ) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call(
            "item",
            "searchStorageItems",
            vec![serde_json::to_value(criteria).unwrap_or(Value::Null)],
        ))
        .await
    }

    pub async fn discard_items(&self, items: Vec<Value>) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("item", "discard", vec![Value::Array(items)]))
            .await
    }

    // ---- club ---------------------------------------------------------

    pub async fn search_club(
        &self,
        criteria: &ClubSearchCriteria,
    ) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call(
            "club",
            "search",
            vec![serde_json::to_value(criteria).unwrap_or(Value::Null)],
        ))
        .await
    }

    pub async fn get_club_stats(&self) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("club", "getStats", vec![]))
            .await
    }

    // ---- user ---------------------------------------------------------

    pub async fn get_user(&self) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::sync_call("user", "getUser", vec![]))
            .await
    }

    pub async fn get_currencies(&self) -> Result<ResultEnvelope<Value>, ChannelError> {
        self.call(RequestDescriptor::call("user", "requestCurrencies", vec![]))
            .await
    }

    // ---- store --------------------------------------------------------

    pub async fn get_packs(&self, category: Option<&str>) -> Result<ResultEnvelope<Value>, ChannelError> {
        let arg = category.map(|c| json!(c)).unwrap_or(Value::Null);
        self.call(RequestDescriptor::call("store", "getPacks", vec![arg]))
            .await
    }

    // ---- notification / localization ----------------------------------

    pub async fn show_notification(
        &self,
        message: &str,
        kind: NotificationKind,
    ) -> Result<ResultEnvelope<bool>, ChannelError> {
        self.call(RequestDescriptor::sync_call(
            "notification",
            "queue",
            vec![json!(message), serde_json::to_value(kind).unwrap_or(Value::Null)],
        ))
        .await
    }

    pub async fn localize(&self, key: &str) -> Result<ResultEnvelope<String>, ChannelError> {
        self.call(RequestDescriptor::sync_call("localization", "localize", vec![json!(key)]))
            .await
    }

    pub async fn get_locale(&self) -> Result<ResultEnvelope<String>, ChannelError> {
        self.call(RequestDescriptor::sync_call("localization", "getLocale", vec![]))
            .await
    }
}
