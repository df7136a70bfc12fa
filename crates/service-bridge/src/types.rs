//! Argument types for bridge calls.
//!
//! Result payloads stay as `serde_json::Value`; the page decides their
//! shape and the orchestration layer only ever inspects a handful of
//! fields. Arguments are typed because the bridge serializes them.

use serde::{Deserialize, Serialize};

/// Destination piles for inventory moves.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum ItemPile {
    #[serde(rename = "club")]
    Club,
    #[serde(rename = "tradepile")]
    Transfer,
    #[serde(rename = "watchlist")]
    Watchlist,
    #[serde(rename = "unassigned")]
    Unassigned,
    #[serde(rename = "sbcStorage")]
    SbcStorage,
}

/// Listing durations the market accepts, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuctionDuration {
    OneHour,
    ThreeHours,
    SixHours,
    TwelveHours,
    OneDay,
    ThreeDays,
}

impl AuctionDuration {
    pub fn seconds(self) -> u32 {
        match self {
            AuctionDuration::OneHour => 3_600,
            AuctionDuration::ThreeHours => 10_800,
            AuctionDuration::SixHours => 21_600,
            AuctionDuration::TwelveHours => 43_200,
            AuctionDuration::OneDay => 86_400,
            AuctionDuration::ThreeDays => 259_200,
        }
    }
}

impl Serialize for AuctionDuration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.seconds())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemQuality {
    Bronze,
    Silver,
    Gold,
    Special,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Positive,
    Negative,
    Neutral,
}

/// Transfer-market search filter. Unset fields are omitted from the
/// serialized criteria so the page applies its own defaults.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSearchCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<ItemQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_buy: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_buy: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_bid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nation: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub league: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club: Option<u32>,
}

/// Club inventory search filter.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSearchCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<ItemQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub untradeables_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

/// SBC storage search filter.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSearchCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<ItemQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn piles_serialize_to_page_names() {
        assert_eq!(serde_json::to_value(ItemPile::Transfer).unwrap(), json!("tradepile"));
        assert_eq!(serde_json::to_value(ItemPile::SbcStorage).unwrap(), json!("sbcStorage"));
    }

    #[test]
    fn durations_serialize_as_seconds() {
        assert_eq!(serde_json::to_value(AuctionDuration::OneHour).unwrap(), json!(3600));
        assert_eq!(serde_json::to_value(AuctionDuration::ThreeDays).unwrap(), json!(259200));
    }

    #[test]
    fn unset_criteria_fields_are_omitted() {
        let criteria = TransferSearchCriteria {
            quality: Some(ItemQuality::Bronze),
            max_buy: Some(1000),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&criteria).unwrap(),
            json!({ "quality": "bronze", "maxBuy": 1000 })
        );
    }
}
