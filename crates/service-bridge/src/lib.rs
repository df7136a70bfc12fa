//! RPC bridge over the companion app's private service layer.
//!
//! The page exposes its services as observer objects; this crate injects a
//! promise-wrapping shim and drives it through the script channel, so the
//! rest of the system sees plain request/response calls. The contract is the
//! [`ResultEnvelope`]: service failures are values, channel failures are
//! errors.

pub mod bridge;
pub mod envelope;
pub mod script;
pub mod shim;
pub mod types;

pub use bridge::ServiceBridge;
pub use envelope::{codes, ErrorInfo, RequestDescriptor, ResultEnvelope};
pub use shim::{COMPANION_SHIM_JS, OBSERVE_TIMEOUT_MS};
pub use types::{
    AuctionDuration, ClubSearchCriteria, ItemPile, ItemQuality, NotificationKind,
    StorageSearchCriteria, TransferSearchCriteria,
};
