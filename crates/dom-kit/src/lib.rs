//! DOM surface and resilience primitives.
//!
//! [`DomSurface`] is the seam between orchestration code and the live page:
//! the driver primitives (query, read, click, type) expressed as a trait so
//! routines can run against a fake surface in tests. [`ScriptDom`] implements
//! it over the script channel. [`Waits`] and the retry helpers carry the
//! timing discipline: waits observe state until a bound, retries re-run an
//! operation with backoff.

pub mod errors;
pub mod retry;
pub mod script_dom;
pub mod surface;
pub mod waits;

pub use errors::DomError;
pub use retry::{with_retry, with_retry_on_condition, RetryExhausted, RetryOptions};
pub use script_dom::ScriptDom;
pub use surface::{DomSurface, ElementHandle};
pub use waits::Waits;
