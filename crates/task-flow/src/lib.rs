//! Orchestration for the companion app: navigation, task discovery,
//! solvers and the daily control loop.
//!
//! Everything here drives the page through the [`dom_kit::DomSurface`]
//! seam, so routines run unchanged against the live page or a fake surface
//! in tests.

pub mod auth;
pub mod context;
pub mod daily_loop;
pub mod discovery;
pub mod errors;
pub mod helpers;
pub mod navigation;
pub mod packs;
pub mod selectors;
pub mod solvers;

#[cfg(test)]
mod testkit;

pub use auth::{Credentials, LoginRoutine, SecondFactorSource, APP_URL};
pub use context::SolveCtx;
pub use daily_loop::DailyTaskLoop;
pub use discovery::{CandidateTask, TaskDiscovery};
pub use errors::PilotError;
pub use helpers::SolveHelpers;
pub use navigation::Navigator;
pub use packs::PackOpeningRoutine;
pub use selectors::Selectors;
pub use solvers::{Solver, SolverFactory, SolverRegistry};
