//! Per-profile expense ledger and budget-advisory engine.
//!
//! Each profile owns an isolated SQLite ledger of dated, categorized
//! expenses and a JSON document of per-month category spending limits.
//! On top of the stores sit pure advisory functions (suggested limits
//! from recent history, overspend warnings) and an in-memory audit log
//! of limit edits. Rendering, charting and localization are left to
//! hosts; the engine takes explicit paths and returns plain values.
//!
//! Concurrency contract: all calls are blocking and the engine assumes
//! at most one writer per profile at a time. A host exposing concurrent
//! access must serialize writes per profile (e.g. a per-profile mutex)
//! before calling in.

pub mod advisor;
pub mod audit;
pub mod error;
pub mod ledger;
pub mod limits;
pub mod models;
pub mod month;
pub mod profiles;
