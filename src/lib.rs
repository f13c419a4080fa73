//! Purpose: Shared library crate used by the `jfetch` CLI and tests.
//! Exports: `error`, `params`, `request`.
//! Role: Internal library backing the binary; not yet a stable public SDK.
//! Invariants: Treat the crate API as internal until a dedicated library release.
//! Invariants: Modules prefer explicit inputs/outputs over hidden state.
pub mod error;
pub mod params;
pub mod request;
