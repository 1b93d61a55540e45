//! Integration test host for the pae workspace.
//!
//! The engine lives in `pae-core` and the binary in `pae-cli`; this package
//! only exists so cross-crate tests under `tests/` have a home.

pub use pae_core;
