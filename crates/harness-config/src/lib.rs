// crates/harness-config/src/lib.rs
// ============================================================================
// Module: Translator Harness Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for translator-harness.toml semantics.
// Dependencies: harness-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `harness-config` defines the TOML configuration model for the acceptance
//! test harness: target agent, normalizer, suite source, artifact paths, and
//! run logging. Loading is strict about size, encoding, and bounds.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
