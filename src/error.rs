// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Per spec §7: only init failures are surfaced to the caller. Event-level
//! and cache-construction failures are logged and recovered from locally;
//! they never appear here.

use thiserror::Error;

/// Failure constructing a [`Renderer`](crate::renderer::Renderer).
#[derive(Debug, Error)]
pub enum InitError {
    /// The font source could not be reached or returned no usable faces.
    #[error("font source unavailable: {0}")]
    FontSource(String),
    /// The supplied renderer settings were invalid (e.g. zero-sized frame).
    #[error("invalid renderer settings: {0}")]
    InvalidSettings(String),
    /// The blit engine / rasterizer backend failed to initialize.
    #[error("rasterizer backend unavailable: {0}")]
    Backend(String),
}

/// Top-level error type. Currently only wraps [`InitError`]; kept as its
/// own enum (rather than a bare `InitError`) so additional caller-visible
/// failure modes can be added without an API break.
#[derive(Debug, Error)]
pub enum Error {
    /// Renderer construction failed.
    #[error(transparent)]
    Init(#[from] InitError),
}
