// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-event rendering pipeline for timestamped styled subtitle events.
//!
//! This crate turns a parsed [`Event`](event::Event) plus a [`Track`](event::Track)
//! of styles into a layered list of positioned alpha-bitmap [`Image`](image::Image)s
//! suitable for compositing onto video frames. Script parsing, font discovery,
//! the low-level outline/stroker/rasterizer primitives and the text shaper's
//! bidi/cluster/cmap machinery are treated as external collaborators and are
//! expressed here as traits (see [`fontsrc`], [`shaping`], [`raster`]).

mod align;
mod bitmap;
mod blur;
pub mod cache;
mod color;
mod compose;
mod coords;
mod drawing;
pub mod error;
mod fixed;
pub mod fontsrc;
mod geometry;
pub mod image;
mod outline;
mod pipeline;
mod quantize;
mod raster;
mod reorder;
mod render_state;
pub mod shaping;
mod style;
mod tags;
mod wrap;

pub mod event;
pub mod frame;
pub mod renderer;

pub use color::Color;
pub use error::{Error, InitError};
pub use event::{Event, Style, Track};
pub use fixed::D6;
pub use fontsrc::{FaceId, FaceMetrics, FontSource};
pub use image::{EventImages, Image};
pub use raster::{BlitEngine, ScalarBlitEngine};
pub use renderer::{ChangeLevel, Renderer, RendererSettings};
pub use shaping::{ShapedCluster, Shaper};

pub(crate) use geometry::BBox;
