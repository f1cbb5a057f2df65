// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord charts: songs, measures and their import/export form.
//!
//! This module provides:
//! - The song aggregate ([`Oligophony`]) and its measure sequence
//! - Measures of beat slots ([`Measure`]) addressed by [`MeasureId`]
//! - Plain chart data for bulk import and export ([`ChartData`])

pub mod import;
pub mod measure;
pub mod song;

pub use import::{ChartData, MeasureEntry};
pub use measure::{Measure, MeasureId};
pub use song::{Oligophony, Slot, SongId, TransposeTarget};
