// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lane module: least-squares line fitting and left/right lane aggregation.

pub mod aggregate;
pub mod fit;

pub use aggregate::{LaneAggregator, LaneBuckets, WeightedFit};
pub use fit::{fit_line, fit_segment};
