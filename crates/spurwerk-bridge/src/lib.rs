// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// spurwerk-bridge: the world outside the per-frame pipeline.
//
// Frame capture and display are collaborator traits so the driving loop can be
// fed from image files, a camera binding, or a test double. `FrameLoop` owns
// the acquire/process/present cycle and guarantees both collaborators are
// released however the loop ends.

pub mod files;
pub mod frame_loop;
pub mod stop;
pub mod traits;

pub use files::{ImageFileSink, ImageFileSource};
pub use frame_loop::{FrameLoop, RunSummary, StopReason};
pub use stop::{FrameLimit, KeyStop, StopFlag};
pub use traits::{FrameSink, FrameSource, StopSignal};
