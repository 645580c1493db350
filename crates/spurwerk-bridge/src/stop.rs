// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stop signals for the frame loop: a shared flag, a frame budget, and a
// terminal key watcher.

use std::io::{self, BufRead, BufReader};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use spurwerk_core::error::Result;
use tracing::{debug, info};

use crate::traits::StopSignal;

/// Key that stops the loop when typed on its own line.
pub const STOP_KEY: &str = "q";

/// Cloneable "stop requested" flag shared between threads.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl StopSignal for StopFlag {
    fn should_stop(&self, _frames_processed: u64) -> bool {
        self.is_raised()
    }
}

/// Stop once a fixed number of frames has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimit(pub u64);

impl StopSignal for FrameLimit {
    fn should_stop(&self, frames_processed: u64) -> bool {
        frames_processed >= self.0
    }
}

/// Raises a flag when `q` is entered on standard input.
///
/// The watcher runs on a detached thread; it exits on the stop key or when
/// the input reaches end of file, without raising the flag in the latter case.
#[derive(Debug, Clone)]
pub struct KeyStop {
    flag: StopFlag,
}

impl KeyStop {
    /// Watch the process's standard input.
    pub fn spawn() -> Result<Self> {
        Self::watch(BufReader::new(io::stdin()))
    }

    /// Watch an arbitrary line-oriented reader.
    pub fn watch<R>(reader: R) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let flag = StopFlag::new();
        let raised = flag.clone();
        thread::Builder::new()
            .name("spurwerk-keystop".into())
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) if line.trim().eq_ignore_ascii_case(STOP_KEY) => {
                            info!("Stop key received");
                            raised.raise();
                            return;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            debug!(error = %err, "Key watcher input failed");
                            return;
                        }
                    }
                }
            })?;
        Ok(Self { flag })
    }

    pub fn flag(&self) -> &StopFlag {
        &self.flag
    }
}

impl StopSignal for KeyStop {
    fn should_stop(&self, frames_processed: u64) -> bool {
        self.flag.should_stop(frames_processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn wait_for(flag: &StopFlag) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if flag.is_raised() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn flag_is_shared_between_clones() {
        let flag = StopFlag::new();
        let other = flag.clone();
        assert!(!other.should_stop(0));
        flag.raise();
        assert!(other.should_stop(0));
    }

    #[test]
    fn frame_limit_stops_at_budget() {
        let limit = FrameLimit(3);
        assert!(!limit.should_stop(2));
        assert!(limit.should_stop(3));
        assert!(FrameLimit(0).should_stop(0));
    }

    #[test]
    fn stop_key_raises_flag() {
        let keys = KeyStop::watch(Cursor::new("x\n  Q \nmore\n")).unwrap();
        assert!(wait_for(keys.flag()));
        assert!(keys.should_stop(0));
    }

    #[test]
    fn end_of_input_leaves_flag_lowered() {
        let keys = KeyStop::watch(Cursor::new("quit\nnope\n")).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(!keys.should_stop(10));
    }
}
