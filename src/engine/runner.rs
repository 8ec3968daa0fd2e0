//! Background cycle thread with cooperative stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::capture::CaptureBackend;
use crate::engine::MatchEngine;
use crate::trace::trace_event;
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Default cycle period, roughly display refresh rate.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(16);

/// Owns the cycle thread.
///
/// The stop flag is checked once per cycle, at the top, so a stop request
/// lets the in-flight cycle finish and publish before the thread exits. No
/// thread is ever killed mid-cycle.
pub struct CycleRunner {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CycleRunner {
    /// Spawns the cycle thread and starts matching immediately.
    ///
    /// Cycles start `period` apart; a cycle that overruns the period is
    /// followed immediately by the next one.
    pub fn spawn<P, F>(
        mut engine: MatchEngine<P, F>,
        period: Duration,
    ) -> ScreenMatchResult<Self>
    where
        P: CaptureBackend + Send + 'static,
        F: CaptureBackend + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("screenmatch-cycle".into())
            .spawn(move || {
                while !flag.load(Ordering::Acquire) {
                    let started = Instant::now();
                    if engine.run_cycle().is_err() {
                        // Internal cycle errors are not fatal to the runner;
                        // the next cycle starts from fresh inputs.
                        trace_event!("cycle_error");
                    }
                    if let Some(remaining) = period.checked_sub(started.elapsed()) {
                        thread::sleep(remaining);
                    }
                }
            })
            .map_err(|_| ScreenMatchError::RunnerState("failed to spawn cycle thread"))?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Requests a stop without waiting for the thread to exit.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stops the runner and waits for the final cycle to publish.
    pub fn join(mut self) -> ScreenMatchResult<()> {
        self.request_stop();
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ScreenMatchError::RunnerState("cycle thread panicked")),
            None => Ok(()),
        }
    }
}

impl Drop for CycleRunner {
    fn drop(&mut self) {
        self.request_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
