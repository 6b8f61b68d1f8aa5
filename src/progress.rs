//! Observer trait for pipeline step and state events.
//!
//! Inject an [`Arc<dyn PipelineObserver>`] via
//! [`crate::config::ClientConfigBuilder::observer`] to receive events as the
//! orchestrator runs each step. A UI forwards them to a spinner, a status
//! bar or a channel; the library does not care which.
//!
//! # Example
//!
//! ```rust
//! use resume_tailor::{ClientConfig, PipelineObserver, Step};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     finished: AtomicUsize,
//! }
//!
//! impl PipelineObserver for CountingObserver {
//!     fn on_step_complete(&self, step: Step) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{step} done");
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { finished: AtomicUsize::new(0) });
//!
//! let config = ClientConfig::builder()
//!     .observer(observer as Arc<dyn PipelineObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::Step;
use crate::state::PipelineState;
use std::sync::Arc;

/// Called by the orchestrator around each network step.
///
/// All methods default to no-ops so implementors only override what they
/// need. Implementations must be `Send + Sync` because the orchestrator may
/// be driven from any tokio worker.
pub trait PipelineObserver: Send + Sync {
    /// A step passed its preconditions and its request is about to be sent.
    fn on_step_start(&self, step: Step) {
        let _ = step;
    }

    /// A step finished and its results (if any) are applied.
    fn on_step_complete(&self, step: Step) {
        let _ = step;
    }

    /// A step failed. `message` is the user-facing text.
    ///
    /// Also called when a step future is dropped before it completes,
    /// after the busy flag has been released.
    fn on_step_error(&self, step: Step, message: &str) {
        let _ = (step, message);
    }

    /// The derived pipeline state changed.
    fn on_state_change(&self, from: PipelineState, to: PipelineState) {
        let _ = (from, to);
    }
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type Observer = Arc<dyn PipelineObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl PipelineObserver for Recorder {
        fn on_step_start(&self, step: Step) {
            self.events.lock().unwrap().push(format!("start:{step}"));
        }

        fn on_step_error(&self, step: Step, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error:{step}:{message}"));
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_step_start(Step::Upload);
        obs.on_step_complete(Step::Upload);
        obs.on_step_error(Step::Tailor, "nope");
        obs.on_state_change(PipelineState::Idle, PipelineState::Uploading);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_step_start(Step::Tailor);
        rec.on_step_complete(Step::Tailor);
        rec.on_step_error(Step::Download, "gone");
        let events = rec.events.lock().unwrap();
        assert_eq!(*events, vec!["start:tailor", "error:download:gone"]);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let obs: Observer = Arc::new(NoopObserver);
        obs.on_step_complete(Step::Download);
    }
}
