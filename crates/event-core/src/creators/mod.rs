//! Event creators.
//!
//! Each creator turns frozen upstream results into one kind of event. A
//! creator is configured with builder methods, then either run inline with
//! [`EventCreator::run`] or moved onto a blocking worker with
//! [`EventCreator::create`], which returns a [`CreatorTask`] to await.

pub mod balance;
pub mod battle_end;
pub mod battle_open;
pub mod battle_result;
pub mod count;
pub mod death;
pub mod kill;
pub mod special_weapon;

pub use balance::PlayerNumberBalanceEventCreator;
pub use battle_end::BattleEndEventCreator;
pub use battle_open::BattleOpenEventCreator;
pub use battle_result::BattleResultEventCreator;
pub use count::CountEventCreator;
pub use death::DeathEventCreator;
pub use kill::KillEventCreator;
pub use special_weapon::SpecialWeaponEventCreator;

use std::sync::Arc;

use inkframe_battle_model::{Frame, FrameSeq};
use inkframe_common::{FrameSpan, InkframeError, InkframeResult};
use tokio::task::JoinHandle;

/// Orchestrates the extraction of one event kind.
pub trait EventCreator: Send + Sync + Sized + 'static {
    type Output: Send + 'static;

    /// Name used for the worker and in logs.
    fn name(&self) -> &'static str;

    /// Run synchronously on the current thread.
    fn run(&self) -> InkframeResult<Self::Output>;

    /// Run on a blocking worker of the current tokio runtime.
    fn create(self) -> CreatorTask<Self::Output> {
        let name = self.name();
        let handle = tokio::task::spawn_blocking(move || {
            let _span = tracing::info_span!("creator", name).entered();
            let started = std::time::Instant::now();
            let result = self.run();
            tracing::debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                ok = result.is_ok(),
                "Event creator finished"
            );
            result
        });
        CreatorTask { name, handle }
    }
}

/// A creator running on a worker. Results are only reachable through
/// [`CreatorTask::join`].
#[derive(Debug)]
pub struct CreatorTask<T> {
    name: &'static str,
    handle: JoinHandle<InkframeResult<T>>,
}

impl<T> CreatorTask<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wait for the worker. A panicked or aborted worker surfaces as
    /// [`InkframeError::Worker`].
    pub async fn join(self) -> InkframeResult<T> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(creator = self.name, error = %e, "Event creator join failed");
                Err(InkframeError::worker(self.name, e.to_string()))
            }
        }
    }
}

/// Frames of `seq` inside `window`, or the whole sequence for an unbounded window.
pub(crate) fn frames_in<T>(seq: &FrameSeq<T>, window: Option<FrameSpan>) -> &[Frame<T>] {
    match window {
        Some(span) => seq.window(span.start, span.end),
        None => seq.frames(),
    }
}

/// Unwrap an input that must be supplied before a creator runs.
pub(crate) fn required<'a, T>(
    input: &'a Option<Arc<T>>,
    creator: &str,
    what: &str,
) -> InkframeResult<&'a T> {
    input
        .as_deref()
        .ok_or_else(|| InkframeError::misuse(format!("{creator} started without {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u32);

    impl EventCreator for Fixed {
        type Output = u32;

        fn name(&self) -> &'static str {
            "fixed"
        }

        fn run(&self) -> InkframeResult<u32> {
            Ok(self.0)
        }
    }

    struct Panicking;

    impl EventCreator for Panicking {
        type Output = ();

        fn name(&self) -> &'static str {
            "panicking"
        }

        fn run(&self) -> InkframeResult<()> {
            panic!("creator bug");
        }
    }

    #[tokio::test]
    async fn test_create_and_join() {
        let task = Fixed(7).create();
        assert_eq!(task.name(), "fixed");
        assert_eq!(task.join().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_panic_surfaces_as_worker_error() {
        let err = Panicking.create().join().await.unwrap_err();
        assert!(matches!(err, InkframeError::Worker { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_required_input() {
        let missing: Option<Arc<u32>> = None;
        let err = required(&missing, "kill", "lamp detections").unwrap_err();
        assert!(err.to_string().contains("kill started without lamp detections"));

        let present = Some(Arc::new(3u32));
        assert_eq!(*required(&present, "kill", "lamps").unwrap(), 3);
    }
}
