//! Host timer: runs a callback on a fixed period until cancelled.

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use super::sequencer::StepSequencer;
use crate::{clock::AudioEngine, error::SequencerError, sequencing::Step};

/// A background thread calling a closure every `interval`.
///
/// The first call happens immediately. Calls never overlap, and none start
/// after [`PollingTask::cancel`] has returned.
pub struct PollingTask {
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PollingTask {
    pub fn spawn<F>(interval: Duration, callback: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        Self::spawn_with(thread::Builder::new(), interval, callback)
    }

    /// Like [`spawn`](Self::spawn) on a caller-configured thread builder.
    pub fn spawn_with<F>(builder: thread::Builder, interval: Duration, mut callback: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let token = Arc::clone(&cancelled);

        let handle = builder.name("lookahead-poll".into()).spawn(move || {
            let mut next = Instant::now();
            while !token.load(Ordering::Acquire) {
                callback();

                // Fixed cadence; a late call is followed by one immediate call, not a burst.
                next = (next + interval).max(Instant::now());
                loop {
                    if token.load(Ordering::Acquire) {
                        return;
                    }
                    let now = Instant::now();
                    if now >= next {
                        break;
                    }
                    thread::park_timeout(next - now);
                }
            }
        })?;

        Ok(Self {
            cancelled,
            handle: Some(handle),
        })
    }

    /// True while the polling thread exists and has not been cancelled.
    pub fn is_active(&self) -> bool {
        self.handle.is_some() && !self.cancelled.load(Ordering::Acquire)
    }

    /// Stop polling and wait for the thread to exit.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                log::error!("polling thread panicked");
            }
        }
    }
}

impl Drop for PollingTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A [`StepSequencer`] driven by its own [`PollingTask`].
///
/// `play()` starts polling at the configured interval, `stop()` cancels it
/// before the sequencer leaves Running, so no tick can land after `stop()`
/// returns.
pub struct Transport<E: AudioEngine + Send + 'static> {
    sequencer: Arc<Mutex<StepSequencer<E>>>,
    poller: Option<PollingTask>,
    poll_stack_size: Option<usize>,
}

impl<E: AudioEngine + Send + 'static> Transport<E> {
    pub fn new(sequencer: StepSequencer<E>) -> Self {
        Self {
            sequencer: Arc::new(Mutex::new(sequencer)),
            poller: None,
            poll_stack_size: None,
        }
    }

    /// Stack size for the polling thread; the platform default otherwise.
    pub fn with_poll_stack_size(mut self, bytes: usize) -> Self {
        self.poll_stack_size = Some(bytes);
        self
    }

    fn lock(&self) -> MutexGuard<'_, StepSequencer<E>> {
        lock_sequencer(&self.sequencer)
    }

    pub fn configure<S: Into<Step>>(
        &self,
        steps: impl IntoIterator<Item = S>,
        step_length: f64,
    ) -> Result<(), SequencerError> {
        self.lock().configure(steps, step_length)
    }

    pub fn play(&mut self) -> Result<(), SequencerError> {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }

        let interval = {
            let mut sequencer = self.lock();
            sequencer.play()?;
            sequencer.config().poll_interval
        };

        let mut builder = thread::Builder::new();
        if let Some(bytes) = self.poll_stack_size {
            builder = builder.stack_size(bytes);
        }

        let shared = Arc::clone(&self.sequencer);
        let poller = PollingTask::spawn_with(builder, interval, move || {
            lock_sequencer(&shared).tick();
        });

        match poller {
            Ok(poller) => {
                self.poller = Some(poller);
                Ok(())
            }
            Err(err) => {
                log::error!("failed to spawn polling thread: {err}");
                self.lock().stop();
                Err(SequencerError::Poller(err.to_string()))
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        self.lock().stop();
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(PollingTask::is_active)
    }

    /// Run `f` with exclusive access to the sequencer.
    pub fn with_sequencer<R>(&self, f: impl FnOnce(&mut StepSequencer<E>) -> R) -> R {
        f(&mut self.lock())
    }
}

impl<E: AudioEngine + Send + 'static> Drop for Transport<E> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Poisoning is ignored: a tick only replaces the timing state after its note
/// has been committed.
fn lock_sequencer<E: AudioEngine>(
    sequencer: &Mutex<StepSequencer<E>>,
) -> MutexGuard<'_, StepSequencer<E>> {
    sequencer.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn polling_task_stops_calling_after_cancel() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let task = PollingTask::spawn(Duration::from_millis(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        thread::sleep(Duration::from_millis(20));
        assert!(task.is_active());
        task.cancel();

        let after_cancel = count.load(Ordering::SeqCst);
        assert!(after_cancel >= 1);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(count.load(Ordering::SeqCst), after_cancel);
    }

    #[test]
    fn first_call_is_immediate() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let task = PollingTask::spawn(Duration::from_secs(60), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        task.cancel();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    /// No address space can back a stack this large.
    #[cfg(all(target_os = "linux", target_pointer_width = "64"))]
    const IMPOSSIBLE_STACK: usize = 1 << 60;

    #[cfg(all(target_os = "linux", target_pointer_width = "64"))]
    #[test]
    fn spawn_failure_is_returned() {
        let builder = thread::Builder::new().stack_size(IMPOSSIBLE_STACK);
        assert!(PollingTask::spawn_with(builder, Duration::from_millis(1), || {}).is_err());
    }

    #[cfg(all(target_os = "linux", target_pointer_width = "64"))]
    #[test]
    fn transport_play_fails_and_stops_when_poller_cannot_start() {
        use crate::{engine::OfflineEngine, sequencing::SequencerConfig, TransportState};

        let sequencer = StepSequencer::new(OfflineEngine::new(), SequencerConfig::default());
        let mut transport = Transport::new(sequencer).with_poll_stack_size(IMPOSSIBLE_STACK);

        let err = transport.play().unwrap_err();
        assert!(matches!(err, SequencerError::Poller(_)));
        assert!(!err.is_configuration());
        assert!(!transport.is_polling());
        assert_eq!(
            transport.with_sequencer(|s| s.transport()),
            TransportState::Stopped
        );
    }
}
