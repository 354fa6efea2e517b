use crate::prelude::{Arc, Duration, Future, Instant, Mutex};
use crate::runtime::{self, AsyncHandle};
use crate::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Runs fetches on the async runtime and hands their results back to the
/// owning (UI) thread through a channel.
///
/// Nothing is applied from the spawned task itself; the owner drains
/// completions and commits them, so all state changes stay on one thread.
/// Dropping the dispatcher cancels whatever is still running.
pub struct FetchDispatcher<M> {
    tx: Sender<M>,
    rx: Receiver<M>,
    in_flight: Arc<AtomicUsize>,
    tasks: Mutex<Vec<Box<dyn AsyncHandle>>>,
}

/// Decrements the in-flight count when the task ends, aborted or not
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<M: Send + 'static> FetchDispatcher<M> {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            in_flight: Arc::new(AtomicUsize::new(0)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawns `future`; its output is queued for [`FetchDispatcher::drain`].
    ///
    /// Fails without running anything when no async runtime is available.
    pub fn dispatch<F>(&self, future: F) -> Result<()>
    where
        F: Future<Output = M> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlight(self.in_flight.clone());

        let spawned = runtime::spawn(async move {
            let _guard = guard;
            let message = future.await;
            if tx.send(message).is_err() {
                log::debug!("dispatcher dropped before completion was delivered");
            }
        });

        // On failure the future (and its guard) was dropped unspawned
        let handle = spawned?;
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|task| !task.is_finished());
            tasks.push(handle);
        }
        Ok(())
    }

    /// Aborts every running fetch; their completions never arrive
    pub fn cancel_all(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                if !task.is_finished() {
                    task.cancel();
                }
            }
        }
    }

    /// Completions received so far, without blocking
    pub fn drain(&self) -> Vec<M> {
        self.rx.try_iter().collect()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0 && self.rx.is_empty()
    }

    /// Blocks until one completion arrives or `timeout` passes.
    /// Not for use on the UI thread.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<M> {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Blocks until every dispatched fetch has delivered or `timeout` passes,
    /// returning what arrived
    pub fn wait(&self, timeout: Duration) -> Vec<M> {
        let deadline = Instant::now() + timeout;
        let mut received = self.drain();

        while self.in_flight() > 0 {
            let now = Instant::now();
            if now >= deadline {
                log::warn!("{} fetches still in flight after {:?}", self.in_flight(), timeout);
                break;
            }
            let slice = (deadline - now).min(Duration::from_millis(20));
            received.extend(self.recv_timeout(slice));
        }

        received.extend(self.drain());
        received
    }
}

impl<M: Send + 'static> Default for FetchDispatcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Drop for FetchDispatcher<M> {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.cancel();
            }
        }
    }
}

impl<M> std::fmt::Debug for FetchDispatcher<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchDispatcher")
            .field("in_flight", &self.in_flight.load(Ordering::Acquire))
            .field("queued", &self.rx.len())
            .finish()
    }
}
