//! Singleflight Module
//!
//! Collapses concurrent loads of the same key into one in-flight operation.
//! The first caller for a key becomes the leader and runs the work; every
//! caller that arrives while the flight is up waits on a broadcast channel
//! and receives the leader's result, success or error alike.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::{CacheError, Result};

type FlightMap<T> = Mutex<HashMap<String, broadcast::Sender<Result<T>>>>;

// == Flight Group ==
/// Deduplicates concurrent invocations of the same keyed operation.
///
/// The in-flight map lock is only ever held for map bookkeeping, never
/// across an await point.
pub struct FlightGroup<T> {
    calls: FlightMap<T>,
}

impl<T: Clone + Send + 'static> FlightGroup<T> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    // == Fly ==
    /// Runs `work` for `key`, unless a flight for the same key is already
    /// in progress, in which case the caller waits for that flight's
    /// result instead.
    ///
    /// If the leader is cancelled mid-flight, its registration is removed
    /// on drop so waiters fail with an internal error rather than hanging.
    pub async fn fly<F, Fut>(&self, key: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let waiter = {
            let mut calls = self.calls.lock();
            match calls.get(key) {
                Some(sender) => Some(sender.subscribe()),
                None => {
                    let (sender, _) = broadcast::channel(1);
                    calls.insert(key.to_string(), sender);
                    None
                }
            }
        };

        if let Some(mut receiver) = waiter {
            return match receiver.recv().await {
                Ok(shared) => shared,
                // Channel closed without a result: the leader was dropped
                Err(_) => Err(CacheError::Internal(format!(
                    "in-flight load for '{}' was abandoned",
                    key
                ))),
            };
        }

        // Leader path; the guard clears the registration even if this
        // future is dropped before completing
        let mut guard = FlightGuard {
            calls: &self.calls,
            key,
            armed: true,
        };
        let result = work().await;

        // Remove the registration before broadcasting so a caller arriving
        // now starts a fresh flight instead of waiting on a finished one
        let sender = self.calls.lock().remove(key);
        guard.armed = false;
        if let Some(sender) = sender {
            // No receivers is fine; the leader alone consumed the result
            let _ = sender.send(result.clone());
        }
        result
    }
}

impl<T: Clone + Send + 'static> Default for FlightGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

// == Flight Guard ==
/// Removes a leader's registration if the flight is dropped mid-work.
/// Dropping the registered sender closes the channel, waking waiters with
/// a receive error.
struct FlightGuard<'a, T> {
    calls: &'a FlightMap<T>,
    key: &'a str,
    armed: bool,
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.calls.lock().remove(self.key);
        }
    }
}
