// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat moderation single-flight.

use std::sync::Arc;

use dashmap::DashMap;

/// Tracks which chats have a moderation run in flight.
///
/// A chat holds at most one permit at a time. Messages arriving while a
/// permit is out are recorded to history but never moderated, not even
/// after the permit is released.
#[derive(Debug, Default)]
pub struct FlightGuard {
    active: DashMap<i64, ()>,
}

impl FlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the chat for one moderation run.
    ///
    /// Returns `None` when a run is already in flight for `chat_id`. The
    /// claim is released when the returned permit is dropped.
    pub fn try_acquire(self: &Arc<Self>, chat_id: i64) -> Option<FlightPermit> {
        if self.active.insert(chat_id, ()).is_some() {
            return None;
        }
        Some(FlightPermit {
            guard: Arc::clone(self),
            chat_id,
        })
    }

    /// Number of chats with a moderation run currently in flight.
    pub fn in_flight(&self) -> usize {
        self.active.len()
    }
}

/// RAII claim on a chat's moderation slot.
#[derive(Debug)]
pub struct FlightPermit {
    guard: Arc<FlightGuard>,
    chat_id: i64,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.guard.active.remove(&self.chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_on_same_chat_fails() {
        let guard = Arc::new(FlightGuard::new());
        let permit = guard.try_acquire(7);
        assert!(permit.is_some());
        assert!(guard.try_acquire(7).is_none());
    }

    #[test]
    fn dropping_the_permit_releases_the_chat() {
        let guard = Arc::new(FlightGuard::new());
        drop(guard.try_acquire(7));
        assert!(guard.try_acquire(7).is_some());
    }

    #[test]
    fn distinct_chats_do_not_conflict() {
        let guard = Arc::new(FlightGuard::new());
        let first = guard.try_acquire(1);
        let second = guard.try_acquire(2);
        assert!(first.is_some());
        assert!(second.is_some());
    }

    #[test]
    fn in_flight_tracks_outstanding_permits() {
        let guard = Arc::new(FlightGuard::new());
        assert_eq!(guard.in_flight(), 0);
        let first = guard.try_acquire(1);
        let second = guard.try_acquire(2);
        assert_eq!(guard.in_flight(), 2);
        drop(first);
        assert_eq!(guard.in_flight(), 1);
        drop(second);
        assert_eq!(guard.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_acquires_yield_exactly_one_permit() {
        let guard = Arc::new(FlightGuard::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let guard = guard.clone();
            handles.push(tokio::spawn(async move { guard.try_acquire(7) }));
        }

        let mut permits = Vec::new();
        for handle in handles {
            permits.push(handle.await.unwrap());
        }
        assert_eq!(permits.iter().filter(|p| p.is_some()).count(), 1);
    }
}
