// ABOUTME: Per-client sliding-window rate limiter shared by every service operation.
// ABOUTME: Keeps admission instants per client and recomputes the window on each check.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::warn;

pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_REQUESTS: usize = 30;

/// Admission checks between sweeps of idle clients.
const SWEEP_INTERVAL: u64 = 256;

#[derive(Debug, Default)]
struct Windows {
    clients: HashMap<String, VecDeque<Instant>>,
    checks: u64,
}

/// Sliding-window limiter: at most `max_requests` admissions per client in
/// any trailing `window`.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    state: Mutex<Windows>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_WINDOW, DEFAULT_MAX_REQUESTS)
    }
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            state: Mutex::new(Windows::default()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Checks and records one request for `client`.
    pub fn admit(&self, client: &str) -> bool {
        self.admit_at(client, Instant::now())
    }

    /// Prunes admissions older than the window, then admits and records
    /// `now` if fewer than `max_requests` remain. Rejections are not recorded.
    ///
    /// Every few hundred checks, clients with no admission inside the window
    /// are dropped so the map only holds recently active clients.
    pub fn admit_at(&self, client: &str, now: Instant) -> bool {
        let mut state = self.lock();
        state.checks = state.checks.wrapping_add(1);
        if state.checks % SWEEP_INTERVAL == 0 {
            Self::sweep(&mut state.clients, now, self.window);
        }

        let history = state.clients.entry(client.to_string()).or_default();

        while let Some(&oldest) = history.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                history.pop_front();
            } else {
                break;
            }
        }

        if history.len() >= self.max_requests {
            warn!(client, limit = self.max_requests, "rate limit exceeded");
            return false;
        }

        history.push_back(now);
        true
    }

    /// Admissions currently counted against `client`, without pruning.
    pub fn recorded(&self, client: &str) -> usize {
        self.lock().clients.get(client).map_or(0, VecDeque::len)
    }

    /// Clients currently holding a window.
    pub fn tracked_clients(&self) -> usize {
        self.lock().clients.len()
    }

    /// Drops clients whose newest admission has left the window; returns how
    /// many were dropped.
    pub fn prune_idle_at(&self, now: Instant) -> usize {
        let mut state = self.lock();
        Self::sweep(&mut state.clients, now, self.window)
    }

    fn sweep(clients: &mut HashMap<String, VecDeque<Instant>>, now: Instant, window: Duration) -> usize {
        let before = clients.len();
        clients.retain(|_, history| {
            history
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < window)
        });
        before - clients.len()
    }

    fn lock(&self) -> MutexGuard<'_, Windows> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Derives the rate-limit key for a request.
///
/// Uses the first element of an `X-Forwarded-For` header, else the peer
/// address, else `"unknown"`.
pub fn client_identity(forwarded_for: Option<&str>, peer: Option<&str>) -> String {
    forwarded_for
        .and_then(|header| header.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .or_else(|| peer.map(str::trim).filter(|p| !p.is_empty()))
        .unwrap_or("unknown")
        .to_string()
}
