//! Admission control for concurrent tile loads.
//!
//! All bookkeeping (counters, queue, last start time) lives behind a single
//! mutex. The lock is only held for the admit / release / drain decision and
//! never across an `.await`; the loads themselves run on spawned tasks.
//!
//! # Slot Lifecycle
//!
//! Every admitted request owns an [`ActiveSlot`]. The slot is created in the
//! same critical section that increments the counters, and dropping it
//! decrements them and admits the next eligible queued request. Because the
//! release happens in `Drop`, a slot is freed exactly once whatever the
//! outcome: success, load error, timeout, or a target that panics.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;

use super::config::ThrottleConfig;
use super::error::ThrottleError;
use super::queue::{PendingQueue, PendingRequest};
use super::snapshot::{DomainSnapshot, ThrottleSnapshot};
use crate::target::TileTarget;
use crate::telemetry::ThrottleMetrics;

/// Live state for one domain.
#[derive(Debug, Default, Clone, Copy)]
struct DomainCounter {
    active: usize,
}

/// Mutable throttler state, guarded by `Shared::state`.
struct ThrottleState<T: TileTarget> {
    global_active: usize,
    domains: HashMap<String, DomainCounter>,
    queue: PendingQueue<T>,
    /// Start time of the most recently started (or scheduled) request.
    last_start: Option<Instant>,
}

impl<T: TileTarget> ThrottleState<T> {
    fn new() -> Self {
        Self {
            global_active: 0,
            domains: HashMap::new(),
            queue: PendingQueue::new(),
            last_start: None,
        }
    }

    fn domain_active(&self, domain: &str) -> usize {
        self.domains.get(domain).map_or(0, |counter| counter.active)
    }

    fn has_capacity(&self, domain: &str, config: &ThrottleConfig) -> bool {
        self.global_active < config.max_concurrent
            && self.domain_active(domain) < config.max_per_domain
    }

    /// Counts a request as active. Returns the new global active count.
    fn occupy(&mut self, domain: &str) -> usize {
        self.global_active += 1;
        self.domains.entry(domain.to_string()).or_default().active += 1;
        self.global_active
    }

    fn vacate(&mut self, domain: &str) {
        self.global_active = self.global_active.saturating_sub(1);
        if let Some(counter) = self.domains.get_mut(domain) {
            counter.active = counter.active.saturating_sub(1);
        }
    }

    /// Reserves a start time at least `min_delay` after the previous start.
    fn schedule_start(&mut self, now: Instant, min_delay: Duration) -> Instant {
        let start_at = match self.last_start {
            Some(last) => (last + min_delay).max(now),
            None => now,
        };
        self.last_start = Some(start_at);
        start_at
    }

    fn mark_started(&mut self, now: Instant) {
        self.last_start = Some(self.last_start.map_or(now, |last| last.max(now)));
    }
}

struct Shared<T: TileTarget> {
    config: ThrottleConfig,
    state: Mutex<ThrottleState<T>>,
    metrics: ThrottleMetrics,
}

impl<T: TileTarget> Shared<T> {
    /// Frees a slot and admits at most one queued request.
    fn release(self: &Arc<Self>, domain: &str) {
        let next = {
            let mut state = self.state.lock();
            state.vacate(domain);
            self.admit_next(&mut state)
        };

        if let Some((request, slot)) = next {
            dispatch(request, slot, None);
        }
    }

    /// Removes the first queued request whose domain has spare capacity and
    /// counts it as active.
    fn admit_next(
        self: &Arc<Self>,
        state: &mut ThrottleState<T>,
    ) -> Option<(PendingRequest<T>, ActiveSlot<T>)> {
        if state.queue.is_empty() || state.global_active >= self.config.max_concurrent {
            return None;
        }

        let max_per_domain = self.config.max_per_domain;
        let domains = &state.domains;
        let request = state.queue.take_first_eligible(|entry| {
            domains
                .get(&entry.domain)
                .map_or(0, |counter| counter.active)
                < max_per_domain
        })?;

        let active = state.occupy(&request.domain);
        state.mark_started(Instant::now());
        self.metrics.request_admitted(active);

        tracing::debug!(
            domain = %request.domain,
            priority = request.priority,
            waited_ms = request.submitted_at.elapsed().as_millis() as u64,
            still_queued = state.queue.len(),
            "Admitted queued tile request"
        );

        let slot = ActiveSlot::new(Arc::clone(self), request.domain.clone());
        Some((request, slot))
    }
}

/// An occupied concurrency slot. Dropping it releases the slot.
struct ActiveSlot<T: TileTarget> {
    shared: Arc<Shared<T>>,
    domain: String,
    /// Set once the request's outcome has been recorded.
    reported: bool,
}

impl<T: TileTarget> ActiveSlot<T> {
    fn new(shared: Arc<Shared<T>>, domain: String) -> Self {
        Self {
            shared,
            domain,
            reported: false,
        }
    }
}

impl<T: TileTarget> Drop for ActiveSlot<T> {
    fn drop(&mut self) {
        if !self.reported {
            self.shared.metrics.request_abandoned();
        }
        self.shared.release(&self.domain);
    }
}

/// Runs an admitted request on the current Tokio runtime.
///
/// Without a runtime the request is dropped, which releases its slot and
/// reports it as abandoned to the waiting caller.
fn dispatch<T: TileTarget>(
    request: PendingRequest<T>,
    slot: ActiveSlot<T>,
    start_at: Option<Instant>,
) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(execute(request, slot, start_at));
        }
        Err(_) => {
            tracing::warn!(
                url = %request.locator,
                "No Tokio runtime available, abandoning tile request"
            );
        }
    }
}

async fn execute<T: TileTarget>(
    request: PendingRequest<T>,
    mut slot: ActiveSlot<T>,
    start_at: Option<Instant>,
) {
    let PendingRequest {
        target,
        locator,
        domain,
        completion,
        ..
    } = request;

    if let Some(start_at) = start_at.filter(|at| *at > Instant::now()) {
        tokio::time::sleep_until(start_at).await;
    }

    let timeout = slot.shared.config.tile_timeout;
    let metrics = &slot.shared.metrics;
    let result = match tokio::time::timeout(timeout, target.begin_load(locator.clone())).await {
        Ok(Ok(output)) => {
            metrics.request_succeeded();
            Ok(output)
        }
        Ok(Err(error)) => {
            tracing::debug!(domain = %domain, url = %locator, error = %error, "Tile load failed");
            metrics.request_failed();
            Err(ThrottleError::Load(error))
        }
        Err(_) => {
            tracing::warn!(
                domain = %domain,
                url = %locator,
                timeout_ms = timeout.as_millis() as u64,
                "Tile load timed out"
            );
            metrics.request_timed_out();
            Err(ThrottleError::Timeout {
                url: locator,
                timeout,
            })
        }
    };

    // Free the slot before waking the caller so it observes released counters
    slot.reported = true;
    drop(slot);

    // The caller may have discarded its completion
    let _ = completion.send(result);
}

/// Result of a submitted request.
///
/// Resolves once the request has been admitted and its load has succeeded,
/// failed or timed out. Dropping a completion discards the result; the load
/// itself still runs to completion and frees its slot.
#[must_use = "a completion does nothing unless awaited"]
pub struct TileCompletion<O> {
    receiver: oneshot::Receiver<Result<O, ThrottleError>>,
    locator: String,
}

impl<O> TileCompletion<O> {
    /// Address this completion was submitted for.
    pub fn locator(&self) -> &str {
        &self.locator
    }
}

impl<O> Future for TileCompletion<O> {
    type Output = Result<O, ThrottleError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ThrottleError::Abandoned {
                url: this.locator.clone(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<O> std::fmt::Debug for TileCompletion<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCompletion")
            .field("locator", &self.locator)
            .finish()
    }
}

/// Global and per-domain admission control for tile loads.
///
/// Cloning is cheap and yields a handle to the same throttler, so one
/// instance can be shared by every layer of a map view.
pub struct RequestThrottler<T: TileTarget> {
    shared: Arc<Shared<T>>,
}

impl<T: TileTarget> RequestThrottler<T> {
    /// Creates a throttler with the given limits.
    ///
    /// # Panics
    ///
    /// Panics if the configuration does not pass [`ThrottleConfig::validate`].
    pub fn new(config: ThrottleConfig) -> Self {
        if let Err(reason) = config.validate() {
            panic!("invalid throttle configuration: {}", reason);
        }

        tracing::info!(
            max_concurrent = config.max_concurrent,
            max_per_domain = config.max_per_domain,
            min_delay_ms = config.min_delay.as_millis() as u64,
            tile_timeout_ms = config.tile_timeout.as_millis() as u64,
            "Created tile request throttler"
        );

        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(ThrottleState::new()),
                metrics: ThrottleMetrics::new(),
            }),
        }
    }

    /// Creates a throttler with default limits.
    pub fn with_defaults() -> Self {
        Self::new(ThrottleConfig::default())
    }

    /// Submits a tile load.
    ///
    /// The admission decision is made before this returns: the request is
    /// either started (after the minimum spacing since the last start) or
    /// queued by `priority`, lower first. Await the returned completion for
    /// the result.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(
        &self,
        target: T,
        locator: impl Into<String>,
        domain: impl Into<String>,
        priority: i64,
    ) -> TileCompletion<T::Output> {
        let locator = locator.into();
        let (sender, receiver) = oneshot::channel();
        let completion = TileCompletion {
            receiver,
            locator: locator.clone(),
        };
        let request = PendingRequest::new(target, locator, domain.into(), priority, sender);
        self.shared.metrics.request_submitted();

        let admitted = {
            let mut state = self.shared.state.lock();
            if !state.domains.contains_key(&request.domain) {
                state
                    .domains
                    .insert(request.domain.clone(), DomainCounter::default());
            }

            if state.has_capacity(&request.domain, &self.shared.config) {
                let active = state.occupy(&request.domain);
                let start_at = state.schedule_start(Instant::now(), self.shared.config.min_delay);
                self.shared.metrics.request_admitted(active);
                let slot = ActiveSlot::new(Arc::clone(&self.shared), request.domain.clone());
                Some((request, slot, start_at))
            } else {
                tracing::debug!(
                    domain = %request.domain,
                    priority = request.priority,
                    global_active = state.global_active,
                    domain_active = state.domain_active(&request.domain),
                    "Tile request queued"
                );
                self.shared.metrics.request_queued();
                state.queue.push(request);
                None
            }
        };

        if let Some((request, slot, start_at)) = admitted {
            dispatch(request, slot, Some(start_at));
        }

        completion
    }

    /// Read-only view of active and queued requests.
    pub fn snapshot(&self) -> ThrottleSnapshot {
        let state = self.shared.state.lock();

        let mut domains: BTreeMap<String, DomainSnapshot> = state
            .domains
            .iter()
            .map(|(domain, counter)| {
                (
                    domain.clone(),
                    DomainSnapshot {
                        active: counter.active,
                        queued: 0,
                    },
                )
            })
            .collect();
        for (domain, queued) in state.queue.domain_counts() {
            domains.entry(domain.to_string()).or_default().queued = queued;
        }

        ThrottleSnapshot {
            active: state.global_active,
            queued: state.queue.len(),
            domains,
            totals: self.shared.metrics.totals(),
        }
    }

    /// Number of requests currently in flight.
    pub fn active_count(&self) -> usize {
        self.shared.state.lock().global_active
    }

    /// Number of requests waiting in the queue.
    pub fn queued_count(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Returns the configuration this throttler was created with.
    pub fn config(&self) -> &ThrottleConfig {
        &self.shared.config
    }
}

impl<T: TileTarget> Clone for RequestThrottler<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: TileTarget> std::fmt::Debug for RequestThrottler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("RequestThrottler")
            .field("config", &self.shared.config)
            .field("active", &state.global_active)
            .field("queue", &state.queue)
            .finish()
    }
}
