//! Tile-layer integration.
//!
//! Glues the burst stager and the request throttler together the way a map
//! layer uses them: every tile first waits out its burst delay, then is
//! submitted to the throttler with a priority derived from its distance to
//! the viewport center.
//!
//! ```text
//! TileRequest ──► BurstStager ──(delay)──► RequestThrottler ──► TileTarget
//!                 (per episode)            (caps, queue, timeout)
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;

use crate::burst::BurstStager;
use crate::coord::{CoordError, TileCoord, Viewport};
use crate::target::TileTarget;
use crate::throttle::{RequestThrottler, ThrottleError};
use crate::wms::{TimeStep, WmsLayer};

/// One tile to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub tile: TileCoord,
    /// Full request URL.
    pub url: String,
    /// Host used for per-domain limits.
    pub domain: String,
    /// Lower loads first.
    pub priority: i64,
}

impl TileRequest {
    /// Builds the requests for every tile of a viewport, most urgent first.
    pub fn for_viewport(
        layer: &WmsLayer,
        viewport: &Viewport,
        time: Option<&TimeStep>,
    ) -> Result<Vec<TileRequest>, CoordError> {
        let requests = viewport
            .tiles()?
            .into_iter()
            .map(|tile| TileRequest {
                tile,
                url: layer.get_map_url(&tile, time),
                domain: layer.domain().to_string(),
                priority: viewport.priority_of(&tile),
            })
            .collect();
        Ok(requests)
    }
}

/// Result of loading one tile.
#[derive(Debug)]
pub struct TileOutcome<O> {
    pub request: TileRequest,
    pub result: Result<O, ThrottleError>,
    /// Burst delay applied before submission.
    pub burst_delay: Duration,
    /// Time from the load call to completion, burst delay included.
    pub elapsed: Duration,
}

impl<O> TileOutcome<O> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcome counts for a batch of tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub abandoned: usize,
}

impl BatchSummary {
    pub fn from_outcomes<O>(outcomes: &[TileOutcome<O>]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match &outcome.result {
                Ok(_) => summary.succeeded += 1,
                Err(ThrottleError::Timeout { .. }) => summary.timed_out += 1,
                Err(ThrottleError::Load(_)) => summary.failed += 1,
                Err(ThrottleError::Abandoned { .. }) => summary.abandoned += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.timed_out + self.abandoned
    }
}

/// Loads tiles for a map layer through a shared stager and throttler.
pub struct TileLoader<T: TileTarget> {
    stager: Arc<BurstStager>,
    throttler: RequestThrottler<T>,
}

impl<T: TileTarget> TileLoader<T> {
    pub fn new(stager: Arc<BurstStager>, throttler: RequestThrottler<T>) -> Self {
        Self { stager, throttler }
    }

    pub fn stager(&self) -> &Arc<BurstStager> {
        &self.stager
    }

    pub fn throttler(&self) -> &RequestThrottler<T> {
        &self.throttler
    }

    /// Marks a layer activation or forecast time step change.
    ///
    /// Restarts burst staging so the first tiles of the new episode are
    /// spread out again.
    pub fn begin_episode(&self) {
        self.stager.reset();
        tracing::info!(
            active = self.throttler.active_count(),
            queued = self.throttler.queued_count(),
            "Started tile loading episode"
        );
    }

    /// Loads one tile.
    ///
    /// The burst delay is taken from the stager when this is called, not when
    /// the returned future is first polled, so tiles are staged in call order.
    /// The future owns everything it needs and can be spawned.
    pub fn load(
        &self,
        target: T,
        request: TileRequest,
    ) -> impl Future<Output = TileOutcome<T::Output>> + Send + 'static {
        let started = Instant::now();
        let burst_delay = self.stager.delay_for_next_tile();
        let throttler = self.throttler.clone();

        async move {
            if !burst_delay.is_zero() {
                tokio::time::sleep(burst_delay).await;
            }

            let result = throttler
                .submit(
                    target,
                    request.url.clone(),
                    request.domain.clone(),
                    request.priority,
                )
                .await;

            TileOutcome {
                request,
                result,
                burst_delay,
                elapsed: started.elapsed(),
            }
        }
    }

    /// Loads a batch of tiles concurrently.
    ///
    /// Returns one outcome per request, in request order.
    pub async fn load_all<F>(
        &self,
        requests: Vec<TileRequest>,
        make_target: F,
    ) -> Vec<TileOutcome<T::Output>>
    where
        F: FnMut(&TileRequest) -> T,
    {
        self.load_all_with_progress(requests, make_target, |_| {})
            .await
    }

    /// Like [`load_all`](Self::load_all), calling `on_complete` as each tile
    /// finishes.
    pub async fn load_all_with_progress<F, P>(
        &self,
        requests: Vec<TileRequest>,
        mut make_target: F,
        mut on_complete: P,
    ) -> Vec<TileOutcome<T::Output>>
    where
        F: FnMut(&TileRequest) -> T,
        P: FnMut(&TileOutcome<T::Output>),
    {
        let count = requests.len();
        let mut pending: FuturesUnordered<_> = requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| {
                let target = make_target(&request);
                let load = self.load(target, request);
                async move { (index, load.await) }
            })
            .collect();

        let mut outcomes: Vec<Option<TileOutcome<T::Output>>> = Vec::with_capacity(count);
        outcomes.resize_with(count, || None);

        while let Some((index, outcome)) = pending.next().await {
            on_complete(&outcome);
            outcomes[index] = Some(outcome);
        }

        outcomes.into_iter().flatten().collect()
    }
}

impl<T: TileTarget> Clone for TileLoader<T> {
    fn clone(&self) -> Self {
        Self {
            stager: Arc::clone(&self.stager),
            throttler: self.throttler.clone(),
        }
    }
}

impl<T: TileTarget> std::fmt::Debug for TileLoader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLoader")
            .field("stager", &self.stager)
            .field("throttler", &self.throttler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burst::BurstConfig;
    use crate::target::{BoxFuture, LoadError};
    use crate::throttle::ThrottleConfig;

    /// Succeeds with the locator unless it contains "fail".
    struct EchoTarget;

    impl TileTarget for EchoTarget {
        type Output = String;

        fn begin_load(self, locator: String) -> BoxFuture<'static, Result<String, LoadError>> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                if locator.contains("fail") {
                    Err(LoadError::Status {
                        status: 500,
                        url: locator,
                    })
                } else {
                    Ok(locator)
                }
            })
        }
    }

    fn request(name: &str, priority: i64) -> TileRequest {
        TileRequest {
            tile: TileCoord {
                row: 0,
                col: 0,
                zoom: 0,
            },
            url: name.to_string(),
            domain: "thredds.example.org".to_string(),
            priority,
        }
    }

    fn loader(threshold: usize) -> TileLoader<EchoTarget> {
        TileLoader::new(
            Arc::new(BurstStager::new(BurstConfig::new(
                threshold,
                Duration::from_millis(100),
            ))),
            RequestThrottler::new(ThrottleConfig::new().with_min_delay(Duration::ZERO)),
        )
    }

    #[test]
    fn test_for_viewport_builds_prioritised_requests() {
        let layer = WmsLayer::new("https://thredds.example.org/wms", "hs").unwrap();
        let viewport = Viewport::new(-17.7, 168.3, 6, 1).unwrap();

        let requests = TileRequest::for_viewport(&layer, &viewport, None).unwrap();
        assert_eq!(requests.len(), 9);
        assert!(requests.iter().all(|r| r.domain == "thredds.example.org"));
        assert!(requests.windows(2).all(|w| w[0].priority <= w[1].priority));
        assert_eq!(requests[0].tile, viewport.center_tile().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_applies_burst_delay_in_call_order() {
        let loader = loader(3);

        let first = loader.load(EchoTarget, request("a", 0));
        let second = loader.load(EchoTarget, request("b", 0));
        let third = loader.load(EchoTarget, request("c", 0));
        let (first, second, third) = tokio::join!(first, second, third);

        assert_eq!(first.burst_delay, Duration::from_millis(100));
        assert_eq!(second.burst_delay, Duration::from_millis(200));
        assert_eq!(third.burst_delay, Duration::ZERO);
        assert!(second.elapsed >= Duration::from_millis(200));
        assert!(!loader.stager().is_staging());
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_episode_restarts_staging() {
        let loader = loader(2);
        loader.load(EchoTarget, request("a", 0)).await;
        loader.load(EchoTarget, request("b", 0)).await;
        assert!(!loader.stager().is_staging());

        loader.begin_episode();
        let outcome = loader.load(EchoTarget, request("c", 0)).await;
        assert_eq!(outcome.burst_delay, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_all_keeps_request_order_and_reports_progress() {
        let loader = loader(1);
        let requests = vec![request("t1", 5), request("fail-2", 1), request("t3", 3)];

        let mut completed = 0;
        let outcomes = loader
            .load_all_with_progress(requests, |_| EchoTarget, |_| completed += 1)
            .await;

        assert_eq!(completed, 3);
        let urls: Vec<&str> = outcomes.iter().map(|o| o.request.url.as_str()).collect();
        assert_eq!(urls, vec!["t1", "fail-2", "t3"]);

        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(
            summary,
            BatchSummary {
                succeeded: 2,
                failed: 1,
                timed_out: 0,
                abandoned: 0
            }
        );
        assert_eq!(summary.total(), 3);
        assert!(loader.throttler().snapshot().is_idle());
    }
}
