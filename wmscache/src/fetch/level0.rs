//! Finest-level population from the map source.
//!
//! Rows are processed one after another. Within a row every Missing tile
//! gets its own task, spawned only once a worker permit is available, and
//! the row ends when all of its tasks have finished.

use super::retry::{RetryForever, RetryPolicy};
use crate::cache::{
    FileStatusIndex, FinestLevelReady, StoreError, TileCoord, TileStatus, TileStore,
};
use crate::provider::{GetMapRequest, MapClient, ProviderError};
use crate::raster::{Raster, RasterError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Worker count used when none is configured: one per available CPU.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Why one attempt at a tile failed.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("source answered with HTTP status {0}")]
    Status(u16),

    #[error("short read: received {received} of {expected} bytes")]
    ShortRead { received: usize, expected: usize },

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("storage task failed: {0}")]
    Join(String),
}

/// Final state of one tile task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TileOutcome {
    Stored,
    Empty,
    Abandoned,
    Cancelled,
}

/// Counts from one fetch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Tiles stored with data
    pub fetched: u64,
    /// Tiles stored as Empty markers
    pub empty: u64,
    /// Tiles the retry policy gave up on; they remain Missing
    pub abandoned: u64,
    /// Tiles already on disk before the run
    pub skipped: u64,
    /// The run stopped early on cancellation
    pub cancelled: bool,
}

impl FetchReport {
    /// Every Missing tile of the finest level was resolved.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.abandoned == 0
    }

    /// Token allowing mip reduction, if the run completed.
    pub fn into_ready(self) -> Option<FinestLevelReady> {
        self.is_complete().then(FinestLevelReady::after_fetch)
    }
}

/// Fetches every Missing tile of the finest level.
pub struct Level0Fetcher<C> {
    client: Arc<C>,
    store: TileStore,
    index: Arc<FileStatusIndex>,
    retry: Arc<dyn RetryPolicy>,
    workers: usize,
}

impl<C> Level0Fetcher<C>
where
    C: MapClient + 'static,
{
    /// Creates a fetcher that retries forever with one worker per CPU.
    pub fn new(client: Arc<C>, store: TileStore, index: Arc<FileStatusIndex>) -> Self {
        Self {
            client,
            store,
            index,
            retry: Arc::new(RetryForever::default()),
            workers: default_workers(),
        }
    }

    pub fn with_retry_policy(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    /// Maximum concurrent tile requests (at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Fetch all Missing finest-level tiles.
    ///
    /// Cancellation is observed between rows, before each spawn and between
    /// attempts; tiles in flight finish their current attempt.
    #[instrument(skip_all, name = "level0_fetch")]
    pub async fn run(&self, cancel: &CancellationToken) -> FetchReport {
        let mut report = FetchReport::default();
        let desc = self.store.description();
        let finest = desc.grid().finest_level();
        let Some(level) = self.index.level(finest) else {
            return report;
        };

        let counts = level.counts();
        info!(
            level = finest,
            missing = counts.missing,
            total = counts.total(),
            workers = self.workers,
            "Fetching finest level"
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));

        for y in 0..level.tiles_y() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let mut row = JoinSet::new();
            for x in 0..level.tiles_x() {
                if level.get(x, y) != Some(TileStatus::Missing) {
                    report.skipped += 1;
                    continue;
                }

                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
                };
                let Some(permit) = permit else {
                    report.cancelled = true;
                    break;
                };

                let client = Arc::clone(&self.client);
                let store = self.store.clone();
                let index = Arc::clone(&self.index);
                let retry = Arc::clone(&self.retry);
                let cancel = cancel.clone();
                let coord = TileCoord::new(finest, x, y);

                row.spawn(async move {
                    let _permit = permit;
                    fetch_tile(&*client, &store, &index, &*retry, coord, &cancel).await
                });
            }

            while let Some(result) = row.join_next().await {
                match result {
                    Ok(TileOutcome::Stored) => report.fetched += 1,
                    Ok(TileOutcome::Empty) => report.empty += 1,
                    Ok(TileOutcome::Abandoned) => report.abandoned += 1,
                    Ok(TileOutcome::Cancelled) => report.cancelled = true,
                    Err(join_err) => {
                        warn!(row = y, error = %join_err, "Tile task panicked");
                        report.abandoned += 1;
                    }
                }
            }

            debug!(
                row = y,
                fetched = report.fetched,
                empty = report.empty,
                "Row complete"
            );

            if report.cancelled {
                break;
            }
        }

        info!(
            fetched = report.fetched,
            empty = report.empty,
            abandoned = report.abandoned,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "Finest level fetch finished"
        );
        report
    }
}

/// Retry one tile until it is stored, abandoned or cancelled.
async fn fetch_tile<C: MapClient>(
    client: &C,
    store: &TileStore,
    index: &FileStatusIndex,
    retry: &dyn RetryPolicy,
    coord: TileCoord,
    cancel: &CancellationToken,
) -> TileOutcome {
    let request = GetMapRequest::for_tile(store.description(), coord.x, coord.y);
    let mut failures = 0u32;

    loop {
        if cancel.is_cancelled() {
            return TileOutcome::Cancelled;
        }

        match attempt(client, store, &request, coord).await {
            Ok(status) => {
                index.mark(coord, status);
                return match status {
                    TileStatus::Empty => TileOutcome::Empty,
                    _ => TileOutcome::Stored,
                };
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                warn!(
                    level = coord.level,
                    x = coord.x,
                    y = coord.y,
                    attempt = failures,
                    error = %e,
                    "Tile fetch failed"
                );

                let Some(delay) = retry.next_delay(failures) else {
                    warn!(
                        level = coord.level,
                        x = coord.x,
                        y = coord.y,
                        attempts = failures,
                        "Abandoning tile"
                    );
                    return TileOutcome::Abandoned;
                };

                if delay.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::select! {
                        _ = cancel.cancelled() => return TileOutcome::Cancelled,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

async fn attempt<C: MapClient>(
    client: &C,
    store: &TileStore,
    request: &GetMapRequest,
    coord: TileCoord,
) -> Result<TileStatus, AttemptError> {
    let response = client.get_map(request).await?;
    if !response.is_ok() {
        return Err(AttemptError::Status(response.status));
    }

    let expected = store.description().tile_shape().byte_len();
    let mut body = response.body;
    if body.len() < expected {
        return Err(AttemptError::ShortRead {
            received: body.len(),
            expected,
        });
    }
    body.truncate(expected);

    let store = store.clone();
    tokio::task::spawn_blocking(move || classify_and_store(&store, body, coord))
        .await
        .map_err(|e| AttemptError::Join(e.to_string()))?
}

/// Store an all-sentinel tile as Empty and anything else as data.
fn classify_and_store(
    store: &TileStore,
    body: Vec<u8>,
    coord: TileCoord,
) -> Result<TileStatus, AttemptError> {
    let desc = store.description();
    let tile = Raster::from_bytes(desc.tile_width(), desc.tile_height(), desc.data_type(), body)?;

    if let Some(invalid) = desc.invalid_value() {
        if tile.is_uniform(invalid) {
            store.store_empty(coord)?;
            return Ok(TileStatus::Empty);
        }
    }

    store.store(&tile, coord)?;
    Ok(TileStatus::Exists)
}
