//! Cache initialization and the background pipeline.
//!
//! [`CacheController::init`] creates the storage root and scans it into the
//! status index, synchronously. [`CacheController::start`] then launches a single
//! background task that fetches the finest level and, once that phase has
//! completed, builds every coarser level. The controller keeps serving
//! lookups from the index and the store while the pipeline runs.

mod handle;

pub use handle::{PipelineError, PipelineHandle, PipelinePhase, PipelineReport};

use crate::cache::{CacheDescription, CacheError, FileStatusIndex, TileStore};
use crate::codec::{StandardCodec, TileCodec};
use crate::config::ConfigFile;
use crate::fetch::{default_workers, Level0Fetcher, RetryForever, RetryPolicy};
use crate::layer::TileCacheLayer;
use crate::mip::MipPyramidBuilder;
use crate::provider::MapClient;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Tuning for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub retry: Arc<dyn RetryPolicy>,
    pub workers: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            retry: Arc::new(RetryForever::default()),
            workers: default_workers(),
        }
    }
}

/// An initialized tile cache.
#[derive(Debug, Clone)]
pub struct CacheController {
    description: Arc<CacheDescription>,
    index: Arc<FileStatusIndex>,
    store: TileStore,
}

impl CacheController {
    /// Create the storage root and build the status index.
    pub fn init(
        description: CacheDescription,
        codec: Arc<dyn TileCodec>,
    ) -> Result<Self, CacheError> {
        let description = Arc::new(description);
        let index = Arc::new(FileStatusIndex::build(&description)?);
        let store = TileStore::new(Arc::clone(&description), codec);

        let grid = description.grid();
        info!(
            layer = %description.layer().id,
            root = %description.storage_root().display(),
            tiles_x = grid.tiles_x(),
            tiles_y = grid.tiles_y(),
            levels = grid.num_levels(),
            cached = %description.cached_content_type(),
            "Tile cache initialized"
        );

        Ok(Self {
            description,
            index,
            store,
        })
    }

    /// Initialize from a loaded configuration file with the built-in codecs.
    pub fn from_config(config: &ConfigFile) -> Result<Self, CacheError> {
        Self::init(config.cache_description()?, Arc::new(StandardCodec))
    }

    pub fn description(&self) -> &CacheDescription {
        &self.description
    }

    pub fn index(&self) -> &Arc<FileStatusIndex> {
        &self.index
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// Read-only view for serving tiles.
    pub fn layer(&self) -> TileCacheLayer {
        TileCacheLayer::new(self.store.clone(), Arc::clone(&self.index))
    }

    /// Launch the fetch-then-reduce pipeline in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<C>(&self, client: Arc<C>, options: PipelineOptions) -> PipelineHandle
    where
        C: MapClient + 'static,
    {
        let cancel = CancellationToken::new();
        let (phase_tx, phase_rx) = watch::channel(PipelinePhase::Fetching);

        let fetcher = Level0Fetcher::new(client, self.store.clone(), Arc::clone(&self.index))
            .with_retry_policy(options.retry)
            .with_workers(options.workers);
        let builder = MipPyramidBuilder::new(self.store.clone(), Arc::clone(&self.index));

        let task = tokio::spawn(run_pipeline(fetcher, builder, phase_tx, cancel.clone()));
        PipelineHandle::new(phase_rx, cancel, task)
    }
}

async fn run_pipeline<C>(
    fetcher: Level0Fetcher<C>,
    builder: MipPyramidBuilder,
    phase_tx: watch::Sender<PipelinePhase>,
    cancel: CancellationToken,
) -> Result<PipelineReport, PipelineError>
where
    C: MapClient + 'static,
{
    let fetch = fetcher.run(&cancel).await;
    if fetch.cancelled {
        phase_tx.send_replace(PipelinePhase::Cancelled);
        return Ok(PipelineReport { fetch, mip: None });
    }

    let Some(ready) = fetch.into_ready() else {
        warn!(
            abandoned = fetch.abandoned,
            "Finest level incomplete, skipping mip construction"
        );
        phase_tx.send_replace(PipelinePhase::Incomplete);
        return Ok(PipelineReport { fetch, mip: None });
    };

    phase_tx.send_replace(PipelinePhase::Reducing);
    let mip_cancel = cancel.clone();
    let result = tokio::task::spawn_blocking(move || builder.build(ready, &mip_cancel)).await;

    match result {
        Ok(Ok(mip)) => {
            let phase = if mip.cancelled {
                PipelinePhase::Cancelled
            } else {
                PipelinePhase::Completed
            };
            phase_tx.send_replace(phase);
            Ok(PipelineReport {
                fetch,
                mip: Some(mip),
            })
        }
        Ok(Err(source)) => {
            phase_tx.send_replace(PipelinePhase::Failed);
            Err(PipelineError::Reduction { fetch, source })
        }
        Err(join_err) => {
            error!(error = %join_err, "Mip construction task panicked");
            phase_tx.send_replace(PipelinePhase::Failed);
            Err(PipelineError::TaskPanicked(join_err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{TilePadding, TileStatus};
    use crate::fetch::NoRetry;
    use crate::grid::GridPlan;
    use crate::mip::MipError;
    use crate::provider::{MapResponse, MockMapClient};
    use crate::raster::{DataType, Value};
    use crate::test_support::small_description;
    use tempfile::TempDir;

    fn constant_client(value: i16) -> Arc<MockMapClient> {
        Arc::new(MockMapClient::new(move |_, _| {
            Ok(MapResponse::ok(value.to_le_bytes().repeat(4)))
        }))
    }

    #[test]
    fn test_init_fails_when_root_cannot_be_created() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let err = CacheController::init(
            small_description(&blocker.join("cache"), None),
            Arc::new(StandardCodec),
        )
        .unwrap_err();

        assert!(matches!(err, CacheError::CreateRoot { .. }));
    }

    #[tokio::test]
    async fn test_pipeline_builds_all_levels() {
        let temp = TempDir::new().unwrap();
        let controller = CacheController::init(
            small_description(temp.path(), Some(Value::S16(-9999))),
            Arc::new(StandardCodec),
        )
        .unwrap();

        let handle = controller.start(constant_client(12), PipelineOptions::default());
        let report = handle.wait().await.unwrap();

        assert_eq!(report.fetch.fetched, 8);
        assert_eq!(report.mip.unwrap().written, 2);
        for level in controller.index().levels() {
            assert_eq!(level.counts().exists, level.counts().total());
        }
    }

    #[tokio::test]
    async fn test_abandoned_tiles_skip_reduction() {
        let temp = TempDir::new().unwrap();
        let controller = CacheController::init(
            small_description(temp.path(), None),
            Arc::new(StandardCodec),
        )
        .unwrap();
        let client = Arc::new(MockMapClient::new(|_, _| {
            Ok(MapResponse {
                status: 404,
                body: Vec::new(),
            })
        }));

        let handle = controller.start(
            client,
            PipelineOptions {
                retry: Arc::new(NoRetry),
                workers: 2,
            },
        );
        let mut phases = handle.subscribe();
        let report = handle.wait().await.unwrap();

        assert_eq!(report.fetch.abandoned, 8);
        assert!(report.mip.is_none());
        assert_eq!(*phases.borrow_and_update(), PipelinePhase::Incomplete);
        assert_eq!(
            controller.index().status(crate::cache::TileCoord::new(0, 0, 0)),
            Some(TileStatus::Missing)
        );
    }

    #[tokio::test]
    async fn test_padding_fails_reduction_but_keeps_finest_level() {
        let temp = TempDir::new().unwrap();
        let desc = CacheDescription::builder(temp.path())
            .with_data_type(DataType::S16)
            .with_default_value(Value::S16(0))
            .with_tile_size(2, 2)
            .with_grid(GridPlan::from_tile_counts(4, 2).unwrap())
            .with_padding(TilePadding::uniform(1))
            .build()
            .unwrap();
        let controller = CacheController::init(desc, Arc::new(StandardCodec)).unwrap();

        let handle = controller.start(constant_client(1), PipelineOptions::default());
        let mut phases = handle.subscribe();
        let err = handle.wait().await.unwrap_err();

        match err {
            PipelineError::Reduction { fetch, source } => {
                assert_eq!(fetch.fetched, 8);
                assert!(matches!(source, MipError::PaddingUnsupported(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*phases.borrow_and_update(), PipelinePhase::Failed);
        assert_eq!(controller.index().level(1).unwrap().counts().exists, 8);
    }
}
