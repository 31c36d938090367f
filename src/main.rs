use std::sync::Arc;
use std::time::Instant;

use svc_dispatch::config::{EncoderConfig, LayerConfig, SliceMode};
use svc_dispatch::context::{EncoderContext, SliceCoder};
use svc_dispatch::manager::{TaskDispatch, TaskManager};
use svc_dispatch::task::{EncodeVariant, TaskKind};

fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

/// Stand-in for the real per-slice encoding work.
struct SyntheticCoder;

impl SliceCoder for SyntheticCoder {
    fn update_slice_map(&self, layer: usize, slice: usize) -> anyhow::Result<()> {
        log::debug!("map update: layer {} slice {}", layer, slice);
        Ok(())
    }

    fn encode_slice(
        &self,
        layer: usize,
        slice: usize,
        variant: EncodeVariant,
    ) -> anyhow::Result<()> {
        // Burn a little CPU so the fan-out shows up in the frame timings
        let mut acc = 0u64;
        for i in 0..500_000u64 {
            acc = acc.wrapping_mul(6364136223846793005).wrapping_add(i);
        }
        log::debug!(
            "encoded: layer {} slice {} ({:?}, {:02x})",
            layer,
            slice,
            variant,
            acc & 0xff
        );
        Ok(())
    }
}

fn load_config() -> anyhow::Result<EncoderConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(EncoderConfig::builder()
            .threads(4)
            .add_layer(LayerConfig::new(SliceMode::FixedCount { slices: 4 }))
            .add_layer(LayerConfig::new(SliceMode::SizeBounded {
                max_slice_bytes: 1500,
            }))
            .build()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = load_config()?;
    let layer_count = config.layers.len();
    let ctx = Arc::new(EncoderContext::new(config, Arc::new(SyntheticCoder)));
    let mut manager = TaskManager::create(Arc::clone(&ctx))?;

    for frame in 0..30u64 {
        let start = Instant::now();
        for layer in 0..layer_count {
            // Pretend slicing drifts every tenth frame
            ctx.set_needs_slicing_adjustment(layer, frame % 10 == 0);
            manager.init_frame(layer).await?;
            manager.execute_tasks(TaskKind::Encode).await?;
        }
        log::info!("frame {} encoded in {:?}", frame, start.elapsed());
    }

    manager.uninit();
    Ok(())
}
