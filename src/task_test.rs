use std::sync::Arc;

use parking_lot::Mutex;
use task_pool::task::PoolTask;

use super::{EncodeVariant, MapUpdateTask, SliceEncodeTask};
use crate::config::{EncoderConfig, LayerConfig, SliceMode};
use crate::context::{EncoderContext, SliceCoder};

#[derive(Default)]
struct RecordingCoder {
    map_updates: Mutex<Vec<(usize, usize)>>,
    encodes: Mutex<Vec<(usize, usize, EncodeVariant)>>,
}

impl SliceCoder for RecordingCoder {
    fn update_slice_map(&self, layer: usize, slice: usize) -> anyhow::Result<()> {
        self.map_updates.lock().push((layer, slice));
        Ok(())
    }

    fn encode_slice(
        &self,
        layer: usize,
        slice: usize,
        variant: EncodeVariant,
    ) -> anyhow::Result<()> {
        self.encodes.lock().push((layer, slice, variant));
        Ok(())
    }
}

#[test]
fn variant_selection_follows_the_slicing_policy() {
    let size_bounded = LayerConfig::new(SliceMode::SizeBounded {
        max_slice_bytes: 1500,
    });
    let fixed = LayerConfig::new(SliceMode::FixedCount { slices: 4 });
    let single = LayerConfig::new(SliceMode::Single);

    // size-bounded wins even with load balancing enabled
    assert_eq!(
        EncodeVariant::select(&size_bounded, true),
        EncodeVariant::ConstrainedSize
    );
    assert_eq!(
        EncodeVariant::select(&size_bounded, false),
        EncodeVariant::ConstrainedSize
    );
    assert_eq!(
        EncodeVariant::select(&fixed, true),
        EncodeVariant::LoadBalancing
    );
    assert_eq!(
        EncodeVariant::select(&fixed, false),
        EncodeVariant::FixedSlice
    );
    assert_eq!(
        EncodeVariant::select(&single, false),
        EncodeVariant::FixedSlice
    );
}

#[test]
fn tasks_call_into_the_coder() -> anyhow::Result<()> {
    let coder = Arc::new(RecordingCoder::default());
    let config = EncoderConfig::builder()
        .threads(2)
        .add_layer(LayerConfig::new(SliceMode::FixedCount { slices: 4 }))
        .add_layer(LayerConfig::new(SliceMode::FixedCount { slices: 4 }))
        .build();
    let ctx = Arc::new(EncoderContext::new(config, coder.clone()));

    MapUpdateTask::new(Arc::clone(&ctx), 0, 2).execute()?;
    let encode = SliceEncodeTask::new(ctx, 1, 3, EncodeVariant::LoadBalancing);
    assert_eq!(encode.variant(), EncodeVariant::LoadBalancing);
    encode.execute()?;

    assert_eq!(coder.map_updates.lock().as_slice(), &[(0, 2)]);
    assert_eq!(
        coder.encodes.lock().as_slice(),
        &[(1, 3, EncodeVariant::LoadBalancing)]
    );
    Ok(())
}
