use std::sync::Arc;

use task_pool::task::PoolTask;

use crate::config::{LayerConfig, SliceMode};
use crate::context::EncoderContext;

/// The two task populations each layer owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Slice-map update pass, run only when slicing needs re-adjusting
    MapUpdate,
    /// The per-frame encoding pass
    Encode,
}

/// Slice-boundary policy an encode task was built under. Chosen once per
/// layer at init, never re-decided per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeVariant {
    FixedSlice,
    LoadBalancing,
    ConstrainedSize,
}

impl EncodeVariant {
    /// Size-bounded slicing forces the constrained-size variant; load
    /// balancing only applies to the remaining modes.
    pub fn select(layer: &LayerConfig, load_balancing: bool) -> Self {
        match layer.slice_mode {
            SliceMode::SizeBounded { .. } => EncodeVariant::ConstrainedSize,
            _ if load_balancing => EncodeVariant::LoadBalancing,
            _ => EncodeVariant::FixedSlice,
        }
    }
}

/// Recomputes one slice's macroblock map ahead of the encoding pass.
pub struct MapUpdateTask {
    layer: usize,
    index: usize,
    ctx: Arc<EncoderContext>,
}

impl MapUpdateTask {
    pub fn new(ctx: Arc<EncoderContext>, layer: usize, index: usize) -> Self {
        Self { layer, index, ctx }
    }
}

impl PoolTask for MapUpdateTask {
    fn execute(&self) -> anyhow::Result<()> {
        self.ctx.coder().update_slice_map(self.layer, self.index)
    }
}

/// Encodes one slice of the current frame.
pub struct SliceEncodeTask {
    layer: usize,
    index: usize,
    variant: EncodeVariant,
    ctx: Arc<EncoderContext>,
}

impl SliceEncodeTask {
    pub fn new(
        ctx: Arc<EncoderContext>,
        layer: usize,
        index: usize,
        variant: EncodeVariant,
    ) -> Self {
        Self {
            layer,
            index,
            variant,
            ctx,
        }
    }

    pub fn variant(&self) -> EncodeVariant {
        self.variant
    }
}

impl PoolTask for SliceEncodeTask {
    fn execute(&self) -> anyhow::Result<()> {
        self.ctx
            .coder()
            .encode_slice(self.layer, self.index, self.variant)
    }
}

#[cfg(test)]
#[path = "task_test.rs"]
mod task_test;
