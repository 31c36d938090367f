use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::EncoderConfig;
use crate::task::EncodeVariant;

/// The actual encoding logic behind every dispatched task. The dispatch
/// core never looks past this boundary; it only counts completions.
pub trait SliceCoder: Send + Sync {
    /// Recomputes the macroblock-to-slice map for one slice of a layer.
    fn update_slice_map(&self, layer: usize, slice: usize) -> anyhow::Result<()>;

    /// Encodes one slice of the layer's current frame. The variant tells
    /// the coder which boundary policy the slice was built under.
    fn encode_slice(
        &self,
        layer: usize,
        slice: usize,
        variant: EncodeVariant,
    ) -> anyhow::Result<()>;
}

/// Shared encoder state handed to every task.
pub struct EncoderContext {
    config: EncoderConfig,
    coder: Arc<dyn SliceCoder>,
    adjust_slicing: Vec<AtomicBool>,
}

impl EncoderContext {
    pub fn new(config: EncoderConfig, coder: Arc<dyn SliceCoder>) -> Self {
        let adjust_slicing = (0..config.layers.len())
            .map(|_| AtomicBool::new(false))
            .collect();
        Self {
            config,
            coder,
            adjust_slicing,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn coder(&self) -> &Arc<dyn SliceCoder> {
        &self.coder
    }

    /// Raised by the frame driver when the layer's slicing must be
    /// re-adjusted before encoding the next frame.
    pub fn set_needs_slicing_adjustment(&self, layer: usize, on: bool) {
        if let Some(flag) = self.adjust_slicing.get(layer) {
            flag.store(on, Ordering::Relaxed);
        }
    }

    pub fn needs_slicing_adjustment(&self, layer: usize) -> bool {
        self.adjust_slicing
            .get(layer)
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}
