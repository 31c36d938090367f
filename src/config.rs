use serde::{Deserialize, Serialize};

/// How a layer is split into slices. Also determines the layer's task
/// count: size-bounded layers get one task per active worker thread, the
/// others one task per slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceMode {
    /// One slice covering the whole layer
    Single,
    /// Fixed number of slices with fixed boundaries
    FixedCount { slices: usize },
    /// Slice boundaries bounded by encoded size
    SizeBounded { max_slice_bytes: usize },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LayerConfig {
    pub slice_mode: SliceMode,
}

impl LayerConfig {
    pub fn new(slice_mode: SliceMode) -> Self {
        Self { slice_mode }
    }

    /// Tasks this layer contributes per pass. Fixed for the lifetime of a
    /// manager built from this config.
    pub fn task_count(&self, active_threads: usize) -> usize {
        match self.slice_mode {
            SliceMode::Single => 1,
            SliceMode::FixedCount { slices } => slices,
            SliceMode::SizeBounded { .. } => active_threads,
        }
    }
}

/// Encoder-level configuration consumed by the dispatch core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Worker pool width; size-bounded layers derive their task count from
    /// it as well
    pub threads: usize,
    /// Re-balance slice boundaries across frames on non-size-bounded layers
    pub load_balancing: bool,
    /// One entry per dependency layer, lowest layer first
    pub layers: Vec<LayerConfig>,
}

impl EncoderConfig {
    pub fn builder() -> EncoderConfigBuilder {
        EncoderConfigBuilder::default()
    }
}

pub struct EncoderConfigBuilder {
    threads: usize,
    load_balancing: bool,
    layers: Vec<LayerConfig>,
}

impl Default for EncoderConfigBuilder {
    fn default() -> Self {
        Self {
            threads: 1,
            load_balancing: false,
            layers: Vec::new(),
        }
    }
}

impl EncoderConfigBuilder {
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn load_balancing(mut self, on: bool) -> Self {
        self.load_balancing = on;
        self
    }

    pub fn add_layer(mut self, layer: LayerConfig) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn build(self) -> EncoderConfig {
        EncoderConfig {
            threads: self.threads,
            load_balancing: self.load_balancing,
            layers: self.layers,
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
