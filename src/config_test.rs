use super::{EncoderConfig, LayerConfig, SliceMode};

#[test]
fn builder_defaults() {
    let config = EncoderConfig::builder().build();
    assert_eq!(config.threads, 1);
    assert!(!config.load_balancing);
    assert!(config.layers.is_empty());
}

#[test]
fn task_count_follows_the_slice_mode() {
    assert_eq!(LayerConfig::new(SliceMode::Single).task_count(8), 1);
    assert_eq!(
        LayerConfig::new(SliceMode::FixedCount { slices: 4 }).task_count(8),
        4
    );
    assert_eq!(
        LayerConfig::new(SliceMode::SizeBounded {
            max_slice_bytes: 1500
        })
        .task_count(8),
        8
    );
}

#[test]
fn config_from_json() -> anyhow::Result<()> {
    let config: EncoderConfig = serde_json::from_str(
        r#"{
            "threads": 2,
            "load_balancing": true,
            "layers": [
                { "slice_mode": { "FixedCount": { "slices": 3 } } },
                { "slice_mode": "Single" }
            ]
        }"#,
    )?;

    assert_eq!(config.threads, 2);
    assert!(config.load_balancing);
    assert_eq!(config.layers.len(), 2);
    assert_eq!(config.layers[0].task_count(2), 3);
    assert_eq!(config.layers[1].task_count(2), 1);
    Ok(())
}
