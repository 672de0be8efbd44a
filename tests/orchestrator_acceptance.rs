/// Acceptance tests for cached calls against an in-memory container
///
/// These tests drive the built-in rules through the `Cache` facade the way an
/// analysis session would: compute on the first call, restore on the next.
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{embedding, file_names, sample_data};
use scache::config::CacheConfig;
use scache::container::{Matrix, Raster, Value};
use scache::orchestrator::TMP_PLOT_KEY;
use scache::rule::Callback;
use scache::{
    AnnotatedData, Cache, CacheError, CallArgs, CallOptions, Category, Group, KeyHint, Registry,
    Storage,
};
use tempfile::TempDir;

fn open_cache(temp_dir: &TempDir, backend: &str) -> Cache {
    Cache::from_config(&CacheConfig {
        dir: Some(temp_dir.path().to_string_lossy().into_owned()),
        backend: backend.to_string(),
        ..Default::default()
    })
    .unwrap()
}

fn counting(calls: &Arc<AtomicUsize>, body: fn(&mut AnnotatedData, &CallArgs)) -> Callback<AnnotatedData> {
    let calls = calls.clone();
    Arc::new(move |data: &mut AnnotatedData, args: &CallArgs| -> anyhow::Result<Option<Value>> {
        calls.fetch_add(1, Ordering::SeqCst);
        body(data, args);
        Ok(None)
    })
}

fn umap(data: &mut AnnotatedData, _: &CallArgs) {
    data.insert(Category::Obsm, "X_umap", embedding(1.0)).unwrap();
}

fn velocity_graphs(data: &mut AnnotatedData, _: &CallArgs) {
    data.insert(Category::Uns, "velocity_graph", Value::Floats(vec![0.1, 0.2])).unwrap();
    data.insert(Category::Uns, "velocity_graph_neg", Value::Floats(vec![-0.1])).unwrap();
}

#[test]
fn test_second_session_restores_without_computing() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open_cache(&temp_dir, "bincode");
    let calls = Arc::new(AtomicUsize::new(0));

    let mut registry = Registry::<AnnotatedData>::builtin().unwrap();
    registry.bind("umap", counting(&calls, umap)).unwrap();
    let rule = registry.get("umap").unwrap();

    let mut first = sample_data();
    cache.run(rule, &mut first, &CallArgs::new(), &CallOptions::new()).unwrap();

    let mut second = sample_data();
    cache.run(rule, &mut second, &CallArgs::new(), &CallOptions::new()).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!(file_names(&temp_dir.path().join("tl")), vec!["umap.bincode"]);
}

#[test]
fn test_zstd_backend_and_custom_file_name() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open_cache(&temp_dir, "zstd");
    let calls = Arc::new(AtomicUsize::new(0));

    let mut registry = Registry::<AnnotatedData>::builtin().unwrap();
    registry.bind("umap", counting(&calls, umap)).unwrap();
    let rule = registry.get("umap").unwrap();

    let options = CallOptions::new().fname("umap_run2");
    let mut data = sample_data();
    cache.run(rule, &mut data, &CallArgs::new(), &options).unwrap();

    assert_eq!(
        file_names(&temp_dir.path().join("tl")),
        vec!["umap_run2.bincode.zst"]
    );
}

#[test]
fn test_pca_nested_paths_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open_cache(&temp_dir, "bincode");
    let registry = Registry::<AnnotatedData>::builtin().unwrap();
    let rule = registry.get("pca").unwrap();

    let mut data = sample_data();
    data.insert(Category::Obsm, "X_pca", embedding(0.0)).unwrap();
    data.insert(Category::Varm, "PCs", Matrix::new(3, 2, vec![0.5; 6])).unwrap();
    let mut pca = scache::container::Mapping::new();
    pca.insert("variance_ratio".into(), Value::Floats(vec![0.7, 0.3]));
    pca.insert("variance".into(), Value::Floats(vec![2.0, 1.0]));
    data.insert(Category::Uns, "pca", pca).unwrap();

    let options = CallOptions::new().call(false);
    cache.run(rule, &mut data, &CallArgs::new(), &options).unwrap();
    assert!(temp_dir.path().join("pp").join("pca.bincode").is_file());

    let mut restored = sample_data();
    cache.run(rule, &mut restored, &CallArgs::new(), &options).unwrap();
    assert_eq!(
        restored.get(Category::Uns, &["pca", "variance"]),
        Some(&Value::Floats(vec![2.0, 1.0]))
    );
    assert_eq!(data, restored);
}

#[test]
fn test_velocity_graph_arguments_resolve_ambiguity() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open_cache(&temp_dir, "bincode");
    let calls = Arc::new(AtomicUsize::new(0));

    let mut registry = Registry::<AnnotatedData>::builtin().unwrap();
    registry.bind("velocity_graph", counting(&calls, velocity_graphs)).unwrap();
    let rule = registry.get("velocity_graph").unwrap();

    let mut data = sample_data();
    data.insert(Category::Uns, "neighbors_graph", Value::empty_map()).unwrap();

    // `velocity_graph` and `neighbors_graph` both match `(.+)_graph$`
    let err = cache
        .run(rule, &mut data, &CallArgs::new(), &CallOptions::new())
        .unwrap_err();
    assert!(matches!(err, CacheError::AmbiguousKeyMatch { .. }));

    let args = CallArgs::new().kwarg("vkey", "velocity");
    let mut data = sample_data();
    data.insert(Category::Uns, "neighbors_graph", Value::empty_map()).unwrap();
    cache.run(rule, &mut data, &args, &CallOptions::new().force(true)).unwrap();

    let mut restored = sample_data();
    cache.run(rule, &mut restored, &args, &CallOptions::new()).unwrap();
    assert!(restored.contains(Category::Uns, &["velocity_graph"]));
    assert!(restored.contains(Category::Uns, &["velocity_graph_neg"]));
    assert!(!restored.contains(Category::Uns, &["neighbors_graph"]));
    assert!(cache.storage(Group::Tl).exists("velo_graph").unwrap());
}

#[test]
fn test_hint_batch_for_embeddings() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open_cache(&temp_dir, "bincode");
    let registry = Registry::<AnnotatedData>::builtin().unwrap();
    let rule = registry.get("velocity_embedding").unwrap();

    let mut data = sample_data();
    data.insert(Category::Obsm, "velocity_umap", embedding(0.0)).unwrap();
    data.insert(Category::Obsm, "velocity_tsne", embedding(1.0)).unwrap();
    data.insert(Category::Obsm, "velocity_pca", embedding(2.0)).unwrap();

    let options = CallOptions::new()
        .call(false)
        .hint(KeyHint::pattern("velocity_(umap|tsne)").unwrap());
    cache.run(rule, &mut data, &CallArgs::new(), &options).unwrap();

    let mut restored = sample_data();
    cache.run(rule, &mut restored, &CallArgs::new(), &options).unwrap();
    assert!(restored.contains(Category::Obsm, &["velocity_umap"]));
    assert!(restored.contains(Category::Obsm, &["velocity_tsne"]));
    assert!(!restored.contains(Category::Obsm, &["velocity_pca"]));
}

#[test]
fn test_missing_category_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open_cache(&temp_dir, "bincode");
    let registry = Registry::<AnnotatedData>::builtin().unwrap();
    let rule = registry.get("expression").unwrap();

    // No `X` slot and nothing to compute it
    let mut data = AnnotatedData::new(4, 3);
    let err = cache
        .run(rule, &mut data, &CallArgs::new(), &CallOptions::new())
        .unwrap_err();
    assert!(matches!(err, CacheError::InternalConsistency { .. }));
}

#[test]
fn test_skip_tolerates_missing_values() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open_cache(&temp_dir, "bincode");
    let registry = Registry::<AnnotatedData>::builtin().unwrap();
    let rule = registry.get("draw_graph").unwrap();

    let mut data = sample_data();
    data.insert(Category::Obsm, "X_draw_graph_fa", embedding(0.0)).unwrap();

    // `uns['draw_graph']` was never computed
    let options = CallOptions::new().call(false).skip(true);
    cache.run(rule, &mut data, &CallArgs::new(), &options).unwrap();

    let mut restored = sample_data();
    cache.run(rule, &mut restored, &CallArgs::new(), &options).unwrap();
    assert!(restored.contains(Category::Obsm, &["X_draw_graph_fa"]));
    assert!(!restored.contains(Category::Uns, &["draw_graph"]));
}

#[test]
fn test_plot_capture() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open_cache(&temp_dir, "zstd");
    let renders = Arc::new(AtomicUsize::new(0));
    let counter = renders.clone();

    let mut registry = Registry::<AnnotatedData>::builtin().unwrap();
    let renderer = Arc::new(move |data: &AnnotatedData, _: &CallArgs| -> anyhow::Result<Raster> {
        counter.fetch_add(1, Ordering::SeqCst);
        let shade = if data.contains(Category::Obsm, &["X_umap"]) { 200 } else { 0 };
        Ok(Raster::new(2, 2, vec![shade; 16]))
    });
    registry.register_plot("umap", renderer).unwrap();
    let rule = registry.get("umap_plot").unwrap();

    let mut data = sample_data();
    data.insert(Category::Obsm, "X_umap", embedding(0.0)).unwrap();

    let first = cache
        .run(rule, &mut data, &CallArgs::new(), &CallOptions::new())
        .unwrap()
        .into_image()
        .unwrap();
    let second = cache
        .run(rule, &mut data, &CallArgs::new(), &CallOptions::new())
        .unwrap()
        .into_image()
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.pixels[0], 200);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert!(!data.contains(Category::Uns, &[TMP_PLOT_KEY]));
    assert_eq!(
        file_names(&temp_dir.path().join("pl")),
        vec!["umap_plot.bincode.zst"]
    );
}

#[test]
fn test_pca_array_hands_back_the_embedding() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open_cache(&temp_dir, "bincode");
    let calls = Arc::new(AtomicUsize::new(0));

    let mut registry = Registry::<AnnotatedData>::builtin().unwrap();
    registry
        .bind(
            "pcarr",
            counting(&calls, |data, _| {
                data.insert(Category::Obsm, "X_pca", embedding(5.0)).unwrap();
            }),
        )
        .unwrap();
    let rule = registry.get("pcarr").unwrap();

    let mut first = sample_data();
    let computed = cache
        .run(rule, &mut first, &CallArgs::new(), &CallOptions::new())
        .unwrap()
        .into_value()
        .unwrap();

    let mut second = sample_data();
    let restored = cache
        .run(rule, &mut second, &CallArgs::new(), &CallOptions::new())
        .unwrap()
        .into_value()
        .unwrap();

    assert_eq!(computed, Value::Matrix(embedding(5.0)));
    assert_eq!(computed, restored);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(file_names(&temp_dir.path().join("pp")), vec!["pca_arr.bincode"]);
}

#[test]
fn test_clear_all_groups() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open_cache(&temp_dir, "bincode");
    let registry = Registry::<AnnotatedData>::builtin().unwrap();

    let mut data = sample_data();
    let options = CallOptions::new().call(false);
    cache
        .run(registry.get("expression").unwrap(), &mut data, &CallArgs::new(), &options)
        .unwrap();
    cache
        .run(registry.get("louvain").unwrap(), &mut data, &CallArgs::new(), &options)
        .unwrap();

    let removed = cache.clear(None).unwrap();
    assert_eq!(removed.len(), 2);
    assert!(file_names(&temp_dir.path().join("pp")).is_empty());
    assert!(file_names(&temp_dir.path().join("tl")).is_empty());
}
