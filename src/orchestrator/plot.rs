//! Plot capture
//!
//! A plot rule stores a rendered raster under a transient `uns` key so that the
//! regular save and load paths can persist it. The orchestrator takes the
//! raster back out of the container before returning.

use std::sync::Arc;

use super::CallArgs;
use crate::container::{get_path, remove_path, set_path, AttributePath, Category, Container, Raster, Value};
use crate::error::CacheError;
use crate::resolve::KeySpec;
use crate::rule::{Callback, CacheRule, Group};

/// Transient `uns` key holding a captured plot
pub const TMP_PLOT_KEY: &str = "scache_tmp_plot";

/// Draws a container into an RGBA raster
pub trait Renderer<C>: Send + Sync {
    fn render(&self, container: &C, args: &CallArgs) -> anyhow::Result<Raster>;
}

impl<C, F> Renderer<C> for F
where
    F: Fn(&C, &CallArgs) -> anyhow::Result<Raster> + Send + Sync,
{
    fn render(&self, container: &C, args: &CallArgs) -> anyhow::Result<Raster> {
        self(container, args)
    }
}

fn tmp_plot_path() -> AttributePath {
    AttributePath::key(Category::Uns, TMP_PLOT_KEY)
}

/// Computation rendering into the transient key, unless a plot is already there
pub fn plot_callback<C: Container + 'static>(renderer: Arc<dyn Renderer<C>>) -> Callback<C> {
    Arc::new(move |container: &mut C, args: &CallArgs| -> anyhow::Result<Option<Value>> {
        let path = tmp_plot_path();
        if get_path(&*container, &path).is_some() {
            return Ok(None);
        }

        let raster = renderer.render(container, args)?;
        if !raster.is_consistent() {
            anyhow::bail!(
                "Renderer produced {} bytes for a {}x{} image",
                raster.pixels.len(),
                raster.width,
                raster.height
            );
        }
        set_path(container, &path, Value::Raster(raster))?;
        Ok(None)
    })
}

/// Plot-capture rule `<name>_plot`, stored in the `pl` group
pub fn plot_rule<C: Container + 'static>(
    name: &str,
    renderer: Arc<dyn Renderer<C>>,
) -> Result<CacheRule<C>, CacheError> {
    let name = format!("{}_plot", name);

    Ok(CacheRule::from_pairs(&name, [("uns", KeySpec::literal(TMP_PLOT_KEY))])?
        .with_group(Group::Pl)
        .with_fname(name.clone())
        .with_default_fn(plot_callback(renderer))
        .as_plot())
}

/// Remove the captured plot from the container and return it
pub fn take_image(container: &mut dyn Container, rule: &str) -> Result<Raster, CacheError> {
    match remove_path(container, &tmp_plot_path()) {
        Some(Value::Raster(raster)) => Ok(raster),
        Some(other) => Err(CacheError::InternalConsistency {
            rule: rule.to_string(),
            reason: format!("`{}` holds {} instead of an image", tmp_plot_path(), other.summary()),
        }),
        None => Err(CacheError::InternalConsistency {
            rule: rule.to_string(),
            reason: format!("no image was captured under `{}`", tmp_plot_path()),
        }),
    }
}

/// Drop a captured plot left behind by a failed call
pub fn discard(container: &mut dyn Container) {
    remove_path(container, &tmp_plot_path());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::AnnotatedData;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_callback_skips_existing_plot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let renderer = Arc::new(move |_: &AnnotatedData, _: &CallArgs| -> anyhow::Result<Raster> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Raster::new(2, 1, vec![255; 8]))
        });
        let callback = plot_callback::<AnnotatedData>(renderer);

        let mut data = AnnotatedData::new(2, 2);
        callback(&mut data, &CallArgs::new()).unwrap();
        callback(&mut data, &CallArgs::new()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(data.contains(Category::Uns, &[TMP_PLOT_KEY]));
    }

    #[test]
    fn test_inconsistent_raster_rejected() {
        let renderer = Arc::new(|_: &AnnotatedData, _: &CallArgs| -> anyhow::Result<Raster> {
            Ok(Raster::new(2, 2, vec![0; 3]))
        });
        let callback = plot_callback::<AnnotatedData>(renderer);

        let mut data = AnnotatedData::new(2, 2);
        assert!(callback(&mut data, &CallArgs::new()).is_err());
        assert!(!data.contains(Category::Uns, &[TMP_PLOT_KEY]));
    }

    #[test]
    fn test_take_image_removes_key() {
        let mut data = AnnotatedData::new(2, 2);
        data.insert(Category::Uns, TMP_PLOT_KEY, Raster::new(1, 1, vec![1, 2, 3, 4]))
            .unwrap();

        let image = take_image(&mut data, "umap_plot").unwrap();
        assert_eq!(image.pixels, vec![1, 2, 3, 4]);
        assert!(!data.contains(Category::Uns, &[TMP_PLOT_KEY]));
        assert!(take_image(&mut data, "umap_plot").is_err());
    }

    #[test]
    fn test_discard_removes_leftover_plot() {
        let mut data = AnnotatedData::new(2, 2);
        data.insert(Category::Uns, TMP_PLOT_KEY, Raster::new(1, 1, vec![0; 4]))
            .unwrap();

        discard(&mut data);
        assert!(!data.contains(Category::Uns, &[TMP_PLOT_KEY]));
        discard(&mut data);
    }
}
