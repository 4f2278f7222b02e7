//! Writers that forward cache writes to a slide store.

use super::{SlideId, SlideStore, SlideUpdate, Spawn};
use std::rc::Rc;

/// Destination for persistence writes issued by the cache.
///
/// Writes are fire-and-forget: a failure is the writer's to report.
pub trait SlideWriter {
    fn write(&self, slide_id: &str, update: SlideUpdate);
}

/// Writer bound to one store, running calls on a spawner.
#[derive(Clone)]
pub struct StoreWriter {
    store: Rc<dyn SlideStore>,
    spawner: Rc<dyn Spawn>,
}

impl StoreWriter {
    pub fn new(store: Rc<dyn SlideStore>, spawner: Rc<dyn Spawn>) -> Self {
        Self { store, spawner }
    }

    pub fn store(&self) -> &Rc<dyn SlideStore> {
        &self.store
    }

    /// Associate media with a slide, logging failures.
    pub fn associate_media(&self, slide_id: &str, media_id: &str) {
        let store = self.store.clone();
        let slide_id: SlideId = slide_id.to_string();
        let media_id = media_id.to_string();
        self.spawner.spawn(Box::pin(async move {
            if let Err(e) = store.associate_media_to_slide(&slide_id, &media_id).await {
                log::error!("failed to associate media {media_id} with slide {slide_id}: {e}");
            }
        }));
    }
}

impl SlideWriter for StoreWriter {
    fn write(&self, slide_id: &str, update: SlideUpdate) {
        let store = self.store.clone();
        let slide_id: SlideId = slide_id.to_string();
        self.spawner.spawn(Box::pin(async move {
            match store.update_slide(&slide_id, update).await {
                Ok(()) => log::debug!("slide {slide_id} persisted"),
                Err(e) => log::error!("failed to persist slide {slide_id}: {e}"),
            }
        }));
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::storage::{BlockingSpawner, MemorySlideStore, NewSlide, block_on};

    #[test]
    fn test_write_reaches_store() {
        let store = Rc::new(MemorySlideStore::new());
        let slide = block_on(store.create_slide(NewSlide::default())).unwrap();
        let writer = StoreWriter::new(store.clone(), Rc::new(BlockingSpawner));
        writer.write(&slide.id, SlideUpdate::duration(12.0));
        assert_eq!(store.slide(&slide.id).unwrap().duration, 12.0);
    }

    #[test]
    fn test_failed_write_is_swallowed() {
        let store = Rc::new(MemorySlideStore::new());
        let writer = StoreWriter::new(store.clone(), Rc::new(BlockingSpawner));
        writer.write("missing", SlideUpdate::duration(1.0));
        assert!(store.update_log().is_empty());
    }
}
