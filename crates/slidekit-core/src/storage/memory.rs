//! In-memory slide store.

use super::{
    BoxFuture, NewSlide, Slide, SlideId, SlideStore, SlideUpdate, StorageError, StorageResult,
};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

/// In-memory store for testing and ephemeral use.
///
/// Every applied update is also appended to a log.
#[derive(Default)]
pub struct MemorySlideStore {
    slides: RwLock<HashMap<SlideId, Slide>>,
    update_log: RwLock<Vec<(SlideId, SlideUpdate)>>,
}

impl MemorySlideStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given slides.
    pub fn with_slides(slides: Vec<Slide>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.slides.write() {
            map.extend(slides.into_iter().map(|s| (s.id.clone(), s)));
        }
        store
    }

    /// Updates applied so far, in order.
    pub fn update_log(&self) -> Vec<(SlideId, SlideUpdate)> {
        self.update_log
            .read()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn slide(&self, slide_id: &str) -> Option<Slide> {
        self.slides.read().ok()?.get(slide_id).cloned()
    }
}

impl SlideStore for MemorySlideStore {
    fn load_slide(&self, slide_id: &str) -> BoxFuture<'_, StorageResult<Slide>> {
        let id = slide_id.to_string();
        Box::pin(async move {
            let slides = self.slides.read().map_err(lock_error)?;
            slides.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn list_slides(&self) -> BoxFuture<'_, StorageResult<Vec<Slide>>> {
        Box::pin(async move {
            let slides = self.slides.read().map_err(lock_error)?;
            let mut list: Vec<Slide> = slides.values().cloned().collect();
            list.sort_by_key(|s| s.position);
            Ok(list)
        })
    }

    fn update_slide(&self, slide_id: &str, update: SlideUpdate) -> BoxFuture<'_, StorageResult<()>> {
        let id = slide_id.to_string();
        Box::pin(async move {
            let mut slides = self.slides.write().map_err(lock_error)?;
            let slide = slides
                .get_mut(&id)
                .ok_or_else(|| StorageError::NotFound(id.clone()))?;
            slide.apply(update.clone());
            self.update_log.write().map_err(lock_error)?.push((id, update));
            Ok(())
        })
    }

    fn create_slide(&self, data: NewSlide) -> BoxFuture<'_, StorageResult<Slide>> {
        Box::pin(async move {
            let mut slides = self.slides.write().map_err(lock_error)?;
            let slide = Slide {
                id: Uuid::new_v4().to_string(),
                position: data.position.unwrap_or(slides.len()),
                duration: data.duration,
                konva_data: data.konva_data,
                media_ids: Vec::new(),
            };
            slides.insert(slide.id.clone(), slide.clone());
            Ok(slide)
        })
    }

    fn delete_slide(&self, slide_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = slide_id.to_string();
        Box::pin(async move {
            let mut slides = self.slides.write().map_err(lock_error)?;
            slides.remove(&id);
            Ok(())
        })
    }

    fn associate_media_to_slide(
        &self,
        slide_id: &str,
        media_id: &str,
    ) -> BoxFuture<'_, StorageResult<()>> {
        let id = slide_id.to_string();
        let media_id = media_id.to_string();
        Box::pin(async move {
            let mut slides = self.slides.write().map_err(lock_error)?;
            let slide = slides.get_mut(&id).ok_or(StorageError::NotFound(id))?;
            if !slide.media_ids.contains(&media_id) {
                slide.media_ids.push(media_id);
            }
            Ok(())
        })
    }
}
