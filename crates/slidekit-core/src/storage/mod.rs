//! Slide persistence: the remote store interface and its implementations.

mod memory;
mod spawn;
mod writer;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemorySlideStore;
pub use spawn::{LocalFuture, Spawn};
pub use writer::{SlideWriter, StoreWriter};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileSlideStore;

#[cfg(not(target_arch = "wasm32"))]
pub use spawn::BlockingSpawner;

#[cfg(target_arch = "wasm32")]
pub use spawn::LocalSpawner;

use crate::scene::SceneTree;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Identifier of a slide in the remote store.
pub type SlideId = String;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Slide not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

fn is_empty_list(list: &[String]) -> bool {
    list.is_empty()
}

/// A persisted slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: SlideId,
    pub position: usize,
    /// Display duration in seconds.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub konva_data: Option<SceneTree>,
    #[serde(default, skip_serializing_if = "is_empty_list")]
    pub media_ids: Vec<String>,
}

impl Slide {
    /// Apply the fields present in an update.
    pub fn apply(&mut self, update: SlideUpdate) {
        if let Some(tree) = update.konva_data {
            self.konva_data = Some(tree);
        }
        if let Some(duration) = update.duration {
            self.duration = duration;
        }
        if let Some(position) = update.position {
            self.position = position;
        }
    }
}

/// Partial slide update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub konva_data: Option<SceneTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl SlideUpdate {
    pub fn scene(tree: SceneTree) -> Self {
        Self {
            konva_data: Some(tree),
            ..Self::default()
        }
    }

    pub fn duration(seconds: f64) -> Self {
        Self {
            duration: Some(seconds),
            ..Self::default()
        }
    }

    pub fn position(position: usize) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Fold a later update into this one; later fields win.
    pub fn merge(&mut self, later: SlideUpdate) {
        if later.konva_data.is_some() {
            self.konva_data = later.konva_data;
        }
        if later.duration.is_some() {
            self.duration = later.duration;
        }
        if later.position.is_some() {
            self.position = later.position;
        }
    }
}

/// Data for a new slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSlide {
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub position: Option<usize>,
    #[serde(default)]
    pub konva_data: Option<SceneTree>,
}

/// Remote slide store.
///
/// The editor runs on a single-threaded event loop, so implementations are
/// not required to be `Send`.
pub trait SlideStore {
    /// Load one slide.
    fn load_slide(&self, slide_id: &str) -> BoxFuture<'_, StorageResult<Slide>>;

    /// All slides ordered by position.
    fn list_slides(&self) -> BoxFuture<'_, StorageResult<Vec<Slide>>>;

    /// Apply a partial update.
    fn update_slide(&self, slide_id: &str, update: SlideUpdate) -> BoxFuture<'_, StorageResult<()>>;

    /// Create a slide. Without an explicit position it is appended.
    fn create_slide(&self, data: NewSlide) -> BoxFuture<'_, StorageResult<Slide>>;

    /// Delete a slide.
    fn delete_slide(&self, slide_id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Record that a slide uses a media item.
    fn associate_media_to_slide(
        &self,
        slide_id: &str,
        media_id: &str,
    ) -> BoxFuture<'_, StorageResult<()>>;
}

#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    // Simple blocking executor for tests
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
