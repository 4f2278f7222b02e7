//! File-based slide store for native platforms.

use super::{BoxFuture, NewSlide, Slide, SlideStore, SlideUpdate, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stores each slide as a JSON file in a directory.
pub struct FileSlideStore {
    base_path: PathBuf,
}

fn read_slide(path: &Path, id: &str) -> StorageResult<Slide> {
    if !path.exists() {
        return Err(StorageError::NotFound(id.to_string()));
    }
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json).map_err(|e| {
        StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

fn write_slide(path: &Path, slide: &Slide) -> StorageResult<()> {
    let json = serde_json::to_string_pretty(slide)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    fs::write(path, json)
        .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

impl FileSlideStore {
    /// Create a store in the given directory, creating it if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a store in the default location.
    ///
    /// On Unix: `~/.local/share/slidekit/slides/`
    /// On Windows: `%LOCALAPPDATA%\slidekit\slides\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("slidekit").join("slides"))
    }

    fn slide_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn read_all(&self) -> StorageResult<Vec<Slide>> {
        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;
        let mut slides = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                let id = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string();
                slides.push(read_slide(&path, &id)?);
            }
        }
        slides.sort_by_key(|s| s.position);
        Ok(slides)
    }
}

impl SlideStore for FileSlideStore {
    fn load_slide(&self, slide_id: &str) -> BoxFuture<'_, StorageResult<Slide>> {
        let path = self.slide_path(slide_id);
        let id = slide_id.to_string();
        Box::pin(async move { read_slide(&path, &id) })
    }

    fn list_slides(&self) -> BoxFuture<'_, StorageResult<Vec<Slide>>> {
        Box::pin(async move { self.read_all() })
    }

    fn update_slide(&self, slide_id: &str, update: SlideUpdate) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.slide_path(slide_id);
        let id = slide_id.to_string();
        Box::pin(async move {
            let mut slide = read_slide(&path, &id)?;
            slide.apply(update);
            write_slide(&path, &slide)
        })
    }

    fn create_slide(&self, data: NewSlide) -> BoxFuture<'_, StorageResult<Slide>> {
        Box::pin(async move {
            let position = match data.position {
                Some(p) => p,
                None => self.read_all()?.len(),
            };
            let slide = Slide {
                id: Uuid::new_v4().to_string(),
                position,
                duration: data.duration,
                konva_data: data.konva_data,
                media_ids: Vec::new(),
            };
            write_slide(&self.slide_path(&slide.id), &slide)?;
            Ok(slide)
        })
    }

    fn delete_slide(&self, slide_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.slide_path(slide_id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn associate_media_to_slide(
        &self,
        slide_id: &str,
        media_id: &str,
    ) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.slide_path(slide_id);
        let id = slide_id.to_string();
        let media_id = media_id.to_string();
        Box::pin(async move {
            let mut slide = read_slide(&path, &id)?;
            if !slide.media_ids.contains(&media_id) {
                slide.media_ids.push(media_id);
                write_slide(&path, &slide)?;
            }
            Ok(())
        })
    }
}
