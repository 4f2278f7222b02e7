//! Headless application state: one editor over a directory-backed store.

use crate::script::{Command, Labels, Script};
use kurbo::{Point, Rect, Size};
use slidekit_core::debounce::{Clock, ManualClock};
use slidekit_core::storage::{BlockingSpawner, FileSlideStore};
use slidekit_core::{
    ConfigError, Editor, EditorConfig, NodeState, SceneError, SelectMode, ShapeId, StorageError,
};
use slidekit_render::{DisplayListRenderer, RenderContext, Renderer, RendererError};
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("usage: slidekit <store-dir> <script.json>")]
    Usage,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error("failed to read script {path}: {source}")]
    ScriptIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid script: {0}")]
    ScriptParse(#[from] serde_json::Error),
    #[error("no slide at index {0}")]
    NoSuchSlide(usize),
    #[error("unknown shape label: {0}")]
    UnknownLabel(String),
    #[error("no slide is open")]
    NoOpenSlide,
}

/// Where to read and write, and how the editor behaves.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_dir: PathBuf,
    pub script_path: PathBuf,
    pub editor: EditorConfig,
}

impl AppConfig {
    /// Parse `<store-dir> <script.json>`; editor settings come from the environment.
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self, AppError> {
        let (Some(store_dir), Some(script_path), None) = (args.next(), args.next(), args.next())
        else {
            return Err(AppError::Usage);
        };
        Ok(Self {
            store_dir: store_dir.into(),
            script_path: script_path.into(),
            editor: EditorConfig::from_env()?,
        })
    }

    pub fn load_script(&self) -> Result<Script, AppError> {
        let json = std::fs::read_to_string(&self.script_path).map_err(|source| {
            AppError::ScriptIo {
                path: self.script_path.display().to_string(),
                source,
            }
        })?;
        Ok(Script::from_json(&json)?)
    }
}

/// A running replay session.
pub struct App {
    editor: Editor,
    clock: ManualClock,
    labels: Labels,
    output: Vec<String>,
}

impl App {
    /// Open the store, making sure there is a slide to edit, and open the first one.
    pub async fn open(store_dir: PathBuf, config: EditorConfig) -> Result<Self, AppError> {
        let store = FileSlideStore::new(store_dir)?;
        log::info!("Using slide store at {}", store.base_path().display());
        let clock = ManualClock::new();
        let clock_handle: Rc<dyn Clock> = Rc::new(clock.clone());
        let mut editor = Editor::new(config, Rc::new(store), Rc::new(BlockingSpawner), clock_handle);

        let count = editor.load_deck().await?;
        log::info!("Loaded {count} slide(s)");
        if count == 0 {
            editor.create_slide().await?;
        }
        if let Some(first) = editor.deck().ids().into_iter().next() {
            editor.open_slide(&first).await?;
        }

        Ok(Self {
            editor,
            clock,
            labels: Labels::default(),
            output: Vec::new(),
        })
    }

    /// Run every command, then fire any write still waiting on its debounce.
    pub async fn replay(&mut self, script: Script) -> Result<(), AppError> {
        let total = script.len();
        for (index, command) in script.commands.into_iter().enumerate() {
            log::debug!("step {}/{total}: {command:?}", index + 1);
            self.execute(command).await?;
        }
        let flushed = self.editor.flush();
        log::info!("Replayed {total} command(s), flushed {flushed} pending write(s)");
        Ok(())
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Lines produced by `dump` and `render`.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn into_output(self) -> Vec<String> {
        self.output
    }

    fn resolve(&self, reference: &str) -> Result<ShapeId, AppError> {
        self.labels
            .resolve(reference)
            .ok_or_else(|| AppError::UnknownLabel(reference.to_string()))
    }

    fn slide_at(&self, index: usize) -> Result<String, AppError> {
        self.editor
            .deck()
            .ids()
            .into_iter()
            .nth(index)
            .ok_or(AppError::NoSuchSlide(index))
    }

    fn open_slide_id(&self) -> Result<String, AppError> {
        self.editor
            .active_slide()
            .map(str::to_string)
            .ok_or(AppError::NoOpenSlide)
    }

    /// Node states of every shape the gesture started with, mapped through `f`.
    fn gesture_states(&self, f: impl Fn(NodeState) -> NodeState) -> Vec<(ShapeId, NodeState)> {
        self.editor
            .transform()
            .originals()
            .map(|shape| (shape.id().to_string(), f(NodeState::of(shape))))
            .collect()
    }

    pub async fn execute(&mut self, command: Command) -> Result<(), AppError> {
        match command {
            Command::OpenSlide { slide } => {
                let id = self.slide_at(slide)?;
                self.editor.open_slide(&id).await?;
            }
            Command::CreateSlide => {
                self.editor.create_slide().await?;
            }
            Command::DeleteSlide { slide } => {
                let id = self.slide_at(slide)?;
                self.editor.delete_slide(&id).await?;
            }
            Command::ReorderSlides { order } => {
                let ids = order
                    .into_iter()
                    .map(|index| self.slide_at(index))
                    .collect::<Result<Vec<_>, _>>()?;
                let moved = self.editor.reorder_slides(&ids)?;
                log::info!("Reordered slides, {moved} moved");
            }
            Command::SetDuration { seconds } => {
                let id = self.open_slide_id()?;
                self.editor.set_duration(&id, seconds);
            }
            Command::AddShape { kind, x, y, options, label } => {
                match self.editor.add_shape(&kind, x, y, &options) {
                    Some(id) => {
                        if let Some(label) = label {
                            self.labels.bind(&label, id);
                        }
                    }
                    None => log::warn!("Could not add a {kind} shape"),
                }
            }
            Command::Select { ids, toggle } => {
                let ids = ids
                    .iter()
                    .map(|reference| self.resolve(reference))
                    .collect::<Result<Vec<_>, _>>()?;
                let mode = if toggle { SelectMode::Toggle } else { SelectMode::Replace };
                self.editor.select(&ids, mode);
            }
            Command::Marquee { x0, y0, x1, y1 } => {
                self.editor.marquee_select(Rect::new(x0, y0, x1, y1).abs());
            }
            Command::ToggleMarqueeMode => {
                let mode = self.editor.toggle_marquee_mode();
                log::info!("Marquee mode is now {mode:?}");
            }
            Command::SelectAll => {
                self.editor.select_all();
            }
            Command::ClickBackground { modifier } => {
                self.editor.background_click(modifier);
            }
            Command::DeleteSelected => {
                let removed = self.editor.delete_selected();
                log::info!("Deleted {removed} shape(s)");
            }
            Command::Drag { dx, dy } => {
                if !self.editor.begin_drag() {
                    log::warn!("Nothing to drag");
                    return Ok(());
                }
                let states = self.gesture_states(|s| NodeState { x: s.x + dx, y: s.y + dy, ..s });
                self.editor.drag_move(&states);
                self.editor.end_gesture();
            }
            Command::Transform { scale_x, scale_y, rotation } => {
                if !self.editor.begin_transform() {
                    log::warn!("Nothing to transform");
                    return Ok(());
                }
                let states = self.gesture_states(|s| NodeState {
                    rotation: rotation.unwrap_or(s.rotation),
                    ..s.scaled(scale_x, scale_y)
                });
                self.editor.transform_update(&states);
                self.editor.end_gesture();
            }
            Command::Handle { handle, x, y } => {
                if !self.editor.begin_transform() {
                    log::warn!("Nothing to transform");
                    return Ok(());
                }
                if self.editor.transform_handle(handle, Point::new(x, y)) {
                    self.editor.end_gesture();
                } else {
                    log::warn!("Handle {handle:?} does not apply to the selection");
                    self.editor.cancel_gesture();
                }
            }
            Command::EditText { id, text } => {
                let id = self.resolve(&id)?;
                if self.editor.start_text_edit(&id) {
                    self.editor.set_text_draft(&text);
                    self.editor.commit_text_edit();
                } else {
                    log::warn!("Shape {id} is not editable text");
                }
            }
            Command::SetBackground { color } => {
                self.editor.set_background(&color);
            }
            Command::MediaLoaded { id, width, height } => {
                let id = self.resolve(&id)?;
                self.editor.media_loaded(&id, Size::new(width, height));
            }
            Command::MediaDeleted => {
                self.editor.media_deleted().await?;
            }
            Command::Anchor { end, x, y } => {
                if self.editor.drag_anchor(end.into(), Point::new(x, y)) {
                    self.editor.release_anchor();
                } else {
                    log::warn!("No arrow selected");
                }
            }
            Command::BringToFront => {
                self.editor.bring_to_front();
            }
            Command::SendToBack => {
                self.editor.send_to_back();
            }
            Command::BringForward => {
                self.editor.bring_forward();
            }
            Command::SendBackward => {
                self.editor.send_backward();
            }
            Command::Undo => {
                self.editor.undo();
            }
            Command::Redo => {
                self.editor.redo();
            }
            Command::Wait { ms } => {
                self.clock.advance_ms(ms);
                let fired = self.editor.tick();
                log::debug!("{fired} debounced write(s) fired after {ms}ms");
            }
            Command::Render { width, height } => {
                let ctx = RenderContext::for_editor(&self.editor, Size::new(width, height))
                    .ok_or(AppError::NoOpenSlide)?;
                let mut renderer = DisplayListRenderer::new();
                renderer.build_scene(&ctx)?;
                let count = renderer.items().len();
                log::info!("Rendered {count} draw item(s)");
                self.output.push(format!("frame {width}x{height}: {count} items"));
            }
            Command::Dump => {
                let tree = self.editor.tree().ok_or(AppError::NoOpenSlide)?;
                self.output.push(tree.to_json()?);
            }
        }
        Ok(())
    }
}

/// Open the store, replay the script and return what it printed.
pub async fn run(config: AppConfig) -> Result<Vec<String>, AppError> {
    let script = config.load_script()?;
    let mut app = App::open(config.store_dir, config.editor).await?;
    app.replay(script).await?;
    Ok(app.into_output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidekit_core::SlideStore;

    fn open(dir: &tempfile::TempDir) -> App {
        pollster::block_on(App::open(dir.path().to_path_buf(), EditorConfig::default())).unwrap()
    }

    fn play(app: &mut App, json: &str) {
        pollster::block_on(app.replay(Script::from_json(json).unwrap())).unwrap();
    }

    fn stored_slides(dir: &tempfile::TempDir) -> Vec<slidekit_core::storage::Slide> {
        let store = FileSlideStore::new(dir.path().to_path_buf()).unwrap();
        let mut slides = pollster::block_on(store.list_slides()).unwrap();
        slides.sort_by_key(|s| s.position);
        slides
    }

    #[test]
    fn test_open_creates_first_slide() {
        let dir = tempfile::tempdir().unwrap();
        let app = open(&dir);
        assert_eq!(app.editor().deck().len(), 1);
        assert!(app.editor().active_slide().is_some());
        assert_eq!(stored_slides(&dir).len(), 1);
    }

    #[test]
    fn test_replay_persists_resize() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open(&dir);
        play(
            &mut app,
            r#"[
                {"op": "addShape", "kind": "Rect", "x": 400, "y": 300, "label": "box"},
                {"op": "transform", "scaleX": 2, "scaleY": 1},
                {"op": "dump"}
            ]"#,
        );
        let slides = stored_slides(&dir);
        let tree = slides[0].konva_data.as_ref().unwrap();
        let shape = tree.shapes().next().unwrap();
        assert!((shape.bounds().width() - 400.0).abs() < 1e-9);
        assert_eq!(app.output().len(), 1);
        assert!(app.output()[0].contains("\"className\""));
    }

    #[test]
    fn test_background_written_on_flush() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open(&dir);
        play(&mut app, r##"[{"op": "setBackground", "color": "#000000"}]"##);
        let tree = stored_slides(&dir)[0].konva_data.clone().unwrap();
        assert_eq!(tree.background_color, "#000000");
    }

    #[test]
    fn test_unknown_label_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open(&dir);
        let result = pollster::block_on(app.execute(Command::Select {
            ids: vec!["@nothing".to_string()],
            toggle: false,
        }));
        assert!(matches!(result, Err(AppError::UnknownLabel(_))));
    }

    #[test]
    fn test_slides_reordered_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open(&dir);
        play(
            &mut app,
            r#"[{"op": "createSlide"}, {"op": "createSlide"}, {"op": "reorderSlides", "order": [2, 0, 1]}]"#,
        );
        let ids = app.editor().deck().ids();
        drop(app);

        let reopened = open(&dir);
        assert_eq!(reopened.editor().deck().ids(), ids);
        let positions: Vec<usize> = stored_slides(&dir).iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_render_reports_items() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open(&dir);
        play(
            &mut app,
            r#"[
                {"op": "addShape", "kind": "Circle", "x": 100, "y": 100},
                {"op": "render", "width": 800, "height": 600}
            ]"#,
        );
        let line = app.output().last().unwrap();
        assert!(line.starts_with("frame 800x600:"));
    }

    #[test]
    fn test_args_need_two_paths() {
        let args = ["only-one".to_string()];
        assert!(matches!(AppConfig::from_args(args.into_iter()), Err(AppError::Usage)));
    }
}
