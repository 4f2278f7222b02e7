//! SlideKit Core Library
//!
//! Platform-agnostic canvas editing engine for signage slides: the scene
//! tree, selection, transform and snapping, and the persistence cache that
//! keeps the live tree and the slide store consistent.

pub mod arrow_transformer;
pub mod attrs;
pub mod cache;
pub mod config;
pub mod debounce;
pub mod editor;
pub mod factory;
pub mod handles;
pub mod history;
pub mod layers;
pub mod record;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod slides;
pub mod snap;
pub mod storage;
pub mod text_edit;
pub mod transform;

pub use arrow_transformer::ArrowTransformer;
pub use attrs::{AttrPatch, BatchUpdate};
pub use cache::{Persist, PersistenceCache, WriteChannel, WriteOptions};
pub use config::{ConfigError, DebounceConfig, EditorConfig, StageConfig};
pub use debounce::{Clock, ManualClock, SystemClock};
pub use editor::Editor;
pub use factory::{ShapeFactory, ShapeOptions};
pub use handles::{Handle, HandleKind};
pub use history::History;
pub use layers::LayerOrderManager;
pub use record::NodeRecord;
pub use scene::{Layer, SceneError, SceneResult, SceneTree};
pub use selection::{MarqueeMode, SelectMode, SelectionManager};
pub use shapes::{Shape, ShapeId, ShapeKind};
pub use slides::SlideDeck;
pub use snap::{Guide, SnapResult, SnappingEngine};
pub use storage::{SlideId, SlideStore, SlideUpdate, StorageError, StorageResult};
pub use text_edit::TextEditOverlay;
pub use transform::{NodeState, TransformEngine, TransformPhase};
