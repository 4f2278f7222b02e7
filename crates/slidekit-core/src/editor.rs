//! The editor context.
//!
//! An [`Editor`] owns every piece of interaction state for one open show and
//! routes each scene mutation through its [`PersistenceCache`]. Hosts feed it
//! pointer and keyboard events, render from [`Editor::tree`], and call
//! [`Editor::tick`] from their event loop so debounced writes can fire.
//!
//! Pointer gestures follow one shape:
//!
//! ```text
//! begin_drag / begin_transform
//!     drag_move / transform_update / transform_handle   (cache only, many)
//! end_gesture                                           (one write)
//! ```

use crate::arrow_transformer::ArrowTransformer;
use crate::attrs::AttrPatch;
use crate::cache::{PersistenceCache, WriteChannel, WriteOptions};
use crate::config::EditorConfig;
use crate::debounce::Clock;
use crate::factory::{ShapeFactory, ShapeOptions};
use crate::handles::{Handle, HandleKind, drag_handle};
use crate::layers::LayerOrderManager;
use crate::scene::{SceneResult, SceneTree};
use crate::selection::{MarqueeMode, SelectMode, SelectionManager};
use crate::shapes::{Endpoint, ShapeId, fit_within};
use crate::slides::SlideDeck;
use crate::snap::{Guide, SnapGuides, SnappingEngine};
use crate::storage::{
    NewSlide, Slide, SlideId, SlideStore, SlideUpdate, Spawn, StorageResult, StoreWriter,
};
use crate::text_edit::TextEditOverlay;
use crate::transform::{CommitKind, NodeState, TransformEngine, TransformPhase};
use kurbo::{Point, Rect, Size};
use std::rc::Rc;

/// Duration given to newly created slides, in seconds.
pub const DEFAULT_SLIDE_DURATION: f64 = 10.0;

type Restack = fn(&SceneTree, &[ShapeId]) -> Vec<ShapeId>;

pub struct Editor {
    config: EditorConfig,
    clock: Rc<dyn Clock>,
    store: Rc<dyn SlideStore>,
    spawner: Rc<dyn Spawn>,
    cache: PersistenceCache,
    deck: SlideDeck,
    active: Option<SlideId>,
    selection: SelectionManager,
    marquee_mode: MarqueeMode,
    transform: TransformEngine,
    snapping: SnappingEngine,
    snap_guides: Option<SnapGuides>,
    text_edit: TextEditOverlay,
    arrows: ArrowTransformer,
    /// Tree as it was when the current gesture began.
    gesture_base: Option<SceneTree>,
    live_states: Vec<(ShapeId, NodeState)>,
}

impl Editor {
    pub fn new(
        config: EditorConfig,
        store: Rc<dyn SlideStore>,
        spawner: Rc<dyn Spawn>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let mut cache = PersistenceCache::new(config.history_limit, config.debounce.clone());
        // Slide metadata writes need a writer before any slide is opened.
        cache.set_writer(Box::new(StoreWriter::new(store.clone(), spawner.clone())));
        Self {
            selection: SelectionManager::new(config.marquee_min_size),
            marquee_mode: config.marquee_mode,
            transform: TransformEngine::new(config.min_resize),
            snapping: SnappingEngine::new(config.snap_threshold),
            config,
            clock,
            store,
            spawner,
            cache,
            deck: SlideDeck::default(),
            active: None,
            snap_guides: None,
            text_edit: TextEditOverlay::new(),
            arrows: ArrowTransformer::new(),
            gesture_base: None,
            live_states: Vec::new(),
        }
    }

    fn store_writer(&self) -> StoreWriter {
        StoreWriter::new(self.store.clone(), self.spawner.clone())
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn cache(&self) -> &PersistenceCache {
        &self.cache
    }

    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    pub fn active_slide(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Live tree of the open slide.
    pub fn tree(&self) -> Option<&SceneTree> {
        self.cache.get(self.active.as_deref()?)
    }

    pub fn selection(&self) -> &[ShapeId] {
        self.selection.selected()
    }

    pub fn marquee_mode(&self) -> MarqueeMode {
        self.marquee_mode
    }

    pub fn transform(&self) -> &TransformEngine {
        &self.transform
    }

    pub fn text_edit(&self) -> &TextEditOverlay {
        &self.text_edit
    }

    pub fn arrow_transformer(&self) -> &ArrowTransformer {
        &self.arrows
    }

    /// Transformer handles to draw, in stage coordinates.
    pub fn handles(&self) -> Vec<Handle> {
        self.tree()
            .map(|tree| self.transform.handles(tree))
            .unwrap_or_default()
    }

    pub fn active_guides(&self) -> &[Guide] {
        self.snapping.active_guides()
    }

    /// Full-span snapping guide lines to draw.
    pub fn guide_lines(&self) -> Vec<kurbo::Line> {
        self.snap_guides
            .as_ref()
            .map(|guides| self.snapping.guide_lines(guides))
            .unwrap_or_default()
    }

    fn tree_from(&self, slide: Slide) -> SceneTree {
        let mut tree = slide
            .konva_data
            .unwrap_or_else(|| self.config.default_stage.empty_tree());
        tree.ensure_unique_ids();
        tree
    }

    /// Edit a copy of the open slide's tree and store it.
    fn edit<R>(&mut self, options: WriteOptions, edit: impl FnOnce(&mut SceneTree) -> R) -> Option<R> {
        let slide_id = self.active.as_deref()?;
        let now = self.clock.now();
        self.cache.update(slide_id, options, now, edit)
    }

    /// Point the transformer and arrow anchors at the current selection.
    fn rebind(&mut self) {
        let Some(tree) = self.active.as_deref().and_then(|id| self.cache.get(id)) else {
            self.transform.unbind();
            self.arrows.clear();
            return;
        };
        self.transform
            .bind(tree, self.selection.selected(), self.text_edit.editing_id());
        self.arrows.bind(tree, self.selection.selected());
    }

    /// Drop stale ids after the tree changed shape, then rebind.
    fn after_structural_change(&mut self) {
        if let Some(tree) = self.active.as_deref().and_then(|id| self.cache.get(id)) {
            self.selection.prune(tree);
            self.text_edit.prune(tree);
        }
        self.rebind();
    }

    // --- slides ---

    /// Load the slide list from the store.
    pub async fn load_deck(&mut self) -> StorageResult<usize> {
        let store = self.store.clone();
        let slides = store.list_slides().await?;
        self.deck = SlideDeck::new(slides);
        if let Some(id) = self.active.as_deref() {
            self.deck.activate(id);
        }
        Ok(self.deck.len())
    }

    /// Open a slide, leaving the current one.
    ///
    /// The previous slide's tree and interaction state are dropped. Its
    /// pending debounced writes stay scheduled and are only flushed here when
    /// `flush_pending_on_slide_switch` is set.
    pub async fn open_slide(&mut self, slide_id: &str) -> StorageResult<()> {
        if self.active.as_deref() == Some(slide_id) {
            return Ok(());
        }
        let store = self.store.clone();
        let slide = store.load_slide(slide_id).await?;
        self.close_slide();
        let tree = self.tree_from(slide);
        self.cache.get_or_insert_with(slide_id, || tree);
        self.cache.set_writer(Box::new(self.store_writer()));
        self.active = Some(slide_id.to_string());
        self.deck.activate(slide_id);
        log::debug!("opened slide {slide_id}");
        Ok(())
    }

    /// Leave the open slide, if any.
    pub fn close_slide(&mut self) {
        let Some(previous) = self.active.take() else {
            return;
        };
        if self.config.flush_pending_on_slide_switch {
            let flushed = self.cache.flush_pending();
            log::debug!("flushed {flushed} pending write(s) leaving slide {previous}");
        }
        self.cache.evict(&previous);
        self.selection.clear();
        self.text_edit.cancel();
        self.transform.unbind();
        self.arrows.clear();
        self.snapping.clear_guides();
        self.snap_guides = None;
        self.gesture_base = None;
        self.live_states.clear();
        self.deck.deactivate();
        log::debug!("left slide {previous}");
    }

    /// Apply a new slide order and persist each moved position.
    pub fn reorder_slides(&mut self, ordered_ids: &[SlideId]) -> SceneResult<usize> {
        let changed = self.deck.reorder(ordered_ids)?;
        for (slide_id, position) in &changed {
            self.cache
                .write_update(slide_id, SlideUpdate::position(*position));
        }
        Ok(changed.len())
    }

    /// Create an empty slide at the end of the show.
    pub async fn create_slide(&mut self) -> StorageResult<SlideId> {
        let data = NewSlide {
            duration: DEFAULT_SLIDE_DURATION,
            position: Some(self.deck.len()),
            konva_data: Some(self.config.default_stage.empty_tree()),
        };
        let store = self.store.clone();
        let slide = store.create_slide(data).await?;
        let id = slide.id.clone();
        self.deck.append(slide);
        log::info!("created slide {id}");
        Ok(id)
    }

    /// Delete a slide and close up the positions after it.
    pub async fn delete_slide(&mut self, slide_id: &str) -> StorageResult<()> {
        let store = self.store.clone();
        store.delete_slide(slide_id).await?;
        if self.active.as_deref() == Some(slide_id) {
            self.close_slide();
        }
        self.cache.evict(slide_id);
        if let Some(renumbered) = self.deck.remove(slide_id) {
            for (id, position) in renumbered {
                self.cache.write_update(&id, SlideUpdate::position(position));
            }
        }
        log::info!("deleted slide {slide_id}");
        Ok(())
    }

    /// Change a slide's duration; the write is debounced.
    pub fn set_duration(&mut self, slide_id: &str, seconds: f64) -> bool {
        let known = self.deck.set_duration(slide_id, seconds);
        let now = self.clock.now();
        self.cache.schedule_duration(slide_id, seconds, now);
        known
    }

    // --- scheduling ---

    /// Fire debounced writes that came due. Returns writes sent.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        self.cache.poll(now)
    }

    /// Fire every pending write; for host shutdown.
    pub fn flush(&mut self) -> usize {
        self.cache.flush_pending()
    }

    // --- shapes ---

    /// Create a shape centered on a stage point and select it.
    pub fn add_shape(&mut self, tag: &str, x: f64, y: f64, options: &ShapeOptions) -> Option<ShapeId> {
        let stage = self.tree()?.stage_rect();
        let shape = ShapeFactory::create(tag, x, y, stage.width(), stage.height(), options)?;
        let id = shape.id().to_string();
        let is_media = shape.kind().is_media();
        self.edit(WriteOptions::commit(), |tree| tree.add_shape(shape))?;
        if let (true, Some(media_id), Some(slide_id)) =
            (is_media, options.media_id.as_deref(), self.active.as_deref())
        {
            self.store_writer().associate_media(slide_id, media_id);
        }
        self.select(std::slice::from_ref(&id), SelectMode::Replace);
        Some(id)
    }

    /// Delete every selected shape in one write. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selection.selected().to_vec();
        let any_present = self
            .tree()
            .is_some_and(|tree| ids.iter().any(|id| tree.contains(id)));
        let removed = if any_present {
            self.edit(WriteOptions::commit(), |tree| tree.remove_shapes(&ids))
                .unwrap_or(0)
        } else {
            0
        };
        self.after_structural_change();
        removed
    }

    pub fn set_background(&mut self, color: &str) -> bool {
        self.edit(WriteOptions::debounced(WriteChannel::Background), |tree| {
            color.clone_into(&mut tree.background_color);
        })
        .is_some()
    }

    /// One-shot fit of an auto-resizing media frame once its natural size is known.
    pub fn media_loaded(&mut self, id: &str, natural: Size) -> bool {
        let Some(tree) = self.tree() else {
            return false;
        };
        let Some(media) = tree.find(id).and_then(|s| s.media()) else {
            return false;
        };
        if !media.auto_resize {
            return false;
        }
        let fitted = fit_within(natural, tree.stage_rect().size());
        let patch = AttrPatch {
            width: Some(fitted.width),
            height: Some(fitted.height),
            auto_resize: Some(false),
            ..AttrPatch::default()
        };
        self.edit(WriteOptions::cache_only(), |tree| tree.apply_patch(id, &patch))
            .unwrap_or(false)
    }

    /// Media was deleted from the library: drop every cached tree and reload the open one.
    pub async fn media_deleted(&mut self) -> StorageResult<()> {
        self.cache.clear();
        let Some(active) = self.active.clone() else {
            return Ok(());
        };
        let store = self.store.clone();
        let slide = store.load_slide(&active).await?;
        let tree = self.tree_from(slide);
        let now = self.clock.now();
        self.cache.put(&active, tree, WriteOptions::cache_only(), now);
        self.after_structural_change();
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        let Some(slide_id) = self.active.as_deref() else {
            return false;
        };
        if !self.cache.undo(slide_id) {
            return false;
        }
        self.after_structural_change();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(slide_id) = self.active.as_deref() else {
            return false;
        };
        if !self.cache.redo(slide_id) {
            return false;
        }
        self.after_structural_change();
        true
    }

    // --- selection ---

    /// Select shapes by id. Ids not in the tree are ignored.
    pub fn select(&mut self, ids: &[ShapeId], mode: SelectMode) -> bool {
        let Some(tree) = self.tree() else {
            return false;
        };
        let ids: Vec<ShapeId> = ids.iter().filter(|id| tree.contains(id)).cloned().collect();
        let changed = self.selection.select(&ids, mode);
        if changed {
            self.rebind();
        }
        changed
    }

    /// Click on a shape body; a held modifier toggles it.
    pub fn click_shape(&mut self, id: &str, modifier: bool) -> bool {
        let mode = if modifier { SelectMode::Toggle } else { SelectMode::Replace };
        self.select(&[id.to_string()], mode)
    }

    pub fn background_click(&mut self, modifier: bool) -> bool {
        let changed = self
            .selection
            .background_click(modifier, self.text_edit.is_active());
        if changed {
            self.rebind();
        }
        changed
    }

    pub fn marquee_select(&mut self, marquee: Rect) -> bool {
        let Some(tree) = self.active.as_deref().and_then(|id| self.cache.get(id)) else {
            return false;
        };
        let changed = self.selection.marquee_select(tree, marquee, self.marquee_mode);
        if changed {
            self.rebind();
        }
        changed
    }

    pub fn toggle_marquee_mode(&mut self) -> MarqueeMode {
        self.marquee_mode = self.marquee_mode.toggled();
        log::debug!("marquee mode {:?}", self.marquee_mode);
        self.marquee_mode
    }

    pub fn select_all(&mut self) -> bool {
        let Some(tree) = self.active.as_deref().and_then(|id| self.cache.get(id)) else {
            return false;
        };
        let changed = self.selection.select_all(tree);
        if changed {
            self.rebind();
        }
        changed
    }

    // --- gestures ---

    fn begin(&mut self, phase: TransformPhase) -> bool {
        if self.transform.phase() != TransformPhase::Idle {
            self.cancel_gesture();
        }
        let Some(tree) = self.active.as_deref().and_then(|id| self.cache.get(id)) else {
            return false;
        };
        let started = match phase {
            TransformPhase::Dragging => self.transform.begin_drag(tree),
            TransformPhase::Transforming => self.transform.begin_transform(tree),
            TransformPhase::Idle => false,
        };
        if !started {
            return false;
        }
        self.snap_guides = match (phase, self.transform.bound_ids()) {
            (TransformPhase::Dragging, [id]) => self.snapping.compute_guides(tree, id),
            _ => None,
        };
        self.gesture_base = Some(tree.clone());
        self.live_states.clear();
        true
    }

    /// Start moving the selected shapes.
    pub fn begin_drag(&mut self) -> bool {
        self.begin(TransformPhase::Dragging)
    }

    /// Start resizing or rotating the selected shapes.
    pub fn begin_transform(&mut self) -> bool {
        self.begin(TransformPhase::Transforming)
    }

    fn continuous(&mut self, states: Vec<(ShapeId, NodeState)>) -> bool {
        let Some(batch) = self.transform.update(&states) else {
            return false;
        };
        self.live_states = states;
        self.edit(WriteOptions::cache_only(), |tree| tree.apply_batch(&batch))
            .is_some()
    }

    /// Drag frame. A single dragged shape snaps to alignment guides.
    pub fn drag_move(&mut self, states: &[(ShapeId, NodeState)]) -> bool {
        let mut states = states.to_vec();
        if let (Some(guides), [(id, state)]) = (&self.snap_guides, states.as_mut_slice()) {
            if self.transform.is_bound(id) {
                let snapped = self
                    .snapping
                    .apply_snap(Point::new(state.x, state.y), guides);
                state.x = snapped.position.x;
                state.y = snapped.position.y;
            }
        }
        self.continuous(states)
    }

    /// Transform frame from raw node states.
    pub fn transform_update(&mut self, states: &[(ShapeId, NodeState)]) -> bool {
        self.continuous(states.to_vec())
    }

    /// Transform frame from a handle dragged to a stage point.
    pub fn transform_handle(&mut self, handle: HandleKind, pointer: Point) -> bool {
        let [id] = self.transform.bound_ids() else {
            return false;
        };
        let (Some(original), Some(base)) = (self.transform.original(id), &self.gesture_base) else {
            return false;
        };
        let Some(parent) = base.parent_transform(id) else {
            return false;
        };
        let Some(state) = drag_handle(original, handle, parent.inverse() * pointer) else {
            return false;
        };
        let id = id.clone();
        self.continuous(vec![(id, state)])
    }

    /// Release: write the gesture's final attributes once.
    ///
    /// Drags persist without a history entry; resize and rotate commit with one.
    pub fn end_gesture(&mut self) -> bool {
        let states = std::mem::take(&mut self.live_states);
        let base = self.gesture_base.take();
        self.snapping.clear_guides();
        self.snap_guides = None;
        let Some((batch, kind)) = self.transform.end(&states) else {
            return false;
        };
        let options = match kind {
            CommitKind::Drag => WriteOptions::persist_only(),
            CommitKind::Transform => {
                // History records the tree from before the first frame.
                if let (Some(base), Some(slide_id)) = (base, self.active.as_deref()) {
                    let now = self.clock.now();
                    self.cache.put(slide_id, base, WriteOptions::cache_only(), now);
                }
                WriteOptions::commit()
            }
        };
        let applied = self
            .edit(options, |tree| tree.apply_batch(&batch))
            .unwrap_or(0);
        log::debug!("{kind:?} committed for {applied} shape(s)");
        self.rebind();
        true
    }

    /// Abort the gesture and restore the tree it started from.
    pub fn cancel_gesture(&mut self) {
        self.transform.cancel();
        self.snapping.clear_guides();
        self.snap_guides = None;
        self.live_states.clear();
        if let (Some(base), Some(slide_id)) = (self.gesture_base.take(), self.active.as_deref()) {
            let now = self.clock.now();
            self.cache.put(slide_id, base, WriteOptions::cache_only(), now);
        }
        self.rebind();
    }

    // --- arrow anchors ---

    /// Drag an arrow endpoint to a stage point. The write is debounced.
    pub fn drag_anchor(&mut self, which: Endpoint, pointer: Point) -> bool {
        let Some(tree) = self.active.as_deref().and_then(|id| self.cache.get(id)) else {
            return false;
        };
        let Some(patch) = self.arrows.drag_to(tree, which, pointer) else {
            return false;
        };
        let Some(id) = self.arrows.target().map(str::to_string) else {
            return false;
        };
        self.edit(WriteOptions::debounced(WriteChannel::ArrowAnchor), |tree| {
            tree.apply_patch(&id, &patch)
        })
        .unwrap_or(false)
    }

    pub fn release_anchor(&mut self) {
        if let Some(tree) = self.active.as_deref().and_then(|id| self.cache.get(id)) {
            self.arrows.release(tree);
        }
    }

    // --- text ---

    /// Open the inline editor on a text shape; its handles hide meanwhile.
    pub fn start_text_edit(&mut self, id: &str) -> bool {
        let Some(tree) = self.active.as_deref().and_then(|id| self.cache.get(id)) else {
            return false;
        };
        if !self.text_edit.start(tree, id) {
            return false;
        }
        if !self.selection.is_selected(id) {
            self.selection.select(&[id.to_string()], SelectMode::Replace);
        }
        self.rebind();
        true
    }

    pub fn text_input(&mut self, typed: &str) {
        self.text_edit.input(typed);
    }

    pub fn text_backspace(&mut self) {
        self.text_edit.backspace();
    }

    pub fn set_text_draft(&mut self, text: &str) {
        self.text_edit.set_draft(text);
    }

    /// Close the editor, committing changed text with a history entry.
    pub fn commit_text_edit(&mut self) -> bool {
        let changed = match self.text_edit.commit() {
            Some((id, text)) => {
                let patch = AttrPatch {
                    text: Some(text),
                    ..AttrPatch::default()
                };
                self.edit(WriteOptions::commit(), |tree| tree.apply_patch(&id, &patch))
                    .unwrap_or(false)
            }
            None => false,
        };
        self.rebind();
        changed
    }

    pub fn cancel_text_edit(&mut self) {
        self.text_edit.cancel();
        self.rebind();
    }

    // --- z-order ---

    /// Apply a new back-to-front order to the active layer.
    pub fn reorder_layer(&mut self, ordered_ids: &[ShapeId]) -> SceneResult<bool> {
        let Some(tree) = self.tree() else {
            return Ok(false);
        };
        let mut next = tree.clone();
        if LayerOrderManager::reorder(&mut next, ordered_ids)?.is_empty() {
            return Ok(false);
        }
        let Some(slide_id) = self.active.as_deref() else {
            return Ok(false);
        };
        let now = self.clock.now();
        self.cache.put(slide_id, next, WriteOptions::commit(), now);
        Ok(true)
    }

    fn restack(&mut self, order_of: Restack) -> bool {
        let Some(tree) = self.tree() else {
            return false;
        };
        if self.selection.is_empty() {
            return false;
        }
        let order = order_of(tree, self.selection.selected());
        match self.reorder_layer(&order) {
            Ok(changed) => changed,
            Err(e) => {
                log::warn!("restack failed: {e}");
                false
            }
        }
    }

    pub fn bring_to_front(&mut self) -> bool {
        self.restack(LayerOrderManager::bring_to_front)
    }

    pub fn send_to_back(&mut self) -> bool {
        self.restack(LayerOrderManager::send_to_back)
    }

    pub fn bring_forward(&mut self) -> bool {
        self.restack(LayerOrderManager::bring_forward)
    }

    pub fn send_backward(&mut self) -> bool {
        self.restack(LayerOrderManager::send_backward)
    }
}
