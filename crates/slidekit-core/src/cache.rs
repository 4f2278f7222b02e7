//! Persistence cache: the single owner of every slide's live scene tree.
//!
//! All mutations go through [`PersistenceCache::put`] or
//! [`PersistenceCache::update`]. Each one replaces the slide's tree with a new
//! value, optionally records the replaced tree for undo, and decides whether
//! the remote writer hears about it now, later, or not at all.

use crate::config::DebounceConfig;
use crate::debounce::{Debouncer, Duration, Instant};
use crate::history::History;
use crate::scene::SceneTree;
use crate::storage::{SlideId, SlideUpdate, SlideWriter};
use std::collections::HashMap;

/// Independent debounce streams per slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteChannel {
    /// Background color edits.
    Background,
    /// Slide duration edits.
    Duration,
    /// Arrow endpoint drags.
    ArrowAnchor,
}

impl WriteChannel {
    /// Whether the channel persists the scene tree.
    pub fn carries_scene(self) -> bool {
        !matches!(self, WriteChannel::Duration)
    }
}

/// When a cache write reaches the remote writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    Never,
    Now,
    Debounced(WriteChannel),
}

/// How a tree replacement is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub record_history: bool,
    pub persist: Persist,
}

impl WriteOptions {
    /// Fast cache only: continuous feedback.
    pub fn cache_only() -> Self {
        Self {
            record_history: false,
            persist: Persist::Never,
        }
    }

    /// Undoable edit, written immediately.
    pub fn commit() -> Self {
        Self {
            record_history: true,
            persist: Persist::Now,
        }
    }

    /// Written immediately without an undo entry.
    pub fn persist_only() -> Self {
        Self {
            record_history: false,
            persist: Persist::Now,
        }
    }

    /// Cache now, write after the channel's quiet period.
    pub fn debounced(channel: WriteChannel) -> Self {
        Self {
            record_history: false,
            persist: Persist::Debounced(channel),
        }
    }
}

#[derive(Debug, Clone)]
enum PendingWrite {
    /// Scene snapshot, used when the slide has left the cache by the time it fires.
    Scene(SceneTree),
    Duration(f64),
}

#[derive(Debug)]
struct CacheEntry {
    tree: SceneTree,
    history: History,
}

/// Per-slide scene cache with history and write scheduling.
pub struct PersistenceCache {
    entries: HashMap<SlideId, CacheEntry>,
    writer: Option<Box<dyn SlideWriter>>,
    pending: Debouncer<(SlideId, WriteChannel), PendingWrite>,
    delays: DebounceConfig,
    history_limit: usize,
}

impl PersistenceCache {
    pub fn new(history_limit: usize, delays: DebounceConfig) -> Self {
        Self {
            entries: HashMap::new(),
            writer: None,
            pending: Debouncer::new(),
            delays,
            history_limit,
        }
    }

    /// Register the remote writer for the active slide context.
    pub fn set_writer(&mut self, writer: Box<dyn SlideWriter>) {
        self.writer = Some(writer);
    }

    pub fn clear_writer(&mut self) {
        self.writer = None;
    }

    pub fn has_writer(&self) -> bool {
        self.writer.is_some()
    }

    pub fn get(&self, slide_id: &str) -> Option<&SceneTree> {
        self.entries.get(slide_id).map(|e| &e.tree)
    }

    pub fn contains(&self, slide_id: &str) -> bool {
        self.entries.contains_key(slide_id)
    }

    /// Cached tree, building it on a miss.
    pub fn get_or_insert_with(
        &mut self,
        slide_id: &str,
        build: impl FnOnce() -> SceneTree,
    ) -> &SceneTree {
        let limit = self.history_limit;
        &self
            .entries
            .entry(slide_id.to_string())
            .or_insert_with(|| CacheEntry {
                tree: build(),
                history: History::new(limit),
            })
            .tree
    }

    fn delay(&self, channel: WriteChannel) -> Duration {
        match channel {
            WriteChannel::Background => self.delays.background(),
            WriteChannel::Duration => self.delays.duration(),
            WriteChannel::ArrowAnchor => self.delays.anchor(),
        }
    }

    /// Replace a slide's tree.
    pub fn put(&mut self, slide_id: &str, tree: SceneTree, options: WriteOptions, now: Instant) {
        let limit = self.history_limit;
        match self.entries.get_mut(slide_id) {
            Some(entry) => {
                let previous = std::mem::replace(&mut entry.tree, tree);
                if options.record_history {
                    entry.history.push(previous);
                }
            }
            None => {
                self.entries.insert(
                    slide_id.to_string(),
                    CacheEntry {
                        tree,
                        history: History::new(limit),
                    },
                );
            }
        }

        match options.persist {
            Persist::Never => {}
            Persist::Now => self.write_scene_now(slide_id),
            Persist::Debounced(channel) => {
                if let Some(entry) = self.entries.get(slide_id) {
                    let snapshot = PendingWrite::Scene(entry.tree.clone());
                    let delay = self.delay(channel);
                    self.pending
                        .schedule((slide_id.to_string(), channel), snapshot, now, delay);
                    log::trace!("scheduled {channel:?} write for slide {slide_id}");
                }
            }
        }
    }

    /// Copy the slide's tree, edit the copy, then store it with `put`.
    ///
    /// Returns `None` when the slide is not cached.
    pub fn update<R>(
        &mut self,
        slide_id: &str,
        options: WriteOptions,
        now: Instant,
        edit: impl FnOnce(&mut SceneTree) -> R,
    ) -> Option<R> {
        let mut tree = self.get(slide_id)?.clone();
        let result = edit(&mut tree);
        self.put(slide_id, tree, options, now);
        Some(result)
    }

    /// Schedule a debounced duration write.
    pub fn schedule_duration(&mut self, slide_id: &str, seconds: f64, now: Instant) {
        let delay = self.delay(WriteChannel::Duration);
        self.pending.schedule(
            (slide_id.to_string(), WriteChannel::Duration),
            PendingWrite::Duration(seconds),
            now,
            delay,
        );
    }

    /// Whether any write for the slide is waiting on a debounce.
    pub fn has_pending(&self, slide_id: &str) -> bool {
        [
            WriteChannel::Background,
            WriteChannel::Duration,
            WriteChannel::ArrowAnchor,
        ]
        .into_iter()
        .any(|c| self.pending.is_pending(&(slide_id.to_string(), c)))
    }

    fn send(&self, slide_id: &str, update: SlideUpdate) -> bool {
        match &self.writer {
            Some(writer) => {
                writer.write(slide_id, update);
                true
            }
            None => {
                log::warn!("no writer registered, dropping write for slide {slide_id}");
                false
            }
        }
    }

    /// Send a non-scene update (position, duration) through the writer now.
    pub fn write_update(&self, slide_id: &str, update: SlideUpdate) -> bool {
        self.send(slide_id, update)
    }

    fn write_scene_now(&mut self, slide_id: &str) {
        // The immediate write carries the latest tree, superseding pending scene writes.
        let superseded = self
            .pending
            .take_where(|(id, channel)| id == slide_id && channel.carries_scene());
        if !superseded.is_empty() {
            log::trace!("{} pending scene write(s) superseded", superseded.len());
        }
        if let Some(entry) = self.entries.get(slide_id) {
            self.send(slide_id, SlideUpdate::scene(entry.tree.clone()));
        }
    }

    fn fire(&mut self, writes: Vec<((SlideId, WriteChannel), PendingWrite)>) -> usize {
        let mut scene_written: Vec<SlideId> = Vec::new();
        let mut sent = 0;
        for ((slide_id, channel), write) in writes {
            let update = match write {
                PendingWrite::Duration(seconds) => SlideUpdate::duration(seconds),
                PendingWrite::Scene(snapshot) => {
                    // Two scene channels coming due together need one write.
                    if scene_written.contains(&slide_id) {
                        continue;
                    }
                    scene_written.push(slide_id.clone());
                    let tree = self
                        .entries
                        .get(&slide_id)
                        .map(|e| e.tree.clone())
                        .unwrap_or(snapshot);
                    SlideUpdate::scene(tree)
                }
            };
            log::debug!("debounced {channel:?} write for slide {slide_id}");
            if self.send(&slide_id, update) {
                sent += 1;
            }
        }
        sent
    }

    /// Fire debounced writes whose quiet period has elapsed. Returns writes sent.
    pub fn poll(&mut self, now: Instant) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let due = self.pending.take_due(now);
        self.fire(due)
    }

    /// Fire every pending debounced write immediately.
    pub fn flush_pending(&mut self) -> usize {
        let all = self.pending.take_all();
        self.fire(all)
    }

    /// Restore the slide's previous tree and persist it.
    pub fn undo(&mut self, slide_id: &str) -> bool {
        let Some(entry) = self.entries.get_mut(slide_id) else {
            return false;
        };
        let Some(previous) = entry.history.undo(entry.tree.clone()) else {
            return false;
        };
        entry.tree = previous;
        self.write_scene_now(slide_id);
        true
    }

    /// Re-apply the slide's last undone tree and persist it.
    pub fn redo(&mut self, slide_id: &str) -> bool {
        let Some(entry) = self.entries.get_mut(slide_id) else {
            return false;
        };
        let Some(next) = entry.history.redo(entry.tree.clone()) else {
            return false;
        };
        entry.tree = next;
        self.write_scene_now(slide_id);
        true
    }

    pub fn can_undo(&self, slide_id: &str) -> bool {
        self.entries
            .get(slide_id)
            .is_some_and(|e| e.history.can_undo())
    }

    pub fn can_redo(&self, slide_id: &str) -> bool {
        self.entries
            .get(slide_id)
            .is_some_and(|e| e.history.can_redo())
    }

    /// Drop one slide's tree and history. Pending writes are kept.
    pub fn evict(&mut self, slide_id: &str) {
        if self.entries.remove(slide_id).is_some() {
            log::debug!("evicted slide {slide_id} from cache");
        }
    }

    /// Drop every cached tree. Pending writes are kept.
    pub fn clear(&mut self) {
        log::debug!("clearing {} cached slide(s)", self.entries.len());
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::{Clock, ManualClock};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<(String, SlideUpdate)>>>;

    struct RecordingWriter(Log);

    impl SlideWriter for RecordingWriter {
        fn write(&self, slide_id: &str, update: SlideUpdate) {
            self.0.borrow_mut().push((slide_id.to_string(), update));
        }
    }

    fn cache_with_writer() -> (PersistenceCache, Log, ManualClock) {
        let log: Log = Rc::default();
        let mut cache = PersistenceCache::new(50, DebounceConfig::default());
        cache.set_writer(Box::new(RecordingWriter(log.clone())));
        (cache, log, ManualClock::new())
    }

    fn tree(bg: &str) -> SceneTree {
        SceneTree::new(100.0, 100.0, bg)
    }

    #[test]
    fn test_cache_only_does_not_write() {
        let (mut cache, log, clock) = cache_with_writer();
        cache.put("s", tree("#000"), WriteOptions::cache_only(), clock.now());
        assert_eq!(cache.get("s").unwrap().background_color, "#000");
        assert!(log.borrow().is_empty());
        assert!(!cache.can_undo("s"));
    }

    #[test]
    fn test_commit_records_and_writes() {
        let (mut cache, log, clock) = cache_with_writer();
        cache.put("s", tree("#000"), WriteOptions::cache_only(), clock.now());
        cache.put("s", tree("#111"), WriteOptions::commit(), clock.now());
        assert_eq!(log.borrow().len(), 1);
        assert!(cache.can_undo("s"));
        assert!(cache.undo("s"));
        assert_eq!(cache.get("s").unwrap().background_color, "#000");
        assert_eq!(log.borrow().len(), 2);
        assert!(cache.redo("s"));
        assert_eq!(cache.get("s").unwrap().background_color, "#111");
    }

    #[test]
    fn test_rapid_background_changes_write_once() {
        let (mut cache, log, clock) = cache_with_writer();
        cache.put("s", tree("#fff"), WriteOptions::cache_only(), clock.now());
        for color in ["#100", "#200", "#300", "#400", "#500"] {
            cache.update("s", WriteOptions::debounced(WriteChannel::Background), clock.now(), |t| {
                t.background_color = color.to_string();
            });
            clock.advance_ms(200);
            assert_eq!(cache.poll(clock.now()), 0);
        }
        clock.advance_ms(200);
        assert_eq!(cache.poll(clock.now()), 1);
        let log = log.borrow();
        assert_eq!(log.len(), 1);
        let written = log[0].1.konva_data.as_ref().unwrap();
        assert_eq!(written.background_color, "#500");
    }

    #[test]
    fn test_immediate_write_supersedes_pending_scene() {
        let (mut cache, log, clock) = cache_with_writer();
        cache.put("s", tree("#fff"), WriteOptions::debounced(WriteChannel::Background), clock.now());
        cache.schedule_duration("s", 9.0, clock.now());
        cache.put("s", tree("#000"), WriteOptions::commit(), clock.now());
        assert_eq!(log.borrow().len(), 1);
        assert!(cache.has_pending("s"));
        clock.advance_ms(1000);
        cache.poll(clock.now());
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].1.duration, Some(9.0));
        assert!(log[1].1.konva_data.is_none());
    }

    #[test]
    fn test_pending_write_survives_eviction() {
        let (mut cache, log, clock) = cache_with_writer();
        cache.put("s", tree("#abc"), WriteOptions::debounced(WriteChannel::Background), clock.now());
        cache.evict("s");
        assert!(cache.get("s").is_none());
        assert_eq!(cache.flush_pending(), 1);
        let log = log.borrow();
        assert_eq!(log[0].1.konva_data.as_ref().unwrap().background_color, "#abc");
    }

    #[test]
    fn test_write_without_writer_is_dropped() {
        let mut cache = PersistenceCache::new(50, DebounceConfig::default());
        let clock = ManualClock::new();
        cache.put("s", tree("#abc"), WriteOptions::debounced(WriteChannel::Background), clock.now());
        clock.advance_ms(1000);
        assert_eq!(cache.poll(clock.now()), 0);
        assert!(!cache.has_pending("s"));
    }

    #[test]
    fn test_update_on_missing_slide() {
        let (mut cache, _, clock) = cache_with_writer();
        assert!(cache.update("nope", WriteOptions::commit(), clock.now(), |_| ()).is_none());
    }

    #[test]
    fn test_get_or_insert_builds_once() {
        let (mut cache, _, _) = cache_with_writer();
        cache.get_or_insert_with("s", || tree("#111"));
        let t = cache.get_or_insert_with("s", || tree("#222"));
        assert_eq!(t.background_color, "#111");
        cache.clear();
        assert!(!cache.contains("s"));
    }
}
