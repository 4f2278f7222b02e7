//! Slide list ordering and the active slide pointer.

use crate::layers::changed_positions;
use crate::scene::SceneResult;
use crate::storage::{Slide, SlideId};

/// Ordered slides of a show plus which one is open.
///
/// Only slide metadata is kept; scene trees live in the persistence cache.
/// The active slide is tracked by index but always follows the same logical
/// slide through reorders and deletions.
#[derive(Debug, Clone, Default)]
pub struct SlideDeck {
    slides: Vec<Slide>,
    active: Option<usize>,
}

impl SlideDeck {
    /// Build from slides in any order; they are sorted by position and renumbered.
    pub fn new(mut slides: Vec<Slide>) -> Self {
        slides.sort_by_key(|s| s.position);
        for (i, slide) in slides.iter_mut().enumerate() {
            slide.position = i;
            slide.konva_data = None;
        }
        Self {
            slides,
            active: None,
        }
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn ids(&self) -> Vec<SlideId> {
        self.slides.iter().map(|s| s.id.clone()).collect()
    }

    pub fn get(&self, slide_id: &str) -> Option<&Slide> {
        self.slides.iter().find(|s| s.id == slide_id)
    }

    pub fn get_mut(&mut self, slide_id: &str) -> Option<&mut Slide> {
        self.slides.iter_mut().find(|s| s.id == slide_id)
    }

    pub fn index_of(&self, slide_id: &str) -> Option<usize> {
        self.slides.iter().position(|s| s.id == slide_id)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active
            .and_then(|i| self.slides.get(i))
            .map(|s| s.id.as_str())
    }

    /// Make a slide active. Returns false for an unknown id.
    pub fn activate(&mut self, slide_id: &str) -> bool {
        match self.index_of(slide_id) {
            Some(i) => {
                self.active = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    /// Apply a new order. Returns `(id, position)` for each slide that moved.
    pub fn reorder(&mut self, ordered_ids: &[SlideId]) -> SceneResult<Vec<(SlideId, usize)>> {
        let active_id = self.active_id().map(str::to_string);
        let changed = changed_positions(&self.ids(), ordered_ids)?;
        let mut old = std::mem::take(&mut self.slides);
        for (position, id) in ordered_ids.iter().enumerate() {
            if let Some(i) = old.iter().position(|s| &s.id == id) {
                let mut slide = old.swap_remove(i);
                slide.position = position;
                self.slides.push(slide);
            }
        }
        self.active = active_id.and_then(|id| self.index_of(&id));
        Ok(changed)
    }

    /// Append a slide created by the store.
    pub fn append(&mut self, mut slide: Slide) -> usize {
        slide.position = self.slides.len();
        slide.konva_data = None;
        self.slides.push(slide);
        self.slides.len() - 1
    }

    /// Remove a slide. Returns the renumbered `(id, position)` of the slides after it.
    pub fn remove(&mut self, slide_id: &str) -> Option<Vec<(SlideId, usize)>> {
        let index = self.index_of(slide_id)?;
        let active_id = self.active_id().map(str::to_string);
        self.slides.remove(index);
        let renumbered = self.slides[index..]
            .iter_mut()
            .enumerate()
            .map(|(offset, slide)| {
                slide.position = index + offset;
                (slide.id.clone(), slide.position)
            })
            .collect();
        self.active = active_id.and_then(|id| self.index_of(&id));
        Some(renumbered)
    }

    pub fn set_duration(&mut self, slide_id: &str, seconds: f64) -> bool {
        match self.get_mut(slide_id) {
            Some(slide) => {
                slide.duration = seconds;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(id: &str, position: usize) -> Slide {
        Slide {
            id: id.to_string(),
            position,
            duration: 10.0,
            konva_data: None,
            media_ids: Vec::new(),
        }
    }

    fn deck() -> SlideDeck {
        SlideDeck::new(vec![slide("C", 2), slide("A", 0), slide("B", 1)])
    }

    fn ids(list: &[&str]) -> Vec<SlideId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_active_follows_reordered_slide() {
        let mut deck = deck();
        deck.activate("B");
        assert_eq!(deck.active_index(), Some(1));
        let changed = deck.reorder(&ids(&["B", "A", "C"])).unwrap();
        assert_eq!(deck.ids(), ids(&["B", "A", "C"]));
        assert_eq!(deck.active_index(), Some(0));
        assert_eq!(deck.active_id(), Some("B"));
        assert_eq!(changed, vec![("B".to_string(), 0), ("A".to_string(), 1)]);
        assert_eq!(deck.get("A").unwrap().position, 1);
    }

    #[test]
    fn test_invalid_reorder_leaves_deck() {
        let mut deck = deck();
        assert!(deck.reorder(&ids(&["A", "B"])).is_err());
        assert_eq!(deck.ids(), ids(&["A", "B", "C"]));
    }

    #[test]
    fn test_remove_renumbers_and_tracks_active() {
        let mut deck = deck();
        deck.activate("C");
        let renumbered = deck.remove("A").unwrap();
        assert_eq!(renumbered, vec![("B".to_string(), 0), ("C".to_string(), 1)]);
        assert_eq!(deck.active_index(), Some(1));
        deck.remove("C");
        assert_eq!(deck.active_index(), None);
        assert!(deck.remove("zzz").is_none());
    }

    #[test]
    fn test_append_positions_at_end() {
        let mut deck = deck();
        let index = deck.append(slide("D", 99));
        assert_eq!(index, 3);
        assert_eq!(deck.get("D").unwrap().position, 3);
    }
}
