//! Tick contexts: the column of simultaneous tickables across voices.
//!
//! Each context owns the [`ModifierContext`] for its members, so modifiers of
//! notes struck together share one lateral budget. The formatter assigns `x`;
//! everything else is derived in [`TickContext::pre_format`].

use serde::{Deserialize, Serialize};

use crate::config::LayoutOptions;
use crate::element::{Drawable, Element, ElementKind};
use crate::error::{Result, StateError};
use crate::modifier_context::{ModifierContext, ModifierEntry, NoteHost};

/// One tickable placed in this context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickMember {
    /// Position of the voice in the formatted set
    pub voice: usize,
    /// Index of the tickable within its voice
    pub index: usize,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TickMetrics {
    /// Widest member
    pub notes_width: f64,
    pub left_shift: f64,
    pub right_shift: f64,
    pub modifier_width: f64,
    /// Minimum width: notes plus modifiers
    pub width: f64,
}

#[derive(Debug, Clone)]
pub struct TickContext {
    tick: u64,
    slot: u32,
    members: Vec<TickMember>,
    modifiers: ModifierContext,
    x: f64,
    justified_width: f64,
    metrics: Option<TickMetrics>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl TickContext {
    pub fn new(tick: u64, slot: u32, options: LayoutOptions, debug: bool) -> Self {
        Self {
            tick,
            slot,
            members: Vec::new(),
            modifiers: ModifierContext::new(options, debug),
            x: 0.0,
            justified_width: 0.0,
            metrics: None,
            prev: None,
            next: None,
        }
    }

    /// Register `element` (tickable `index` of voice `voice`) and its
    /// modifiers. Cached metrics are dropped.
    pub fn add_element(&mut self, voice: usize, index: usize, element: &Element) {
        let member = self.members.len();
        self.members.push(TickMember { voice, index, width: element.width() });

        let lines = element.key_lines();
        if let ElementKind::Note(_) = element.kind() {
            self.modifiers.add_host(NoteHost {
                member,
                voice,
                lines: lines.clone(),
                head_width: element.head_width(),
                stem: element.stem_direction(),
            });
        }
        let scale = element.scale();
        for (slot, modifier) in element.modifiers().iter().enumerate() {
            self.modifiers.add_modifier(ModifierEntry {
                member,
                slot,
                modifier: modifier.clone(),
                width: modifier.width(scale),
                line: lines.get(modifier.index).copied().unwrap_or(0.0),
            });
        }
        self.metrics = None;
    }

    pub fn pre_format(&mut self) {
        if self.metrics.is_some() {
            return;
        }
        self.modifiers.pre_format();
        self.modifiers.post_format();

        let state = self.modifiers.state();
        let notes_width = self.members.iter().map(|m| m.width).fold(0.0, f64::max);
        let modifier_width = self.modifiers.width();
        self.metrics = Some(TickMetrics {
            notes_width,
            left_shift: state.left_shift,
            right_shift: state.right_shift,
            modifier_width,
            width: notes_width + modifier_width,
        });
    }

    pub fn metrics(&self) -> Result<TickMetrics> {
        self.metrics.ok_or_else(|| StateError::UnformattedTick.into())
    }

    /// Minimum width, zero before pre-formatting.
    pub fn width(&self) -> f64 {
        self.metrics.map_or(0.0, |m| m.width)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Ordering slot among contexts at the same tick. Zero-tick elements take
    /// leading slots; timed elements share the last.
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn members(&self) -> &[TickMember] {
        &self.members
    }

    pub fn modifier_context(&self) -> &ModifierContext {
        &self.modifiers
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub(crate) fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    /// Width after justification.
    pub fn justified_width(&self) -> f64 {
        self.justified_width
    }

    pub(crate) fn set_justified_width(&mut self, width: f64) {
        self.justified_width = width;
    }

    pub fn prev(&self) -> Option<usize> {
        self.prev
    }

    pub fn next(&self) -> Option<usize> {
        self.next
    }

    pub(crate) fn link(&mut self, prev: Option<usize>, next: Option<usize>) {
        self.prev = prev;
        self.next = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;
    use pretty_assertions::assert_eq;

    fn note(keys: &[&str]) -> Element {
        let mut e = Element::note(keys, "q").unwrap();
        e.pre_format().unwrap();
        e
    }

    #[test]
    fn metrics_need_pre_format() {
        let mut tc = TickContext::new(0, u32::MAX, LayoutOptions::default(), false);
        tc.add_element(0, 0, &note(&["c/4"]));
        assert_eq!(tc.metrics().unwrap_err(), StateError::UnformattedTick.into());
        tc.pre_format();
        let m = tc.metrics().unwrap();
        assert_eq!(m.notes_width, 11.8);
        assert_eq!(m.width, 11.8);
    }

    #[test]
    fn width_includes_modifiers_of_every_member() {
        let mut a = note(&["c/4"]);
        a.add_modifier(Modifier::accidental("#", 0).unwrap()).unwrap();
        let mut b = note(&["e/5"]);
        b.add_modifier(Modifier::dot(0)).unwrap();

        let mut tc = TickContext::new(0, u32::MAX, LayoutOptions::default(), false);
        tc.add_element(0, 0, &a);
        tc.add_element(1, 0, &b);
        tc.pre_format();
        let m = tc.metrics().unwrap();
        assert_eq!(m.left_shift, 9.0);
        assert!((m.width - (11.8 + 9.0 + m.right_shift)).abs() < 1e-9);
        assert_eq!(tc.members().iter().map(|m| m.voice).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn adding_drops_cached_metrics() {
        let mut tc = TickContext::new(0, u32::MAX, LayoutOptions::default(), false);
        tc.add_element(0, 0, &note(&["c/4"]));
        tc.pre_format();
        let mut wide = note(&["a/4"]);
        wide.add_modifier(Modifier::fingering("12", 0)).unwrap();
        tc.add_element(1, 0, &wide);
        assert!(tc.metrics().is_err());
        tc.pre_format();
        assert!(tc.width() > 11.8);
    }
}
