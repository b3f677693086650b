//! Lateral space allocation for the modifiers sharing one tick.
//!
//! Categories are formatted in a fixed order, each seeing the shifts
//! accumulated by the ones before it: fingerings claim room next to the
//! head before accidentals are packed outside them, dots go right of any
//! displaced heads, and so on. The order lives in [`PRE_FORMAT`]; changing it
//! changes the layout.

use std::collections::BTreeMap;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::LayoutOptions;
use crate::error::{Result, StateError};
use crate::model::StemDirection;
use crate::modifier::{Modifier, ModifierCategory, ModifierKind, ModifierPosition};

/// Shift accumulators written by the category routines.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModifierState {
    pub left_shift: f64,
    pub right_shift: f64,
    /// Next free text line below the stave
    pub text_line: f64,
    /// Next free text line above the stave
    pub top_text_line: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifierMetrics {
    pub state: ModifierState,
    pub width: f64,
}

/// A note head taking part in head-on-head spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteHost {
    /// Member index in the owning tick context
    pub member: usize,
    pub voice: usize,
    pub lines: Vec<f64>,
    pub head_width: f64,
    pub stem: Option<StemDirection>,
}

/// One modifier registered with the context. `modifier` is a working copy;
/// the formatter writes its placement back to `member`'s modifier `slot`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierEntry {
    pub member: usize,
    pub slot: usize,
    pub modifier: Modifier,
    pub width: f64,
    /// Note line of the key the modifier is attached to
    pub line: f64,
}

type Spacing = fn(&mut ModifierContext);

/// Category formatting order.
pub(crate) const PRE_FORMAT: [(ModifierCategory, Spacing); 13] = [
    (ModifierCategory::NoteHead, format_note_heads),
    (ModifierCategory::Dot, format_dots),
    (ModifierCategory::Fingering, format_side_column),
    (ModifierCategory::Accidental, format_accidentals),
    (ModifierCategory::Stroke, format_side_column),
    (ModifierCategory::GraceNoteGroup, format_side_column),
    (ModifierCategory::NoteSubGroup, format_side_column),
    (ModifierCategory::StringNumber, format_side_column),
    (ModifierCategory::Articulation, format_stacked),
    (ModifierCategory::Ornament, format_stacked),
    (ModifierCategory::Annotation, format_stacked),
    (ModifierCategory::Bend, format_bends),
    (ModifierCategory::Vibrato, format_vibratos),
];

/// Categories that need the final widths.
pub(crate) const POST_FORMAT: [(ModifierCategory, Spacing); 1] =
    [(ModifierCategory::NoteHead, post_format_note_heads)];

/// Accidentals closer than this many lines need separate columns.
const ACCIDENTAL_CLEARANCE: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct ModifierContext {
    options: LayoutOptions,
    debug: bool,
    hosts: Vec<NoteHost>,
    /// Rightward displacement per host, parallel to `hosts`
    host_shifts: Vec<f64>,
    entries: BTreeMap<ModifierCategory, Vec<ModifierEntry>>,
    state: ModifierState,
    /// Category currently being formatted by a shared routine
    current: ModifierCategory,
    pre_formatted: bool,
    post_formatted: bool,
}

impl Default for ModifierContext {
    fn default() -> Self {
        Self::new(LayoutOptions::default(), false)
    }
}

impl ModifierContext {
    pub fn new(options: LayoutOptions, debug: bool) -> Self {
        Self {
            options,
            debug,
            hosts: Vec::new(),
            host_shifts: Vec::new(),
            entries: BTreeMap::new(),
            state: ModifierState::default(),
            current: ModifierCategory::NoteHead,
            pre_formatted: false,
            post_formatted: false,
        }
    }

    pub fn add_host(&mut self, host: NoteHost) {
        self.hosts.push(host);
        self.host_shifts.push(0.0);
        self.invalidate();
    }

    pub fn add_modifier(&mut self, entry: ModifierEntry) {
        self.entries.entry(entry.modifier.category()).or_default().push(entry);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.pre_formatted = false;
        self.post_formatted = false;
    }

    pub fn is_pre_formatted(&self) -> bool {
        self.pre_formatted
    }

    pub fn pre_format(&mut self) {
        if self.pre_formatted {
            return;
        }
        self.state = ModifierState::default();
        self.host_shifts.iter_mut().for_each(|s| *s = 0.0);

        for (category, spacing) in PRE_FORMAT {
            self.current = category;
            spacing(self);
            if self.debug {
                trace!("modifier context: {:?} -> {:?}", category, self.state);
            }
        }
        self.pre_formatted = true;
    }

    pub fn post_format(&mut self) {
        if self.post_formatted {
            return;
        }
        for (category, spacing) in POST_FORMAT {
            self.current = category;
            spacing(self);
        }
        self.post_formatted = true;
    }

    pub fn state(&self) -> ModifierState {
        self.state
    }

    pub fn width(&self) -> f64 {
        self.state.left_shift + self.state.right_shift + self.options.modifier_context_spacing
    }

    pub fn metrics(&self) -> Result<ModifierMetrics> {
        if !self.pre_formatted {
            return Err(StateError::UnformattedModifier.into());
        }
        Ok(ModifierMetrics { state: self.state, width: self.width() })
    }

    /// Rightward displacement of the host registered for `member`.
    pub fn host_shift(&self, member: usize) -> f64 {
        self.hosts
            .iter()
            .zip(&self.host_shifts)
            .find(|(h, _)| h.member == member)
            .map_or(0.0, |(_, s)| *s)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ModifierEntry> {
        self.entries.values().flatten()
    }

    pub fn category_entries(&self, category: ModifierCategory) -> &[ModifierEntry] {
        self.entries.get(&category).map(Vec::as_slice).unwrap_or_default()
    }

    fn current_entries(&mut self) -> &mut [ModifierEntry] {
        self.entries.get_mut(&self.current).map(Vec::as_mut_slice).unwrap_or_default()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Category routines
// ═══════════════════════════════════════════════════════════════════════

/// Heads from different voices within a line of each other collide; the
/// later voice moves right by a head width.
fn format_note_heads(mc: &mut ModifierContext) {
    let mut widest = 0.0_f64;
    for i in 0..mc.hosts.len() {
        let collides = mc.hosts[..i].iter().any(|earlier| {
            earlier.voice != mc.hosts[i].voice
                && earlier
                    .lines
                    .iter()
                    .any(|a| mc.hosts[i].lines.iter().any(|b| (a - b).abs() < 1.0))
        });
        if collides {
            let shift = mc.hosts[..i].iter().map(|h| h.head_width).fold(0.0, f64::max);
            mc.host_shifts[i] = shift;
            widest = widest.max(shift);
        }
    }
    mc.state.right_shift += widest;
}

/// Right-side modifiers of displaced heads already sit past the displaced
/// head; pull them back so they line up with the others.
fn post_format_note_heads(mc: &mut ModifierContext) {
    let displaced: Vec<(usize, f64)> = mc
        .hosts
        .iter()
        .zip(&mc.host_shifts)
        .filter(|(_, s)| **s > 0.0)
        .map(|(h, s)| (h.member, *s))
        .collect();
    if displaced.is_empty() {
        return;
    }
    for entries in mc.entries.values_mut() {
        for entry in entries.iter_mut() {
            if entry.modifier.position != ModifierPosition::Right {
                continue;
            }
            if let Some((_, shift)) = displaced.iter().find(|(m, _)| *m == entry.member) {
                entry.modifier.x_shift = (entry.modifier.x_shift - shift).max(0.0);
            }
        }
    }
}

/// One column per dot; the n-th dot of a key goes into column n.
fn format_dots(mc: &mut ModifierContext) {
    let spacing = mc.options.modifier_spacing;
    let start = mc.state.right_shift;
    let mut seen: Vec<(usize, usize)> = Vec::new();
    let mut columns = 0usize;
    let mut column_width = 0.0_f64;

    for entry in mc.current_entries() {
        let key = (entry.member, entry.modifier.index);
        let column = seen.iter().filter(|k| **k == key).count();
        seen.push(key);
        entry.modifier.x_shift = start + column as f64 * (entry.width + spacing);
        columns = columns.max(column + 1);
        column_width = column_width.max(entry.width);
    }
    mc.state.right_shift += columns as f64 * (column_width + spacing);
}

/// Single column on either side: fingerings, strokes, grace notes, inline
/// clefs and string numbers.
fn format_side_column(mc: &mut ModifierContext) {
    let spacing = mc.options.modifier_spacing;
    let (left_start, right_start) = (mc.state.left_shift, mc.state.right_shift);
    let (mut left, mut right) = (0.0_f64, 0.0_f64);

    for entry in mc.current_entries() {
        match entry.modifier.position {
            ModifierPosition::Right => {
                entry.modifier.x_shift = right_start;
                right = right.max(entry.width);
            }
            _ => {
                entry.modifier.x_shift = left_start;
                left = left.max(entry.width);
            }
        }
    }
    if left > 0.0 {
        mc.state.left_shift += left + spacing;
    }
    if right > 0.0 {
        mc.state.right_shift += right + spacing;
    }
}

/// Pack accidentals into columns, top to bottom; an accidental joins the
/// first column whose members are all at least three lines away.
fn format_accidentals(mc: &mut ModifierContext) {
    let spacing = mc.options.modifier_spacing;
    let start = mc.state.left_shift;
    let entries = mc.current_entries();
    if entries.is_empty() {
        return;
    }

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| entries[b].line.total_cmp(&entries[a].line));

    let mut columns: Vec<Vec<f64>> = Vec::new();
    let mut widths: Vec<f64> = Vec::new();
    let mut assignment = vec![0usize; entries.len()];
    for &i in &order {
        let line = entries[i].line;
        let column = columns
            .iter()
            .position(|lines| lines.iter().all(|l| (l - line).abs() >= ACCIDENTAL_CLEARANCE))
            .unwrap_or_else(|| {
                columns.push(Vec::new());
                widths.push(0.0);
                columns.len() - 1
            });
        columns[column].push(line);
        widths[column] = widths[column].max(entries[i].width);
        assignment[i] = column;
    }

    for (entry, &column) in entries.iter_mut().zip(&assignment) {
        let inner: f64 = widths[..column].iter().sum::<f64>() + column as f64 * spacing;
        entry.modifier.x_shift = start + inner;
    }
    let total: f64 = widths.iter().sum();
    mc.state.left_shift += total + spacing * widths.len() as f64;
}

/// Articulations, ornaments and annotations stack outward from the stave.
fn format_stacked(mc: &mut ModifierContext) {
    let mut state = mc.state;
    for entry in mc.current_entries() {
        let lines = entry.modifier.text_lines();
        if entry.modifier.position == ModifierPosition::Below {
            entry.modifier.text_line = state.text_line;
            state.text_line += lines;
        } else {
            entry.modifier.text_line = state.top_text_line;
            state.top_text_line += lines;
        }
    }
    mc.state = state;
}

fn format_bends(mc: &mut ModifierContext) {
    let spacing = mc.options.modifier_spacing;
    let mut state = mc.state;
    let mut widest = 0.0_f64;
    let mut any = false;
    for entry in mc.current_entries() {
        entry.modifier.x_shift = state.right_shift;
        entry.modifier.text_line = state.top_text_line;
        widest = widest.max(entry.width);
        any = true;
    }
    if any {
        state.right_shift += widest + spacing;
        state.top_text_line += 1.0;
    }
    mc.state = state;
}

fn format_vibratos(mc: &mut ModifierContext) {
    let mut state = mc.state;
    let mut any = false;
    for entry in mc.current_entries() {
        entry.modifier.text_line = state.top_text_line;
        any = true;
    }
    if any {
        state.top_text_line += 1.0;
    }
    mc.state = state;
}

/// Delayed ornaments sit halfway between their tick and the next one.
pub(crate) fn is_delayed(modifier: &Modifier) -> bool {
    matches!(modifier.kind, ModifierKind::Ornament { delayed: true, .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(member: usize, slot: usize, modifier: Modifier, line: f64) -> ModifierEntry {
        let width = modifier.width(1.0);
        ModifierEntry { member, slot, modifier, width, line }
    }

    fn host(member: usize, voice: usize, lines: Vec<f64>) -> NoteHost {
        NoteHost { member, voice, lines, head_width: 11.8, stem: None }
    }

    #[test]
    fn metrics_require_pre_format() {
        let mut mc = ModifierContext::default();
        assert_eq!(mc.metrics().unwrap_err(), StateError::UnformattedModifier.into());
        mc.pre_format();
        assert_eq!(mc.metrics().unwrap().width, 0.0);
    }

    #[test]
    fn fingering_claims_space_before_accidentals() {
        let mut mc = ModifierContext::default();
        mc.add_modifier(entry(0, 0, Modifier::accidental("#", 0).unwrap(), 1.0));
        mc.add_modifier(entry(1, 0, Modifier::fingering("3", 0), 4.0));
        mc.pre_format();

        let fingering = &mc.category_entries(ModifierCategory::Fingering)[0];
        let accidental = &mc.category_entries(ModifierCategory::Accidental)[0];
        assert_eq!(fingering.modifier.x_shift, 0.0);
        assert_eq!(accidental.modifier.x_shift, 6.0 + 1.0);
        assert!(mc.state().left_shift >= 6.0 + 8.0);
    }

    #[test]
    fn pre_format_is_idempotent_until_a_modifier_arrives() {
        let mut mc = ModifierContext::default();
        mc.add_modifier(entry(0, 0, Modifier::dot(0), 1.0));
        mc.add_modifier(entry(0, 1, Modifier::annotation("pizz.", 0), 1.0));
        mc.pre_format();
        let first = mc.metrics().unwrap();
        mc.pre_format();
        assert_eq!(mc.metrics().unwrap(), first);

        mc.add_modifier(entry(0, 2, Modifier::accidental("b", 0).unwrap(), 1.0));
        assert!(!mc.is_pre_formatted());
        mc.pre_format();
        assert!(mc.metrics().unwrap().width > first.width);
    }

    #[test]
    fn close_accidentals_take_separate_columns() {
        let mut mc = ModifierContext::default();
        mc.add_modifier(entry(0, 0, Modifier::accidental("#", 0).unwrap(), 1.0));
        mc.add_modifier(entry(0, 1, Modifier::accidental("#", 1).unwrap(), 2.0));
        mc.add_modifier(entry(0, 2, Modifier::accidental("#", 2).unwrap(), 4.5));
        mc.pre_format();

        let shifts: Vec<f64> = mc
            .category_entries(ModifierCategory::Accidental)
            .iter()
            .map(|e| e.modifier.x_shift)
            .collect();
        // top (4.5) and bottom (1.0) share the inner column
        assert_eq!(shifts, vec![0.0, 9.0, 0.0]);
        assert_eq!(mc.state().left_shift, 18.0);
    }

    #[test]
    fn colliding_voices_displace_the_later_head() {
        let mut mc = ModifierContext::default();
        mc.add_host(host(0, 0, vec![3.0]));
        mc.add_host(host(1, 1, vec![2.5]));
        mc.add_modifier(entry(1, 0, Modifier::dot(0), 2.5));
        mc.pre_format();
        mc.post_format();

        assert_eq!(mc.host_shift(0), 0.0);
        assert_eq!(mc.host_shift(1), 11.8);
        let dot = &mc.category_entries(ModifierCategory::Dot)[0];
        assert_eq!(dot.modifier.x_shift, 0.0);
        assert!(mc.state().right_shift > 11.8);
    }

    #[test]
    fn stacked_modifiers_take_successive_lines() {
        let mut mc = ModifierContext::default();
        mc.add_modifier(entry(0, 0, Modifier::articulation("a.", 0).unwrap(), 1.0));
        mc.add_modifier(entry(0, 1, Modifier::ornament("tr", 0).unwrap(), 1.0));
        mc.add_modifier(entry(0, 2, Modifier::articulation("a@u", 0).unwrap(), 1.0));
        mc.add_modifier(entry(0, 3, Modifier::vibrato(0), 1.0));
        mc.pre_format();

        let ornament = &mc.category_entries(ModifierCategory::Ornament)[0];
        assert_eq!(ornament.modifier.text_line, 0.5);
        let vibrato = &mc.category_entries(ModifierCategory::Vibrato)[0];
        assert_eq!(vibrato.modifier.text_line, 1.5);
        assert_eq!(mc.state().text_line, 1.5);
    }
}
