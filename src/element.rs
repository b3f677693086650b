//! Drawable elements: notes, rests, signatures, bars and the spanners that
//! connect them.
//!
//! Every element is a tagged [`ElementKind`] plus the shared state the
//! layout and render passes need: a weak reference to its stave, the bound
//! render context, formatted geometry, attached modifiers and the monotonic
//! `rendered` flag.
//!
//! Drawing checks its preconditions in a fixed order: a context must be
//! bound, stave-dependent kinds need a live stave, and tickable kinds must
//! have been positioned by the formatter. `draw` never touches the element's
//! own state; the render pipeline marks it rendered only after a successful
//! draw.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::{Rc, Weak};

use crate::error::{Result, StateError, ValidationError};
use crate::glyphs::Glyph;
use crate::model::{
    BarType, ClefKind, Duration, KeySignature, Pitch, RepeatKind, StemDirection, TimeSignature,
};
use crate::modifier::{accidental_glyph, Modifier, TEXT_CHAR_WIDTH};
use crate::renderer::notes::{self, NoteGeometry};
use crate::renderer::{curves, modifiers, staff, FontSpec, RenderContext, SharedContext};
use crate::stave::{clef_glyph, time_signature_width, Stave, StaveHandle};
use crate::voice::{Voice, VoiceId};

/// Inline clef changes are drawn smaller than the clef at the stave start.
const INLINE_CLEF_SIZE: f64 = 0.7;

// ═══════════════════════════════════════════════════════════════════════
// Capability interface
// ═══════════════════════════════════════════════════════════════════════

/// The operations every drawable shares.
pub trait Drawable {
    /// Compute intrinsic metrics ahead of formatting.
    fn pre_format(&mut self) -> Result<()>;

    /// Emit primitives to the bound render context.
    fn draw(&self, scope: &DrawScope<'_>) -> Result<()>;

    /// Intrinsic width in pixels.
    fn width(&self) -> f64;
}

/// Points at one tickable of a registered voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteAnchor {
    pub voice: VoiceId,
    pub index: usize,
}

impl NoteAnchor {
    pub fn new(voice: VoiceId, index: usize) -> Self {
        Self { voice, index }
    }
}

/// Read-only view of the voices of a drawing session, used by spanners to
/// find the notes they connect.
#[derive(Clone, Copy)]
pub struct DrawScope<'a> {
    voices: &'a [Voice],
}

impl<'a> DrawScope<'a> {
    pub fn new(voices: &'a [Voice]) -> Self {
        Self { voices }
    }

    pub fn empty() -> DrawScope<'static> {
        DrawScope { voices: &[] }
    }

    pub fn voice(&self, id: VoiceId) -> Result<&'a Voice> {
        self.voices.get(id.0).ok_or_else(|| StateError::UnknownVoice(id.0).into())
    }

    pub fn resolve(&self, anchor: NoteAnchor) -> Result<&'a Element> {
        self.voice(anchor.voice)?
            .tickables()
            .get(anchor.index)
            .ok_or_else(|| StateError::UnknownAnchor { voice: anchor.voice.0, index: anchor.index }.into())
    }

    fn geometry(&self, anchor: NoteAnchor) -> Result<NoteGeometry> {
        self.resolve(anchor)?
            .note_geometry()
            .ok_or_else(|| StateError::UnknownAnchor { voice: anchor.voice.0, index: anchor.index }.into())
    }

    fn range_geometry(&self, voice: VoiceId, range: &Range<usize>) -> Result<Vec<(NoteGeometry, usize)>> {
        range
            .clone()
            .map(|index| {
                let anchor = NoteAnchor::new(voice, index);
                let flags = self.resolve(anchor)?.duration().map_or(0, |d| d.flag_count());
                Ok((self.geometry(anchor)?, flags))
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Kinds
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct NoteData {
    pub keys: Vec<Pitch>,
    pub duration: Duration,
    /// Overrides the stave clef when set
    pub clef: Option<ClefKind>,
    pub stem: Option<StemDirection>,
    /// Stem and flags are drawn by a beam instead
    pub beamed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestData {
    pub duration: Duration,
    /// Note line the rest is centred on
    pub line: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabPosition {
    /// String number, 1 is the top line
    pub string: u8,
    pub fret: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabData {
    pub positions: Vec<TabPosition>,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextData {
    pub content: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Note(NoteData),
    Rest(RestData),
    Clef(ClefKind),
    KeySig(KeySignature),
    TimeSig(TimeSignature),
    Bar(BarType),
    Tab(TabData),
    /// Invisible placeholder that only occupies time
    Ghost(Duration),
    Repeat(RepeatKind),
    Text(TextData),
    Tie { from: NoteAnchor, to: NoteAnchor },
    Curve { from: NoteAnchor, to: NoteAnchor },
    Beam { voice: VoiceId, range: Range<usize> },
    Bracket { voice: VoiceId, range: Range<usize>, label: String },
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Note(_) => "note",
            Self::Rest(_) => "rest",
            Self::Clef(_) => "clef",
            Self::KeySig(_) => "key signature",
            Self::TimeSig(_) => "time signature",
            Self::Bar(_) => "bar",
            Self::Tab(_) => "tab",
            Self::Ghost(_) => "ghost",
            Self::Repeat(_) => "repeat",
            Self::Text(_) => "text",
            Self::Tie { .. } => "tie",
            Self::Curve { .. } => "curve",
            Self::Beam { .. } => "beam",
            Self::Bracket { .. } => "bracket",
        }
    }

    pub fn needs_stave(&self) -> bool {
        matches!(
            self,
            Self::Note(_)
                | Self::Rest(_)
                | Self::Clef(_)
                | Self::KeySig(_)
                | Self::TimeSig(_)
                | Self::Bar(_)
                | Self::Tab(_)
                | Self::Repeat(_)
        )
    }

    /// Spanners live in the render queue, everything else can go in a voice.
    pub fn is_spanner(&self) -> bool {
        matches!(self, Self::Tie { .. } | Self::Curve { .. } | Self::Beam { .. } | Self::Bracket { .. })
    }

    pub fn is_tickable(&self) -> bool {
        !self.is_spanner()
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Note(n) => Some(n.duration),
            Self::Rest(r) => Some(r.duration),
            Self::Tab(t) => Some(t.duration),
            Self::Ghost(d) => Some(*d),
            Self::Text(t) => Some(t.duration),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Element
// ═══════════════════════════════════════════════════════════════════════

pub struct Element {
    kind: ElementKind,
    stave: Option<Weak<RefCell<Stave>>>,
    context: Option<SharedContext>,
    rendered: bool,
    formatted: bool,
    x: f64,
    y: f64,
    width: f64,
    modifiers: Vec<Modifier>,
    /// `(num_notes, notes_occupied)`
    tuplet: Option<(u32, u32)>,
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("rendered", &self.rendered)
            .field("formatted", &self.formatted)
            .field("modifiers", &self.modifiers)
            .finish()
    }
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            stave: None,
            context: None,
            rendered: false,
            formatted: false,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            modifiers: Vec::new(),
            tuplet: None,
        }
    }

    /// A note or chord. Dotted durations put one dot per key and dot.
    pub fn note(keys: &[&str], duration: &str) -> Result<Self> {
        if keys.is_empty() {
            return Err(ValidationError::EmptyChord.into());
        }
        let keys = keys.iter().map(|k| Pitch::parse(k)).collect::<Result<Vec<_>>>()?;
        let duration = Duration::parse(duration)?;
        let mut element = Self::new(ElementKind::Note(NoteData {
            keys,
            duration,
            clef: None,
            stem: None,
            beamed: false,
        }));
        element.add_dots(duration);
        Ok(element)
    }

    pub fn rest(duration: &str) -> Result<Self> {
        let duration = Duration::parse(duration)?;
        let line = if duration.value == 1 { 4.0 } else { 3.0 };
        let mut element = Self::new(ElementKind::Rest(RestData { duration, line }));
        element.add_dots(duration);
        Ok(element)
    }

    /// Tablature positions as `(string, fret)` pairs.
    pub fn tab(positions: &[(u8, &str)], duration: &str) -> Result<Self> {
        if positions.is_empty() {
            return Err(ValidationError::EmptyChord.into());
        }
        let positions = positions
            .iter()
            .map(|&(string, fret)| TabPosition { string, fret: fret.to_string() })
            .collect();
        Ok(Self::new(ElementKind::Tab(TabData { positions, duration: Duration::parse(duration)? })))
    }

    pub fn ghost(duration: &str) -> Result<Self> {
        Ok(Self::new(ElementKind::Ghost(Duration::parse(duration)?)))
    }

    pub fn text(content: impl Into<String>, duration: &str) -> Result<Self> {
        Ok(Self::new(ElementKind::Text(TextData {
            content: content.into(),
            duration: Duration::parse(duration)?,
        })))
    }

    pub fn bar(bar: BarType) -> Self {
        Self::new(ElementKind::Bar(bar))
    }

    pub fn clef(clef: ClefKind) -> Self {
        Self::new(ElementKind::Clef(clef))
    }

    pub fn key_signature(spec: &str) -> Result<Self> {
        Ok(Self::new(ElementKind::KeySig(KeySignature::parse(spec)?)))
    }

    pub fn time_signature(spec: &str) -> Result<Self> {
        Ok(Self::new(ElementKind::TimeSig(TimeSignature::parse(spec)?)))
    }

    pub fn repeat(kind: RepeatKind) -> Self {
        Self::new(ElementKind::Repeat(kind))
    }

    pub fn tie(from: NoteAnchor, to: NoteAnchor) -> Self {
        Self::new(ElementKind::Tie { from, to })
    }

    pub fn curve(from: NoteAnchor, to: NoteAnchor) -> Self {
        Self::new(ElementKind::Curve { from, to })
    }

    /// Prefer [`Voice::create_beam`], which also hands the stems to the beam.
    pub fn beam(voice: VoiceId, range: Range<usize>) -> Self {
        Self::new(ElementKind::Beam { voice, range })
    }

    pub fn bracket(voice: VoiceId, range: Range<usize>, label: impl Into<String>) -> Self {
        Self::new(ElementKind::Bracket { voice, range, label: label.into() })
    }

    fn add_dots(&mut self, duration: Duration) {
        for index in 0..self.key_count() {
            for _ in 0..duration.dots {
                self.modifiers.push(Modifier::dot(index));
            }
        }
    }

    // ── Builders ────────────────────────────────────────────────────

    pub fn with_clef(mut self, clef: ClefKind) -> Self {
        if let ElementKind::Note(ref mut note) = self.kind {
            note.clef = Some(clef);
        }
        self
    }

    pub fn with_stem(mut self, stem: StemDirection) -> Self {
        if let ElementKind::Note(ref mut note) = self.kind {
            note.stem = Some(stem);
        }
        self
    }

    /// Play `num_notes` in the time of `notes_occupied`.
    pub fn set_tuplet(&mut self, num_notes: u32, notes_occupied: u32) -> Result<&mut Self> {
        if num_notes == 0 || notes_occupied == 0 {
            return Err(ValidationError::InvalidTuplet { num_notes, notes_occupied, ticks: 0 }.into());
        }
        self.tuplet = Some((num_notes, notes_occupied));
        Ok(self)
    }

    pub fn add_modifier(&mut self, modifier: Modifier) -> Result<&mut Self> {
        let keys = self.key_count();
        if modifier.index >= keys {
            return Err(ValidationError::ModifierIndex { index: modifier.index, keys }.into());
        }
        self.modifiers.push(modifier);
        Ok(self)
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub(crate) fn modifiers_mut(&mut self) -> &mut [Modifier] {
        &mut self.modifiers
    }

    pub fn duration(&self) -> Option<Duration> {
        self.kind.duration()
    }

    pub fn tuplet(&self) -> Option<(u32, u32)> {
        self.tuplet
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn is_formatted(&self) -> bool {
        self.formatted
    }

    pub(crate) fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.formatted = true;
    }

    pub(crate) fn set_beamed(&mut self, beamed: bool) {
        if let ElementKind::Note(ref mut note) = self.kind {
            note.beamed = beamed;
        }
    }

    /// Number of keys modifiers can attach to.
    pub fn key_count(&self) -> usize {
        match &self.kind {
            ElementKind::Note(n) => n.keys.len(),
            ElementKind::Tab(t) => t.positions.len(),
            k if k.is_spanner() => 0,
            _ => 1,
        }
    }

    /// Length in ticks at the given resolution, tuplet ratio applied.
    pub fn ticks(&self, resolution: u64) -> Result<u64> {
        let Some(duration) = self.duration() else {
            return Ok(0);
        };
        let base = duration.ticks(resolution)?;
        match self.tuplet {
            None => Ok(base),
            Some((num_notes, notes_occupied)) => {
                let scaled = base * notes_occupied as u64;
                if scaled % num_notes as u64 != 0 {
                    return Err(ValidationError::InvalidTuplet { num_notes, notes_occupied, ticks: base }.into());
                }
                Ok(scaled / num_notes as u64)
            }
        }
    }

    // ── Binding ─────────────────────────────────────────────────────

    pub fn bind(&mut self, stave: &StaveHandle, context: SharedContext) -> &mut Self {
        self.set_stave(stave);
        self.set_context(context)
    }

    pub fn set_stave(&mut self, stave: &StaveHandle) -> &mut Self {
        self.stave = Some(Rc::downgrade(stave));
        self
    }

    /// The bound stave, if it is still alive.
    pub fn stave(&self) -> Option<StaveHandle> {
        self.stave.as_ref().and_then(Weak::upgrade)
    }

    pub fn set_context(&mut self, context: SharedContext) -> &mut Self {
        self.context = Some(context);
        self
    }

    pub fn context(&self) -> Option<&SharedContext> {
        self.context.as_ref()
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    pub fn mark_rendered(&mut self) {
        self.rendered = true;
    }

    // ── Geometry ────────────────────────────────────────────────────

    /// Render scale from the bound stave, 1.0 without one.
    pub fn scale(&self) -> f64 {
        self.stave().map_or(1.0, |handle| {
            let stave = handle.borrow();
            stave.scale()
        })
    }

    /// Clef used to place keys: the note's own, else the stave's.
    pub fn clef_kind(&self) -> ClefKind {
        if let ElementKind::Note(NoteData { clef: Some(clef), .. }) = self.kind {
            return clef;
        }
        self.stave()
            .map(|handle| {
                let stave = handle.borrow();
                stave.clef()
            })
            .unwrap_or_default()
    }

    /// Note line of every key, in key order.
    pub fn key_lines(&self) -> Vec<f64> {
        match &self.kind {
            ElementKind::Note(note) => {
                let clef = self.clef_kind();
                note.keys.iter().map(|k| k.line(clef)).collect()
            }
            ElementKind::Rest(rest) => vec![rest.line],
            _ => vec![3.0],
        }
    }

    pub fn stem_direction(&self) -> Option<StemDirection> {
        let ElementKind::Note(note) = &self.kind else {
            return None;
        };
        if let Some(stem) = note.stem {
            return Some(stem);
        }
        let lines = self.key_lines();
        let min = lines.iter().copied().fold(f64::INFINITY, f64::min);
        let max = lines.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(if (min + max) / 2.0 < 3.0 { StemDirection::Up } else { StemDirection::Down })
    }

    fn head_glyph(&self) -> Glyph {
        match self.duration().map(|d| d.value) {
            Some(1) => Glyph::NoteheadWhole,
            Some(2) => Glyph::NoteheadHalf,
            _ => Glyph::NoteheadBlack,
        }
    }

    /// Width of the note head column (or the body of non-note kinds).
    pub fn head_width(&self) -> f64 {
        let scale = self.scale();
        match &self.kind {
            ElementKind::Note(_) => self.head_glyph().width() * scale,
            ElementKind::Tab(tab) => {
                let chars = tab.positions.iter().map(|p| p.fret.chars().count()).max().unwrap_or(1);
                chars as f64 * TEXT_CHAR_WIDTH * scale
            }
            _ => self.intrinsic_width(scale),
        }
    }

    fn intrinsic_width(&self, scale: f64) -> f64 {
        let w = match &self.kind {
            ElementKind::Note(_) => self.head_glyph().width(),
            ElementKind::Rest(rest) => rest_glyph(rest.duration).width(),
            ElementKind::Clef(clef) => clef_glyph(*clef).width() * INLINE_CLEF_SIZE,
            ElementKind::KeySig(key) => {
                key.accidental().map_or(0.0, |acc| accidental_glyph(acc).width() * key.accidental_count() as f64)
            }
            ElementKind::TimeSig(time) => time_signature_width(time),
            ElementKind::Bar(bar) => bar_width(*bar),
            ElementKind::Tab(tab) => {
                let chars = tab.positions.iter().map(|p| p.fret.chars().count()).max().unwrap_or(1);
                chars as f64 * TEXT_CHAR_WIDTH
            }
            ElementKind::Ghost(_) => 0.0,
            ElementKind::Repeat(kind) => match kind.label() {
                Some(label) => label.chars().count() as f64 * TEXT_CHAR_WIDTH,
                None => Glyph::Segno.width(),
            },
            ElementKind::Text(text) => text.content.chars().count() as f64 * TEXT_CHAR_WIDTH,
            _ => 0.0,
        };
        w * scale
    }

    /// Vertical position the formatter assigns on the given stave.
    pub(crate) fn natural_y(&self, stave: &Stave) -> f64 {
        match &self.kind {
            ElementKind::Note(_) | ElementKind::Rest(_) => {
                let first = self.key_lines().first().copied().unwrap_or(3.0);
                stave.y_for_note_line(first)
            }
            ElementKind::Text(_) => stave.y_for_line(-2.0),
            _ => stave.y(),
        }
    }

    /// Drawing geometry for a formatted note on a live stave.
    pub(crate) fn note_geometry(&self) -> Option<NoteGeometry> {
        let ElementKind::Note(note) = &self.kind else {
            return None;
        };
        let handle = self.stave()?;
        let stave = handle.borrow();
        let ys = self.key_lines().into_iter().map(|l| stave.y_for_note_line(l)).collect();
        Some(NoteGeometry {
            x: self.x,
            head_width: self.head_glyph().width() * stave.scale(),
            ys,
            stem: self.stem_direction().unwrap_or(StemDirection::Up),
            stem_forced: note.stem.is_some(),
            scale: stave.scale(),
            stave_top: stave.y(),
            stave_bottom: stave.bottom_y(),
            space: stave.space(),
            clef: self.clef_kind(),
        })
    }

    // ── Drawing ─────────────────────────────────────────────────────

    fn draw_on_stave(&self, ctx: &mut dyn RenderContext, stave: &Stave) -> Result<()> {
        let scale = stave.scale();
        match &self.kind {
            ElementKind::Note(note) => {
                let geom = self.note_geometry().ok_or(StateError::MissingStave(self.kind.name()))?;
                let stemmed = note.duration.has_stem();
                notes::draw_ledger_lines(ctx, &geom);
                notes::draw_note_heads(ctx, &geom, self.head_glyph(), note.duration.is_filled());
                if stemmed && !note.beamed {
                    notes::draw_stem(ctx, &geom, note.duration.flag_count());
                }
                for modifier in &self.modifiers {
                    modifiers::draw_modifier(ctx, &geom, stemmed, modifier);
                }
            }
            ElementKind::Rest(rest) => {
                notes::draw_rest(ctx, rest_glyph(rest.duration), self.x, stave.y_for_note_line(rest.line), scale);
            }
            ElementKind::Tab(tab) => {
                let positions: Vec<(f64, &str)> = tab
                    .positions
                    .iter()
                    .map(|p| (stave.y_for_line(p.string.saturating_sub(1) as f64), p.fret.as_str()))
                    .collect();
                notes::draw_tab_positions(ctx, self.x, self.head_width(), &positions, scale);
            }
            ElementKind::Clef(clef) => staff::draw_clef(ctx, stave, self.x, *clef, INLINE_CLEF_SIZE),
            ElementKind::KeySig(key) => staff::draw_key_signature(ctx, stave, self.x, key),
            ElementKind::TimeSig(time) => staff::draw_time_signature(ctx, stave, self.x, time),
            ElementKind::Bar(bar) => {
                let w = bar_width(*bar) * scale;
                let pad = 2.0 * scale;
                let anchor = match bar {
                    BarType::RepeatBegin => self.x + pad,
                    BarType::RepeatBoth => self.x + w / 2.0,
                    _ => self.x + w - pad,
                };
                staff::draw_barline(ctx, stave, anchor, *bar);
            }
            ElementKind::Repeat(kind) => staff::draw_repeat(ctx, stave, self.x, *kind),
            _ => {}
        }
        Ok(())
    }

    fn draw_free(&self, ctx: &mut dyn RenderContext, scope: &DrawScope<'_>) -> Result<()> {
        match &self.kind {
            ElementKind::Ghost(_) => {}
            ElementKind::Text(text) => {
                let point = ctx.font().point * self.scale();
                let font = FontSpec::sized(ctx, point);
                ctx.text(self.x, self.y, &text.content, &font);
            }
            ElementKind::Tie { from, to } => {
                let (a, b) = (scope.geometry(*from)?, scope.geometry(*to)?);
                curves::draw_tie(ctx, &a, &b);
            }
            ElementKind::Curve { from, to } => {
                let (a, b) = (scope.geometry(*from)?, scope.geometry(*to)?);
                curves::draw_curve(ctx, &a, &b);
            }
            ElementKind::Beam { voice, range } => {
                let notes = scope.range_geometry(*voice, range)?;
                notes::draw_beam(ctx, &notes);
            }
            ElementKind::Bracket { voice, range, label } => {
                let notes: Vec<NoteGeometry> =
                    scope.range_geometry(*voice, range)?.into_iter().map(|(g, _)| g).collect();
                curves::draw_bracket(ctx, &notes, label);
            }
            _ => {}
        }
        Ok(())
    }
}

impl Drawable for Element {
    fn pre_format(&mut self) -> Result<()> {
        self.width = self.intrinsic_width(self.scale());
        Ok(())
    }

    fn draw(&self, scope: &DrawScope<'_>) -> Result<()> {
        let context = self.context.as_ref().ok_or(StateError::MissingContext)?;
        let name = self.kind.name();
        let stave = if self.kind.needs_stave() {
            Some(self.stave().ok_or(StateError::MissingStave(name))?)
        } else {
            None
        };
        if self.rendered {
            return Ok(());
        }
        if self.kind.is_tickable() && !self.formatted {
            return Err(StateError::NotFormatted(name).into());
        }

        let mut guard = context.try_borrow_mut().map_err(|_| StateError::ReentrantDraw)?;
        let ctx: &mut dyn RenderContext = &mut *guard;
        match stave {
            Some(handle) => {
                let stave = handle.borrow();
                self.draw_on_stave(ctx, &stave)
            }
            None => self.draw_free(ctx, scope),
        }
    }

    fn width(&self) -> f64 {
        self.width
    }
}

fn rest_glyph(duration: Duration) -> Glyph {
    match duration.value {
        1 => Glyph::RestWhole,
        2 => Glyph::RestHalf,
        4 => Glyph::RestQuarter,
        8 => Glyph::Rest8th,
        _ => Glyph::Rest16th,
    }
}

/// Horizontal room a bar element claims, padding included.
fn bar_width(bar: BarType) -> f64 {
    match bar {
        BarType::None => 0.0,
        BarType::Single => 8.0,
        BarType::Double => 10.0,
        BarType::End => 12.0,
        BarType::RepeatBegin | BarType::RepeatEnd => 16.0,
        BarType::RepeatBoth => 26.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::renderer::RecordingContext;
    use pretty_assertions::assert_eq;

    fn recording() -> (Rc<RefCell<RecordingContext>>, SharedContext) {
        let rec = Rc::new(RefCell::new(RecordingContext::new()));
        let shared: SharedContext = rec.clone();
        (rec, shared)
    }

    #[test]
    fn draw_checks_context_then_stave_then_format() {
        let mut note = Element::note(&["c/4"], "q").unwrap();
        assert_eq!(note.draw(&DrawScope::empty()).unwrap_err(), StateError::MissingContext.into());

        let (rec, shared) = recording();
        note.set_context(shared);
        assert_eq!(note.draw(&DrawScope::empty()).unwrap_err(), StateError::MissingStave("note").into());

        let stave = Stave::new(0.0, 0.0, 300.0).into_handle();
        note.set_stave(&stave);
        assert_eq!(note.draw(&DrawScope::empty()).unwrap_err(), StateError::NotFormatted("note").into());
        assert!(rec.borrow().is_empty());
        assert!(!note.is_rendered());

        note.set_position(50.0, 0.0);
        note.draw(&DrawScope::empty()).unwrap();
        assert_eq!(rec.borrow().count_glyph(Glyph::NoteheadBlack), 1);
        assert!(!note.is_rendered());
    }

    #[test]
    fn rendered_elements_draw_nothing() {
        let (rec, shared) = recording();
        let mut text = Element::text("a tempo", "q").unwrap();
        text.set_context(shared);
        text.set_position(20.0, 10.0);
        text.mark_rendered();
        text.draw(&DrawScope::empty()).unwrap();
        assert!(rec.borrow().is_empty());

        let mut note = Element::note(&["e/4"], "q").unwrap();
        note.set_context(rec.clone());
        note.mark_rendered();
        assert_eq!(note.draw(&DrawScope::empty()).unwrap_err(), StateError::MissingStave("note").into());
        let stave = Stave::new(0.0, 0.0, 300.0).into_handle();
        note.set_stave(&stave);
        note.draw(&DrawScope::empty()).unwrap();
        assert!(rec.borrow().is_empty());
    }

    #[test]
    fn stave_goes_away_with_its_handle() {
        let mut rest = Element::rest("h").unwrap();
        {
            let stave = Stave::new(0.0, 0.0, 100.0).into_handle();
            rest.set_stave(&stave);
            assert!(rest.stave().is_some());
        }
        assert!(rest.stave().is_none());
    }

    #[test]
    fn held_context_fails_fast() {
        let (rec, shared) = recording();
        let mut text = Element::text("rit.", "q").unwrap();
        text.set_context(shared);
        text.set_position(0.0, 0.0);
        let _busy = rec.borrow_mut();
        assert_eq!(text.draw(&DrawScope::empty()).unwrap_err(), StateError::ReentrantDraw.into());
    }

    #[test]
    fn ghosts_and_text_need_no_stave() {
        let (rec, shared) = recording();
        let mut ghost = Element::ghost("q").unwrap();
        ghost.set_context(shared.clone());
        ghost.set_position(0.0, 0.0);
        ghost.draw(&DrawScope::empty()).unwrap();

        let mut text = Element::text("dolce", "h").unwrap();
        text.set_context(shared);
        text.set_position(10.0, 5.0);
        text.draw(&DrawScope::empty()).unwrap();
        assert_eq!(rec.borrow().texts().collect::<Vec<_>>(), vec!["dolce"]);
    }

    #[test]
    fn stems_follow_pitch_unless_forced() {
        assert_eq!(Element::note(&["c/4"], "q").unwrap().stem_direction(), Some(StemDirection::Up));
        assert_eq!(Element::note(&["a/5"], "q").unwrap().stem_direction(), Some(StemDirection::Down));
        let forced = Element::note(&["a/5"], "q").unwrap().with_stem(StemDirection::Up);
        assert_eq!(forced.stem_direction(), Some(StemDirection::Up));
        assert_eq!(Element::rest("q").unwrap().stem_direction(), None);
    }

    #[test]
    fn dotted_chords_get_a_dot_per_key() {
        let note = Element::note(&["c/4", "e/4", "g/4"], "h.").unwrap();
        assert_eq!(note.modifiers().len(), 3);
        assert_eq!(note.ticks(16384).unwrap(), 12288);
    }

    #[test]
    fn modifier_index_is_validated() {
        let mut note = Element::note(&["c/4", "e/4"], "q").unwrap();
        note.add_modifier(Modifier::accidental("#", 1).unwrap()).unwrap();
        let err = note.add_modifier(Modifier::fingering("2", 2)).unwrap_err();
        assert_eq!(err, ValidationError::ModifierIndex { index: 2, keys: 2 }.into());
        assert!(Element::note(&[], "q").is_err());
        assert!(matches!(
            Element::note(&["x/4"], "q"),
            Err(EngineError::Validation(ValidationError::InvalidKey(_)))
        ));
    }

    #[test]
    fn tuplets_scale_ticks() {
        let mut note = Element::note(&["c/4"], "8").unwrap();
        note.set_tuplet(3, 2).unwrap();
        assert_eq!(note.ticks(49152).unwrap(), 4096);
        assert!(matches!(
            note.ticks(16384),
            Err(EngineError::Validation(ValidationError::InvalidTuplet { num_notes: 3, .. }))
        ));
        assert!(note.set_tuplet(0, 2).is_err());
    }

    #[test]
    fn zero_tick_kinds() {
        assert_eq!(Element::bar(BarType::Single).ticks(16384).unwrap(), 0);
        assert_eq!(Element::clef(ClefKind::Bass).ticks(16384).unwrap(), 0);
        assert!(Element::tie(NoteAnchor::new(VoiceId(0), 0), NoteAnchor::new(VoiceId(0), 1)).kind().is_spanner());
    }
}
