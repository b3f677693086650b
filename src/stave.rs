//! Staves: fixed-geometry line sets that own their begin-of-stave modifiers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{EngineConfig, LayoutOptions};
use crate::element::{DrawScope, Drawable};
use crate::error::{ConfigurationError, Result, StateError};
use crate::glyphs::Glyph;
use crate::model::{BarType, ClefKind, KeySignature, TimeSignature};
use crate::modifier::accidental_glyph;
use crate::renderer::{staff, SharedContext};

/// Shared handle to a stave. Elements keep only a weak reference to it.
pub type StaveHandle = Rc<RefCell<Stave>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaveModifier {
    Clef(ClefKind),
    KeySignature(KeySignature),
    TimeSignature(TimeSignature),
}

pub struct Stave {
    x: f64,
    y: f64,
    width: f64,
    space: f64,
    num_lines: usize,
    options: LayoutOptions,
    modifiers: Vec<StaveModifier>,
    begin_bar: BarType,
    end_bar: BarType,
    note_start_override: Option<f64>,
    context: Option<SharedContext>,
}

impl std::fmt::Debug for Stave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stave")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("num_lines", &self.num_lines)
            .field("modifiers", &self.modifiers)
            .finish()
    }
}

impl Stave {
    /// A five-line stave whose top line sits at `y`.
    pub fn new(x: f64, y: f64, width: f64) -> Self {
        Self {
            x,
            y,
            width,
            space: 10.0,
            num_lines: 5,
            options: LayoutOptions::default(),
            modifiers: Vec::new(),
            begin_bar: BarType::Single,
            end_bar: BarType::Single,
            note_start_override: None,
            context: None,
        }
    }

    pub fn with_config(x: f64, y: f64, width: f64, config: &EngineConfig) -> Self {
        Self {
            space: config.stave.space,
            options: config.layout,
            ..Self::new(x, y, width)
        }
    }

    /// A six-line tablature stave with a tab clef.
    pub fn tab(x: f64, y: f64, width: f64) -> Self {
        let mut stave = Self { num_lines: 6, space: 13.0, ..Self::new(x, y, width) };
        stave.modifiers.push(StaveModifier::Clef(ClefKind::Tab));
        stave
    }

    pub fn with_lines(mut self, num_lines: usize) -> Result<Self> {
        if num_lines == 0 {
            return Err(ConfigurationError::NoStaveLines.into());
        }
        self.num_lines = num_lines;
        Ok(self)
    }

    pub fn into_handle(self) -> StaveHandle {
        Rc::new(RefCell::new(self))
    }

    // ── Modifiers ───────────────────────────────────────────────────

    pub fn add_modifier(&mut self, modifier: StaveModifier) -> &mut Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn add_clef(&mut self, name: &str) -> Result<&mut Self> {
        let clef = ClefKind::from_name(name)?;
        Ok(self.add_modifier(StaveModifier::Clef(clef)))
    }

    pub fn add_key_signature(&mut self, spec: &str) -> Result<&mut Self> {
        let key = KeySignature::parse(spec)?;
        Ok(self.add_modifier(StaveModifier::KeySignature(key)))
    }

    pub fn add_time_signature(&mut self, spec: &str) -> Result<&mut Self> {
        let time = TimeSignature::parse(spec)?;
        Ok(self.add_modifier(StaveModifier::TimeSignature(time)))
    }

    pub fn modifiers(&self) -> &[StaveModifier] {
        &self.modifiers
    }

    /// The most recently attached clef, treble when none was attached.
    pub fn clef(&self) -> ClefKind {
        self.modifiers
            .iter()
            .rev()
            .find_map(|m| match m {
                StaveModifier::Clef(c) => Some(*c),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn set_begin_bar(&mut self, bar: BarType) -> &mut Self {
        self.begin_bar = bar;
        self
    }

    pub fn set_end_bar(&mut self, bar: BarType) -> &mut Self {
        self.end_bar = bar;
        self
    }

    pub fn begin_bar(&self) -> BarType {
        self.begin_bar
    }

    pub fn end_bar(&self) -> BarType {
        self.end_bar
    }

    // ── Geometry ────────────────────────────────────────────────────

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn space(&self) -> f64 {
        self.space
    }

    pub fn num_lines(&self) -> usize {
        self.num_lines
    }

    /// Render scale relative to the default staff space of 10.
    pub fn scale(&self) -> f64 {
        self.space / 10.0
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Y of a stave line, counted from 0 at the top line.
    pub fn y_for_line(&self, line: f64) -> f64 {
        self.y + line * self.space
    }

    /// Y of a note line: 1 is the bottom line of a five-line stave and each
    /// half step is a space.
    pub fn y_for_note_line(&self, line: f64) -> f64 {
        self.y + (self.num_lines as f64 - line) * self.space
    }

    pub fn bottom_y(&self) -> f64 {
        self.y_for_line((self.num_lines - 1) as f64)
    }

    pub fn end_x(&self) -> f64 {
        self.x + self.width
    }

    /// Horizontal room claimed by one begin-of-stave modifier.
    pub fn modifier_width(&self, modifier: &StaveModifier) -> f64 {
        let s = self.scale();
        let w = match modifier {
            StaveModifier::Clef(c) => clef_glyph(*c).width(),
            StaveModifier::KeySignature(k) => {
                k.accidental()
                    .map_or(0.0, |acc| accidental_glyph(acc).width() * k.accidental_count() as f64)
            }
            StaveModifier::TimeSignature(t) => time_signature_width(t),
        };
        if w == 0.0 {
            0.0
        } else {
            w * s + self.options.stave_modifier_padding
        }
    }

    /// Where the first tickable may start.
    pub fn note_start_x(&self) -> f64 {
        if let Some(x) = self.note_start_override {
            return x;
        }
        let begin: f64 = self.modifiers.iter().map(|m| self.modifier_width(m)).sum();
        self.x + self.options.stave_padding + begin
    }

    pub fn note_end_x(&self) -> f64 {
        self.end_x() - self.options.stave_padding
    }

    /// Align this stave's note area with other staves of a system.
    pub(crate) fn set_note_start_x(&mut self, x: f64) {
        self.note_start_override = Some(x);
    }

    // ── Rendering ───────────────────────────────────────────────────

    pub fn set_context(&mut self, context: SharedContext) -> &mut Self {
        self.context = Some(context);
        self
    }

    pub fn context(&self) -> Option<&SharedContext> {
        self.context.as_ref()
    }
}

impl Drawable for Stave {
    fn pre_format(&mut self) -> Result<()> {
        Ok(())
    }

    /// Draw lines, begin/end bars and the attached modifiers in insertion order.
    fn draw(&self, _scope: &DrawScope<'_>) -> Result<()> {
        let context = self.context.as_ref().ok_or(StateError::MissingContext)?;
        let mut ctx = context.try_borrow_mut().map_err(|_| StateError::ReentrantDraw)?;
        let ctx = &mut *ctx;

        staff::draw_staff_lines(ctx, self);
        staff::draw_barline(ctx, self, self.x, self.begin_bar);

        let mut x = self.x + self.options.stave_padding;
        for modifier in &self.modifiers {
            match modifier {
                StaveModifier::Clef(clef) => staff::draw_clef(ctx, self, x, *clef, 1.0),
                StaveModifier::KeySignature(key) => staff::draw_key_signature(ctx, self, x, key),
                StaveModifier::TimeSignature(time) => staff::draw_time_signature(ctx, self, x, time),
            }
            x += self.modifier_width(modifier);
        }

        staff::draw_barline(ctx, self, self.end_x(), self.end_bar);
        Ok(())
    }

    fn width(&self) -> f64 {
        self.width
    }
}

pub(crate) fn clef_glyph(clef: ClefKind) -> Glyph {
    match clef {
        ClefKind::Treble => Glyph::TrebleClef,
        ClefKind::Bass => Glyph::BassClef,
        ClefKind::Alto | ClefKind::Tenor => Glyph::AltoClef,
        ClefKind::Percussion => Glyph::PercussionClef,
        ClefKind::Tab => Glyph::TabClef,
    }
}

pub(crate) fn time_signature_width(time: &TimeSignature) -> f64 {
    if time.symbol.is_some() {
        return Glyph::TimeSigCommon.width();
    }
    let digits = |n: u32| n.to_string().len() as f64;
    digits(time.beats).max(digits(time.beat_value)) * Glyph::TimeSigDigit(0).width()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_geometry() {
        let stave = Stave::new(10.0, 40.0, 300.0);
        assert_eq!(stave.y_for_line(0.0), 40.0);
        assert_eq!(stave.bottom_y(), 80.0);
        assert_eq!(stave.y_for_note_line(5.0), 40.0);
        assert_eq!(stave.y_for_note_line(1.0), 80.0);
        assert_eq!(stave.y_for_note_line(3.0), 60.0);
    }

    #[test]
    fn note_start_grows_with_modifiers_in_order() {
        let mut stave = Stave::new(0.0, 0.0, 400.0);
        let bare = stave.note_start_x();
        stave.add_clef("bass").unwrap().add_key_signature("D").unwrap().add_time_signature("3/4").unwrap();
        assert_eq!(stave.clef(), ClefKind::Bass);
        assert!(stave.note_start_x() > bare);
        assert!(matches!(stave.modifiers()[1], StaveModifier::KeySignature(KeySignature { fifths: 2 })));

        stave.set_note_start_x(150.0);
        assert_eq!(stave.note_start_x(), 150.0);
    }

    #[test]
    fn drawing_needs_context() {
        let stave = Stave::new(0.0, 0.0, 100.0);
        let err = stave.draw(&DrawScope::empty()).unwrap_err();
        assert_eq!(err, StateError::MissingContext.into());
    }

    #[test]
    fn zero_lines_rejected() {
        assert!(Stave::new(0.0, 0.0, 10.0).with_lines(0).is_err());
        assert_eq!(Stave::tab(0.0, 0.0, 10.0).clef(), ClefKind::Tab);
    }
}
