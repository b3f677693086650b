//! Per-note attachments (accidentals, dots, fingerings, articulations, ...).
//!
//! A modifier is plain data attached to one key of its host element. Lateral
//! placement is decided by the [`ModifierContext`](crate::modifier_context)
//! that groups all modifiers sharing a tick; the results are written back into
//! `x_shift` and `text_line`.

use serde::{Deserialize, Serialize};

use crate::error::{LookupError, Result};
use crate::glyphs::Glyph;
use crate::model::{AccidentalType, ClefKind, Pitch};

/// Approximate advance of one character of modifier text at a staff space of 10.
pub(crate) const TEXT_CHAR_WIDTH: f64 = 6.0;

/// Formatting category. The declaration order is the order in which
/// categories claim lateral space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModifierCategory {
    NoteHead,
    Dot,
    Fingering,
    Accidental,
    Stroke,
    GraceNoteGroup,
    NoteSubGroup,
    StringNumber,
    Articulation,
    Ornament,
    Annotation,
    Bend,
    Vibrato,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierPosition {
    Left,
    Right,
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticulationType {
    Staccato,
    Staccatissimo,
    Accent,
    Tenuto,
    Marcato,
    Fermata,
}

impl ArticulationType {
    pub fn from_code(code: &str) -> Result<Self> {
        Ok(match code {
            "a." => Self::Staccato,
            "av" => Self::Staccatissimo,
            "a>" => Self::Accent,
            "a-" => Self::Tenuto,
            "a^" => Self::Marcato,
            "a@a" | "a@u" => Self::Fermata,
            other => return Err(LookupError::Articulation(other.to_string()).into()),
        })
    }

    pub fn glyph(&self) -> Glyph {
        match self {
            Self::Staccato => Glyph::ArticStaccato,
            Self::Staccatissimo => Glyph::ArticStaccatissimo,
            Self::Accent => Glyph::ArticAccent,
            Self::Tenuto => Glyph::ArticTenuto,
            Self::Marcato => Glyph::ArticMarcato,
            Self::Fermata => Glyph::Fermata,
        }
    }

    /// Height in text lines when stacked.
    fn lines(&self) -> f64 {
        match self {
            Self::Fermata => 1.5,
            Self::Marcato => 1.0,
            _ => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrnamentType {
    Trill,
    Mordent,
    MordentInverted,
    Turn,
    TurnInverted,
}

impl OrnamentType {
    pub fn from_code(code: &str) -> Result<Self> {
        Ok(match code {
            "tr" => Self::Trill,
            "mordent" => Self::Mordent,
            "mordent_inverted" => Self::MordentInverted,
            "turn" => Self::Turn,
            "turn_inverted" => Self::TurnInverted,
            other => return Err(LookupError::Ornament(other.to_string()).into()),
        })
    }

    pub fn glyph(&self) -> Glyph {
        match self {
            Self::Trill => Glyph::OrnamentTrill,
            Self::Mordent => Glyph::OrnamentMordent,
            Self::MordentInverted => Glyph::OrnamentMordentInverted,
            Self::Turn => Glyph::OrnamentTurn,
            Self::TurnInverted => Glyph::OrnamentTurnInverted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrokeType {
    Arpeggio,
    BrushUp,
    BrushDown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModifierKind {
    Dot,
    Accidental(AccidentalType),
    Fingering(String),
    Stroke(StrokeType),
    GraceNotes { keys: Vec<Pitch>, slash: bool },
    /// Inline clef change drawn just before the note
    NoteSubGroup(ClefKind),
    StringNumber(u8),
    Articulation(ArticulationType),
    /// Delayed ornaments sit between their note and the next tick
    Ornament { kind: OrnamentType, delayed: bool },
    Annotation(String),
    Bend(String),
    Vibrato,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    /// Key of the host element this modifier belongs to
    pub index: usize,
    pub position: ModifierPosition,
    /// Distance from the note head edge on the modifier's side
    pub x_shift: f64,
    /// Stack slot for above/below modifiers
    pub text_line: f64,
}

impl Modifier {
    fn new(kind: ModifierKind, index: usize, position: ModifierPosition) -> Self {
        Self { kind, index, position, x_shift: 0.0, text_line: 0.0 }
    }

    pub fn dot(index: usize) -> Self {
        Self::new(ModifierKind::Dot, index, ModifierPosition::Right)
    }

    pub fn accidental(code: &str, index: usize) -> Result<Self> {
        let acc = AccidentalType::from_code(code)?;
        Ok(Self::new(ModifierKind::Accidental(acc), index, ModifierPosition::Left))
    }

    pub fn fingering(text: impl Into<String>, index: usize) -> Self {
        Self::new(ModifierKind::Fingering(text.into()), index, ModifierPosition::Left)
    }

    pub fn stroke(kind: StrokeType, index: usize) -> Self {
        Self::new(ModifierKind::Stroke(kind), index, ModifierPosition::Left)
    }

    pub fn grace_notes(keys: &[&str], slash: bool, index: usize) -> Result<Self> {
        let keys = keys.iter().map(|k| Pitch::parse(k)).collect::<Result<Vec<_>>>()?;
        Ok(Self::new(ModifierKind::GraceNotes { keys, slash }, index, ModifierPosition::Left))
    }

    pub fn sub_group(clef: ClefKind, index: usize) -> Self {
        Self::new(ModifierKind::NoteSubGroup(clef), index, ModifierPosition::Left)
    }

    pub fn string_number(number: u8, index: usize) -> Self {
        Self::new(ModifierKind::StringNumber(number), index, ModifierPosition::Right)
    }

    pub fn articulation(code: &str, index: usize) -> Result<Self> {
        let position = if code == "a@u" { ModifierPosition::Below } else { ModifierPosition::Above };
        let kind = ArticulationType::from_code(code)?;
        Ok(Self::new(ModifierKind::Articulation(kind), index, position))
    }

    pub fn ornament(code: &str, index: usize) -> Result<Self> {
        let kind = OrnamentType::from_code(code)?;
        Ok(Self::new(ModifierKind::Ornament { kind, delayed: false }, index, ModifierPosition::Above))
    }

    pub fn annotation(text: impl Into<String>, index: usize) -> Self {
        Self::new(ModifierKind::Annotation(text.into()), index, ModifierPosition::Above)
    }

    pub fn bend(text: impl Into<String>, index: usize) -> Self {
        Self::new(ModifierKind::Bend(text.into()), index, ModifierPosition::Right)
    }

    pub fn vibrato(index: usize) -> Self {
        Self::new(ModifierKind::Vibrato, index, ModifierPosition::Above)
    }

    pub fn with_position(mut self, position: ModifierPosition) -> Self {
        self.position = position;
        self
    }

    /// Mark an ornament as delayed; no effect on other kinds.
    pub fn delayed(mut self) -> Self {
        if let ModifierKind::Ornament { ref mut delayed, .. } = self.kind {
            *delayed = true;
        }
        self
    }

    pub fn category(&self) -> ModifierCategory {
        match self.kind {
            ModifierKind::Dot => ModifierCategory::Dot,
            ModifierKind::Accidental(_) => ModifierCategory::Accidental,
            ModifierKind::Fingering(_) => ModifierCategory::Fingering,
            ModifierKind::Stroke(_) => ModifierCategory::Stroke,
            ModifierKind::GraceNotes { .. } => ModifierCategory::GraceNoteGroup,
            ModifierKind::NoteSubGroup(_) => ModifierCategory::NoteSubGroup,
            ModifierKind::StringNumber(_) => ModifierCategory::StringNumber,
            ModifierKind::Articulation(_) => ModifierCategory::Articulation,
            ModifierKind::Ornament { .. } => ModifierCategory::Ornament,
            ModifierKind::Annotation(_) => ModifierCategory::Annotation,
            ModifierKind::Bend(_) => ModifierCategory::Bend,
            ModifierKind::Vibrato => ModifierCategory::Vibrato,
        }
    }

    /// Lateral width at the given render scale (1.0 = staff space 10).
    pub fn width(&self, scale: f64) -> f64 {
        let w = match &self.kind {
            ModifierKind::Dot => Glyph::AugmentationDot.width(),
            ModifierKind::Accidental(acc) => accidental_glyph(*acc).width(),
            ModifierKind::Fingering(text) | ModifierKind::Annotation(text) => {
                text.chars().count() as f64 * TEXT_CHAR_WIDTH
            }
            ModifierKind::Stroke(_) => 5.0,
            ModifierKind::GraceNotes { keys, .. } => {
                keys.len().max(1) as f64 * Glyph::NoteheadBlack.width() * GRACE_SCALE + 4.0
            }
            ModifierKind::NoteSubGroup(_) => 16.0,
            ModifierKind::StringNumber(_) => 10.0,
            ModifierKind::Articulation(a) => a.glyph().width(),
            ModifierKind::Ornament { kind, .. } => kind.glyph().width(),
            ModifierKind::Bend(text) => 8.0 + text.chars().count() as f64 * TEXT_CHAR_WIDTH,
            ModifierKind::Vibrato => 0.0,
        };
        w * scale
    }

    /// Height in text lines for stacked (above/below) modifiers.
    pub(crate) fn text_lines(&self) -> f64 {
        match &self.kind {
            ModifierKind::Articulation(a) => a.lines(),
            ModifierKind::Ornament { .. } | ModifierKind::Annotation(_) => 1.0,
            ModifierKind::Bend(_) | ModifierKind::Vibrato => 1.0,
            _ => 0.0,
        }
    }
}

/// Size of grace-note heads relative to regular ones.
pub(crate) const GRACE_SCALE: f64 = 0.66;

pub(crate) fn accidental_glyph(acc: AccidentalType) -> Glyph {
    match acc {
        AccidentalType::Sharp => Glyph::AccidentalSharp,
        AccidentalType::Flat => Glyph::AccidentalFlat,
        AccidentalType::Natural => Glyph::AccidentalNatural,
        AccidentalType::DoubleSharp => Glyph::AccidentalDoubleSharp,
        AccidentalType::DoubleFlat => Glyph::AccidentalDoubleFlat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn unknown_codes_are_lookup_errors() {
        assert!(matches!(Modifier::accidental("x", 0), Err(EngineError::Lookup(LookupError::Accidental(_)))));
        assert!(matches!(Modifier::ornament("shake", 0), Err(EngineError::Lookup(LookupError::Ornament(_)))));
        assert!(matches!(Modifier::articulation("a!", 0), Err(EngineError::Lookup(LookupError::Articulation(_)))));
    }

    #[test]
    fn categories_follow_kind() {
        assert_eq!(Modifier::dot(0).category(), ModifierCategory::Dot);
        assert_eq!(Modifier::fingering("3", 0).category(), ModifierCategory::Fingering);
        assert_eq!(Modifier::articulation("a@u", 0).unwrap().position, ModifierPosition::Below);
        let orn = Modifier::ornament("tr", 0).unwrap().delayed();
        assert_eq!(orn.kind, ModifierKind::Ornament { kind: OrnamentType::Trill, delayed: true });
        assert!(ModifierCategory::Fingering < ModifierCategory::Accidental);
    }
}
