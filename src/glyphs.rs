//! Glyph table: code lookup, advance widths and outlines.
//!
//! Outlines use the VexFlow outline command format (`m x y`, `l x y`,
//! `b ex ey c1x c1y c2x c2y`, `q ex ey cx cy`) with y pointing up. Units are
//! pixels at a staff space of 10; surfaces multiply by the scale they are
//! given. Glyphs without an outline carry a text fallback instead.

use serde::{Deserialize, Serialize};

use crate::error::{LookupError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Glyph {
    NoteheadBlack,
    NoteheadHalf,
    NoteheadWhole,
    RestWhole,
    RestHalf,
    RestQuarter,
    Rest8th,
    Rest16th,
    AccidentalSharp,
    AccidentalFlat,
    AccidentalNatural,
    AccidentalDoubleSharp,
    AccidentalDoubleFlat,
    TrebleClef,
    BassClef,
    AltoClef,
    PercussionClef,
    TabClef,
    AugmentationDot,
    Flag8thUp,
    Flag8thDown,
    ArticStaccato,
    ArticStaccatissimo,
    ArticAccent,
    ArticTenuto,
    ArticMarcato,
    Fermata,
    OrnamentTrill,
    OrnamentMordent,
    OrnamentMordentInverted,
    OrnamentTurn,
    OrnamentTurnInverted,
    Segno,
    Coda,
    TimeSigDigit(u8),
    TimeSigCommon,
    TimeSigCutCommon,
}

const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

impl Glyph {
    /// Resolve a SMuFL-style glyph name.
    pub fn from_code(code: &str) -> Result<Self> {
        if let Some(d) = code.strip_prefix("timeSig") {
            if let Ok(n) = d.parse::<u8>() {
                if n < 10 {
                    return Ok(Self::TimeSigDigit(n));
                }
            }
        }
        Ok(match code {
            "noteheadBlack" => Self::NoteheadBlack,
            "noteheadHalf" => Self::NoteheadHalf,
            "noteheadWhole" => Self::NoteheadWhole,
            "restWhole" => Self::RestWhole,
            "restHalf" => Self::RestHalf,
            "restQuarter" => Self::RestQuarter,
            "rest8th" => Self::Rest8th,
            "rest16th" => Self::Rest16th,
            "accidentalSharp" => Self::AccidentalSharp,
            "accidentalFlat" => Self::AccidentalFlat,
            "accidentalNatural" => Self::AccidentalNatural,
            "accidentalDoubleSharp" => Self::AccidentalDoubleSharp,
            "accidentalDoubleFlat" => Self::AccidentalDoubleFlat,
            "gClef" => Self::TrebleClef,
            "fClef" => Self::BassClef,
            "cClef" => Self::AltoClef,
            "unpitchedPercussionClef1" => Self::PercussionClef,
            "6stringTabClef" => Self::TabClef,
            "augmentationDot" => Self::AugmentationDot,
            "flag8thUp" => Self::Flag8thUp,
            "flag8thDown" => Self::Flag8thDown,
            "articStaccatoAbove" => Self::ArticStaccato,
            "articStaccatissimoAbove" => Self::ArticStaccatissimo,
            "articAccentAbove" => Self::ArticAccent,
            "articTenutoAbove" => Self::ArticTenuto,
            "articMarcatoAbove" => Self::ArticMarcato,
            "fermataAbove" => Self::Fermata,
            "ornamentTrill" => Self::OrnamentTrill,
            "ornamentMordent" => Self::OrnamentMordent,
            "ornamentShortTrill" => Self::OrnamentMordentInverted,
            "ornamentTurn" => Self::OrnamentTurn,
            "ornamentTurnInverted" => Self::OrnamentTurnInverted,
            "segno" => Self::Segno,
            "coda" => Self::Coda,
            "timeSigCommon" => Self::TimeSigCommon,
            "timeSigCutCommon" => Self::TimeSigCutCommon,
            other => return Err(LookupError::Glyph(other.to_string()).into()),
        })
    }

    /// Advance width at a staff space of 10.
    pub fn width(&self) -> f64 {
        match self {
            Self::NoteheadBlack | Self::NoteheadHalf => 11.8,
            Self::NoteheadWhole => 16.0,
            Self::RestWhole | Self::RestHalf => 12.0,
            Self::RestQuarter | Self::Rest8th => 8.0,
            Self::Rest16th => 10.0,
            Self::AccidentalSharp => 8.0,
            Self::AccidentalFlat => 7.0,
            Self::AccidentalNatural => 6.0,
            Self::AccidentalDoubleSharp => 7.0,
            Self::AccidentalDoubleFlat => 12.0,
            Self::TrebleClef => 26.0,
            Self::BassClef => 26.0,
            Self::AltoClef => 22.0,
            Self::PercussionClef => 12.0,
            Self::TabClef => 18.0,
            Self::AugmentationDot => 3.6,
            Self::Flag8thUp | Self::Flag8thDown => 9.0,
            Self::ArticStaccato => 3.6,
            Self::ArticStaccatissimo => 3.0,
            Self::ArticAccent | Self::ArticTenuto => 10.0,
            Self::ArticMarcato => 8.0,
            Self::Fermata => 18.0,
            Self::OrnamentTrill => 12.0,
            Self::OrnamentMordent | Self::OrnamentMordentInverted => 14.0,
            Self::OrnamentTurn | Self::OrnamentTurnInverted => 14.0,
            Self::Segno => 14.0,
            Self::Coda => 16.0,
            Self::TimeSigDigit(_) => 14.0,
            Self::TimeSigCommon | Self::TimeSigCutCommon => 16.0,
        }
    }

    pub fn outline(&self) -> Option<&'static str> {
        Some(match self {
            Self::NoteheadBlack | Self::NoteheadHalf => NOTEHEAD,
            Self::NoteheadWhole => NOTEHEAD_WHOLE,
            Self::RestWhole => "m 0 0 l 12 0 l 12 -5 l 0 -5",
            Self::RestHalf => "m 0 0 l 12 0 l 12 5 l 0 5",
            Self::RestQuarter => "m 2 14 l 7 7 l 4 3 l 8 -4 l 5 -4 l 6 -13 l 4 -13 l 2 -4 l 0 -4 l 3 1 l 0 7",
            Self::Rest8th => "m 2 5 b 3 7 0 6 1 7 l 7 6 l 3 -10 l 4.5 -10 l 8 6.5 l 7 7 b 3 3.5 5 4.5 4 3.5 b 2 5 1 3.5 0 4",
            Self::Rest16th => "m 2 5 b 3 7 0 6 1 7 l 9 6 l 3 -16 l 4.5 -16 l 10 6.5 l 9 7 b 5 3.5 7 4.5 6 3.5 l 4 -3 b 2 -1 3 -2 1 -2",
            Self::AccidentalSharp => "m 2 -10 l 3 -10 l 3 11 l 2 11 m 5 -11 l 6 -11 l 6 10 l 5 10 m 0 2 l 8 5 l 8 7.5 l 0 4.5 m 0 -5 l 8 -2 l 8 0.5 l 0 -2.5",
            Self::AccidentalFlat => FLAT,
            Self::AccidentalNatural => "m 0 -7 l 1.2 -7 l 1.2 -3 l 6 -4.5 l 6 12 l 4.8 12 l 4.8 3 l 0 4.5 m 1.2 0.5 l 4.8 -0.5 l 4.8 -2 l 1.2 -1",
            Self::AccidentalDoubleSharp => "m 0 -3.5 l 1 -3.5 l 3.5 -1 l 6 -3.5 l 7 -3.5 l 7 -2.5 l 4.5 0 l 7 2.5 l 7 3.5 l 6 3.5 l 3.5 1 l 1 3.5 l 0 3.5 l 0 2.5 l 2.5 0 l 0 -2.5",
            Self::AccidentalDoubleFlat => DOUBLE_FLAT,
            Self::AltoClef => "m 0 20 l 3 20 l 3 -20 l 0 -20 m 5 20 l 6.5 20 l 6.5 -20 l 5 -20 m 6.5 0 b 20 10 10 0 20 4 b 6.5 0 20 -4 10 0 m 6.5 0 b 20 -10 10 0 20 -4",
            Self::PercussionClef => "m 2 -10 l 5 -10 l 5 10 l 2 10 m 7 -10 l 10 -10 l 10 10 l 7 10",
            Self::AugmentationDot | Self::ArticStaccato => DOT,
            Self::Flag8thUp => "m 0 0 l 1 0 b 9 -8 2 -6 9 -4 b 8 -18 9 -14 10 -16 b 1 -6 6 -12 4 -8 l 0 -6",
            Self::Flag8thDown => "m 0 0 l 1 0 b 9 8 2 6 9 4 b 8 18 9 14 10 16 b 1 6 6 12 4 8 l 0 6",
            Self::ArticStaccatissimo => "m 0 0 l 3 0 l 1.5 -6",
            Self::ArticAccent => "m 0 3.5 l 10 0 l 0 -3.5 l 0 -2.3 l 7 0 l 0 2.3",
            Self::ArticTenuto => "m 0 0.7 l 10 0.7 l 10 -0.7 l 0 -0.7",
            Self::ArticMarcato => "m 0 0 l 4 9 l 8 0 l 6.5 0 l 4 6 l 1.5 0",
            Self::Fermata => "m 0 0 b 18 0 2 11 16 11 l 16.5 0 b 1.5 0 15 9 3 9 m 7.2 2 b 10.8 2 7.2 4 10.8 4 b 7.2 2 10.8 0 7.2 0",
            Self::OrnamentMordent => "m 0 0 l 3.5 4 l 7 0 l 10.5 4 l 14 0 l 14 1.5 l 10.5 5.5 l 7 1.5 l 3.5 5.5 l 0 1.5 m 6.5 -3 l 7.5 -3 l 7.5 7 l 6.5 7",
            Self::OrnamentMordentInverted => "m 0 0 l 3.5 4 l 7 0 l 10.5 4 l 14 0 l 14 1.5 l 10.5 5.5 l 7 1.5 l 3.5 5.5 l 0 1.5",
            Self::OrnamentTurn => "m 0 2 b 7 2 0 6 5 6 b 14 2 9 -2 14 -2 b 7 2 12 6 9 6 b 0 2 5 -2 0 -2",
            Self::OrnamentTurnInverted => "m 0 -2 b 7 -2 0 -6 5 -6 b 14 -2 9 2 14 2 b 7 -2 12 -6 9 -6 b 0 -2 5 2 0 2",
            Self::Segno => "m 0 -8 l 12 8 l 12.8 7.2 l 0.8 -8.8 m 9 -6 b 3 6 14 -2 -1 2 b 9 -6 1 10 12 4",
            Self::Coda => "m 8 -8 b 8 8 0 -8 0 8 b 8 -8 16 8 16 -8 m 8 -6 b 8 6 14 -6 14 6 b 8 -6 2 6 2 -6 m 7.5 -11 l 8.5 -11 l 8.5 11 l 7.5 11 m -3 0.5 l 19 0.5 l 19 -0.5 l -3 -0.5",
            _ => return None,
        })
    }

    /// Text stand-in for glyphs that ship without an outline.
    pub fn text(&self) -> Option<&'static str> {
        match self {
            Self::TabClef => Some("TAB"),
            Self::OrnamentTrill => Some("tr"),
            Self::TimeSigDigit(d) => DIGITS.get(*d as usize).copied(),
            Self::TimeSigCommon => Some("C"),
            Self::TimeSigCutCommon => Some("¢"),
            _ => None,
        }
    }
}

const NOTEHEAD: &str =
    "m 0 0 b 5.9 4 0 2.4 2.6 4 b 11.8 0 9.2 4 11.8 2.4 b 5.9 -4 11.8 -2.4 9.2 -4 b 0 0 2.6 -4 0 -2.4";
const NOTEHEAD_WHOLE: &str =
    "m 0 0 b 8 5 0 3 3.5 5 b 16 0 12.5 5 16 3 b 8 -5 16 -3 12.5 -5 b 0 0 3.5 -5 0 -3";
const DOT: &str =
    "m 0 0 b 1.8 1.8 0 1 0.8 1.8 b 3.6 0 2.8 1.8 3.6 1 b 1.8 -1.8 3.6 -1 2.8 -1.8 b 0 0 0.8 -1.8 0 -1";
const FLAT: &str =
    "m 0 -5 l 0 17 l 1.2 17 l 1.2 0.5 b 6.5 0.5 1.2 -2.5 4.5 2.5 b 2.5 -4 7 -2.5 5.5 -4";
const DOUBLE_FLAT: &str =
    "m 0 -5 l 0 17 l 1.2 17 l 1.2 0.5 b 6.5 0.5 1.2 -2.5 4.5 2.5 b 2.5 -4 7 -2.5 5.5 -4 \
     m 5 -5 l 5 17 l 6.2 17 l 6.2 0.5 b 11.5 0.5 6.2 -2.5 9.5 2.5 b 7.5 -4 12 -2.5 10.5 -4";
