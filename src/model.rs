//! Musical value types shared by elements, staves and voices.
//!
//! These are the in-memory element descriptors handed to the engine by the
//! embedding application. They parse from the compact string notation used by
//! the API layer (`"c#/4"`, `"q."`, `"3/4"`, `"Bb"`).

use serde::{Deserialize, Serialize};

use crate::error::{LookupError, Result, ValidationError};

/// Ticks per whole note used when a voice does not pick its own resolution.
pub const DEFAULT_RESOLUTION: u64 = 16384;

// ═══════════════════════════════════════════════════════════════════════
// Durations
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    /// Note value as a fraction of a whole note: 1 = whole, 4 = quarter
    pub value: u32,
    pub dots: u8,
}

impl Duration {
    pub fn new(value: u32, dots: u8) -> Result<Self> {
        if !matches!(value, 1 | 2 | 4 | 8 | 16 | 32 | 64) {
            return Err(ValidationError::InvalidDuration(value.to_string()).into());
        }
        Ok(Self { value, dots })
    }

    /// Parse `w`, `h`, `q` or a number, followed by `.` or `d` per dot.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let base_end = spec
            .find(|c: char| c == '.' || c == 'd')
            .unwrap_or(spec.len());
        let (base, dots) = spec.split_at(base_end);
        let invalid = || ValidationError::InvalidDuration(spec.to_string());

        let value = match base {
            "w" => 1,
            "h" => 2,
            "q" => 4,
            digits => digits.parse::<u32>().map_err(|_| invalid())?,
        };
        if !dots.chars().all(|c| c == '.' || c == 'd') || dots.len() > 3 {
            return Err(invalid().into());
        }
        Self::new(value, dots.len() as u8).map_err(|_| invalid().into())
    }

    /// Length in ticks for a voice of the given resolution.
    pub fn ticks(&self, resolution: u64) -> Result<u64> {
        let value = self.value as u64;
        if resolution % (value << self.dots) != 0 {
            return Err(ValidationError::InvalidDuration(format!(
                "{} with {} dot(s) at resolution {}",
                self.value, self.dots, resolution
            ))
            .into());
        }
        let base = resolution / value;
        let mut ticks = base;
        let mut extra = base;
        for _ in 0..self.dots {
            extra /= 2;
            ticks += extra;
        }
        Ok(ticks)
    }

    pub fn is_filled(&self) -> bool {
        self.value >= 4
    }

    pub fn has_stem(&self) -> bool {
        self.value >= 2
    }

    pub fn flag_count(&self) -> usize {
        match self.value {
            8 => 1,
            16 => 2,
            32 => 3,
            64 => 4,
            _ => 0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Pitches and accidentals
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccidentalType {
    Sharp,
    Flat,
    Natural,
    DoubleSharp,
    DoubleFlat,
}

impl AccidentalType {
    pub fn from_code(code: &str) -> Result<Self> {
        Ok(match code {
            "#" => Self::Sharp,
            "b" => Self::Flat,
            "n" => Self::Natural,
            "##" => Self::DoubleSharp,
            "bb" => Self::DoubleFlat,
            other => return Err(LookupError::Accidental(other.to_string()).into()),
        })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Sharp => "#",
            Self::Flat => "b",
            Self::Natural => "n",
            Self::DoubleSharp => "##",
            Self::DoubleFlat => "bb",
        }
    }
}

/// Octaves accepted in key notation.
pub const MIN_OCTAVE: i32 = 0;
pub const MAX_OCTAVE: i32 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    /// Uppercase step letter, `C` through `B`
    pub step: char,
    pub accidental: Option<AccidentalType>,
    pub octave: i32,
}

impl Pitch {
    /// Parse `step[accidental]/octave`, e.g. `c/4`, `f#/5`, `bb/3`.
    pub fn parse(key: &str) -> Result<Self> {
        let invalid = || ValidationError::InvalidKey(key.to_string());
        let (name, octave) = key.trim().split_once('/').ok_or_else(invalid)?;
        let octave: i32 = octave.trim().parse().map_err(|_| invalid())?;
        if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
            return Err(invalid().into());
        }

        let mut chars = name.chars();
        let step = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        if !matches!(step, 'A'..='G') {
            return Err(invalid().into());
        }
        let rest: String = chars.collect();
        let accidental = if rest.is_empty() {
            None
        } else {
            Some(AccidentalType::from_code(&rest).map_err(|_| invalid())?)
        };

        Ok(Self { step, accidental, octave })
    }

    fn step_index(&self) -> i32 {
        match self.step {
            'C' => 0,
            'D' => 1,
            'E' => 2,
            'F' => 3,
            'G' => 4,
            'A' => 5,
            _ => 6,
        }
    }

    /// Staff line under the given clef. Line 1 is the bottom line of a five
    /// line stave; half values are spaces.
    pub fn line(&self, clef: ClefKind) -> f64 {
        let treble = (self.octave * 7 + self.step_index() - 28) as f64 / 2.0;
        treble + clef.line_shift()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Clefs, keys, time signatures
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClefKind {
    #[default]
    Treble,
    Bass,
    Alto,
    Tenor,
    Percussion,
    Tab,
}

impl ClefKind {
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "treble" => Self::Treble,
            "bass" => Self::Bass,
            "alto" => Self::Alto,
            "tenor" => Self::Tenor,
            "percussion" => Self::Percussion,
            "tab" => Self::Tab,
            other => return Err(LookupError::Clef(other.to_string()).into()),
        })
    }

    pub fn line_shift(&self) -> f64 {
        match self {
            Self::Bass => 6.0,
            Self::Alto => 3.0,
            Self::Tenor => 4.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSymbol {
    Common,
    CutCommon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub beats: u32,
    pub beat_value: u32,
    pub symbol: Option<TimeSymbol>,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { beats: 4, beat_value: 4, symbol: None }
    }
}

impl TimeSignature {
    pub fn new(beats: u32, beat_value: u32) -> Self {
        Self { beats, beat_value, symbol: None }
    }

    /// Parse `N/D`, `C` (common time) or `C|` (cut time).
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        match spec {
            "C" => return Ok(Self { beats: 4, beat_value: 4, symbol: Some(TimeSymbol::Common) }),
            "C|" => return Ok(Self { beats: 2, beat_value: 2, symbol: Some(TimeSymbol::CutCommon) }),
            _ => {}
        }
        let invalid = || ValidationError::InvalidTimeSignature(spec.to_string());
        let (beats, value) = spec.split_once('/').ok_or_else(invalid)?;
        let beats: u32 = beats.trim().parse().map_err(|_| invalid())?;
        let beat_value: u32 = value.trim().parse().map_err(|_| invalid())?;
        let time = Self::new(beats, beat_value);
        time.validate().map_err(|_| invalid())?;
        Ok(time)
    }

    /// Beats must be positive and the beat value a power of two.
    pub fn validate(&self) -> Result<()> {
        if self.beats == 0 || !self.beat_value.is_power_of_two() {
            return Err(ValidationError::InvalidTimeSignature(format!("{}/{}", self.beats, self.beat_value)).into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeySignature {
    /// Positive for sharps, negative for flats
    pub fifths: i8,
}

const MAJOR_KEYS: [(&str, i8); 15] = [
    ("Cb", -7), ("Gb", -6), ("Db", -5), ("Ab", -4), ("Eb", -3), ("Bb", -2), ("F", -1),
    ("C", 0), ("G", 1), ("D", 2), ("A", 3), ("E", 4), ("B", 5), ("F#", 6), ("C#", 7),
];

const MINOR_KEYS: [(&str, i8); 15] = [
    ("Abm", -7), ("Ebm", -6), ("Bbm", -5), ("Fm", -4), ("Cm", -3), ("Gm", -2), ("Dm", -1),
    ("Am", 0), ("Em", 1), ("Bm", 2), ("F#m", 3), ("C#m", 4), ("G#m", 5), ("D#m", 6), ("A#m", 7),
];

impl KeySignature {
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        MAJOR_KEYS
            .iter()
            .chain(MINOR_KEYS.iter())
            .find(|(name, _)| *name == spec)
            .map(|&(_, fifths)| Self { fifths })
            .ok_or_else(|| ValidationError::InvalidKeySignature(spec.to_string()).into())
    }

    pub fn accidental_count(&self) -> usize {
        self.fifths.unsigned_abs() as usize
    }

    pub fn accidental(&self) -> Option<AccidentalType> {
        match self.fifths {
            0 => None,
            f if f > 0 => Some(AccidentalType::Sharp),
            _ => Some(AccidentalType::Flat),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Bars, repeats, stems
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarType {
    #[default]
    Single,
    Double,
    End,
    RepeatBegin,
    RepeatEnd,
    RepeatBoth,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatKind {
    Segno,
    Coda,
    DaCapo,
    DalSegno,
    Fine,
    ToCoda,
}

impl RepeatKind {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Segno | Self::Coda => None,
            Self::DaCapo => Some("D.C."),
            Self::DalSegno => Some("D.S."),
            Self::Fine => Some("Fine"),
            Self::ToCoda => Some("To Coda"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StemDirection {
    Up,
    Down,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn durations_parse_and_tick() {
        let q = Duration::parse("q").unwrap();
        assert_eq!(q.ticks(DEFAULT_RESOLUTION).unwrap(), 4096);
        let dotted = Duration::parse("q.").unwrap();
        assert_eq!(dotted.dots, 1);
        assert_eq!(dotted.ticks(DEFAULT_RESOLUTION).unwrap(), 6144);
        assert_eq!(Duration::parse("8dd").unwrap().ticks(DEFAULT_RESOLUTION).unwrap(), 2048 + 1024 + 512);
        assert_eq!(Duration::parse("w").unwrap().ticks(4).unwrap(), 4);
        assert!(Duration::parse("x").is_err());
        assert!(Duration::parse("3").is_err());
        assert!(Duration::parse("16").unwrap().ticks(4).is_err());
    }

    #[test]
    fn pitch_lines_follow_clef() {
        let c4 = Pitch::parse("c/4").unwrap();
        assert_eq!(c4.line(ClefKind::Treble), 0.0);
        assert_eq!(c4.line(ClefKind::Alto), 3.0);
        assert_eq!(c4.line(ClefKind::Bass), 6.0);
        assert_eq!(Pitch::parse("e/4").unwrap().line(ClefKind::Treble), 1.0);
        assert_eq!(Pitch::parse("f/5").unwrap().line(ClefKind::Treble), 5.0);

        let fs = Pitch::parse("F#/5").unwrap();
        assert_eq!(fs.accidental, Some(AccidentalType::Sharp));
        assert!(Pitch::parse("h/4").is_err());
        assert!(Pitch::parse("c4").is_err());
        assert!(Pitch::parse("cx/4").is_err());
    }

    #[test]
    fn octaves_outside_the_keyboard_are_rejected() {
        assert_eq!(
            Pitch::parse("c/999999999").unwrap_err(),
            ValidationError::InvalidKey("c/999999999".to_string()).into()
        );
        assert!(Pitch::parse("a/-1").is_err());
        assert_eq!(Pitch::parse("b/9").unwrap().line(ClefKind::Treble), 20.5);
    }

    #[test]
    fn time_and_key_signatures() {
        assert_eq!(TimeSignature::parse("3/4").unwrap(), TimeSignature::new(3, 4));
        assert_eq!(TimeSignature::parse("C").unwrap().symbol, Some(TimeSymbol::Common));
        assert!(matches!(
            TimeSignature::parse("four/4"),
            Err(crate::error::EngineError::Validation(ValidationError::InvalidTimeSignature(_)))
        ));
        assert!(TimeSignature::parse("3/5").is_err());
        assert!(TimeSignature::parse("0/4").is_err());
        assert!(TimeSignature::new(4, 0).validate().is_err());

        assert_eq!(KeySignature::parse("Bb").unwrap().fifths, -2);
        assert_eq!(KeySignature::parse("F#m").unwrap().fifths, 3);
        assert!(KeySignature::parse("H").is_err());
    }
}
