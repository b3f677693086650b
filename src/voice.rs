//! Voices: ordered tickables with tick accounting against a time signature.

use std::ops::Range;

use crate::element::{DrawScope, Drawable, Element, ElementKind};
use crate::error::{Result, StateError, ValidationError};
use crate::model::{TimeSignature, DEFAULT_RESOLUTION};
use crate::renderer::SharedContext;
use crate::stave::StaveHandle;

/// Index of a voice within its drawing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceMode {
    /// Total ticks must match the capacity exactly
    #[default]
    Strict,
    /// No tick accounting against capacity
    Soft,
}

#[derive(Debug)]
pub struct Voice {
    time: TimeSignature,
    resolution: u64,
    mode: VoiceMode,
    tickables: Vec<Element>,
    /// Ticks per tickable, parallel to `tickables`
    ticks: Vec<u64>,
    ticks_used: u64,
}

impl Voice {
    pub fn new(time: TimeSignature) -> Result<Self> {
        Self::with_resolution(time, DEFAULT_RESOLUTION)
    }

    /// A voice whose ticks-per-whole-note is `resolution`. Triplets need a
    /// resolution divisible by three.
    pub fn with_resolution(time: TimeSignature, resolution: u64) -> Result<Self> {
        time.validate()?;
        if resolution == 0 || resolution % time.beat_value as u64 != 0 {
            return Err(ValidationError::InvalidResolution { resolution, beat_value: time.beat_value }.into());
        }
        Ok(Self {
            time,
            resolution,
            mode: VoiceMode::Strict,
            tickables: Vec::new(),
            ticks: Vec::new(),
            ticks_used: 0,
        })
    }

    /// Shorthand for `Voice::new(TimeSignature::parse(spec)?)`.
    pub fn parse(spec: &str) -> Result<Self> {
        Self::new(TimeSignature::parse(spec)?)
    }

    pub fn with_mode(mut self, mode: VoiceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> VoiceMode {
        self.mode
    }

    pub fn time(&self) -> TimeSignature {
        self.time
    }

    pub fn set_time(&mut self, time: TimeSignature) -> Result<()> {
        if !self.tickables.is_empty() {
            return Err(StateError::TimeSignatureLocked.into());
        }
        time.validate()?;
        if self.resolution % time.beat_value as u64 != 0 {
            return Err(ValidationError::InvalidResolution {
                resolution: self.resolution,
                beat_value: time.beat_value,
            }
            .into());
        }
        self.time = time;
        Ok(())
    }

    pub fn resolution(&self) -> u64 {
        self.resolution
    }

    pub fn capacity(&self) -> u64 {
        self.time.beats as u64 * self.resolution / self.time.beat_value as u64
    }

    pub fn ticks_used(&self) -> u64 {
        self.ticks_used
    }

    pub fn is_complete(&self) -> bool {
        self.ticks_used == self.capacity()
    }

    /// Strict voices must be filled exactly.
    pub fn validate(&self) -> Result<()> {
        if self.mode == VoiceMode::Strict && !self.is_complete() {
            return Err(ValidationError::IncompleteVoice { used: self.ticks_used, capacity: self.capacity() }.into());
        }
        Ok(())
    }

    pub fn add_tickable(&mut self, tickable: Element) -> Result<&mut Self> {
        if !tickable.kind().is_tickable() {
            return Err(ValidationError::NotTickable(tickable.kind().name()).into());
        }
        let ticks = tickable.ticks(self.resolution)?;
        let capacity = self.capacity();
        if self.mode == VoiceMode::Strict && self.ticks_used + ticks > capacity {
            return Err(ValidationError::VoiceOverflow { used: self.ticks_used, adding: ticks, capacity }.into());
        }
        self.ticks_used += ticks;
        self.ticks.push(ticks);
        self.tickables.push(tickable);
        Ok(self)
    }

    pub fn add_tickables(&mut self, tickables: impl IntoIterator<Item = Element>) -> Result<&mut Self> {
        for tickable in tickables {
            self.add_tickable(tickable)?;
        }
        Ok(self)
    }

    pub fn tickables(&self) -> &[Element] {
        &self.tickables
    }

    pub fn tickable_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.tickables.get_mut(index)
    }

    /// Ticks taken by the tickable at `index`.
    pub fn tickable_ticks(&self, index: usize) -> u64 {
        self.ticks.get(index).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.tickables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickables.is_empty()
    }

    // ── Spanners ────────────────────────────────────────────────────

    fn check_range(&self, range: &Range<usize>, min_len: usize) -> Result<()> {
        let in_bounds = range.start < range.end && range.end <= self.tickables.len();
        let all_notes = in_bounds
            && self.tickables[range.clone()].iter().all(|t| matches!(t.kind(), ElementKind::Note(_)));
        if !all_notes || range.len() < min_len {
            return Err(ValidationError::SpannerRange {
                start: range.start,
                end: range.end,
                len: self.tickables.len(),
            }
            .into());
        }
        Ok(())
    }

    /// Beam the notes in `range`; their stems and flags are left to the
    /// returned beam, which goes in the render queue.
    pub fn create_beam(&mut self, id: VoiceId, range: Range<usize>) -> Result<Element> {
        self.check_range(&range, 2)?;
        for note in &mut self.tickables[range.clone()] {
            note.set_beamed(true);
        }
        Ok(Element::beam(id, range))
    }

    /// Tuplet bracket over the notes in `range`, labelled with the tuplet's
    /// note count.
    pub fn create_bracket(&self, id: VoiceId, range: Range<usize>) -> Result<Element> {
        self.check_range(&range, 1)?;
        let label = self.tickables[range.start]
            .tuplet()
            .map_or_else(|| range.len().to_string(), |(num_notes, _)| num_notes.to_string());
        Ok(Element::bracket(id, range, label))
    }

    // ── Binding and render state ────────────────────────────────────

    pub fn set_stave(&mut self, stave: &StaveHandle) -> &mut Self {
        for t in &mut self.tickables {
            t.set_stave(stave);
        }
        self
    }

    pub fn set_context(&mut self, context: &SharedContext) -> &mut Self {
        for t in &mut self.tickables {
            t.set_context(context.clone());
        }
        self
    }

    pub fn mark_rendered(&mut self) {
        for t in &mut self.tickables {
            t.mark_rendered();
        }
    }

    pub(crate) fn tickables_mut(&mut self) -> &mut [Element] {
        &mut self.tickables
    }
}

impl Drawable for Voice {
    fn pre_format(&mut self) -> Result<()> {
        self.tickables.iter_mut().try_for_each(|t| t.pre_format())
    }

    /// Draw every tickable in order; the first failure aborts the voice.
    fn draw(&self, scope: &DrawScope<'_>) -> Result<()> {
        self.tickables.iter().try_for_each(|t| t.draw(scope))
    }

    fn width(&self) -> f64 {
        self.tickables.iter().map(|t| t.width()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::model::BarType;
    use pretty_assertions::assert_eq;

    fn quarter(key: &str) -> Element {
        Element::note(&[key], "q").unwrap()
    }

    #[test]
    fn strict_voice_rejects_overflow() {
        let mut voice = Voice::parse("4/4").unwrap();
        assert_eq!(voice.capacity(), 16384);
        voice.add_tickables(["c/4", "d/4", "e/4", "f/4"].map(quarter)).unwrap();
        assert!(voice.is_complete());

        let err = voice.add_tickable(quarter("g/4")).unwrap_err();
        assert_eq!(err, ValidationError::VoiceOverflow { used: 16384, adding: 4096, capacity: 16384 }.into());
        assert_eq!(voice.len(), 4);
        voice.validate().unwrap();
    }

    #[test]
    fn malformed_time_signature_is_rejected() {
        let err = Voice::new(TimeSignature::new(4, 0)).unwrap_err();
        assert_eq!(err, ValidationError::InvalidTimeSignature("4/0".to_string()).into());

        let mut voice = Voice::parse("4/4").unwrap();
        assert!(voice.set_time(TimeSignature::new(3, 0)).is_err());
        assert!(voice.set_time(TimeSignature::new(0, 4)).is_err());
        assert_eq!(voice.time(), TimeSignature::new(4, 4));
    }

    #[test]
    fn soft_voices_ignore_capacity() {
        let mut voice = Voice::parse("2/4").unwrap().with_mode(VoiceMode::Soft);
        voice.add_tickables(["c/4", "d/4", "e/4"].map(quarter)).unwrap();
        assert_eq!(voice.ticks_used(), 12288);
        voice.validate().unwrap();
    }

    #[test]
    fn incomplete_strict_voice_fails_validation() {
        let mut voice = Voice::parse("3/4").unwrap();
        voice.add_tickable(quarter("c/4")).unwrap();
        assert!(matches!(voice.validate(), Err(EngineError::Validation(ValidationError::IncompleteVoice { .. }))));
    }

    #[test]
    fn time_signature_locks_after_first_tickable() {
        let mut voice = Voice::parse("4/4").unwrap();
        voice.set_time(TimeSignature::new(3, 4)).unwrap();
        voice.add_tickable(Element::bar(BarType::Single)).unwrap();
        assert_eq!(voice.ticks_used(), 0);
        assert_eq!(voice.set_time(TimeSignature::new(2, 4)).unwrap_err(), StateError::TimeSignatureLocked.into());
    }

    #[test]
    fn resolution_must_divide_beat_value() {
        assert!(matches!(
            Voice::with_resolution(TimeSignature::new(3, 8), 12),
            Err(EngineError::Validation(ValidationError::InvalidResolution { resolution: 12, beat_value: 8 }))
        ));
    }

    #[test]
    fn beams_take_over_stems() {
        let mut voice = Voice::parse("2/4").unwrap();
        voice.add_tickables(["c/5", "d/5", "e/5", "f/5"].map(|k| Element::note(&[k], "8").unwrap())).unwrap();
        let beam = voice.create_beam(VoiceId(0), 0..4).unwrap();
        assert_eq!(beam.kind(), &ElementKind::Beam { voice: VoiceId(0), range: 0..4 });
        assert!(voice.tickables().iter().all(|t| matches!(t.kind(), ElementKind::Note(n) if n.beamed)));
        assert!(voice.create_beam(VoiceId(0), 3..4).is_err());
        assert!(voice.create_beam(VoiceId(0), 2..6).is_err());
    }

    #[test]
    fn spanners_are_not_tickables() {
        let mut voice = Voice::parse("4/4").unwrap();
        let beam = Element::beam(VoiceId(0), 0..2);
        assert_eq!(voice.add_tickable(beam).unwrap_err(), ValidationError::NotTickable("beam").into());
    }

    #[test]
    fn triplets_fill_a_beat() {
        let mut voice = Voice::with_resolution(TimeSignature::new(1, 4), 3 * DEFAULT_RESOLUTION).unwrap();
        for key in ["c/4", "d/4", "e/4"] {
            let mut note = Element::note(&[key], "8").unwrap();
            note.set_tuplet(3, 2).unwrap();
            voice.add_tickable(note).unwrap();
        }
        assert!(voice.is_complete());
        let bracket = voice.create_bracket(VoiceId(0), 0..3).unwrap();
        assert!(matches!(bracket.kind(), ElementKind::Bracket { label, .. } if label == "3"));
    }
}
