//! Error taxonomy for layout and rendering.
//!
//! Every error is raised synchronously at the point of violation. Nothing is
//! retried internally; a failed draw leaves the session unusable until
//! [`Session::reset`](crate::pipeline::Session::reset) is called.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level engine error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Missing or malformed construction data
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Malformed musical input
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation invoked out of order
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Unknown glyph, accidental, ornament or articulation code
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// The session was asked to draw without a render surface
    #[error("no render surface has been supplied")]
    MissingRenderSurface,

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("stave must have at least one line")]
    NoStaveLines,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("cannot parse time signature '{0}'")]
    InvalidTimeSignature(String),

    #[error("cannot parse duration '{0}'")]
    InvalidDuration(String),

    #[error("cannot parse note key '{0}'")]
    InvalidKey(String),

    #[error("cannot parse key signature '{0}'")]
    InvalidKeySignature(String),

    #[error("a note needs at least one key")]
    EmptyChord,

    #[error("voice overflow: {used} ticks used, adding {adding} exceeds capacity {capacity}")]
    VoiceOverflow { used: u64, adding: u64, capacity: u64 },

    #[error("incomplete voice: {used} of {capacity} ticks used")]
    IncompleteVoice { used: u64, capacity: u64 },

    #[error("resolution {resolution} is not divisible by beat value {beat_value}")]
    InvalidResolution { resolution: u64, beat_value: u32 },

    #[error("tuplet {num_notes}:{notes_occupied} does not divide {ticks} ticks evenly")]
    InvalidTuplet { num_notes: u32, notes_occupied: u32, ticks: u64 },

    #[error("modifier targets key {index} but the element has {keys} key(s)")]
    ModifierIndex { index: usize, keys: usize },

    #[error("spanner range {start}..{end} is empty or outside voice of {len} tickables")]
    SpannerRange { start: usize, end: usize, len: usize },

    #[error("{0} elements cannot be added to a voice")]
    NotTickable(&'static str),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    #[error("draw called without a bound render context")]
    MissingContext,

    #[error("{0} cannot be drawn without a stave")]
    MissingStave(&'static str),

    #[error("{0} drawn before it was formatted")]
    NotFormatted(&'static str),

    #[error("modifier metrics requested before pre-formatting")]
    UnformattedModifier,

    #[error("tick context metrics requested before pre-formatting")]
    UnformattedTick,

    #[error("time signature cannot change once tickables have been added")]
    TimeSignatureLocked,

    #[error("render context is already in use by another draw call")]
    ReentrantDraw,

    #[error("session is drawing or failed; call reset() first")]
    SessionBusy,

    #[error("no voice registered with id {0}")]
    UnknownVoice(usize),

    #[error("anchor refers to tickable {index} of voice {voice}, which does not exist")]
    UnknownAnchor { voice: usize, index: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("unknown glyph code '{0}'")]
    Glyph(String),

    #[error("unknown accidental code '{0}'")]
    Accidental(String),

    #[error("unknown ornament code '{0}'")]
    Ornament(String),

    #[error("unknown articulation code '{0}'")]
    Articulation(String),

    #[error("unknown clef '{0}'")]
    Clef(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_errors_convert_and_display() {
        let err: EngineError = ValidationError::VoiceOverflow { used: 16384, adding: 4096, capacity: 16384 }.into();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "validation error: voice overflow: 16384 ticks used, adding 4096 exceeds capacity 16384"
        );

        let err: EngineError = StateError::MissingStave("note").into();
        assert_eq!(err.to_string(), "state error: note cannot be drawn without a stave");
    }
}
