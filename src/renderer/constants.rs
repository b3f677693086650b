//! Shared drawing constants (pixels at a staff space of 10).

// ── Staff ───────────────────────────────────────────────────────────
pub(crate) const STAFF_LINE_WIDTH: f64 = 0.8;
pub(crate) const BARLINE_WIDTH: f64 = 1.0;
pub(crate) const THICK_BARLINE_WIDTH: f64 = 3.0;
pub(crate) const BRACE_WIDTH: f64 = 10.0; // horizontal reach of a brace

// ── Notes ───────────────────────────────────────────────────────────
pub(crate) const STEM_LENGTH: f64 = 35.0;
pub(crate) const STEM_WIDTH: f64 = 1.2;
pub(crate) const MIN_BEAMED_STEM: f64 = 18.0;
pub(crate) const BEAM_THICKNESS: f64 = 4.0;
pub(crate) const BEAM_SPACING: f64 = 3.0;
pub(crate) const MAX_BEAM_SLOPE: f64 = 0.5;
pub(crate) const FLAG_SPACING: f64 = 6.0;
pub(crate) const LEDGER_LINE_WIDTH: f64 = 0.8;
pub(crate) const LEDGER_LINE_EXTEND: f64 = 3.0; // how far ledger lines extend past notehead

// ── Curves ──────────────────────────────────────────────────────────
pub(crate) const CURVE_NOTEHEAD_Y_OFFSET: f64 = 5.0;
pub(crate) const CURVE_THICKNESS: f64 = 1.5;
pub(crate) const CURVE_HEIGHT_FACTOR: f64 = 0.15;
pub(crate) const CURVE_MIN_HEIGHT: f64 = 5.0;
pub(crate) const CURVE_MAX_HEIGHT: f64 = 25.0;
pub(crate) const BRACKET_HOOK: f64 = 5.0;

// ── Text ────────────────────────────────────────────────────────────
pub(crate) const TEXT_LINE_HEIGHT: f64 = 10.0;
pub(crate) const TAB_FRET_POINT: f64 = 10.0;
pub(crate) const ANNOTATION_POINT: f64 = 10.0;

// ── Colors ──────────────────────────────────────────────────────────
pub(crate) const NOTE_COLOR: &str = "#1a1a1a";
pub(crate) const STAFF_COLOR: &str = "#555555";
pub(crate) const BARLINE_COLOR: &str = "#333333";
