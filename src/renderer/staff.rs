//! Staff line, barline, clef, key/time signature, repeat and connector rendering.

use crate::glyphs::Glyph;
use crate::model::{BarType, ClefKind, KeySignature, RepeatKind, TimeSignature, TimeSymbol};
use crate::modifier::accidental_glyph;
use crate::stave::{clef_glyph, time_signature_width, Stave};
use crate::system::ConnectorType;
use super::constants::*;
use super::{with_pen, FontSpec, Point, RenderContext, TextAnchor};

// ═══════════════════════════════════════════════════════════════════════
// Staff lines and barlines
// ═══════════════════════════════════════════════════════════════════════

pub(crate) fn draw_staff_lines(ctx: &mut dyn RenderContext, stave: &Stave) {
    let (x1, x2) = (stave.x(), stave.end_x());
    with_pen(ctx, STAFF_COLOR, STAFF_LINE_WIDTH, |ctx| {
        for i in 0..stave.num_lines() {
            let y = stave.y_for_line(i as f64);
            ctx.line(x1, y, x2, y);
        }
    });
}

/// Draw a barline anchored at `x`. Closing styles extend to the left of the
/// anchor, opening repeats to the right.
pub(crate) fn draw_barline(ctx: &mut dyn RenderContext, stave: &Stave, x: f64, bar: BarType) {
    let s = stave.scale();
    match bar {
        BarType::None => {}
        BarType::Single => bar_stroke(ctx, stave, x, BARLINE_WIDTH),
        BarType::Double => {
            bar_stroke(ctx, stave, x - 3.0 * s, BARLINE_WIDTH);
            bar_stroke(ctx, stave, x, BARLINE_WIDTH);
        }
        BarType::End => {
            bar_stroke(ctx, stave, x - 5.0 * s, BARLINE_WIDTH);
            bar_stroke(ctx, stave, x, THICK_BARLINE_WIDTH * s);
        }
        BarType::RepeatBegin => {
            bar_stroke(ctx, stave, x, THICK_BARLINE_WIDTH * s);
            bar_stroke(ctx, stave, x + 5.0 * s, BARLINE_WIDTH);
            repeat_dots(ctx, stave, x + 10.0 * s);
        }
        BarType::RepeatEnd => {
            repeat_dots(ctx, stave, x - 10.0 * s);
            bar_stroke(ctx, stave, x - 5.0 * s, BARLINE_WIDTH);
            bar_stroke(ctx, stave, x, THICK_BARLINE_WIDTH * s);
        }
        BarType::RepeatBoth => {
            repeat_dots(ctx, stave, x - 10.0 * s);
            bar_stroke(ctx, stave, x - 5.0 * s, BARLINE_WIDTH);
            bar_stroke(ctx, stave, x, THICK_BARLINE_WIDTH * s);
            bar_stroke(ctx, stave, x + 5.0 * s, BARLINE_WIDTH);
            repeat_dots(ctx, stave, x + 10.0 * s);
        }
    }
}

fn bar_stroke(ctx: &mut dyn RenderContext, stave: &Stave, x: f64, width: f64) {
    let (top, bottom) = (stave.y(), stave.bottom_y());
    with_pen(ctx, BARLINE_COLOR, width, |ctx| ctx.line(x, top, x, bottom));
}

fn repeat_dots(ctx: &mut dyn RenderContext, stave: &Stave, x: f64) {
    let s = stave.scale();
    let mid = (stave.y() + stave.bottom_y()) / 2.0;
    for y in [mid - stave.space() / 2.0, mid + stave.space() / 2.0] {
        ctx.glyph(Glyph::AugmentationDot, x - 2.0 * s, y, s * 1.1, true);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Clefs and signatures
// ═══════════════════════════════════════════════════════════════════════

/// Note line a clef glyph is centred on.
pub(crate) fn clef_line(clef: ClefKind) -> f64 {
    match clef {
        ClefKind::Treble => 2.0,
        ClefKind::Bass | ClefKind::Tenor => 4.0,
        ClefKind::Alto | ClefKind::Percussion | ClefKind::Tab => 3.0,
    }
}

pub(crate) fn draw_clef(ctx: &mut dyn RenderContext, stave: &Stave, x: f64, clef: ClefKind, size: f64) {
    let scale = stave.scale() * size;
    let y = match clef {
        ClefKind::Tab => stave.y_for_line((stave.num_lines() as f64 - 1.0) / 2.0) + 4.0 * scale,
        other => stave.y_for_note_line(clef_line(other)),
    };
    ctx.glyph(clef_glyph(clef), x, y, scale, true);
}

/// Key signature accidental positions in half-space steps below the top
/// line, for a treble clef.
const SHARP_POSITIONS: [i32; 7] = [0, 3, -1, 2, 5, 1, 4];
const FLAT_POSITIONS: [i32; 7] = [4, 1, 5, 2, 6, 3, 7];

fn clef_offset(clef: ClefKind) -> i32 {
    match clef {
        ClefKind::Bass => 2,
        ClefKind::Alto => 1,
        ClefKind::Tenor => -1,
        _ => 0,
    }
}

pub(crate) fn key_signature_positions(key: &KeySignature, clef: ClefKind) -> Vec<i32> {
    let table = if key.fifths >= 0 { &SHARP_POSITIONS } else { &FLAT_POSITIONS };
    let offset = clef_offset(clef);
    table.iter().take(key.accidental_count().min(7)).map(|p| p + offset).collect()
}

pub(crate) fn draw_key_signature(ctx: &mut dyn RenderContext, stave: &Stave, x: f64, key: &KeySignature) {
    let Some(acc) = key.accidental() else {
        return;
    };
    let glyph = accidental_glyph(acc);
    let scale = stave.scale();
    let step = glyph.width() * scale;
    for (i, pos) in key_signature_positions(key, stave.clef()).into_iter().enumerate() {
        let y = stave.y() + pos as f64 * stave.space() / 2.0;
        ctx.glyph(glyph, x + i as f64 * step, y, scale, true);
    }
}

pub(crate) fn draw_time_signature(ctx: &mut dyn RenderContext, stave: &Stave, x: f64, time: &TimeSignature) {
    let scale = stave.scale();
    if let Some(symbol) = time.symbol {
        let glyph = match symbol {
            TimeSymbol::Common => Glyph::TimeSigCommon,
            TimeSymbol::CutCommon => Glyph::TimeSigCutCommon,
        };
        ctx.glyph(glyph, x, stave.y_for_line(3.0), scale, true);
        return;
    }

    let total = time_signature_width(time) * scale;
    let top_y = stave.y() + 2.0 * stave.space();
    let bottom_y = stave.y() + 4.0 * stave.space();
    draw_number(ctx, x, total, top_y, time.beats, scale);
    draw_number(ctx, x, total, bottom_y, time.beat_value, scale);
}

fn draw_number(ctx: &mut dyn RenderContext, x: f64, total: f64, y: f64, n: u32, scale: f64) {
    let digits: Vec<u8> = n.to_string().bytes().map(|b| b - b'0').collect();
    let advance = Glyph::TimeSigDigit(0).width() * scale;
    let mut dx = x + (total - digits.len() as f64 * advance) / 2.0;
    for d in digits {
        ctx.glyph(Glyph::TimeSigDigit(d), dx, y, scale, true);
        dx += advance;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Repeats and connectors
// ═══════════════════════════════════════════════════════════════════════

pub(crate) fn draw_repeat(ctx: &mut dyn RenderContext, stave: &Stave, x: f64, kind: RepeatKind) {
    let scale = stave.scale();
    let y = stave.y_for_line(-1.5);
    match kind {
        RepeatKind::Segno => ctx.glyph(Glyph::Segno, x, y, scale, true),
        RepeatKind::Coda => ctx.glyph(Glyph::Coda, x, y, scale, true),
        other => {
            if let Some(label) = other.label() {
                let font = FontSpec::sized(ctx, ANNOTATION_POINT * scale).styled("bold italic");
                ctx.text(x, y, label, &font);
            }
        }
    }
}

/// Draw a system connector spanning `top`..`bottom` at `x`.
pub(crate) fn draw_connector(ctx: &mut dyn RenderContext, kind: ConnectorType, x: f64, top: f64, bottom: f64) {
    let h = bottom - top;
    match kind {
        ConnectorType::SingleLeft | ConnectorType::SingleRight => {
            with_pen(ctx, BARLINE_COLOR, BARLINE_WIDTH, |ctx| ctx.line(x, top, x, bottom));
        }
        ConnectorType::Double => {
            with_pen(ctx, BARLINE_COLOR, BARLINE_WIDTH, |ctx| {
                ctx.line(x - 3.0, top, x - 3.0, bottom);
                ctx.line(x, top, x, bottom);
            });
        }
        ConnectorType::BoldDoubleRight => {
            with_pen(ctx, BARLINE_COLOR, BARLINE_WIDTH, |ctx| ctx.line(x - 5.0, top, x - 5.0, bottom));
            with_pen(ctx, BARLINE_COLOR, THICK_BARLINE_WIDTH, |ctx| ctx.line(x, top, x, bottom));
        }
        ConnectorType::Bracket => {
            let bx = x - BRACE_WIDTH / 2.0;
            with_pen(ctx, NOTE_COLOR, THICK_BARLINE_WIDTH, |ctx| ctx.line(bx, top, bx, bottom));
            with_pen(ctx, NOTE_COLOR, BARLINE_WIDTH, |ctx| {
                ctx.quadratic_curve(
                    Point::new(bx, top),
                    Point::new(bx + 2.0, top - 2.0),
                    Point::new(bx + BRACKET_HOOK * 2.0, top - BRACKET_HOOK),
                );
                ctx.quadratic_curve(
                    Point::new(bx, bottom),
                    Point::new(bx + 2.0, bottom + 2.0),
                    Point::new(bx + BRACKET_HOOK * 2.0, bottom + BRACKET_HOOK),
                );
            });
        }
        ConnectorType::Brace => {
            let mid_y = (top + bottom) / 2.0;
            let w = BRACE_WIDTH;
            let bx = x - 4.0;
            with_pen(ctx, NOTE_COLOR, 2.5, |ctx| {
                ctx.bezier_curve(
                    Point::new(bx, top),
                    Point::new(bx, top + h * 0.28),
                    Point::new(bx - w, mid_y - h * 0.08),
                    Point::new(bx - w, mid_y),
                );
                ctx.bezier_curve(
                    Point::new(bx - w, mid_y),
                    Point::new(bx - w, mid_y + h * 0.08),
                    Point::new(bx, bottom - h * 0.28),
                    Point::new(bx, bottom),
                );
            });
        }
    }
}

/// Label text placed left of a connector, e.g. an instrument name.
pub(crate) fn draw_connector_label(ctx: &mut dyn RenderContext, x: f64, top: f64, bottom: f64, label: &str) {
    let font = FontSpec::sized(ctx, ANNOTATION_POINT).anchored(TextAnchor::End);
    ctx.text(x - BRACE_WIDTH - 4.0, (top + bottom) / 2.0 + TEXT_LINE_HEIGHT / 3.0, label, &font);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingContext;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_signature_positions_follow_clef() {
        let d_major = KeySignature { fifths: 2 };
        assert_eq!(key_signature_positions(&d_major, ClefKind::Treble), vec![0, 3]);
        assert_eq!(key_signature_positions(&d_major, ClefKind::Bass), vec![2, 5]);
        let e_flat = KeySignature { fifths: -3 };
        assert_eq!(key_signature_positions(&e_flat, ClefKind::Tenor), vec![3, 0, 4]);
    }

    #[test]
    fn barline_styles_emit_expected_strokes() {
        let stave = Stave::new(0.0, 0.0, 200.0);
        let mut ctx = RecordingContext::new();
        draw_barline(&mut ctx, &stave, 200.0, BarType::End);
        assert_eq!(ctx.len(), 2);
        ctx.clear();
        draw_barline(&mut ctx, &stave, 0.0, BarType::RepeatBegin);
        assert_eq!(ctx.count_glyph(Glyph::AugmentationDot), 2);
        assert_eq!(ctx.len(), 4);
        ctx.clear();
        draw_barline(&mut ctx, &stave, 0.0, BarType::None);
        assert!(ctx.is_empty());
    }

    #[test]
    fn multi_digit_time_signature() {
        let stave = Stave::new(0.0, 0.0, 200.0);
        let mut ctx = RecordingContext::new();
        draw_time_signature(&mut ctx, &stave, 10.0, &TimeSignature::new(12, 8));
        assert_eq!(ctx.count_glyph(Glyph::TimeSigDigit(1)), 1);
        assert_eq!(ctx.count_glyph(Glyph::TimeSigDigit(2)), 1);
        assert_eq!(ctx.count_glyph(Glyph::TimeSigDigit(8)), 1);
    }
}
