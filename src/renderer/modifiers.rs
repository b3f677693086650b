//! Modifier rendering. Placement comes from the modifier context; this
//! module only turns `x_shift`/`text_line` into coordinates around the host
//! note.

use crate::glyphs::Glyph;
use crate::modifier::{accidental_glyph, Modifier, ModifierKind, ModifierPosition, StrokeType, GRACE_SCALE};
use crate::stave::clef_glyph;
use super::constants::*;
use super::notes::NoteGeometry;
use super::staff::clef_line;
use super::{with_pen, FontSpec, Point, RenderContext, TextAnchor};

pub(crate) fn draw_modifier(ctx: &mut dyn RenderContext, geom: &NoteGeometry, stemmed: bool, modifier: &Modifier) {
    let s = geom.scale;
    let width = modifier.width(s);
    let head_y = geom.ys.get(modifier.index).copied().unwrap_or_else(|| geom.top_head());

    let x = match modifier.position {
        ModifierPosition::Left => geom.x - modifier.x_shift - width,
        ModifierPosition::Right => geom.x + geom.head_width + modifier.x_shift,
        ModifierPosition::Above | ModifierPosition::Below => geom.center_x() - width / 2.0 + modifier.x_shift,
    };
    let line_height = TEXT_LINE_HEIGHT * s;
    let y = match modifier.position {
        ModifierPosition::Left | ModifierPosition::Right => head_y,
        ModifierPosition::Above => {
            geom.stave_top.min(geom.extent_top(stemmed)) - line_height - modifier.text_line * line_height
        }
        ModifierPosition::Below => {
            geom.stave_bottom.max(geom.extent_bottom(stemmed)) + line_height + modifier.text_line * line_height
        }
    };

    match &modifier.kind {
        ModifierKind::Dot => {
            // Dots on a line move up into the space above.
            let steps = (geom.stave_bottom - head_y) / geom.space;
            let on_line = (steps - steps.round()).abs() < 0.01;
            let dot_y = if on_line { head_y - geom.space / 2.0 } else { head_y };
            ctx.glyph(Glyph::AugmentationDot, x, dot_y, s, true);
        }
        ModifierKind::Accidental(acc) => ctx.glyph(accidental_glyph(*acc), x, y, s, true),
        ModifierKind::Fingering(text) => {
            let font = FontSpec::sized(ctx, ANNOTATION_POINT * s * 0.9).styled("bold");
            ctx.text(x, y + 4.0 * s, text, &font);
        }
        ModifierKind::StringNumber(n) => {
            let font = FontSpec::sized(ctx, ANNOTATION_POINT * s).anchored(TextAnchor::Middle);
            ctx.text(x + width / 2.0, y + 4.0 * s, &n.to_string(), &font);
        }
        ModifierKind::Stroke(kind) => draw_stroke(ctx, geom, x + width / 2.0, *kind),
        ModifierKind::GraceNotes { keys, slash } => {
            let gs = s * GRACE_SCALE;
            let head = Glyph::NoteheadBlack.width() * gs;
            let mut gx = x;
            for key in keys {
                let gy = geom.y_for_line(key.line(geom.clef));
                ctx.glyph(Glyph::NoteheadBlack, gx, gy, gs, true);
                let stem_x = gx + head - STEM_WIDTH * gs / 2.0;
                with_pen(ctx, NOTE_COLOR, STEM_WIDTH * gs, |ctx| {
                    ctx.line(stem_x, gy, stem_x, gy - STEM_LENGTH * gs);
                });
                if *slash {
                    with_pen(ctx, NOTE_COLOR, STEM_WIDTH * gs, |ctx| {
                        ctx.line(stem_x - 4.0 * gs, gy - 12.0 * gs, stem_x + 4.0 * gs, gy - 20.0 * gs);
                    });
                }
                gx += head;
            }
        }
        ModifierKind::NoteSubGroup(clef) => {
            let gs = s * GRACE_SCALE;
            ctx.glyph(clef_glyph(*clef), x, geom.y_for_line(clef_line(*clef)), gs, true);
        }
        ModifierKind::Articulation(kind) => ctx.glyph(kind.glyph(), x, y, s, true),
        ModifierKind::Ornament { kind, .. } => ctx.glyph(kind.glyph(), x, y, s, true),
        ModifierKind::Annotation(text) => {
            let point = ctx.font().point * s;
            let font = FontSpec::sized(ctx, point).anchored(TextAnchor::Middle);
            ctx.text(geom.center_x() + modifier.x_shift, y, text, &font);
        }
        ModifierKind::Bend(text) => {
            let top = geom.stave_top - line_height - modifier.text_line * line_height;
            with_pen(ctx, NOTE_COLOR, 1.0, |ctx| {
                ctx.quadratic_curve(
                    Point::new(x, head_y),
                    Point::new(x + 6.0 * s, head_y),
                    Point::new(x + 8.0 * s, top),
                );
            });
            let font = FontSpec::sized(ctx, ANNOTATION_POINT * s);
            ctx.text(x + 8.0 * s, top - 2.0 * s, text, &font);
        }
        ModifierKind::Vibrato => {
            let wave = 4.0 * s;
            let mut vx = geom.x;
            let end = geom.x + geom.head_width + 10.0 * s;
            with_pen(ctx, NOTE_COLOR, 1.0, |ctx| {
                let mut up = true;
                while vx < end {
                    let peak = if up { y - 2.0 * s } else { y + 2.0 * s };
                    ctx.quadratic_curve(Point::new(vx, y), Point::new(vx + wave / 2.0, peak), Point::new(vx + wave, y));
                    vx += wave;
                    up = !up;
                }
            });
        }
    }
}

fn draw_stroke(ctx: &mut dyn RenderContext, geom: &NoteGeometry, x: f64, kind: StrokeType) {
    let top = geom.top_head() - geom.space / 2.0;
    let bottom = geom.bottom_head() + geom.space / 2.0;
    let s = geom.scale;
    match kind {
        StrokeType::Arpeggio => {
            with_pen(ctx, NOTE_COLOR, 1.0, |ctx| {
                let mut y = bottom;
                let mut left = true;
                while y > top {
                    let dx = if left { -2.0 * s } else { 2.0 * s };
                    ctx.quadratic_curve(Point::new(x, y), Point::new(x + dx, y - 2.0 * s), Point::new(x, y - 4.0 * s));
                    y -= 4.0 * s;
                    left = !left;
                }
            });
        }
        StrokeType::BrushUp | StrokeType::BrushDown => {
            with_pen(ctx, NOTE_COLOR, 1.0, |ctx| ctx.line(x, top, x, bottom));
            let (tip, dir) = match kind {
                StrokeType::BrushUp => (top, 1.0),
                _ => (bottom, -1.0),
            };
            ctx.polygon(&[
                Point::new(x, tip),
                Point::new(x - 2.5 * s, tip + 5.0 * s * dir),
                Point::new(x + 2.5 * s, tip + 5.0 * s * dir),
            ]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClefKind, StemDirection};
    use crate::renderer::RecordingContext;

    fn geom() -> NoteGeometry {
        NoteGeometry {
            x: 100.0,
            head_width: 11.8,
            ys: vec![30.0, 20.0],
            stem: StemDirection::Up,
            stem_forced: false,
            scale: 1.0,
            stave_top: 0.0,
            stave_bottom: 40.0,
            space: 10.0,
            clef: ClefKind::Treble,
        }
    }

    #[test]
    fn left_modifiers_sit_before_the_head() {
        let mut ctx = RecordingContext::new();
        let mut acc = Modifier::accidental("#", 1).unwrap();
        acc.x_shift = 2.0;
        draw_modifier(&mut ctx, &geom(), true, &acc);
        let (glyph, x, y) = ctx.glyphs().next().unwrap();
        assert_eq!(glyph, Glyph::AccidentalSharp);
        assert_eq!(x, 100.0 - 2.0 - 8.0);
        assert_eq!(y, 20.0);
    }

    #[test]
    fn dot_on_a_line_moves_into_the_space() {
        let mut ctx = RecordingContext::new();
        draw_modifier(&mut ctx, &geom(), true, &Modifier::dot(1));
        let (_, _, y) = ctx.glyphs().next().unwrap();
        assert_eq!(y, 15.0);
    }

    #[test]
    fn stacked_text_lines_climb() {
        let mut ctx = RecordingContext::new();
        let low = Modifier::annotation("p", 0);
        let mut high = Modifier::annotation("f", 0);
        high.text_line = 1.0;
        draw_modifier(&mut ctx, &geom(), false, &low);
        draw_modifier(&mut ctx, &geom(), false, &high);
        let ys: Vec<f64> = ctx
            .ops()
            .iter()
            .filter_map(|op| match op {
                crate::renderer::DrawOp::Text { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert!(ys[1] < ys[0]);
    }
}
