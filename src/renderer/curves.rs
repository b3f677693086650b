//! Tie, slur and tuplet bracket rendering.

use crate::model::StemDirection;
use super::constants::*;
use super::notes::NoteGeometry;
use super::{with_pen, FontSpec, Point, RenderContext, TextAnchor};

/// Curves bow away from the stem: above for stem-down notes, below otherwise.
fn bows_above(from: &NoteGeometry) -> bool {
    from.stem == StemDirection::Down
}

/// Tie between matching heads of two notes; one arc per shared key.
pub(crate) fn draw_tie(ctx: &mut dyn RenderContext, from: &NoteGeometry, to: &NoteGeometry) {
    let dir = if bows_above(from) { -1.0 } else { 1.0 };
    let s = from.scale;
    let sx = from.x + from.head_width + 2.0 * s;
    let ex = to.x - 2.0 * s;
    let height = CURVE_MIN_HEIGHT * s;

    with_pen(ctx, NOTE_COLOR, CURVE_THICKNESS, |ctx| {
        for (&y1, &y2) in from.ys.iter().zip(to.ys.iter()) {
            let sy = y1 + dir * CURVE_NOTEHEAD_Y_OFFSET * s;
            let ey = y2 + dir * CURVE_NOTEHEAD_Y_OFFSET * s;
            let control = Point::new((sx + ex) / 2.0, (sy + ey) / 2.0 + dir * height);
            ctx.quadratic_curve(Point::new(sx, sy), control, Point::new(ex, ey));
        }
    });
}

/// Slur from the outer head of one note to the outer head of another.
pub(crate) fn draw_curve(ctx: &mut dyn RenderContext, from: &NoteGeometry, to: &NoteGeometry) {
    let above = bows_above(from);
    let y_dir = if above { -1.0 } else { 1.0 };
    let s = from.scale;
    let outer = |g: &NoteGeometry| if above { g.top_head() } else { g.bottom_head() };

    let sx = from.center_x();
    let sy = outer(from) + y_dir * CURVE_NOTEHEAD_Y_OFFSET * s;
    let ex = to.center_x();
    let ey = outer(to) + y_dir * CURVE_NOTEHEAD_Y_OFFSET * s;

    let dx = (ex - sx).abs().max(1.0);
    let height = (dx * CURVE_HEIGHT_FACTOR).clamp(CURVE_MIN_HEIGHT * s, CURVE_MAX_HEIGHT * s);
    let mid_y = (sy + ey) / 2.0;

    let cp1 = Point::new(sx + dx * 0.25, mid_y + y_dir * height);
    let cp2 = Point::new(sx + dx * 0.75, mid_y + y_dir * height);

    // Two passes give the slur its tapered thickness.
    with_pen(ctx, NOTE_COLOR, 1.0, |ctx| {
        ctx.bezier_curve(Point::new(sx, sy), cp1, cp2, Point::new(ex, ey));
        let off = CURVE_THICKNESS * y_dir;
        ctx.bezier_curve(
            Point::new(sx, sy),
            Point::new(cp1.x, cp1.y + off),
            Point::new(cp2.x, cp2.y + off),
            Point::new(ex, ey),
        );
    });
}

/// Tuplet bracket over a run of notes with its label centred in a gap.
pub(crate) fn draw_bracket(ctx: &mut dyn RenderContext, notes: &[NoteGeometry], label: &str) {
    let (Some(first), Some(last)) = (notes.first(), notes.last()) else {
        return;
    };
    let s = first.scale;
    let above = first.stem == StemDirection::Up;
    let (y, hook) = if above {
        let top = notes.iter().map(|g| g.extent_top(true)).fold(first.stave_top, f64::min);
        (top - TEXT_LINE_HEIGHT * s, BRACKET_HOOK * s)
    } else {
        let bottom = notes.iter().map(|g| g.extent_bottom(true)).fold(first.stave_bottom, f64::max);
        (bottom + TEXT_LINE_HEIGHT * s, -BRACKET_HOOK * s)
    };

    let x1 = first.x;
    let x2 = last.x + last.head_width;
    let mid = (x1 + x2) / 2.0;
    let gap = (label.chars().count() as f64 * 4.0 + 4.0) * s;

    with_pen(ctx, NOTE_COLOR, 1.0, |ctx| {
        ctx.line(x1, y + hook, x1, y);
        ctx.line(x1, y, mid - gap, y);
        ctx.line(mid + gap, y, x2, y);
        ctx.line(x2, y, x2, y + hook);
    });
    let font = FontSpec::sized(ctx, ANNOTATION_POINT * s).styled("italic").anchored(TextAnchor::Middle);
    ctx.text(mid, y + ANNOTATION_POINT * s / 3.0, label, &font);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClefKind;
    use crate::renderer::{DrawOp, RecordingContext};

    fn note(x: f64, ys: Vec<f64>, stem: StemDirection) -> NoteGeometry {
        NoteGeometry {
            x,
            head_width: 11.8,
            ys,
            stem,
            stem_forced: false,
            scale: 1.0,
            stave_top: 0.0,
            stave_bottom: 40.0,
            space: 10.0,
            clef: ClefKind::Treble,
        }
    }

    #[test]
    fn tie_draws_one_arc_per_shared_key() {
        let mut ctx = RecordingContext::new();
        let a = note(0.0, vec![30.0, 20.0], StemDirection::Up);
        let b = note(50.0, vec![30.0, 20.0], StemDirection::Up);
        draw_tie(&mut ctx, &a, &b);
        assert_eq!(ctx.len(), 2);
        assert!(ctx.ops().iter().all(|op| matches!(op, DrawOp::Quadratic { .. })));
    }

    #[test]
    fn slur_bows_away_from_stems() {
        let mut ctx = RecordingContext::new();
        let a = note(0.0, vec![10.0], StemDirection::Down);
        let b = note(80.0, vec![10.0], StemDirection::Down);
        draw_curve(&mut ctx, &a, &b);
        match &ctx.ops()[0] {
            DrawOp::Bezier { from, c1, .. } => assert!(c1.y < from.y),
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn bracket_leaves_room_for_label() {
        let mut ctx = RecordingContext::new();
        let notes = vec![note(0.0, vec![30.0], StemDirection::Up), note(40.0, vec![30.0], StemDirection::Up)];
        draw_bracket(&mut ctx, &notes, "3");
        assert_eq!(ctx.texts().collect::<Vec<_>>(), vec!["3"]);
        assert_eq!(ctx.len(), 5);
    }
}
