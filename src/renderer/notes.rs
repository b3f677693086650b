//! Note head, stem, flag, rest, tablature, ledger line and beam rendering.

use crate::glyphs::Glyph;
use crate::model::{ClefKind, StemDirection};
use super::constants::*;
use super::{with_pen, FontSpec, Point, RenderContext, TextAnchor};

/// Resolved drawing geometry of one note, taken from its formatted position
/// and its stave.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NoteGeometry {
    /// Left edge of the note head column
    pub x: f64,
    pub head_width: f64,
    /// Head y per key, in key order
    pub ys: Vec<f64>,
    pub stem: StemDirection,
    /// The stem direction was set explicitly rather than derived from pitch
    pub stem_forced: bool,
    pub scale: f64,
    pub stave_top: f64,
    pub stave_bottom: f64,
    pub space: f64,
    pub clef: ClefKind,
}

impl NoteGeometry {
    /// Y of a note line on the note's stave.
    pub fn y_for_line(&self, line: f64) -> f64 {
        self.stave_bottom - (line - 1.0) * self.space
    }

    pub fn top_head(&self) -> f64 {
        self.ys.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn bottom_head(&self) -> f64 {
        self.ys.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.head_width / 2.0
    }

    pub fn stem_x(&self, dir: StemDirection) -> f64 {
        let half = STEM_WIDTH * self.scale / 2.0;
        match dir {
            StemDirection::Up => self.x + self.head_width - half,
            StemDirection::Down => self.x + half,
        }
    }

    /// Where the stem leaves the chord.
    pub fn stem_base(&self, dir: StemDirection) -> f64 {
        match dir {
            StemDirection::Up => self.bottom_head(),
            StemDirection::Down => self.top_head(),
        }
    }

    /// Unbeamed stem end; extra length keeps flags clear of the heads.
    pub fn stem_tip(&self, dir: StemDirection, flags: usize) -> f64 {
        let extra = match flags {
            2 => 4.0,
            3 => 9.0,
            4 => 13.0,
            _ => 0.0,
        };
        let len = (STEM_LENGTH + extra) * self.scale;
        match dir {
            StemDirection::Up => self.top_head() - len,
            StemDirection::Down => self.bottom_head() + len,
        }
    }

    /// Highest point the note occupies, stem included when it has one.
    pub fn extent_top(&self, stemmed: bool) -> f64 {
        let top = self.top_head() - self.space / 2.0;
        if stemmed && self.stem == StemDirection::Up {
            top.min(self.stem_tip(StemDirection::Up, 0))
        } else {
            top
        }
    }

    pub fn extent_bottom(&self, stemmed: bool) -> f64 {
        let bottom = self.bottom_head() + self.space / 2.0;
        if stemmed && self.stem == StemDirection::Down {
            bottom.max(self.stem_tip(StemDirection::Down, 0))
        } else {
            bottom
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Heads, stems, flags
// ═══════════════════════════════════════════════════════════════════════

pub(crate) fn draw_ledger_lines(ctx: &mut dyn RenderContext, geom: &NoteGeometry) {
    let x1 = geom.x - LEDGER_LINE_EXTEND * geom.scale;
    let x2 = geom.x + geom.head_width + LEDGER_LINE_EXTEND * geom.scale;
    let space = geom.space;
    let top = geom.top_head();
    let bottom = geom.bottom_head();

    with_pen(ctx, STAFF_COLOR, LEDGER_LINE_WIDTH, |ctx| {
        if top < geom.stave_top {
            let mut y = geom.stave_top - space;
            while y >= top - 1.0 {
                ctx.line(x1, y, x2, y);
                y -= space;
            }
        }
        if bottom > geom.stave_bottom {
            let mut y = geom.stave_bottom + space;
            while y <= bottom + 1.0 {
                ctx.line(x1, y, x2, y);
                y += space;
            }
        }
    });
}

/// Draw every head of a chord. A head a second away from the previous one
/// flips to the other side of the stem.
pub(crate) fn draw_note_heads(ctx: &mut dyn RenderContext, geom: &NoteGeometry, glyph: Glyph, filled: bool) {
    let mut ys = geom.ys.clone();
    ys.sort_by(|a, b| b.total_cmp(a));

    let half_space = geom.space / 2.0;
    let mut previous: Option<(f64, bool)> = None;
    for y in ys {
        let displaced = match previous {
            Some((prev_y, prev_displaced)) => !prev_displaced && (prev_y - y - half_space).abs() < 0.01,
            None => false,
        };
        let x = match (displaced, geom.stem) {
            (false, _) => geom.x,
            (true, StemDirection::Up) => geom.x + geom.head_width,
            (true, StemDirection::Down) => geom.x - geom.head_width,
        };
        ctx.glyph(glyph, x, y, geom.scale, filled);
        previous = Some((y, displaced));
    }
}

pub(crate) fn draw_stem(ctx: &mut dyn RenderContext, geom: &NoteGeometry, flags: usize) {
    let dir = geom.stem;
    let x = geom.stem_x(dir);
    let tip = geom.stem_tip(dir, flags);
    with_pen(ctx, NOTE_COLOR, STEM_WIDTH * geom.scale, |ctx| {
        ctx.line(x, geom.stem_base(dir), x, tip);
    });

    let glyph = match dir {
        StemDirection::Up => Glyph::Flag8thUp,
        StemDirection::Down => Glyph::Flag8thDown,
    };
    for i in 0..flags {
        let offset = i as f64 * FLAG_SPACING * geom.scale;
        let y = match dir {
            StemDirection::Up => tip + offset,
            StemDirection::Down => tip - offset,
        };
        ctx.glyph(glyph, x - STEM_WIDTH * geom.scale / 2.0, y, geom.scale, true);
    }
}

pub(crate) fn draw_rest(ctx: &mut dyn RenderContext, glyph: Glyph, x: f64, y: f64, scale: f64) {
    ctx.glyph(glyph, x, y, scale, true);
}

/// Fret numbers sit on their string with the line blanked out behind them.
pub(crate) fn draw_tab_positions(
    ctx: &mut dyn RenderContext,
    x: f64,
    width: f64,
    positions: &[(f64, &str)],
    scale: f64,
) {
    let font = FontSpec::sized(ctx, TAB_FRET_POINT * scale).anchored(TextAnchor::Middle);
    let center = x + width / 2.0;
    let half_height = TAB_FRET_POINT * scale / 2.0;
    for &(y, fret) in positions {
        let previous = ctx.fill_style().to_string();
        ctx.set_fill_style("#ffffff");
        ctx.rect(x, y - half_height, width, half_height * 2.0);
        ctx.set_fill_style(&previous);
        ctx.text(center, y + half_height * 0.7, fret, &font);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Beams
// ═══════════════════════════════════════════════════════════════════════

/// Draw stems and beams for a group of notes. Each entry carries the note
/// geometry and the number of beams that note needs.
pub(crate) fn draw_beam(ctx: &mut dyn RenderContext, notes: &[(NoteGeometry, usize)]) {
    let (Some((first, _)), Some((last, _))) = (notes.first(), notes.last()) else {
        return;
    };
    if notes.len() < 2 {
        return;
    }

    let stem_up = if first.stem_forced {
        first.stem == StemDirection::Up
    } else {
        let avg_y = notes.iter().map(|(g, _)| (g.top_head() + g.bottom_head()) / 2.0).sum::<f64>()
            / notes.len() as f64;
        let middle_line = (first.stave_top + first.stave_bottom) / 2.0;
        avg_y >= middle_line
    };
    let dir = if stem_up { StemDirection::Up } else { StemDirection::Down };
    let scale = first.scale;

    let first_x = first.stem_x(dir);
    let last_x = last.stem_x(dir);
    let first_end = first.stem_tip(dir, 0);
    let last_end = last.stem_tip(dir, 0);
    let beam_dx = last_x - first_x;

    let slope = if beam_dx.abs() > 0.1 {
        ((last_end - first_end) / beam_dx).clamp(-MAX_BEAM_SLOPE, MAX_BEAM_SLOPE)
    } else {
        0.0
    };
    let beam_y = |sx: f64| first_end + slope * (sx - first_x);

    // Lift the whole beam until every stem reaches the minimum length.
    let min_stem = MIN_BEAMED_STEM * scale;
    let mut beam_shift = 0.0_f64;
    for (g, _) in notes {
        let sx = g.stem_x(dir);
        let stem_len = (g.stem_base(dir) - (beam_y(sx) + beam_shift)).abs();
        if stem_len < min_stem {
            let needed = min_stem - stem_len;
            if stem_up {
                beam_shift -= needed;
            } else {
                beam_shift += needed;
            }
        }
    }
    let beam_y_adj = |sx: f64| beam_y(sx) + beam_shift;

    with_pen(ctx, NOTE_COLOR, STEM_WIDTH * scale, |ctx| {
        for (g, _) in notes {
            let sx = g.stem_x(dir);
            ctx.line(sx, g.stem_base(dir), sx, beam_y_adj(sx));
        }
    });

    let thickness = BEAM_THICKNESS * scale;
    let toward_heads = if stem_up { 1.0 } else { -1.0 };
    let max_level = notes.iter().map(|(_, beams)| *beams).max().unwrap_or(1).max(1);

    for level in 1..=max_level {
        let offset = (level - 1) as f64 * (BEAM_THICKNESS + BEAM_SPACING) * scale * toward_heads;
        let mut i = 0;
        while i < notes.len() {
            if notes[i].1 < level {
                i += 1;
                continue;
            }
            let start = i;
            while i + 1 < notes.len() && notes[i + 1].1 >= level {
                i += 1;
            }
            let x1 = notes[start].0.stem_x(dir);
            let x2 = if i > start {
                notes[i].0.stem_x(dir)
            } else if start + 1 < notes.len() {
                x1 + 8.0 * scale
            } else {
                x1 - 8.0 * scale
            };
            let y1 = beam_y_adj(x1) + offset;
            let y2 = beam_y_adj(x2) + offset;
            ctx.polygon(&[
                Point::new(x1, y1),
                Point::new(x2, y2),
                Point::new(x2, y2 + thickness * toward_heads),
                Point::new(x1, y1 + thickness * toward_heads),
            ]);
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawOp, RecordingContext};

    fn geom(x: f64, ys: Vec<f64>, stem: StemDirection) -> NoteGeometry {
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
    fn ledger_lines_above_and_below() {
        let mut ctx = RecordingContext::new();
        draw_ledger_lines(&mut ctx, &geom(0.0, vec![-20.0], StemDirection::Down));
        assert_eq!(ctx.len(), 2);
        ctx.clear();
        draw_ledger_lines(&mut ctx, &geom(0.0, vec![50.0], StemDirection::Up));
        assert_eq!(ctx.len(), 1);
        ctx.clear();
        draw_ledger_lines(&mut ctx, &geom(0.0, vec![20.0], StemDirection::Up));
        assert!(ctx.is_empty());
    }

    #[test]
    fn seconds_displace_heads() {
        let mut ctx = RecordingContext::new();
        draw_note_heads(&mut ctx, &geom(100.0, vec![30.0, 25.0], StemDirection::Up), Glyph::NoteheadBlack, true);
        let xs: Vec<f64> = ctx.glyphs().map(|(_, x, _)| x).collect();
        assert_eq!(xs.len(), 2);
        assert_eq!(xs[0], 100.0);
        assert!((xs[1] - 111.8).abs() < 1e-9);
    }

    #[test]
    fn beam_keeps_minimum_stem_and_draws_secondary_level() {
        let mut ctx = RecordingContext::new();
        let notes = vec![
            (geom(0.0, vec![30.0], StemDirection::Up), 2),
            (geom(30.0, vec![35.0], StemDirection::Up), 1),
            (geom(60.0, vec![-30.0], StemDirection::Up), 1),
        ];
        draw_beam(&mut ctx, &notes);

        let polygons = ctx.ops().iter().filter(|op| matches!(op, DrawOp::Polygon(_))).count();
        assert_eq!(polygons, 2);
        for op in ctx.ops() {
            if let DrawOp::Line { y1, y2, .. } = op {
                assert!((y1 - y2).abs() >= MIN_BEAMED_STEM - 1e-9);
            }
        }
    }
}
