//! Recording surface: keeps every primitive in order so callers can replay
//! or inspect what the engine drew.

use serde::{Deserialize, Serialize};

use crate::config::FontConfig;
use crate::glyphs::Glyph;
use super::constants::NOTE_COLOR;
use super::{FontSpec, Point, RenderContext};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawOp {
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Rect { x: f64, y: f64, width: f64, height: f64 },
    Polygon(Vec<Point>),
    Glyph { glyph: Glyph, x: f64, y: f64, scale: f64, filled: bool },
    Text { x: f64, y: f64, content: String },
    Bezier { from: Point, c1: Point, c2: Point, to: Point },
    Quadratic { from: Point, control: Point, to: Point },
}

#[derive(Debug, Clone)]
pub struct RecordingContext {
    ops: Vec<DrawOp>,
    fill: String,
    stroke: String,
    line_width: f64,
    font: FontConfig,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            fill: NOTE_COLOR.to_string(),
            stroke: NOTE_COLOR.to_string(),
            line_width: 1.0,
            font: FontConfig::default(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn glyphs(&self) -> impl Iterator<Item = (Glyph, f64, f64)> + '_ {
        self.ops.iter().filter_map(|op| match *op {
            DrawOp::Glyph { glyph, x, y, .. } => Some((glyph, x, y)),
            _ => None,
        })
    }

    pub fn count_glyph(&self, glyph: Glyph) -> usize {
        self.glyphs().filter(|(g, _, _)| *g == glyph).count()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl RenderContext for RecordingContext {
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.ops.push(DrawOp::Line { x1, y1, x2, y2 });
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::Rect { x, y, width, height });
    }

    fn polygon(&mut self, points: &[Point]) {
        self.ops.push(DrawOp::Polygon(points.to_vec()));
    }

    fn glyph(&mut self, glyph: Glyph, x: f64, y: f64, scale: f64, filled: bool) {
        self.ops.push(DrawOp::Glyph { glyph, x, y, scale, filled });
    }

    fn text(&mut self, x: f64, y: f64, content: &str, _font: &FontSpec) {
        self.ops.push(DrawOp::Text { x, y, content: content.to_string() });
    }

    fn bezier_curve(&mut self, from: Point, c1: Point, c2: Point, to: Point) {
        self.ops.push(DrawOp::Bezier { from, c1, c2, to });
    }

    fn quadratic_curve(&mut self, from: Point, control: Point, to: Point) {
        self.ops.push(DrawOp::Quadratic { from, control, to });
    }

    fn set_fill_style(&mut self, style: &str) {
        self.fill = style.to_string();
    }

    fn fill_style(&self) -> &str {
        &self.fill
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.stroke = style.to_string();
    }

    fn stroke_style(&self) -> &str {
        &self.stroke
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    fn line_width(&self) -> f64 {
        self.line_width
    }

    fn set_font(&mut self, font: &FontConfig) {
        self.font = font.clone();
    }

    fn font(&self) -> &FontConfig {
        &self.font
    }
}
