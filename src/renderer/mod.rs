//! Rendering surfaces and the draw routines that emit primitives onto them.
//!
//! The engine never talks to a concrete canvas. Everything it draws goes
//! through [`RenderContext`], a small set of primitive operations (lines,
//! glyphs, text, curves, fill/stroke state). Two surfaces ship with the
//! crate: [`SvgContext`] produces a self-contained SVG document and
//! [`RecordingContext`] keeps an inspectable log of every primitive.

pub(crate) mod constants;
mod svg_builder;
mod recording;
pub(crate) mod staff;
pub(crate) mod notes;
pub(crate) mod modifiers;
pub(crate) mod curves;

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::FontConfig;
use crate::glyphs::Glyph;

pub use recording::{DrawOp, RecordingContext};
pub use svg_builder::SvgContext;

/// A rendering context shared by every element of a drawing session.
pub type SharedContext = Rc<RefCell<dyn RenderContext>>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub face: String,
    pub point: f64,
    /// `normal`, `bold`, `italic` or `bold italic`
    pub style: String,
    pub anchor: TextAnchor,
}

impl FontSpec {
    pub fn from_config(font: &FontConfig) -> Self {
        Self {
            face: font.face.clone(),
            point: font.point,
            style: font.style.clone(),
            anchor: TextAnchor::Start,
        }
    }

    /// The surface's base font at `point` size.
    pub fn sized(ctx: &dyn RenderContext, point: f64) -> Self {
        Self { point, ..Self::from_config(ctx.font()) }
    }

    pub fn styled(mut self, style: &str) -> Self {
        self.style = style.to_string();
        self
    }

    pub fn anchored(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::from_config(&FontConfig::default())
    }
}

/// Primitive drawing operations supplied by the embedder.
///
/// Coordinates are device-independent pixels with y pointing down.
pub trait RenderContext {
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);

    /// Axis-aligned rectangle filled with the current fill style.
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Closed polygon filled with the current fill style.
    fn polygon(&mut self, points: &[Point]);

    /// Draw a glyph with its origin at `(x, y)`. Unfilled glyphs are stroked.
    fn glyph(&mut self, glyph: Glyph, x: f64, y: f64, scale: f64, filled: bool);

    fn text(&mut self, x: f64, y: f64, content: &str, font: &FontSpec);

    fn bezier_curve(&mut self, from: Point, c1: Point, c2: Point, to: Point);

    fn quadratic_curve(&mut self, from: Point, control: Point, to: Point);

    fn set_fill_style(&mut self, style: &str);

    fn fill_style(&self) -> &str;

    fn set_stroke_style(&mut self, style: &str);

    fn stroke_style(&self) -> &str;

    fn set_line_width(&mut self, width: f64);

    fn line_width(&self) -> f64;

    /// Base face, size and style for text.
    fn set_font(&mut self, font: &FontConfig);

    fn font(&self) -> &FontConfig;
}

/// Run `f` with a temporary stroke style and line width, restoring both after.
pub(crate) fn with_pen(ctx: &mut dyn RenderContext, style: &str, width: f64, f: impl FnOnce(&mut dyn RenderContext)) {
    let previous_style = ctx.stroke_style().to_string();
    let previous_width = ctx.line_width();
    ctx.set_stroke_style(style);
    ctx.set_line_width(width);
    f(ctx);
    ctx.set_stroke_style(&previous_style);
    ctx.set_line_width(previous_width);
}
