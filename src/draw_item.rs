//! The output of the interpreter: an ordered, append-only list of drawable
//! graphic items. This module never simplifies or merges geometry — that
//! is a renderer's job, out of scope here.

use crate::command::Unit;
use crate::context::Point;
use crate::macro_def::EvaluatedPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Dark,
    Clear,
}

/// The basic rendering shape a flash resolves to, per the aperture it
/// references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeTag {
    Round,
    Rect,
    Oval,
    RegularPolygon,
    Macro,
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub aperture: u32,
}

#[derive(Debug, Clone)]
pub struct Arc {
    pub start: Point,
    pub end: Point,
    pub center: Point,
    pub clockwise: bool,
    /// `true` under `G75` (direct I/J offset), `false` under `G74`
    /// (sign recovered from the end point's quadrant).
    pub multi_quadrant: bool,
    pub aperture: u32,
}

#[derive(Debug, Clone)]
pub struct Circle {
    pub center: Point,
    pub diameter: i64,
    pub aperture: u32,
}

#[derive(Debug, Clone)]
pub struct Region {
    pub outline: Vec<Point>,
}

#[derive(Debug, Clone)]
pub struct Flash {
    pub position: Point,
    pub aperture: u32,
    pub rotation_deg: f64,
    pub shape_tag: ShapeTag,
    /// Populated only when `shape_tag == ShapeTag::Macro`: the macro's
    /// primitives evaluated against the aperture's actual parameters.
    /// Coordinates/lengths are already scaled to internal units but are
    /// still relative to `position`, in the macro's own local frame.
    pub macro_primitives: Vec<EvaluatedPrimitive>,
}

#[derive(Debug, Clone)]
pub enum DrawItem {
    Segment(Segment, Polarity, Unit),
    Arc(Arc, Polarity, Unit),
    Circle(Circle, Polarity, Unit),
    Region(Region, Polarity, Unit),
    Flash(Flash, Polarity, Unit),
}

/// Collapses the repeated "negate Y for screen space" convention found
/// throughout the original reader's drawing code into a single helper,
/// applied only at render/export time, never inside the interpreter.
pub fn to_render_y(internal_y: i64) -> i64 {
    -internal_y
}
