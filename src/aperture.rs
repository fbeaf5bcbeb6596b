//! The D-code (aperture) table.
//!
//! Grounded in `dcode.h`/`dcode.cpp`: apertures are numbered 10..999,
//! created lazily from an `AD` command, and converted to a renderable
//! polygon on demand rather than at definition time (`aperture_to_polygon`
//! is a free function, not a cached method, per the redesign note about
//! avoiding precomputed geometry living on the aperture itself).

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::command::ApertureTemplate;
use crate::coordinate::UNIT_SCALE_INCH;

/// Default segment count used to approximate circles/arcs/polygon apertures
/// as polylines, matching `SEGS_CNT` in the original reference reader.
pub const DEFAULT_SEGMENTS_PER_TURN: u32 = 32;

pub const MIN_DCODE: u32 = 10;
pub const MAX_DCODE: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// The shape an aperture resolves to.
#[derive(Debug, Clone)]
pub enum ApertureShape {
    Circle { diameter: f64, hole: Option<f64> },
    Rectangle { x: f64, y: f64, hole: Option<f64> },
    Obround { x: f64, y: f64, hole: Option<f64> },
    Polygon { diameter: f64, vertices: u32, rotation_deg: f64, hole: Option<f64> },
    /// References a macro by name along with the actual parameters the
    /// `AD` command supplied (bound at flash time, not definition time).
    Macro { name: String, actuals: Vec<f64> },
}

/// One entry of the D-code table.
#[derive(Debug, Clone)]
pub struct Aperture {
    pub code: u32,
    pub shape: ApertureShape,
    /// Set once an `AD` command has actually defined this code.
    pub defined: bool,
}

/// Maps D-codes 10..999 to their apertures. Created on demand; referencing
/// an out-of-range code is always an error, referencing an in-range but
/// never-defined code is a warning handled by the caller (the interpreter),
/// not by this table.
#[derive(Debug, Default)]
pub struct ApertureTable {
    apertures: HashMap<u32, Aperture>,
}

impl ApertureTable {
    pub fn new() -> Self {
        ApertureTable { apertures: HashMap::new() }
    }

    pub fn define(&mut self, code: u32, template: &ApertureTemplate) -> Result<(), String> {
        if !(MIN_DCODE..=MAX_DCODE).contains(&code) {
            return Err(format!("D-code {} is out of the valid aperture range 10..999", code));
        }

        let shape = match template {
            ApertureTemplate::Circle(diameter, hole) => ApertureShape::Circle { diameter: *diameter, hole: *hole },
            ApertureTemplate::Rectangle(x, y, hole) => ApertureShape::Rectangle { x: *x, y: *y, hole: *hole },
            ApertureTemplate::Obround(x, y, hole) => ApertureShape::Obround { x: *x, y: *y, hole: *hole },
            ApertureTemplate::Polygon(diameter, vertices, rotation, hole) => ApertureShape::Polygon {
                diameter: *diameter,
                vertices: *vertices,
                rotation_deg: rotation.unwrap_or(0.0),
                hole: *hole,
            },
            ApertureTemplate::Macro(name, actuals) => ApertureShape::Macro { name: name.clone(), actuals: actuals.clone() },
        };

        self.apertures.insert(code, Aperture { code, shape, defined: true });
        Ok(())
    }

    pub fn get(&self, code: u32) -> Option<&Aperture> {
        self.apertures.get(&code)
    }

    pub fn is_in_range(code: u32) -> bool {
        (MIN_DCODE..=MAX_DCODE).contains(&code)
    }
}

/// Converts a standard (non-macro) aperture into a closed polygon in
/// internal units, centered at the origin. Circles/obrounds/polygons are
/// approximated with `segments_per_turn` segments per full turn.
///
/// Returns `None` for a macro aperture: macro flashing is handled by the
/// interpreter via the macro evaluator, not by this function.
pub fn aperture_to_polygon(aperture: &Aperture, segments_per_turn: u32) -> Option<Vec<Point>> {
    let scale = UNIT_SCALE_INCH;
    match &aperture.shape {
        ApertureShape::Circle { diameter, .. } => Some(circle_polygon(diameter / 2.0 * scale, segments_per_turn)),
        ApertureShape::Rectangle { x, y, .. } => Some(rect_polygon(x * scale, y * scale)),
        ApertureShape::Obround { x, y, .. } => Some(obround_polygon(x * scale, y * scale, segments_per_turn)),
        ApertureShape::Polygon { diameter, vertices, rotation_deg, .. } => {
            Some(regular_polygon(diameter / 2.0 * scale, *vertices, *rotation_deg, segments_per_turn))
        }
        ApertureShape::Macro { .. } => None,
    }
}

fn circle_polygon(radius: f64, segments_per_turn: u32) -> Vec<Point> {
    let n = segments_per_turn.max(3);
    (0..n)
        .map(|i| {
            let theta = 2.0 * PI * (i as f64) / (n as f64);
            Point { x: (radius * theta.cos()).round() as i64, y: (radius * theta.sin()).round() as i64 }
        })
        .collect()
}

fn regular_polygon(radius: f64, vertices: u32, rotation_deg: f64, segments_per_turn: u32) -> Vec<Point> {
    let n = vertices.clamp(3, segments_per_turn.max(3));
    let rotation = rotation_deg.to_radians();
    (0..n)
        .map(|i| {
            let theta = rotation + 2.0 * PI * (i as f64) / (n as f64);
            Point { x: (radius * theta.cos()).round() as i64, y: (radius * theta.sin()).round() as i64 }
        })
        .collect()
}

fn rect_polygon(width: f64, height: f64) -> Vec<Point> {
    let hw = width / 2.0;
    let hh = height / 2.0;
    vec![
        Point { x: -hw.round() as i64, y: -hh.round() as i64 },
        Point { x: hw.round() as i64, y: -hh.round() as i64 },
        Point { x: hw.round() as i64, y: hh.round() as i64 },
        Point { x: -hw.round() as i64, y: hh.round() as i64 },
    ]
}

fn obround_polygon(width: f64, height: f64, segments_per_turn: u32) -> Vec<Point> {
    // An obround is a rectangle capped with semicircles on the shorter axis.
    let n = segments_per_turn.max(4) / 2;
    let mut points = Vec::with_capacity((n as usize + 1) * 2);

    if width >= height {
        let radius = height / 2.0;
        let straight = (width - height) / 2.0;
        for i in 0..=n {
            let theta = -PI / 2.0 + PI * (i as f64) / (n as f64);
            points.push(Point { x: (straight + radius * theta.sin()).round() as i64, y: (radius * theta.cos()).round() as i64 });
        }
        for i in 0..=n {
            let theta = PI / 2.0 + PI * (i as f64) / (n as f64);
            points.push(Point { x: (-straight + radius * theta.sin()).round() as i64, y: (radius * theta.cos()).round() as i64 });
        }
    } else {
        let radius = width / 2.0;
        let straight = (height - width) / 2.0;
        for i in 0..=n {
            let theta = PI * (i as f64) / (n as f64);
            points.push(Point { x: (radius * theta.sin()).round() as i64, y: (straight + radius * theta.cos()).round() as i64 });
        }
        for i in 0..=n {
            let theta = PI + PI * (i as f64) / (n as f64);
            points.push(Point { x: (radius * theta.sin()).round() as i64, y: (-straight + radius * theta.cos()).round() as i64 });
        }
    }

    points
}
