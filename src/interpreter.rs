//! The command interpreter: walks a flat `Vec<Command>` already produced by
//! the grammar, threading image state through it and emitting draw items.
//!
//! The G/D-code semantics, polarity computation, and arc quadrant sign
//! recovery implemented here follow `rs274d.cpp`/`rs274x.cpp` in the
//! original reference reader.

use std::collections::HashMap;

use crate::aperture::{ApertureShape, ApertureTable};
use crate::command::Command;
use crate::context::{ImageContext, Interpolation, Point, QuadrantMode};
use crate::coordinate::{self, Axis};
use crate::diagnostics::Diagnostic;
use crate::draw_item::{Arc, DrawItem, Flash, Polarity as DrawPolarity, Region, Segment, ShapeTag};
use crate::error::GerberError;
use crate::macro_def::{self, MacroDefinition};

pub struct Interpreter {
    pub context: ImageContext,
    pub apertures: ApertureTable,
    pub macros: HashMap<String, MacroDefinition>,
    pub items: Vec<DrawItem>,
    pub diagnostics: Vec<Diagnostic>,
    region_outline: Vec<Point>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter {
            context: ImageContext::default(),
            apertures: ApertureTable::new(),
            macros: HashMap::new(),
            items: Vec::new(),
            diagnostics: Vec::new(),
            region_outline: Vec::new(),
        }
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs an entire command stream, returning on the first fatal error.
    /// Non-fatal problems accumulate in `self.diagnostics` and do not stop
    /// interpretation.
    pub fn run(&mut self, commands: &[Command]) -> Result<(), GerberError> {
        for command in commands {
            self.apply(command)?;
        }
        Ok(())
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(message));
    }

    fn info(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::info(message));
    }

    fn polarity(&self) -> DrawPolarity {
        if self.context.effective_polarity_is_dark() {
            DrawPolarity::Dark
        } else {
            DrawPolarity::Clear
        }
    }

    fn decode_xy(&self, x: Option<&str>, y: Option<&str>) -> Point {
        let prev = self.context.current_pos;
        let missing_axis = if self.context.format.absolute { |p: i64| p } else { |_: i64| 0 };
        let x = match x {
            Some(raw) => coordinate::decode(raw, &self.context.format, Axis::X, self.context.units),
            None => missing_axis(prev.x),
        };
        let y = match y {
            Some(raw) => coordinate::decode(raw, &self.context.format, Axis::Y, self.context.units),
            None => missing_axis(prev.y),
        };
        Point { x, y }
    }

    fn decode_offset(&self, value: Option<&str>, axis: Axis) -> i64 {
        match value {
            Some(raw) => coordinate::decode(raw, &self.context.format, axis, self.context.units),
            None => 0,
        }
    }

    /// Maps a point from local (per-layer) to final image coordinates via
    /// the active `%OF%`/`%IR%`/`%MI%`/`%SF%` transform.
    fn to_image(&self, p: Point) -> Point {
        self.context.apply_image_transform(p)
    }

    fn select_aperture(&mut self, code: u32) {
        if !ApertureTable::is_in_range(code) {
            self.warn(format!("D-code {} is outside the valid aperture range 10..999", code));
        } else if self.apertures.get(code).is_none() {
            self.warn(format!("D-code D{} selected before being defined", code));
        }
        self.context.current_aperture = Some(code);
    }

    /// Recovers the arc center from I/J per the active quadrant mode.
    /// Multi-quadrant mode takes I/J as a direct signed offset from the
    /// start point; single-quadrant mode recovers the sign from which
    /// quadrant the end point falls in relative to the start point.
    fn arc_center(&self, start: Point, end: Point, i: i64, j: i64) -> Point {
        match self.context.quadrant_mode {
            QuadrantMode::Multi => Point { x: start.x + i, y: start.y + j },
            QuadrantMode::Single => {
                let dx = end.x - start.x;
                let dy = end.y - start.y;
                let (sx, sy): (i64, i64) = match (dx >= 0, dy >= 0) {
                    (true, true) => (1, 1),
                    (true, false) => (1, -1),
                    (false, true) => (-1, 1),
                    (false, false) => (-1, -1),
                };
                Point { x: start.x + sx * i.abs(), y: start.y + sy * j.abs() }
            }
        }
    }

    fn apply(&mut self, command: &Command) -> Result<(), GerberError> {
        match command {
            Command::G04(_) => {}

            Command::MO(unit) => self.context.units = *unit,

            Command::FS(fs) => {
                self.context.format.x_integer_digits = fs.x_integer_digits;
                self.context.format.x_decimal_digits = fs.x_decimal_digits;
                self.context.format.y_integer_digits = fs.y_integer_digits;
                self.context.format.y_decimal_digits = fs.y_decimal_digits;
                self.context.format.omit_leading_zeros = fs.omit_leading_zeros;
                self.context.format.absolute = fs.absolute;
            }

            Command::AD(ad) => {
                if let Err(message) = self.apertures.define(ad.code, &ad.template) {
                    self.warn(message);
                }
            }

            Command::AM(name, items) => {
                self.macros.insert(name.clone(), MacroDefinition { items: items.clone(), unit: self.context.units });
            }

            Command::Dnn(code) => self.select_aperture(*code),
            Command::G54(code) => self.select_aperture(*code),
            Command::G55 => {}

            Command::G01 => self.context.interpolation = Interpolation::Linear,
            Command::G02 => self.context.interpolation = Interpolation::ClockwiseArc,
            Command::G03 => self.context.interpolation = Interpolation::CounterClockwiseArc,
            Command::G74 => {
                self.context.quadrant_mode = QuadrantMode::Single;
                self.context.interpolation = Interpolation::Linear;
            }
            Command::G75 => self.context.quadrant_mode = QuadrantMode::Multi,

            Command::G70 => self.context.units = crate::command::Unit::Inches,
            Command::G71 => self.context.units = crate::command::Unit::Millimeters,
            Command::G90 => self.context.format.absolute = true,
            Command::G91 => self.context.format.absolute = false,

            Command::D01(op) => self.plot(op)?,
            Command::D02(op) => {
                let target = self.decode_xy(op.x.as_deref(), op.y.as_deref());
                self.context.previous_pos = self.context.current_pos;
                self.context.current_pos = target;
                if self.context.polygon_region {
                    if !self.region_outline.is_empty() {
                        self.emit_region();
                    }
                    self.region_outline.push(target);
                }
            }
            Command::D03(op) => {
                let target = self.decode_xy(op.x.as_deref(), op.y.as_deref());
                self.context.previous_pos = self.context.current_pos;
                self.context.current_pos = target;
                self.flash(target);
            }

            Command::LP(polarity) => {
                self.context.polarity = *polarity;
            }
            Command::LM(mirroring) => self.context.mirror = *mirroring,
            Command::LR(angle) => self.context.object_rotation_deg = *angle,
            Command::LS(scale) => self.context.scale = *scale,

            Command::IP(negative) => self.context.image_negative = *negative,
            Command::OF(a, b) => {
                if let Some(a) = a {
                    self.context.image_offset_a = *a;
                }
                if let Some(b) = b {
                    self.context.image_offset_b = *b;
                }
            }
            Command::IR(angle) => self.context.image_rotation_deg = *angle,
            Command::MI(a, b) => {
                self.context.image_mirror_a = *a;
                self.context.image_mirror_b = *b;
            }
            Command::SF(a, b) => {
                if let Some(a) = a {
                    self.context.image_scale_a = *a;
                }
                if let Some(b) = b {
                    self.context.image_scale_b = *b;
                }
            }

            Command::G36 => {
                self.context.polygon_region = true;
                self.region_outline.clear();
            }
            Command::G37 => {
                self.emit_region();
                self.context.polygon_region = false;
                self.region_outline.clear();
            }

            Command::AB(_) => self.info("aperture block (AB) recorded but not expanded"),
            Command::SR(_) => self.info("step-and-repeat (SR) recorded but not replicated"),

            Command::TF(name, values) => self.context.file_attributes.set(name.clone(), values.clone()),
            Command::TA(name, values) => self.context.aperture_attributes.set(name.clone(), values.clone()),
            Command::TO(name, values) => self.context.object_attributes.set(name.clone(), values.clone()),
            Command::TD(name) => self.context.object_attributes.delete(name.as_deref()),

            Command::Ignored(code) => self.info(format!("extended command {} is ignored", code)),

            Command::M00 => self.info("optional stop (M00)"),
            Command::M01 => self.info("optional stop (M01)"),
            Command::M02 => {}
        }

        Ok(())
    }

    fn plot(&mut self, op: &crate::command::D01Operation) -> Result<(), GerberError> {
        let start = self.context.current_pos;
        let end = self.decode_xy(op.x.as_deref(), op.y.as_deref());
        let i = self.decode_offset(op.i.as_deref(), Axis::X);
        let j = self.decode_offset(op.j.as_deref(), Axis::Y);

        self.context.previous_pos = start;
        self.context.current_pos = end;

        if self.context.polygon_region {
            if self.region_outline.is_empty() {
                self.region_outline.push(start);
            }
            self.region_outline.push(end);
            return Ok(());
        }

        let Some(aperture_code) = self.context.current_aperture else {
            self.warn("D01 plot with no aperture selected");
            return Ok(());
        };

        match self.context.interpolation {
            Interpolation::Linear => {
                self.items.push(DrawItem::Segment(
                    Segment { start: self.to_image(start), end: self.to_image(end), aperture: aperture_code },
                    self.polarity(),
                    self.context.units,
                ));
            }
            Interpolation::ClockwiseArc | Interpolation::CounterClockwiseArc => {
                let center = self.arc_center(start, end, i, j);
                let clockwise = self.context.interpolation == Interpolation::ClockwiseArc;
                let multi_quadrant = self.context.quadrant_mode == QuadrantMode::Multi;
                self.items.push(DrawItem::Arc(
                    Arc {
                        start: self.to_image(start),
                        end: self.to_image(end),
                        center: self.to_image(center),
                        clockwise,
                        aperture: aperture_code,
                        multi_quadrant,
                    },
                    self.polarity(),
                    self.context.units,
                ));
            }
        }

        Ok(())
    }

    fn flash(&mut self, position: Point) {
        let Some(aperture_code) = self.context.current_aperture else {
            self.warn("D03 flash with no aperture selected");
            return;
        };

        let shape = self.apertures.get(aperture_code).map(|a| a.shape.clone());
        if shape.is_none() {
            self.warn(format!("flash referenced undefined aperture D{}", aperture_code));
        }

        let mut warnings = Vec::new();
        let (shape_tag, macro_primitives) = match shape {
            Some(ApertureShape::Circle { .. }) => (ShapeTag::Round, Vec::new()),
            Some(ApertureShape::Rectangle { .. }) => (ShapeTag::Rect, Vec::new()),
            Some(ApertureShape::Obround { .. }) => (ShapeTag::Oval, Vec::new()),
            Some(ApertureShape::Polygon { .. }) => (ShapeTag::RegularPolygon, Vec::new()),
            Some(ApertureShape::Macro { name, actuals }) => {
                let primitives = match self.macros.get(&name) {
                    Some(def) => macro_def::evaluate_primitives(&def.items, &actuals, def.unit, &mut warnings),
                    None => {
                        warnings.push(format!("flash referenced undefined aperture macro {}", name));
                        Vec::new()
                    }
                };
                (ShapeTag::Macro, primitives)
            }
            None => (ShapeTag::Round, Vec::new()),
        };
        for message in warnings {
            self.warn(message);
        }

        self.items.push(DrawItem::Flash(
            Flash {
                position: self.to_image(position),
                aperture: aperture_code,
                rotation_deg: self.context.object_rotation_deg,
                shape_tag,
                macro_primitives,
            },
            self.polarity(),
            self.context.units,
        ));
    }

    fn emit_region(&mut self) {
        if self.region_outline.len() < 3 {
            if !self.region_outline.is_empty() {
                self.warn("polygon region closed with fewer than 3 vertices");
            }
            return;
        }

        let outline = std::mem::take(&mut self.region_outline).into_iter().map(|p| self.to_image(p)).collect();
        self.items.push(DrawItem::Region(
            Region { outline },
            self.polarity(),
            self.context.units,
        ));
    }
}
