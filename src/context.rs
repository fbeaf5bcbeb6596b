//! Image-wide interpreter state: format, units, transforms, and the
//! attribute dictionary. One `ImageContext` is owned per parsed file.

use std::collections::HashMap;

use crate::command::{Mirroring, Polarity, Unit};
use crate::coordinate::Format;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interpolation {
    Linear,
    ClockwiseArc,
    CounterClockwiseArc,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuadrantMode {
    Single,
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Default for Point {
    fn default() -> Self {
        Point { x: 0, y: 0 }
    }
}

/// File/aperture/object attribute dictionary populated by `TF`/`TA`/`TO`
/// and cleared selectively by `TD`.
#[derive(Debug, Default, Clone)]
pub struct AttributeDictionary(pub HashMap<String, Vec<String>>);

impl AttributeDictionary {
    pub fn set(&mut self, name: String, values: Vec<String>) {
        self.0.insert(name, values);
    }

    /// `%TD*%` with no name clears everything; `%TD.Name*%` clears one entry.
    pub fn delete(&mut self, name: Option<&str>) {
        match name {
            Some(n) => {
                self.0.remove(n);
            }
            None => self.0.clear(),
        }
    }
}

/// Image-wide state threaded through command interpretation.
#[derive(Debug, Clone)]
pub struct ImageContext {
    pub units: Unit,
    pub format: Format,
    pub offset_a: f64,
    pub offset_b: f64,
    /// Object-level rotation set by `%LR*%`, applied to flashed apertures.
    pub object_rotation_deg: f64,
    pub mirror: Mirroring,
    pub scale: f64,
    pub image_negative: bool,
    pub polarity: Polarity,
    pub polygon_region: bool,
    pub quadrant_mode: QuadrantMode,
    pub interpolation: Interpolation,
    pub current_pos: Point,
    pub previous_pos: Point,
    pub current_aperture: Option<u32>,
    pub image_name: Option<String>,
    pub layer_name: Option<String>,
    pub file_attributes: AttributeDictionary,
    pub aperture_attributes: AttributeDictionary,
    pub object_attributes: AttributeDictionary,
    /// Image-level offset from `%OF*%`, in the unit system active when OF
    /// was read (A/B, matching the command's own field names).
    pub image_offset_a: f64,
    pub image_offset_b: f64,
    /// Image-level rotation from `%IR*%`, degrees counterclockwise about
    /// the origin. Distinct from `object_rotation_deg` (`LR`), which
    /// rotates individual flashed objects rather than the whole image.
    pub image_rotation_deg: f64,
    /// Image-level mirroring from `%MI*%`, one flag per axis.
    pub image_mirror_a: bool,
    pub image_mirror_b: bool,
    /// Image-level scale factors from `%SF*%`.
    pub image_scale_a: f64,
    pub image_scale_b: f64,
}

impl Default for ImageContext {
    fn default() -> Self {
        ImageContext {
            units: Unit::Inches,
            format: Format::default(),
            offset_a: 0.0,
            offset_b: 0.0,
            object_rotation_deg: 0.0,
            mirror: Mirroring::None,
            scale: 1.0,
            image_negative: false,
            polarity: Polarity::Dark,
            polygon_region: false,
            quadrant_mode: QuadrantMode::Single,
            interpolation: Interpolation::Linear,
            current_pos: Point::default(),
            previous_pos: Point::default(),
            current_aperture: None,
            image_name: None,
            layer_name: None,
            file_attributes: AttributeDictionary::default(),
            aperture_attributes: AttributeDictionary::default(),
            object_attributes: AttributeDictionary::default(),
            image_offset_a: 0.0,
            image_offset_b: 0.0,
            image_rotation_deg: 0.0,
            image_mirror_a: false,
            image_mirror_b: false,
            image_scale_a: 1.0,
            image_scale_b: 1.0,
        }
    }
}

impl ImageContext {
    /// The effective exposure polarity for an object drawn right now:
    /// layer polarity XOR image-level negative flag.
    pub fn effective_polarity_is_dark(&self) -> bool {
        let layer_dark = self.polarity == Polarity::Dark;
        layer_dark != self.image_negative
    }

    /// Maps a point from local (per-layer) coordinates to final image
    /// coordinates by applying `%SF%`/`%MI%`/`%IR%`/`%OF%` in that order,
    /// matching the transform chain Ucamco's spec defines for image-level
    /// attributes (distinct from the per-object `LM`/`LR`/`LS` commands).
    pub fn apply_image_transform(&self, p: Point) -> Point {
        let (x, y) = self.transform_vector(p.x as f64, p.y as f64);
        let unit_scale = crate::coordinate::scale_for(self.units);
        Point {
            x: (x + self.image_offset_a * unit_scale).round() as i64,
            y: (y + self.image_offset_b * unit_scale).round() as i64,
        }
    }

    /// Same chain as [`Self::apply_image_transform`] but without the
    /// translation component, for relative vectors such as an arc's I/J
    /// offset.
    pub fn apply_image_vector_transform(&self, dx: i64, dy: i64) -> (i64, i64) {
        let (x, y) = self.transform_vector(dx as f64, dy as f64);
        (x.round() as i64, y.round() as i64)
    }

    fn transform_vector(&self, x: f64, y: f64) -> (f64, f64) {
        let mut x = x * self.image_scale_a;
        let mut y = y * self.image_scale_b;
        if self.image_mirror_a {
            x = -x;
        }
        if self.image_mirror_b {
            y = -y;
        }
        let theta = self.image_rotation_deg.to_radians();
        let (sin, cos) = theta.sin_cos();
        (x * cos - y * sin, x * sin + y * cos)
    }
}
