//! # Gerber Format Command Parser
//!
//! This module implements the command structure for the Gerber format (RS-274X),
//! which is the standard file format for PCB manufacturing data.
//!
//! The Gerber format is a vector format for 2D binary images, consisting of
//! commands that define graphics state, apertures, and operations to create
//! a final PCB image.

use crate::macro_def::MacroItem;

/// Represents a Gerber format command.
///
/// Each variant corresponds to a specific command in the Gerber format specification.
/// Commands control various aspects of the Gerber image generation, including
/// aperture definitions, coordinate format, plotting operations, and attributes.
#[derive(Debug)]
pub enum Command {
    /// Comment command (G04).
    G04(String),

    /// Mode command (MO) - sets the unit to mm or inch.
    MO(Unit),

    /// Format Specification command (FS) - sets the coordinate format.
    FS(FormatSpecification),

    /// Aperture Define command (AD) - defines an aperture and assigns a D code.
    AD(ApertureDefinition),

    /// Aperture Macro command (AM) - defines a custom aperture template.
    AM(String, Vec<MacroItem>),

    /// Select aperture command (Dnn) - sets the current aperture.
    Dnn(u32),

    /// Set linear plot mode (G01).
    G01,

    /// Set clockwise circular plot mode (G02).
    G02,

    /// Set counterclockwise circular plot mode (G03).
    G03,

    /// Enable multi-quadrant mode for arcs (G75).
    G75,

    /// Enable single-quadrant mode for arcs and reset interpolation to
    /// linear (G74).
    G74,

    /// Legacy RS-274D unit selection: inch (G70).
    G70,
    /// Legacy RS-274D unit selection: millimeter (G71).
    G71,
    /// Legacy RS-274D coordinate mode: absolute (G90).
    G90,
    /// Legacy RS-274D coordinate mode: incremental (G91).
    G91,
    /// Legacy RS-274D tool select (G54Dnn) - equivalent to a bare `Dnn`.
    G54(u32),
    /// Legacy RS-274D photo mode (G55) - recognized, has no effect here.
    G55,

    /// Plot operation (D01) - creates draw or arc objects.
    D01(D01Operation),

    /// Move operation (D02) - moves the current point without drawing.
    D02(D02Operation),

    /// Flash operation (D03) - creates a flash object.
    D03(D03Operation),

    /// Load Polarity command (LP) - sets dark or clear polarity.
    LP(Polarity),

    /// Load Mirroring command (LM) - sets mirroring mode.
    LM(Mirroring),

    /// Load Rotation command (LR) - sets rotation angle in degrees.
    LR(f64),

    /// Load Scaling command (LS) - sets scaling factor.
    LS(f64),

    /// Begin region statement (G36).
    G36,

    /// End region statement (G37).
    G37,

    /// Aperture Block command (AB) - creates a block aperture.
    AB(Option<u32>),

    /// Step and Repeat command (SR) - replicates a block of objects.
    SR(Option<StepAndRepeat>),

    /// File attribute command (TF) - sets attributes for the file.
    TF(String, Vec<String>),

    /// Aperture attribute command (TA) - sets attributes for apertures.
    TA(String, Vec<String>),

    /// Object attribute command (TO) - sets attributes for objects.
    TO(String, Vec<String>),

    /// Delete attribute command (TD) - deletes attributes from the dictionary.
    TD(Option<String>),

    /// Image polarity (IP) - `true` for `NEG` (the whole image is a clear
    /// layer), `false` for `POS`.
    IP(bool),
    /// Image offset (OF) - `(A offset, B offset)` in file-native units.
    OF(Option<f64>, Option<f64>),
    /// Image rotation (IR) - degrees counterclockwise about the origin.
    IR(f64),
    /// Image mirroring (MI) - `(mirror A, mirror B)`.
    MI(bool, bool),
    /// Image scale factor (SF) - `(A scale, B scale)`.
    SF(Option<f64>, Option<f64>),

    /// An extended command this interpreter recognizes but does not act on
    /// (`IN`, `IO`, `IJ`, `AS`, `LN`, `KO`, `RO`, `PM`). Carries the
    /// two-letter code for diagnostics.
    Ignored(String),

    /// Optional stop (M00).
    M00,

    /// Optional stop (M01).
    M01,

    /// End of file command (M02).
    M02,
}

/// Represents the unit of measurement in a Gerber file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Millimeters (metric) - set by `%MOMM*%`
    Millimeters,
    /// Inches (imperial) - set by `%MOIN*%`
    Inches,
}

/// Specifies the format for coordinate data, set by the FS command.
#[derive(Debug, Clone, Copy)]
pub struct FormatSpecification {
    pub x_integer_digits: u8,
    pub x_decimal_digits: u8,
    pub y_integer_digits: u8,
    pub y_decimal_digits: u8,
    /// `true` when zeros are omitted from the leading (most significant)
    /// end of the field (`L`), `false` when omitted from the trailing end (`T`).
    pub omit_leading_zeros: bool,
    /// `true` for absolute coordinates (`A`), `false` for incremental (`I`).
    pub absolute: bool,
}

/// Defines an aperture with its D-code and template, created by the AD command.
#[derive(Debug)]
pub struct ApertureDefinition {
    /// The aperture number (D code >= 10)
    pub code: u32,
    pub template: ApertureTemplate,
}

/// The different kinds of aperture templates.
#[derive(Debug)]
pub enum ApertureTemplate {
    /// Circle aperture (C). Parameters: diameter, optional hole diameter.
    Circle(f64, Option<f64>),
    /// Rectangle aperture (R). Parameters: x-size, y-size, optional hole diameter.
    Rectangle(f64, f64, Option<f64>),
    /// Obround aperture (O). Parameters: x-size, y-size, optional hole diameter.
    Obround(f64, f64, Option<f64>),
    /// Polygon aperture (P). Parameters: outer diameter, vertices, optional rotation, optional hole diameter.
    Polygon(f64, u32, Option<f64>, Option<f64>),
    /// Macro aperture. Parameters: macro name, actual parameters.
    Macro(String, Vec<f64>),
}

/// Parameters for a D01 (plot) operation.
///
/// Coordinates are kept as the raw signed digit-string exactly as written
/// (e.g. `"-0600"`), not parsed into an integer: `coordinate::decode` needs
/// the literal's written digit width to apply the active format's leading-
/// or trailing-zero omission rule, which an `i32` round-trip would destroy.
#[derive(Debug, Default)]
pub struct D01Operation {
    pub x: Option<String>,
    pub y: Option<String>,
    /// I offset for circular interpolation (required for arcs)
    pub i: Option<String>,
    /// J offset for circular interpolation (required for arcs)
    pub j: Option<String>,
}

/// Parameters for a D02 (move) operation. See [`D01Operation`] for why
/// coordinates are raw strings.
#[derive(Debug, Default)]
pub struct D02Operation {
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Parameters for a D03 (flash) operation. See [`D01Operation`] for why
/// coordinates are raw strings.
#[derive(Debug, Default)]
pub struct D03Operation {
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Polarity setting for graphical objects, set by the LP command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Dark polarity - objects darken the image plane (LPD)
    Dark,
    /// Clear polarity - objects clear the image plane (LPC)
    Clear,
}

/// Mirroring settings for graphical objects, set by the LM command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    None,
    X,
    Y,
    XY,
}

/// Parameters for a Step and Repeat block, set by the SR command.
#[derive(Debug)]
pub struct StepAndRepeat {
    pub x_repeats: u32,
    pub y_repeats: u32,
    pub x_step: f64,
    pub y_step: f64,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::G04(comment) => write!(f, "Comment: {}", comment),
            Command::MO(unit) => write!(f, "Set units: {:?}", unit),
            Command::FS(format) => write!(
                f,
                "Format: {}.{}/{}.{}",
                format.x_integer_digits, format.x_decimal_digits, format.y_integer_digits, format.y_decimal_digits
            ),
            Command::M02 => write!(f, "End of file"),
            _ => write!(f, "{:?}", self),
        }
    }
}
