//! Core of a Gerber (RS-274X/RS-274D) file interpreter.
//!
//! Parses Gerber source text into a flat [`Command`] stream via a `pest`
//! grammar, then threads that stream through an [`interpreter::Interpreter`]
//! to produce an image context, aperture table, and ordered list of
//! [`draw_item::DrawItem`]s. Rendering, layer compositing, and DRC are out
//! of scope; see each module's doc comment for what it actually owns.

pub mod aperture;
pub mod command;
pub mod context;
pub mod coordinate;
pub mod diagnostics;
pub mod draw_item;
pub mod error;
pub mod interpreter;
pub mod macro_def;
pub mod macro_eval;

use std::fs;
use std::path::{Path, PathBuf};

use pest::Parser;
use pest_derive::Parser;

pub use command::Command;
use command::{
    ApertureDefinition, ApertureTemplate, D01Operation, D02Operation, D03Operation, FormatSpecification, Mirroring,
    Polarity, StepAndRepeat, Unit,
};
pub use error::GerberError;
pub use interpreter::Interpreter;

#[derive(Parser)]
#[grammar = "gerber.pest"]
pub struct GerberParser;

/// Maximum `%IF%` nesting depth, matching the original reference reader's
/// bounded include stack.
pub const MAX_INCLUDE_DEPTH: usize = 10;

/// A parsed Gerber file: just the flat command stream. Call [`Gerber::interpret`]
/// to run it through the stateful interpreter and get draw items out.
pub struct Gerber {
    pub commands: Vec<Command>,
}

impl Gerber {
    /// Parses the file at `path`, resolving any `%IF<path>*%` includes
    /// relative to the including file's directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, GerberError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let base_dir = path.parent().map(Path::to_path_buf);
        let mut commands = Vec::new();
        Self::parse_into(&content, base_dir.as_deref(), 0, &mut commands)?;
        Ok(Gerber { commands })
    }

    /// Parses Gerber source already in memory. An `%IF%` include in source
    /// with no associated path fails with [`GerberError::IncludeNotFound`],
    /// since there is no base directory to resolve it against.
    pub fn parse_str(content: &str) -> Result<Self, GerberError> {
        let mut commands = Vec::new();
        Self::parse_into(content, None, 0, &mut commands)?;
        Ok(Gerber { commands })
    }

    fn parse_into(
        content: &str,
        base_dir: Option<&Path>,
        depth: usize,
        commands: &mut Vec<Command>,
    ) -> Result<(), GerberError> {
        let mut pairs = GerberParser::parse(Rule::gerber_file, content)?;

        let root = pairs
            .next()
            .ok_or_else(|| GerberError::semantic("empty gerber file".to_string()))?;

        for pair in root.into_inner() {
            match pair.as_rule() {
                Rule::g04 => {
                    let mut inner = pair.into_inner();
                    let text = inner.next().map(|p| p.as_str().trim().to_string()).unwrap_or_default();
                    commands.push(Command::G04(text));
                }

                Rule::mo => {
                    let mut inner = pair.into_inner();
                    let unit_pair = inner
                        .next()
                        .ok_or_else(|| GerberError::semantic("MO command missing unit"))?;
                    let unit = match unit_pair.as_str() {
                        "MM" => Unit::Millimeters,
                        "IN" => Unit::Inches,
                        other => return Err(GerberError::semantic(format!("unrecognized unit: {}", other))),
                    };
                    commands.push(Command::MO(unit));
                }

                Rule::fs => {
                    let mut inner = pair.into_inner();
                    let zero_flag = inner.next().ok_or_else(|| GerberError::semantic("FS missing zero flag"))?;
                    let coord_flag = inner.next().ok_or_else(|| GerberError::semantic("FS missing coordinate flag"))?;
                    let x_int = parse_digit(&mut inner, "FS X integer digits")?;
                    let x_dec = parse_digit(&mut inner, "FS X decimal digits")?;
                    let y_int = parse_digit(&mut inner, "FS Y integer digits")?;
                    let y_dec = parse_digit(&mut inner, "FS Y decimal digits")?;

                    commands.push(Command::FS(FormatSpecification {
                        x_integer_digits: x_int,
                        x_decimal_digits: x_dec,
                        y_integer_digits: y_int,
                        y_decimal_digits: y_dec,
                        omit_leading_zeros: zero_flag.as_str() == "L",
                        absolute: coord_flag.as_str() == "A",
                    }));
                }

                Rule::ad => {
                    let mut inner = pair.into_inner();
                    let code_pair = inner.next().ok_or_else(|| GerberError::semantic("AD missing D-code"))?;
                    let code = parse_dcode(code_pair.as_str())?;

                    let template_pair = inner.next().ok_or_else(|| GerberError::semantic("AD missing aperture template"))?;
                    let template = parse_aperture_template(template_pair)?;

                    commands.push(Command::AD(ApertureDefinition { code, template }));
                }

                Rule::am => {
                    let mut inner = pair.into_inner();
                    let name = inner
                        .next()
                        .ok_or_else(|| GerberError::semantic("AM missing macro name"))?
                        .as_str()
                        .to_string();
                    let body = inner.next().map(|p| p.as_str().to_string()).unwrap_or_default();

                    let mut warnings = Vec::new();
                    let items = macro_def::parse_macro_body(&body, &mut warnings);
                    // Malformed macro statements are non-fatal; they surface as
                    // interpreter diagnostics once the macro is actually used.
                    let _ = warnings;

                    commands.push(Command::AM(name, items));
                }

                Rule::dnn => {
                    let code_pair = pair
                        .into_inner()
                        .next()
                        .ok_or_else(|| GerberError::semantic("Dnn missing aperture code"))?;
                    commands.push(Command::Dnn(parse_dcode(code_pair.as_str())?));
                }

                Rule::g01 => commands.push(Command::G01),
                Rule::g02 => commands.push(Command::G02),
                Rule::g03 => commands.push(Command::G03),
                Rule::g74 => commands.push(Command::G74),
                Rule::g75 => commands.push(Command::G75),

                Rule::g54 => {
                    let code_pair = pair
                        .into_inner()
                        .next()
                        .ok_or_else(|| GerberError::semantic("G54 missing D-code"))?;
                    commands.push(Command::G54(parse_dcode(code_pair.as_str())?));
                }
                Rule::g55 => commands.push(Command::G55),
                Rule::g70 => commands.push(Command::G70),
                Rule::g71 => commands.push(Command::G71),
                Rule::g90 => commands.push(Command::G90),
                Rule::g91 => commands.push(Command::G91),

                Rule::d01 => commands.push(Command::D01(parse_d01(pair)?)),
                Rule::d02 => commands.push(Command::D02(parse_d02(pair)?)),
                Rule::d03 => commands.push(Command::D03(parse_d03(pair)?)),

                Rule::lp => {
                    let code = pair
                        .into_inner()
                        .next()
                        .ok_or_else(|| GerberError::semantic("LP missing polarity"))?;
                    let polarity = match code.as_str() {
                        "D" => Polarity::Dark,
                        "C" => Polarity::Clear,
                        other => return Err(GerberError::semantic(format!("unrecognized polarity: {}", other))),
                    };
                    commands.push(Command::LP(polarity));
                }

                Rule::lm => {
                    let code = pair
                        .into_inner()
                        .next()
                        .ok_or_else(|| GerberError::semantic("LM missing mirroring"))?;
                    let mirroring = match code.as_str() {
                        "N" => Mirroring::None,
                        "X" => Mirroring::X,
                        "Y" => Mirroring::Y,
                        "XY" => Mirroring::XY,
                        other => return Err(GerberError::semantic(format!("unrecognized mirroring: {}", other))),
                    };
                    commands.push(Command::LM(mirroring));
                }

                Rule::lr => {
                    let value = pair
                        .into_inner()
                        .next()
                        .ok_or_else(|| GerberError::semantic("LR missing rotation angle"))?;
                    let angle = parse_f64(value.as_str(), "LR rotation angle")?;
                    commands.push(Command::LR(angle));
                }

                Rule::ls => {
                    let value = pair
                        .into_inner()
                        .next()
                        .ok_or_else(|| GerberError::semantic("LS missing scale factor"))?;
                    let scale = parse_f64(value.as_str(), "LS scale factor")?;
                    commands.push(Command::LS(scale));
                }

                Rule::g36 => commands.push(Command::G36),
                Rule::g37 => commands.push(Command::G37),

                Rule::ab_statement => {
                    let code = pair
                        .into_inner()
                        .next()
                        .map(|p| parse_dcode(p.as_str()))
                        .transpose()?;
                    commands.push(Command::AB(code));
                }

                Rule::sr_statement => {
                    let params = pair.into_inner().next().map(parse_sr_params).transpose()?;
                    commands.push(Command::SR(params));
                }

                Rule::tf => commands.push(Command::TF(parse_attr_name(&pair)?, parse_attr_fields(pair))),
                Rule::ta => commands.push(Command::TA(parse_attr_name(&pair)?, parse_attr_fields(pair))),
                Rule::to => commands.push(Command::TO(parse_attr_name(&pair)?, parse_attr_fields(pair))),
                Rule::td => {
                    let name = pair.into_inner().next().map(|p| p.as_str().to_string());
                    commands.push(Command::TD(name));
                }

                Rule::ip => {
                    let value = pair
                        .into_inner()
                        .next()
                        .ok_or_else(|| GerberError::semantic("IP missing value"))?;
                    let negative = match value.as_str() {
                        "POS" => false,
                        "NEG" => true,
                        other => return Err(GerberError::semantic(format!("unrecognized image polarity: {}", other))),
                    };
                    commands.push(Command::IP(negative));
                }

                Rule::of => {
                    let (mut a, mut b) = (None, None);
                    for field in pair.into_inner() {
                        match field.as_rule() {
                            Rule::of_a => a = Some(parse_axis_value(field, "OF A offset")?),
                            Rule::of_b => b = Some(parse_axis_value(field, "OF B offset")?),
                            _ => {}
                        }
                    }
                    commands.push(Command::OF(a, b));
                }

                Rule::ir => {
                    let value = pair
                        .into_inner()
                        .next()
                        .ok_or_else(|| GerberError::semantic("IR missing rotation"))?;
                    commands.push(Command::IR(parse_f64(value.as_str(), "IR rotation")?));
                }

                Rule::mi => {
                    let (mut a, mut b) = (false, false);
                    for field in pair.into_inner() {
                        match field.as_rule() {
                            Rule::mi_a => a = parse_mirror_flag(field)?,
                            Rule::mi_b => b = parse_mirror_flag(field)?,
                            _ => {}
                        }
                    }
                    commands.push(Command::MI(a, b));
                }

                Rule::sf => {
                    let (mut a, mut b) = (None, None);
                    for field in pair.into_inner() {
                        match field.as_rule() {
                            Rule::sf_a => a = Some(parse_axis_value(field, "SF A scale")?),
                            Rule::sf_b => b = Some(parse_axis_value(field, "SF B scale")?),
                            _ => {}
                        }
                    }
                    commands.push(Command::SF(a, b));
                }

                Rule::include_file => {
                    let raw_path = pair
                        .into_inner()
                        .next()
                        .map(|p| p.as_str().trim().to_string())
                        .unwrap_or_default();

                    if depth + 1 >= MAX_INCLUDE_DEPTH {
                        return Err(GerberError::IncludeDepthExceeded { max: MAX_INCLUDE_DEPTH });
                    }

                    let resolved = match base_dir {
                        Some(dir) => dir.join(&raw_path),
                        None => PathBuf::from(&raw_path),
                    };
                    let included = fs::read_to_string(&resolved)
                        .map_err(|_| GerberError::IncludeNotFound { path: raw_path.clone() })?;
                    let included_base = resolved.parent().map(Path::to_path_buf);
                    Self::parse_into(&included, included_base.as_deref(), depth + 1, commands)?;
                }

                Rule::ignored_extended => {
                    let code = pair
                        .into_inner()
                        .next()
                        .map(|p| p.as_str().to_string())
                        .unwrap_or_default();
                    commands.push(Command::Ignored(code));
                }

                Rule::m00 => commands.push(Command::M00),
                Rule::m01 => commands.push(Command::M01),
                Rule::m02 => commands.push(Command::M02),

                Rule::EOI => {}
                _ => {}
            }
        }

        Ok(())
    }

    /// Runs the parsed command stream through the stateful interpreter and
    /// returns it, carrying the final image context, aperture table,
    /// macro set, draw items, and any non-fatal diagnostics collected
    /// along the way.
    pub fn interpret(&self) -> Interpreter {
        let mut interpreter = Interpreter::new();
        // `apply` never fails for a well-formed Command stream; problems
        // become diagnostics rather than a Result::Err.
        let _ = interpreter.run(&self.commands);
        interpreter
    }
}

fn parse_digit(inner: &mut pest::iterators::Pairs<Rule>, context: &str) -> Result<u8, GerberError> {
    let pair = inner.next().ok_or_else(|| GerberError::semantic(format!("{} missing", context)))?;
    pair.as_str()
        .parse()
        .map_err(|_| GerberError::semantic(format!("{} is not a digit", context)))
}

fn parse_dcode(raw: &str) -> Result<u32, GerberError> {
    raw.trim_start_matches('D')
        .parse()
        .map_err(|_| GerberError::semantic(format!("'{}' is not a valid D-code", raw)))
}

fn parse_f64(raw: &str, context: &str) -> Result<f64, GerberError> {
    raw.parse().map_err(|_| GerberError::semantic(format!("{} '{}' is not a number", context, raw)))
}

fn parse_aperture_template(pair: pest::iterators::Pair<Rule>) -> Result<ApertureTemplate, GerberError> {
    match pair.as_rule() {
        Rule::template_circle => {
            let mut inner = pair.into_inner();
            let diameter = parse_f64(inner.next().unwrap().as_str(), "circle diameter")?;
            let hole = inner.next().map(|p| parse_f64(p.as_str(), "circle hole diameter")).transpose()?;
            Ok(ApertureTemplate::Circle(diameter, hole))
        }
        Rule::template_rect => {
            let mut inner = pair.into_inner();
            let x = parse_f64(inner.next().unwrap().as_str(), "rectangle x size")?;
            let y = parse_f64(inner.next().unwrap().as_str(), "rectangle y size")?;
            let hole = inner.next().map(|p| parse_f64(p.as_str(), "rectangle hole diameter")).transpose()?;
            Ok(ApertureTemplate::Rectangle(x, y, hole))
        }
        Rule::template_obround => {
            let mut inner = pair.into_inner();
            let x = parse_f64(inner.next().unwrap().as_str(), "obround x size")?;
            let y = parse_f64(inner.next().unwrap().as_str(), "obround y size")?;
            let hole = inner.next().map(|p| parse_f64(p.as_str(), "obround hole diameter")).transpose()?;
            Ok(ApertureTemplate::Obround(x, y, hole))
        }
        Rule::template_polygon => {
            let mut inner = pair.into_inner();
            let diameter = parse_f64(inner.next().unwrap().as_str(), "polygon diameter")?;
            let vertices = parse_f64(inner.next().unwrap().as_str(), "polygon vertex count")? as u32;
            let rotation = inner.next().map(|p| parse_f64(p.as_str(), "polygon rotation")).transpose()?;
            let hole = inner.next().map(|p| parse_f64(p.as_str(), "polygon hole diameter")).transpose()?;
            Ok(ApertureTemplate::Polygon(diameter, vertices, rotation, hole))
        }
        Rule::template_macro => {
            let mut inner = pair.into_inner();
            let name = inner.next().unwrap().as_str().to_string();
            let actuals = inner
                .map(|p| parse_f64(p.as_str(), "macro actual parameter"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ApertureTemplate::Macro(name, actuals))
        }
        other => Err(GerberError::semantic(format!("unsupported aperture template: {:?}", other))),
    }
}

fn parse_d01(pair: pest::iterators::Pair<Rule>) -> Result<D01Operation, GerberError> {
    let mut op = D01Operation::default();
    if let Some(coord_block) = pair.into_inner().next() {
        for field in coord_block.into_inner() {
            match field.as_rule() {
                Rule::x_coord => op.x = Some(parse_signed(field)?),
                Rule::y_coord => op.y = Some(parse_signed(field)?),
                Rule::i_coord => op.i = Some(parse_signed(field)?),
                Rule::j_coord => op.j = Some(parse_signed(field)?),
                _ => {}
            }
        }
    }
    Ok(op)
}

fn parse_d02(pair: pest::iterators::Pair<Rule>) -> Result<D02Operation, GerberError> {
    let mut op = D02Operation::default();
    if let Some(coord_block) = pair.into_inner().next() {
        for field in coord_block.into_inner() {
            match field.as_rule() {
                Rule::x_coord => op.x = Some(parse_signed(field)?),
                Rule::y_coord => op.y = Some(parse_signed(field)?),
                _ => {}
            }
        }
    }
    Ok(op)
}

fn parse_d03(pair: pest::iterators::Pair<Rule>) -> Result<D03Operation, GerberError> {
    let mut op = D03Operation::default();
    if let Some(coord_block) = pair.into_inner().next() {
        for field in coord_block.into_inner() {
            match field.as_rule() {
                Rule::x_coord => op.x = Some(parse_signed(field)?),
                Rule::y_coord => op.y = Some(parse_signed(field)?),
                _ => {}
            }
        }
    }
    Ok(op)
}

/// Extracts a coordinate field's raw signed digit string as written, e.g.
/// `"-0600"`. Kept as a string rather than parsed into an integer so that
/// `coordinate::decode` still sees the literal's original digit width.
fn parse_signed(pair: pest::iterators::Pair<Rule>) -> Result<String, GerberError> {
    let raw = pair
        .into_inner()
        .next()
        .ok_or_else(|| GerberError::semantic("coordinate missing digits"))?;
    Ok(raw.as_str().to_string())
}

fn parse_axis_value(pair: pest::iterators::Pair<Rule>, context: &str) -> Result<f64, GerberError> {
    let value = pair
        .into_inner()
        .next()
        .ok_or_else(|| GerberError::semantic(format!("{} missing a value", context)))?;
    parse_f64(value.as_str(), context)
}

fn parse_mirror_flag(pair: pest::iterators::Pair<Rule>) -> Result<bool, GerberError> {
    let value = pair
        .into_inner()
        .next()
        .ok_or_else(|| GerberError::semantic("mirror flag missing a value"))?;
    match value.as_str() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(GerberError::semantic(format!("'{}' is not a valid mirror flag", other))),
    }
}

fn parse_sr_params(pair: pest::iterators::Pair<Rule>) -> Result<StepAndRepeat, GerberError> {
    let mut inner = pair.into_inner();
    let x_repeats: u32 = inner
        .next()
        .ok_or_else(|| GerberError::semantic("SR missing X repeat count"))?
        .as_str()
        .parse()
        .map_err(|_| GerberError::semantic("SR X repeat count is not an integer"))?;
    let y_repeats: u32 = inner
        .next()
        .ok_or_else(|| GerberError::semantic("SR missing Y repeat count"))?
        .as_str()
        .parse()
        .map_err(|_| GerberError::semantic("SR Y repeat count is not an integer"))?;
    let x_step = parse_f64(inner.next().unwrap().as_str(), "SR X step")?;
    let y_step = parse_f64(inner.next().unwrap().as_str(), "SR Y step")?;
    Ok(StepAndRepeat { x_repeats, y_repeats, x_step, y_step })
}

fn parse_attr_name(pair: &pest::iterators::Pair<Rule>) -> Result<String, GerberError> {
    pair.clone()
        .into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| GerberError::semantic("attribute command missing a name"))
}

fn parse_attr_fields(pair: pest::iterators::Pair<Rule>) -> Vec<String> {
    pair.into_inner().skip(1).map(|p| p.as_str().to_string()).collect()
}
