//! Parses the body of an `%AM<name>*...*%` aperture macro definition into
//! an ordered list of [`MacroItem`]s.
//!
//! Grounded in `AM_PARAM::ReadParam` (original RS-274X reference reader):
//! operators are evaluated strictly left to right with no precedence
//! climbing, which is why macro bodies write `0-$1/2-$4` rather than
//! `-($1/2)-$4` to express a negative half-width.

use std::collections::HashMap;

use crate::command::Unit;
use crate::coordinate::scale_for;
use crate::macro_eval::{ExprItem, MacroExpr};

/// Identifies which basic shape a macro primitive line describes.
///
/// Numbering matches Table 3 of the RS-274X specification and
/// `AM_PRIMITIVE_ID` in the original reference reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveId {
    Comment,
    Circle,
    VectorLine,
    CenterLine,
    LowerLeftLine,
    Outline,
    Polygon,
    Moire,
    Thermal,
}

impl PrimitiveId {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(PrimitiveId::Comment),
            1 => Some(PrimitiveId::Circle),
            2 | 20 => Some(PrimitiveId::VectorLine),
            21 => Some(PrimitiveId::CenterLine),
            22 => Some(PrimitiveId::LowerLeftLine),
            4 => Some(PrimitiveId::Outline),
            5 => Some(PrimitiveId::Polygon),
            6 => Some(PrimitiveId::Moire),
            7 => Some(PrimitiveId::Thermal),
            _ => None,
        }
    }
}

/// A single primitive line within a macro body.
#[derive(Debug, Clone)]
pub struct MacroPrimitive {
    pub id: PrimitiveId,
    /// Parameters in declaration order, as written after the primitive id.
    /// Exposure (when the primitive has one) is `params[0]`.
    pub params: Vec<MacroExpr>,
    /// Raw comment text, only populated for [`PrimitiveId::Comment`].
    pub comment: Option<String>,
}

/// One statement inside an aperture macro body: either a drawable
/// primitive or a local variable assignment (`$n=<expr>`).
#[derive(Debug, Clone)]
pub enum MacroItem {
    Primitive(MacroPrimitive),
    Assignment(u32, MacroExpr),
    /// A primitive id outside the known set (`AMP_UNKNOWN`); kept so the
    /// caller can report it rather than silently dropping the statement.
    UnknownPrimitive(i64),
}

/// A macro definition as stored by the interpreter: its statements plus the
/// unit system in effect when `%AM*%` was read, since macro parameters with
/// no unit suffix of their own are interpreted in that system.
#[derive(Debug, Clone)]
pub struct MacroDefinition {
    pub items: Vec<MacroItem>,
    pub unit: Unit,
}

/// One macro primitive with its parameters fully evaluated against a set of
/// actual parameters and scaled into internal units.
#[derive(Debug, Clone)]
pub struct EvaluatedPrimitive {
    pub id: PrimitiveId,
    /// Parameters in declaration order. Exposure, vertex/ring counts, and
    /// rotation angles are left as written; lengths and coordinates are
    /// scaled to internal units (1 unit = 1/10000 inch).
    pub params: Vec<f64>,
}

/// True for a parameter index that holds a length or coordinate (and so
/// needs scaling to internal units) rather than an exposure flag, a count,
/// or a rotation angle, for the given primitive and its total param count.
fn is_length_param(id: PrimitiveId, index: usize, count: usize) -> bool {
    match id {
        PrimitiveId::Comment => false,
        PrimitiveId::Circle => matches!(index, 1 | 2 | 3),
        PrimitiveId::VectorLine => matches!(index, 1 | 2 | 3 | 4 | 5),
        PrimitiveId::CenterLine | PrimitiveId::LowerLeftLine => matches!(index, 1 | 2 | 3 | 4),
        // exposure, n, then n coordinate pairs, then a trailing rotation.
        PrimitiveId::Outline => index >= 2 && index <= count.saturating_sub(2),
        PrimitiveId::Polygon => matches!(index, 2 | 3 | 4),
        PrimitiveId::Moire => matches!(index, 0 | 1 | 2 | 3 | 4 | 6 | 7),
        PrimitiveId::Thermal => matches!(index, 0 | 1 | 2 | 3 | 4),
    }
}

/// Evaluates every statement of a macro body in order against a set of
/// actual parameters (`$1..$n`, 1-based), resolving local `$n=` assignments
/// along the way, and returns the concrete primitives a flash of this
/// aperture produces. `unit` is the macro's definition-time unit system,
/// used to scale length-valued parameters into internal units.
pub fn evaluate_primitives(
    items: &[MacroItem],
    actuals: &[f64],
    unit: Unit,
    warnings: &mut Vec<String>,
) -> Vec<EvaluatedPrimitive> {
    let mut vars: HashMap<u32, f64> = HashMap::new();
    for (index, value) in actuals.iter().enumerate() {
        vars.insert((index + 1) as u32, *value);
    }

    let scale = scale_for(unit);
    let mut evaluated = Vec::new();

    for item in items {
        match item {
            MacroItem::Assignment(idx, expr) => {
                let value = expr.eval(&vars, warnings);
                vars.insert(*idx, value);
            }
            MacroItem::Primitive(primitive) => {
                if primitive.id == PrimitiveId::Comment {
                    continue;
                }
                let count = primitive.params.len();
                let params = primitive
                    .params
                    .iter()
                    .enumerate()
                    .map(|(index, expr)| {
                        let value = expr.eval(&vars, warnings);
                        if is_length_param(primitive.id, index, count) {
                            value * scale
                        } else {
                            value
                        }
                    })
                    .collect();
                evaluated.push(EvaluatedPrimitive { id: primitive.id, params });
            }
            MacroItem::UnknownPrimitive(_) => {}
        }
    }

    evaluated
}

/// Parses a complete macro body (the text between the name's trailing `*`
/// and the closing `%`) into its ordered list of statements.
///
/// Non-fatal problems (an unparseable primitive id, a malformed outline
/// vertex count) are appended to `warnings`; parsing continues with the
/// remaining statements.
pub fn parse_macro_body(body: &str, warnings: &mut Vec<String>) -> Vec<MacroItem> {
    body.split('*')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|stmt| parse_statement(stmt, warnings))
        .collect()
}

fn parse_statement(stmt: &str, warnings: &mut Vec<String>) -> Option<MacroItem> {
    if let Some(rest) = stmt.strip_prefix('$') {
        if let Some(eq) = rest.find('=') {
            let (idx_str, expr_str) = rest.split_at(eq);
            let expr_str = &expr_str[1..];
            return match idx_str.trim().parse::<u32>() {
                Ok(idx) => Some(MacroItem::Assignment(idx, parse_expr(expr_str))),
                Err(_) => {
                    warnings.push(format!("malformed local variable assignment: {}", stmt));
                    None
                }
            };
        }
    }

    let mut fields = stmt.splitn(2, ',');
    let id_field = fields.next().unwrap_or("").trim();

    let code: i64 = match id_field.parse() {
        Ok(c) => c,
        Err(_) => {
            warnings.push(format!("aperture macro primitive has non-numeric id: {}", stmt));
            return None;
        }
    };

    if code == 0 {
        let comment = fields.next().unwrap_or("").trim().to_string();
        return Some(MacroItem::Primitive(MacroPrimitive {
            id: PrimitiveId::Comment,
            params: Vec::new(),
            comment: Some(comment),
        }));
    }

    let id = match PrimitiveId::from_code(code) {
        Some(id) => id,
        None => {
            warnings.push(format!("unsupported aperture macro primitive id {}", code));
            return Some(MacroItem::UnknownPrimitive(code));
        }
    };

    let params: Vec<MacroExpr> = fields
        .next()
        .unwrap_or("")
        .split(',')
        .map(parse_expr)
        .collect();

    // The outline primitive's vertex count (params[1], after exposure) fixes
    // how many coordinate pairs follow it in the primitive line itself, so
    // it must be known at definition time rather than computed from an
    // actual parameter at flash time.
    if id == PrimitiveId::Outline {
        if let Some(count_expr) = params.get(1) {
            if !count_expr.is_immediate() {
                warnings.push(format!(
                    "aperture macro outline vertex count must be immediate, not a $n reference: {}",
                    stmt
                ));
                return None;
            }
        }
    }

    Some(MacroItem::Primitive(MacroPrimitive { id, params, comment: None }))
}

/// Parses one comma-delimited parameter field into a postfix expression.
///
/// Operators (`+ - x X /`) are applied strictly left to right with no
/// precedence, matching the original reader; a `-` with no pending operand
/// on the stack is unary negation rather than subtraction. Because there is
/// no precedence, flat left-to-right evaluation is just postfix with each
/// operator emitted after the operand that follows it, so a binary operator
/// is held in `pending_op` until that next operand has been pushed.
fn parse_expr(field: &str) -> MacroExpr {
    let chars: Vec<char> = field.chars().filter(|c| !c.is_whitespace()).collect();
    let mut items = Vec::new();
    let mut i = 0;
    let mut pending_neg = false;
    let mut pending_op: Option<ExprItem> = None;
    let mut expect_operand = true;

    while i < chars.len() {
        match chars[i] {
            '$' => {
                i += 1;
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let n: u32 = chars[start..i].iter().collect::<String>().parse().unwrap_or(0);
                items.push(ExprItem::PushParam(n));
                if pending_neg {
                    items.push(ExprItem::Neg);
                    pending_neg = false;
                }
                if let Some(op) = pending_op.take() {
                    items.push(op);
                }
                expect_operand = false;
            }
            '-' if expect_operand => {
                pending_neg = !pending_neg;
                i += 1;
            }
            '+' | '-' | 'x' | 'X' | '/' => {
                let op = match chars[i] {
                    '+' => ExprItem::Add,
                    '-' => ExprItem::Sub,
                    'x' | 'X' => ExprItem::Mul,
                    '/' => ExprItem::Div,
                    _ => unreachable!(),
                };
                pending_op = Some(op);
                i += 1;
                expect_operand = true;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let v: f64 = chars[start..i].iter().collect::<String>().parse().unwrap_or(0.0);
                items.push(ExprItem::PushValue(v));
                if pending_neg {
                    items.push(ExprItem::Neg);
                    pending_neg = false;
                }
                if let Some(op) = pending_op.take() {
                    items.push(op);
                }
                expect_operand = false;
            }
            _ => i += 1,
        }
    }

    MacroExpr(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_circle_macro() {
        let mut warnings = Vec::new();
        let items = parse_macro_body("1,1,$1,0,0", &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(items.len(), 1);
        match &items[0] {
            MacroItem::Primitive(p) => {
                assert_eq!(p.id, PrimitiveId::Circle);
                assert_eq!(p.params.len(), 4);
            }
            _ => panic!("expected primitive"),
        }
    }

    #[test]
    fn parses_local_assignment_and_reference() {
        let mut warnings = Vec::new();
        let items = parse_macro_body("$4=$3/2*21,1,$1-$3,$2-$3,0-$1/2-$4,0-$2/2-$4,0", &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(items.len(), 2);
        match &items[0] {
            MacroItem::Assignment(idx, expr) => {
                assert_eq!(*idx, 4);
                assert_eq!(expr.0, vec![ExprItem::PushParam(3), ExprItem::PushValue(2.0), ExprItem::Div]);
            }
            _ => panic!("expected assignment"),
        }
        match &items[1] {
            MacroItem::Primitive(p) => assert_eq!(p.id, PrimitiveId::CenterLine),
            _ => panic!("expected primitive"),
        }
    }

    #[test]
    fn comment_primitive_swallows_remainder() {
        let mut warnings = Vec::new();
        let items = parse_macro_body("0 this is a comment, with a comma", &mut warnings);
        assert_eq!(items.len(), 1);
        match &items[0] {
            MacroItem::Primitive(p) => {
                assert_eq!(p.id, PrimitiveId::Comment);
                assert_eq!(p.comment.as_deref(), Some("this is a comment, with a comma"));
            }
            _ => panic!("expected comment primitive"),
        }
    }

    #[test]
    fn leading_zero_minus_idiom_is_left_to_right() {
        // "0-$1/2-$4" => ((0 - $1) / 2) - $4
        let expr = parse_expr("0-$1/2-$4");
        assert_eq!(
            expr.0,
            vec![
                ExprItem::PushValue(0.0),
                ExprItem::PushParam(1),
                ExprItem::Sub,
                ExprItem::PushValue(2.0),
                ExprItem::Div,
                ExprItem::PushParam(4),
                ExprItem::Sub,
            ]
        );
    }

    #[test]
    fn evaluates_therm_macro_to_the_expected_rectangle() {
        let mut warnings = Vec::new();
        let items = parse_macro_body("$4=$3/2*21,1,$1-$3,$2-$3,-$1/2-$4,-$2/2-$4,0", &mut warnings);
        assert!(warnings.is_empty());

        let mut eval_warnings = Vec::new();
        let evaluated = evaluate_primitives(&items, &[0.100, 0.200, 0.010], Unit::Inches, &mut eval_warnings);
        assert!(eval_warnings.is_empty());
        assert_eq!(evaluated.len(), 1);

        let rect = &evaluated[0];
        assert_eq!(rect.id, PrimitiveId::CenterLine);
        assert_eq!(rect.params[0], 1.0); // exposure, unscaled
        assert_eq!(rect.params[1].round(), 900.0); // width
        assert_eq!(rect.params[2].round(), 1900.0); // height
        assert_eq!(rect.params[3].round(), -550.0); // center x
        assert_eq!(rect.params[4].round(), -1050.0); // center y
        assert_eq!(rect.params[5], 0.0); // rotation, unscaled
    }

    #[test]
    fn outline_with_non_immediate_vertex_count_is_rejected() {
        let mut warnings = Vec::new();
        let items = parse_macro_body("4,1,$1,0,0,1,0,1,1,0,1,0", &mut warnings);
        assert!(items.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("must be immediate"));
    }

    #[test]
    fn outline_with_immediate_vertex_count_parses() {
        let mut warnings = Vec::new();
        let items = parse_macro_body("4,1,4,0,0,1,0,1,1,0,1,0", &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], MacroItem::Primitive(p) if p.id == PrimitiveId::Outline));
    }

    #[test]
    fn unknown_primitive_id_is_reported() {
        let mut warnings = Vec::new();
        let items = parse_macro_body("99,1,2,3", &mut warnings);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(items[0], MacroItem::UnknownPrimitive(99)));
    }
}
