//! Postfix arithmetic engine for aperture macro parameters.
//!
//! The token stream for one parameter is built once, at parse time
//! (see [`crate::macro_def`]), and re-evaluated every time an aperture
//! referencing the macro is flashed. The operator set is the four basic
//! arithmetic operators plus unary negation, exactly as read by
//! `AM_PARAM::ReadParam` in the original RS-274X reference reader.

use std::collections::HashMap;

/// One item of a postfix (reverse-Polish) expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprItem {
    /// An immediate numeric literal.
    PushValue(f64),
    /// A reference to the Nth actual parameter or local variable, 1-based.
    PushParam(u32),
    Add,
    Sub,
    Mul,
    Div,
    /// Unary negation, used for a leading `-` or `0-` idiom in macro bodies.
    Neg,
}

/// A parsed parameter expression, stored as a flat postfix sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MacroExpr(pub Vec<ExprItem>);

impl MacroExpr {
    pub fn immediate(value: f64) -> Self {
        MacroExpr(vec![ExprItem::PushValue(value)])
    }

    /// True if the expression contains no `$n` references, i.e. it can be
    /// evaluated without any actual parameters or local variables bound.
    pub fn is_immediate(&self) -> bool {
        !self.0.iter().any(|item| matches!(item, ExprItem::PushParam(_)))
    }

    /// Evaluates the expression against a variable context.
    ///
    /// `vars` holds both the actual parameters passed to `AD` (seeded under
    /// their 1-based index) and any local `$n=` assignments made earlier in
    /// the same macro body. Division by zero and unresolved `$n` references
    /// are non-fatal: they evaluate to `0.0` and push one message onto
    /// `warnings`.
    pub fn eval(&self, vars: &HashMap<u32, f64>, warnings: &mut Vec<String>) -> f64 {
        let mut stack: Vec<f64> = Vec::new();

        for item in &self.0 {
            match item {
                ExprItem::PushValue(v) => stack.push(*v),
                ExprItem::PushParam(n) => {
                    let v = vars.get(n).copied().unwrap_or_else(|| {
                        warnings.push(format!("aperture macro references undefined parameter ${}", n));
                        0.0
                    });
                    stack.push(v);
                }
                ExprItem::Neg => {
                    let a = stack.pop().unwrap_or(0.0);
                    stack.push(-a);
                }
                ExprItem::Add | ExprItem::Sub | ExprItem::Mul | ExprItem::Div => {
                    let b = stack.pop().unwrap_or(0.0);
                    let a = stack.pop().unwrap_or(0.0);
                    let v = match item {
                        ExprItem::Add => a + b,
                        ExprItem::Sub => a - b,
                        ExprItem::Mul => a * b,
                        ExprItem::Div => {
                            if b == 0.0 {
                                warnings.push("division by zero in aperture macro expression".to_string());
                                0.0
                            } else {
                                a / b
                            }
                        }
                        _ => unreachable!(),
                    };
                    stack.push(v);
                }
            }
        }

        stack.pop().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_constant() {
        let expr = MacroExpr::immediate(3.5);
        let mut warnings = Vec::new();
        assert_eq!(expr.eval(&HashMap::new(), &mut warnings), 3.5);
        assert!(warnings.is_empty());
    }

    #[test]
    fn evaluates_param_reference() {
        let expr = MacroExpr(vec![ExprItem::PushParam(2), ExprItem::PushValue(2.0), ExprItem::Div]);
        let mut vars = HashMap::new();
        vars.insert(2, 10.0);
        let mut warnings = Vec::new();
        assert_eq!(expr.eval(&vars, &mut warnings), 5.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn division_by_zero_warns_and_yields_zero() {
        let expr = MacroExpr(vec![ExprItem::PushValue(1.0), ExprItem::PushValue(0.0), ExprItem::Div]);
        let mut warnings = Vec::new();
        assert_eq!(expr.eval(&HashMap::new(), &mut warnings), 0.0);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn undefined_parameter_warns_and_yields_zero() {
        let expr = MacroExpr(vec![ExprItem::PushParam(9)]);
        let mut warnings = Vec::new();
        assert_eq!(expr.eval(&HashMap::new(), &mut warnings), 0.0);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn complex_expression_matches_rectherm_half_thickness() {
        // $4=$3/2 from the RECTHERM example.
        let expr = MacroExpr(vec![ExprItem::PushParam(3), ExprItem::PushValue(2.0), ExprItem::Div]);
        let mut vars = HashMap::new();
        vars.insert(3, 0.01);
        let mut warnings = Vec::new();
        assert_eq!(expr.eval(&vars, &mut warnings), 0.005);
    }
}
