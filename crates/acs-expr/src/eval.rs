//! Expression evaluation over `serde_json::Value`.
//!
//! Evaluation is side-effect-free. The only external touch point is the
//! [`Scope`] trait, which supplies the context roots and the `exists_hash`
//! point lookup. Missing paths resolve to `null`; type mismatches are
//! [`EvalError`]s for the caller to catch at the rule boundary.

use serde_json::{Number, Value};
use thiserror::Error;

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};

/// What an expression can see while evaluating.
///
/// The engine's `EvaluationContext` implements this; tests substitute small
/// in-memory scopes.
pub trait Scope {
    /// Resolve a root name (`event`, `ctx`, `system`) to its value.
    fn root(&self, name: &str) -> Option<&Value>;

    /// Point lookup backing the `exists_hash` builtin.
    ///
    /// Returns [`EvalError::AdapterUnavailable`] when evaluation runs without
    /// a persistence adapter attached.
    fn hash_exists(&self, hash: &str) -> Result<bool, EvalError>;
}

/// A runtime evaluation failure.
///
/// Never fatal on its own: the evaluator treats a failing condition as
/// "no match" and a failing placeholder as "leave literal".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("type error: {detail}")]
    Type { detail: String },

    #[error("arithmetic error: {detail}")]
    Arithmetic { detail: String },

    #[error("`exists_hash` requires a persistence adapter and none is attached")]
    AdapterUnavailable,

    #[error("persistence lookup failed: {detail}")]
    Lookup { detail: String },

    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },
}

/// Arity of a builtin function, or `None` if the name is not a builtin.
///
/// Shared by compile-time validation and the call evaluator so the two can
/// never disagree about the vocabulary.
pub(crate) fn builtin_arity(name: &str) -> Option<usize> {
    match name {
        "exists_hash" | "len" | "abs" | "lower" | "upper" => Some(1),
        _ => None,
    }
}

/// Evaluate a compiled expression against a scope.
pub fn evaluate(expr: &Expr, scope: &dyn Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(lit) => Ok(literal_value(lit)),
        Expr::Path(segments) => Ok(resolve_path(segments, scope)),
        Expr::List(items) => {
            let values = items
                .iter()
                .map(|item| evaluate(item, scope))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(values))
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, scope)?;
            apply_unary(*op, value)
        }
        Expr::Binary { op: BinaryOp::And, lhs, rhs } => {
            if !truthy(&evaluate(lhs, scope)?) {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(truthy(&evaluate(rhs, scope)?)))
        }
        Expr::Binary { op: BinaryOp::Or, lhs, rhs } => {
            if truthy(&evaluate(lhs, scope)?) {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(truthy(&evaluate(rhs, scope)?)))
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, scope)?;
            let rhs = evaluate(rhs, scope)?;
            apply_binary(*op, &lhs, &rhs)
        }
        Expr::Call { name, args } => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call_builtin(name, &values, scope)
        }
    }
}

/// Truthiness of an evaluation result.
///
/// `null`/`false` are false; numbers are false iff zero; strings and lists
/// are false iff empty; objects are always true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Render a value for substitution into a payload template.
///
/// Strings substitute bare (no surrounding quotes); everything else renders
/// as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::from(*i),
        Literal::Float(f) => Value::from(*f),
        Literal::Str(s) => Value::String(s.clone()),
    }
}

fn resolve_path(segments: &[String], scope: &dyn Scope) -> Value {
    let mut iter = segments.iter();
    let mut current = match iter.next().and_then(|root| scope.root(root)) {
        Some(value) => value,
        None => return Value::Null,
    };
    for segment in iter {
        current = match current {
            Value::Object(map) => match map.get(segment) {
                Some(value) => value,
                None => return Value::Null,
            },
            Value::Array(items) => {
                match segment.parse::<usize>().ok().and_then(|idx| items.get(idx)) {
                    Some(value) => value,
                    None => return Value::Null,
                }
            }
            _ => return Value::Null,
        };
    }
    current.clone()
}

fn apply_unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!truthy(&value))),
        UnaryOp::Neg => match &value {
            Value::Number(n) if n.is_i64() => Ok(Value::from(-n.as_i64().unwrap_or(0))),
            Value::Number(n) => Ok(Value::from(-n.as_f64().unwrap_or(0.0))),
            other => Err(EvalError::Type {
                detail: format!("cannot negate {}", type_name(other)),
            }),
        },
    }
}

fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(lhs, rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!loose_eq(lhs, rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => order(op, lhs, rhs),
        BinaryOp::In => membership(lhs, rhs),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, lhs, rhs)
        }
        // And/Or short-circuit inside `evaluate` and never reach here.
        BinaryOp::And | BinaryOp::Or => Err(EvalError::Type {
            detail: "logical operator outside evaluation".to_string(),
        }),
    }
}

/// Equality with numeric widening: `1 == 1.0` holds. Everything else is
/// strict structural equality.
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

fn order(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let ordering = match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    };
    let ordering = ordering.ok_or_else(|| EvalError::Type {
        detail: format!(
            "cannot order {} {} {}",
            type_name(lhs),
            op.symbol(),
            type_name(rhs)
        ),
    })?;
    let holds = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    };
    Ok(Value::Bool(holds))
}

fn membership(needle: &Value, haystack: &Value) -> Result<Value, EvalError> {
    match haystack {
        Value::Array(items) => Ok(Value::Bool(items.iter().any(|item| loose_eq(needle, item)))),
        Value::String(text) => match needle {
            Value::String(sub) => Ok(Value::Bool(text.contains(sub.as_str()))),
            other => Err(EvalError::Type {
                detail: format!("cannot search a string for {}", type_name(other)),
            }),
        },
        Value::Object(map) => match needle {
            Value::String(key) => Ok(Value::Bool(map.contains_key(key))),
            other => Err(EvalError::Type {
                detail: format!("object membership needs a string key, got {}", type_name(other)),
            }),
        },
        other => Err(EvalError::Type {
            detail: format!("`in` expects a list, string, or object, got {}", type_name(other)),
        }),
    }
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let (a, b) = match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(EvalError::Arithmetic {
                    detail: "non-finite operand".to_string(),
                })
            }
        },
        _ => {
            return Err(EvalError::Type {
                detail: format!(
                    "cannot apply {} to {} and {}",
                    op.symbol(),
                    type_name(lhs),
                    type_name(rhs)
                ),
            })
        }
    };

    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0.0 {
        return Err(EvalError::Arithmetic {
            detail: "division by zero".to_string(),
        });
    }

    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    };

    // Keep integer-looking results integral so templates render `5`, not `5.0`.
    if lhs.as_i64().is_some()
        && rhs.as_i64().is_some()
        && result.fract() == 0.0
        && result.abs() < i64::MAX as f64
    {
        return Ok(Value::from(result as i64));
    }

    Number::from_f64(result)
        .map(Value::Number)
        .ok_or_else(|| EvalError::Arithmetic {
            detail: format!("non-finite result from {}", op.symbol()),
        })
}

fn call_builtin(name: &str, args: &[Value], scope: &dyn Scope) -> Result<Value, EvalError> {
    let single = |args: &[Value]| -> Result<Value, EvalError> {
        args.first().cloned().ok_or_else(|| EvalError::Type {
            detail: format!("`{name}` called without arguments"),
        })
    };

    match name {
        "exists_hash" => match single(args)? {
            Value::String(hash) => scope.hash_exists(&hash).map(Value::Bool),
            other => Err(EvalError::Type {
                detail: format!("`exists_hash` expects a string, got {}", type_name(&other)),
            }),
        },
        "len" => match single(args)? {
            Value::String(s) => Ok(Value::from(s.chars().count() as i64)),
            Value::Array(items) => Ok(Value::from(items.len() as i64)),
            Value::Object(map) => Ok(Value::from(map.len() as i64)),
            other => Err(EvalError::Type {
                detail: format!("`len` expects a string, list, or object, got {}", type_name(&other)),
            }),
        },
        "abs" => match single(args)? {
            Value::Number(n) if n.is_i64() => Ok(Value::from(n.as_i64().unwrap_or(0).abs())),
            Value::Number(n) => Ok(Value::from(n.as_f64().unwrap_or(0.0).abs())),
            other => Err(EvalError::Type {
                detail: format!("`abs` expects a number, got {}", type_name(&other)),
            }),
        },
        "lower" => match single(args)? {
            Value::String(s) => Ok(Value::String(s.to_lowercase())),
            other => Err(EvalError::Type {
                detail: format!("`lower` expects a string, got {}", type_name(&other)),
            }),
        },
        "upper" => match single(args)? {
            Value::String(s) => Ok(Value::String(s.to_uppercase())),
            other => Err(EvalError::Type {
                detail: format!("`upper` expects a string, got {}", type_name(&other)),
            }),
        },
        _ => Err(EvalError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::parser::parse;

    /// Scope over fixed JSON documents, with a seeded hash set.
    struct TestScope {
        event: Value,
        ctx: Value,
        system: Value,
        hashes: Vec<String>,
    }

    impl TestScope {
        fn new(event: Value) -> Self {
            TestScope {
                event,
                ctx: json!({}),
                system: json!({}),
                hashes: Vec::new(),
            }
        }
    }

    impl Scope for TestScope {
        fn root(&self, name: &str) -> Option<&Value> {
            match name {
                "event" => Some(&self.event),
                "ctx" => Some(&self.ctx),
                "system" => Some(&self.system),
                _ => None,
            }
        }

        fn hash_exists(&self, hash: &str) -> Result<bool, EvalError> {
            Ok(self.hashes.iter().any(|h| h == hash))
        }
    }

    fn eval_with(scope: &TestScope, source: &str) -> Result<Value, EvalError> {
        let expr = parse(source).unwrap();
        evaluate(&expr, scope)
    }

    #[test]
    fn path_resolution_walks_objects_and_arrays() {
        let scope = TestScope::new(json!({
            "gps": {"deltaDistanceKm": 250},
            "stops": [{"city": "Pune"}, {"city": "Nagpur"}]
        }));
        assert_eq!(eval_with(&scope, "event.gps.deltaDistanceKm").unwrap(), json!(250));
        assert_eq!(eval_with(&scope, "event.stops.1.city").unwrap(), json!("Nagpur"));
    }

    #[test]
    fn missing_path_resolves_to_null() {
        let scope = TestScope::new(json!({"gps": {}}));
        assert_eq!(eval_with(&scope, "event.gps.deltaDistanceKm").unwrap(), Value::Null);
        assert_eq!(eval_with(&scope, "event.nothing.at.all").unwrap(), Value::Null);
    }

    #[test]
    fn null_comparison_supports_existence_checks() {
        let scope = TestScope::new(json!({"gps": {"deltaDistanceKm": 10}}));
        assert_eq!(eval_with(&scope, "event.gps != null").unwrap(), json!(true));
        assert_eq!(eval_with(&scope, "event.missing == null").unwrap(), json!(true));
    }

    #[test]
    fn ordering_against_null_is_a_type_error() {
        let scope = TestScope::new(json!({}));
        let err = eval_with(&scope, "event.gps.deltaDistanceKm > 200").unwrap_err();
        assert!(matches!(err, EvalError::Type { .. }));
    }

    #[test]
    fn numeric_widening_in_equality() {
        let scope = TestScope::new(json!({"a": 1, "b": 1.0}));
        assert_eq!(eval_with(&scope, "event.a == event.b").unwrap(), json!(true));
    }

    #[test]
    fn logical_operators_short_circuit() {
        // The right side would be a type error if evaluated.
        let scope = TestScope::new(json!({}));
        assert_eq!(
            eval_with(&scope, "false && (event.x > 1)").unwrap(),
            json!(false)
        );
        assert_eq!(
            eval_with(&scope, "true || (event.x > 1)").unwrap(),
            json!(true)
        );
    }

    #[test]
    fn membership_in_list_string_and_object() {
        let mut scope = TestScope::new(json!({"tag": "fraud"}));
        scope.system = json!({"watch": {"devices": ["dev-1", "dev-2"], "note": "flagged dev-1"}});
        assert_eq!(
            eval_with(&scope, "'dev-1' in system.watch.devices").unwrap(),
            json!(true)
        );
        assert_eq!(
            eval_with(&scope, "'dev-3' in system.watch.devices").unwrap(),
            json!(false)
        );
        assert_eq!(
            eval_with(&scope, "'dev-1' in system.watch.note").unwrap(),
            json!(true)
        );
        assert_eq!(
            eval_with(&scope, "'devices' in system.watch").unwrap(),
            json!(true)
        );
    }

    #[test]
    fn arithmetic_keeps_integers_integral() {
        let scope = TestScope::new(json!({}));
        assert_eq!(eval_with(&scope, "2 + 3").unwrap(), json!(5));
        assert_eq!(eval_with(&scope, "7 / 2").unwrap(), json!(3.5));
        assert_eq!(eval_with(&scope, "10 % 3").unwrap(), json!(1));
    }

    #[test]
    fn division_by_zero_is_an_arithmetic_error() {
        let scope = TestScope::new(json!({}));
        assert!(matches!(
            eval_with(&scope, "1 / 0").unwrap_err(),
            EvalError::Arithmetic { .. }
        ));
    }

    #[test]
    fn exists_hash_consults_the_scope() {
        let mut scope = TestScope::new(json!({"pod": {"fileHash": "abc123"}}));
        scope.hashes.push("abc123".to_string());
        assert_eq!(
            eval_with(&scope, "exists_hash(event.pod.fileHash)").unwrap(),
            json!(true)
        );
        assert_eq!(
            eval_with(&scope, "exists_hash('never-seen')").unwrap(),
            json!(false)
        );
    }

    #[test]
    fn len_and_case_builtins() {
        let scope = TestScope::new(json!({"note": "Fraud", "items": [1, 2, 3]}));
        assert_eq!(eval_with(&scope, "len(event.note)").unwrap(), json!(5));
        assert_eq!(eval_with(&scope, "len(event.items)").unwrap(), json!(3));
        assert_eq!(eval_with(&scope, "lower(event.note)").unwrap(), json!("fraud"));
        assert_eq!(eval_with(&scope, "upper(event.note)").unwrap(), json!("FRAUD"));
    }

    #[test]
    fn truthiness_table() {
        assert!(!truthy(&Value::Null));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!([])));
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(0.5)));
        assert!(truthy(&json!("x")));
        assert!(truthy(&json!([0])));
        assert!(truthy(&json!({})));
    }

    #[test]
    fn stringify_renders_strings_bare() {
        assert_eq!(stringify(&json!("SHP-1")), "SHP-1");
        assert_eq!(stringify(&json!(250)), "250");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&Value::Null), "null");
    }
}
