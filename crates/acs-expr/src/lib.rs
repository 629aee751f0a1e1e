//! Condition and template expression language for the shield's rules.
//!
//! Rules carry their matching logic as small text expressions:
//!
//! ```text
//! event.type == 'gps.update' && event.gps.deltaDistanceKm > 200
//! ctx.userKycStatus != 'VERIFIED'
//! exists_hash(event.pod.fileHash)
//! ```
//!
//! The language is deliberately small. Expressions read from three roots
//! (`event`, `ctx`, `system`), support comparison, boolean and arithmetic
//! operators, list membership via `in`, and a closed set of builtin
//! functions. Every expression is compiled once at rule-set load time; a
//! condition that does not compile rejects the whole rule set, naming the
//! offending rule. Runtime failures (missing data, type mismatches) are
//! soft: the engine treats them as "rule did not match".
//!
//! The same expressions power `{{ ... }}` placeholders inside action
//! payloads, see [`Template`] and [`TemplateValue`].

pub mod ast;
pub mod eval;
pub mod parser;
pub mod template;

use thiserror::Error;

pub use ast::{BinaryOp, Expr, Literal, UnaryOp};
pub use eval::{evaluate, stringify, truthy, EvalError, Scope};
pub use template::{Template, TemplateValue};

/// Root names an expression may read from.
const ROOTS: [&str; 3] = ["event", "ctx", "system"];

/// A compile-time rejection of an expression.
///
/// Raised while loading a rule set; the loader wraps it with the offending
/// rule's id.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("syntax error: {detail}")]
    Syntax { detail: String },

    #[error("unknown root `{root}` (expected event, ctx, or system)")]
    UnknownRoot { root: String },

    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },

    #[error("`{name}` takes {expected} argument(s), found {found}")]
    WrongArity {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Parse and validate an expression.
///
/// Validation is structural: path roots must be one of `event`/`ctx`/
/// `system`, function names must be builtins, and builtin arities must
/// match. Type errors are deferred to evaluation time where the data is.
pub fn compile(source: &str) -> Result<Expr, CompileError> {
    let expr = parser::parse(source)?;
    validate(&expr)?;
    Ok(expr)
}

fn validate(expr: &Expr) -> Result<(), CompileError> {
    match expr {
        Expr::Literal(_) => Ok(()),
        Expr::Path(segments) => match segments.first() {
            Some(root) if ROOTS.contains(&root.as_str()) => Ok(()),
            Some(root) => Err(CompileError::UnknownRoot { root: root.clone() }),
            None => Err(CompileError::Syntax {
                detail: "empty path".to_string(),
            }),
        },
        Expr::List(items) => items.iter().try_for_each(validate),
        Expr::Unary { operand, .. } => validate(operand),
        Expr::Binary { lhs, rhs, .. } => {
            validate(lhs)?;
            validate(rhs)
        }
        Expr::Call { name, args } => {
            let expected = eval::builtin_arity(name).ok_or_else(|| CompileError::UnknownFunction {
                name: name.clone(),
            })?;
            if args.len() != expected {
                return Err(CompileError::WrongArity {
                    name: name.clone(),
                    expected,
                    found: args.len(),
                });
            }
            args.iter().try_for_each(validate)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
