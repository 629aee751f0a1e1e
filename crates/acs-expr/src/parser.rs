//! nom parser for the condition language.
//!
//! Precedence, loosest first: `||`, `&&`, comparisons (`== != < <= > >= in`),
//! additive (`+ -`), multiplicative (`* / %`), unary (`! -`), primary.
//! All binary operators associate left. String literals accept single or
//! double quotes and carry no escape sequences.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, anychar, char, digit1, multispace0},
    combinator::{all_consuming, map, map_res, not, opt, recognize, value, verify},
    error::{convert_error, VerboseError},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::CompileError;

type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Parse one complete expression, consuming the whole input.
///
/// Validation of roots/functions happens afterwards in [`crate::compile`];
/// this stage is purely syntactic.
pub fn parse(input: &str) -> Result<Expr, CompileError> {
    match all_consuming(terminated(expression, multispace0))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(CompileError::Syntax {
            detail: convert_error(input, e),
        }),
        Err(nom::Err::Incomplete(_)) => Err(CompileError::Syntax {
            detail: "incomplete input".to_string(),
        }),
    }
}

/// Skip leading whitespace (including newlines: conditions are often written
/// across several lines in rule files) before the inner parser.
fn ws<'a, T>(
    inner: impl FnMut(&'a str) -> PResult<'a, T>,
) -> impl FnMut(&'a str) -> PResult<'a, T> {
    preceded(multispace0, inner)
}

/// Match `kw` only at a word boundary, so `in` never eats the front of
/// `index` and `true` never eats `trueish`.
fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    terminated(
        tag(kw),
        not(verify(anychar, |c: &char| {
            c.is_alphanumeric() || *c == '_'
        })),
    )
}

// EBNF: expression = and_expr , { "||" , and_expr }
fn expression(input: &str) -> PResult<'_, Expr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(ws(tag("||")), and_expr))(input)?;
    Ok((input, fold_chain(first, BinaryOp::Or, rest)))
}

// EBNF: and_expr = comparison , { "&&" , comparison }
fn and_expr(input: &str) -> PResult<'_, Expr> {
    let (input, first) = comparison(input)?;
    let (input, rest) = many0(preceded(ws(tag("&&")), comparison))(input)?;
    Ok((input, fold_chain(first, BinaryOp::And, rest)))
}

fn fold_chain(first: Expr, op: BinaryOp, rest: Vec<Expr>) -> Expr {
    rest.into_iter()
        .fold(first, |lhs, rhs| Expr::binary(op, lhs, rhs))
}

// EBNF: comparison = additive , [ comparison_op , additive ]
fn comparison(input: &str) -> PResult<'_, Expr> {
    let (input, lhs) = additive(input)?;
    let (input, tail) = opt(pair(comparison_op, additive))(input)?;
    Ok((input, match tail {
        Some((op, rhs)) => Expr::binary(op, lhs, rhs),
        None => lhs,
    }))
}

fn comparison_op(input: &str) -> PResult<'_, BinaryOp> {
    ws(alt((
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Ne, tag("!=")),
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Lt, tag("<")),
        value(BinaryOp::Gt, tag(">")),
        value(BinaryOp::In, keyword("in")),
    )))(input)
}

// EBNF: additive = multiplicative , { ( "+" | "-" ) , multiplicative }
fn additive(input: &str) -> PResult<'_, Expr> {
    let (input, first) = multiplicative(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Add, char('+')),
            value(BinaryOp::Sub, char('-')),
        ))),
        multiplicative,
    ))(input)?;
    Ok((input, fold_pairs(first, rest)))
}

// EBNF: multiplicative = unary , { ( "*" | "/" | "%" ) , unary }
fn multiplicative(input: &str) -> PResult<'_, Expr> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Mul, char('*')),
            value(BinaryOp::Div, char('/')),
            value(BinaryOp::Rem, char('%')),
        ))),
        unary,
    ))(input)?;
    Ok((input, fold_pairs(first, rest)))
}

fn fold_pairs(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    rest.into_iter()
        .fold(first, |lhs, (op, rhs)| Expr::binary(op, lhs, rhs))
}

// EBNF: unary = ( "!" | "-" ) , unary | primary
fn unary(input: &str) -> PResult<'_, Expr> {
    alt((
        map(preceded(ws(char('!')), unary), |e| {
            Expr::unary(UnaryOp::Not, e)
        }),
        map(preceded(ws(char('-')), unary), |e| {
            Expr::unary(UnaryOp::Neg, e)
        }),
        primary,
    ))(input)
}

// EBNF: primary = literal | list | call | path | "(" expression ")"
fn primary(input: &str) -> PResult<'_, Expr> {
    ws(alt((
        literal_expr,
        list,
        call,
        path,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))(input)
}

fn literal_expr(input: &str) -> PResult<'_, Expr> {
    alt((
        value(Expr::Literal(Literal::Null), keyword("null")),
        value(Expr::Literal(Literal::Bool(true)), keyword("true")),
        value(Expr::Literal(Literal::Bool(false)), keyword("false")),
        map(number, Expr::Literal),
        map(string, |s| Expr::Literal(Literal::Str(s))),
    ))(input)
}

// EBNF: number = digits , [ "." , digits ]    (sign comes from unary "-")
fn number(input: &str) -> PResult<'_, Literal> {
    alt((
        map_res(
            recognize(tuple((digit1, char('.'), digit1))),
            |text: &str| text.parse::<f64>().map(Literal::Float),
        ),
        map_res(digit1, |text: &str| text.parse::<i64>().map(Literal::Int)),
    ))(input)
}

// EBNF: string = "'" , { any - "'" } , "'" | '"' , { any - '"' } , '"'
fn string(input: &str) -> PResult<'_, String> {
    alt((
        map(
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            str::to_string,
        ),
        map(
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
            str::to_string,
        ),
    ))(input)
}

// EBNF: list = "[" , [ expression , { "," , expression } ] , "]"
fn list(input: &str) -> PResult<'_, Expr> {
    map(
        delimited(
            char('['),
            separated_list0(ws(char(',')), expression),
            ws(char(']')),
        ),
        Expr::List,
    )(input)
}

// EBNF: call = identifier , "(" , [ expression , { "," , expression } ] , ")"
fn call(input: &str) -> PResult<'_, Expr> {
    let (input, name) = identifier(input)?;
    let (input, args) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    )(input)?;
    Ok((
        input,
        Expr::Call {
            name: name.to_string(),
            args,
        },
    ))
}

// EBNF: path = identifier , { "." , ( identifier | digits ) }
fn path(input: &str) -> PResult<'_, Expr> {
    let (input, first) = identifier(input)?;
    let (input, rest) = many0(preceded(
        char('.'),
        alt((map(identifier, str::to_string), map(digit1, str::to_string))),
    ))(input)?;

    let mut segments = Vec::with_capacity(rest.len() + 1);
    segments.push(first.to_string());
    segments.extend(rest);
    Ok((input, Expr::Path(segments)))
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};

    fn path_of(segments: &[&str]) -> Expr {
        Expr::Path(segments.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn parses_comparison_over_path() {
        let expr = parse("event.gps.deltaDistanceKm > 200").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Gt,
                path_of(&["event", "gps", "deltaDistanceKm"]),
                Expr::Literal(Literal::Int(200)),
            )
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // a || b && c  ≡  a || (b && c)
        let expr = parse("ctx.a || ctx.b && ctx.c").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Or, rhs, .. } => {
                assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::And, .. }));
            }
            other => panic!("expected Or at the top, got {:?}", other),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        // 1 + 2 * 3  ≡  1 + (2 * 3)
        let expr = parse("1 + 2 * 3").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Add, rhs, .. } => {
                assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("expected Add at the top, got {:?}", other),
        }
    }

    #[test]
    fn parses_both_quote_styles() {
        assert_eq!(
            parse("'single'").unwrap(),
            Expr::Literal(Literal::Str("single".to_string()))
        );
        assert_eq!(
            parse("\"double\"").unwrap(),
            Expr::Literal(Literal::Str("double".to_string()))
        );
    }

    #[test]
    fn parses_empty_string_literal() {
        assert_eq!(
            parse("''").unwrap(),
            Expr::Literal(Literal::Str(String::new()))
        );
    }

    #[test]
    fn parses_in_operator_with_list() {
        let expr = parse("ctx.role in ['driver', 'carrier']").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::In, rhs, .. } => match *rhs {
                Expr::List(items) => assert_eq!(items.len(), 2),
                other => panic!("expected a list on the right, got {:?}", other),
            },
            other => panic!("expected In, got {:?}", other),
        }
    }

    #[test]
    fn in_does_not_swallow_identifier_prefixes() {
        // `index` must parse as a path segment, not the `in` operator.
        let expr = parse("ctx.index > 1").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Gt, lhs, .. } => {
                assert_eq!(*lhs, path_of(&["ctx", "index"]));
            }
            other => panic!("expected Gt over ctx.index, got {:?}", other),
        }
    }

    #[test]
    fn parses_numeric_path_segment_as_index() {
        assert_eq!(
            parse("event.stops.0.city").unwrap(),
            path_of(&["event", "stops", "0", "city"])
        );
    }

    #[test]
    fn parses_call_with_arguments() {
        let expr = parse("exists_hash(event.pod.fileHash)").unwrap();
        match expr {
            Expr::Call { name, args } => {
                assert_eq!(name, "exists_hash");
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn unary_not_and_negation() {
        assert_eq!(
            parse("!ctx.verified").unwrap(),
            Expr::unary(UnaryOp::Not, path_of(&["ctx", "verified"]))
        );
        assert_eq!(
            parse("-5").unwrap(),
            Expr::unary(UnaryOp::Neg, Expr::Literal(Literal::Int(5)))
        );
    }

    #[test]
    fn parses_parenthesized_grouping() {
        // (1 + 2) * 3  keeps Add inside Mul
        let expr = parse("(1 + 2) * 3").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Mul, lhs, .. } => {
                assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected Mul at the top, got {:?}", other),
        }
    }

    #[test]
    fn parses_multiline_condition() {
        let source = "event.type == 'gps.ping'\n  && event.gps.deltaDistanceKm > 200\n  && event.gps.deltaTimeSec < 300";
        assert!(parse(source).is_ok());
    }

    #[test]
    fn keyword_literals_respect_word_boundaries() {
        assert_eq!(parse("trueish").unwrap(), path_of(&["trueish"]));
        assert_eq!(parse("nullable").unwrap(), path_of(&["nullable"]));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("event.type == 'x' ???").is_err());
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(parse("event.type == 'gps.ping").is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }

    #[test]
    fn float_literals_parse_as_floats() {
        assert_eq!(parse("0.6").unwrap(), Expr::Literal(Literal::Float(0.6)));
    }
}
