use crate::ast::{Filter, Function, Literal, Query, Selector};
use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, is_not, tag, take_while1};
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{all_consuming, map, map_res, opt, value};
use nom::multi::separated_list0;
use nom::number::complete::recognize_float;
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated};
use nom::IResult;

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

pub(crate) fn query(input: &str) -> IResult<&str, Query> {
    map(
        all_consuming(pair(selector, opt(function))),
        |(selector, function)| Query { selector, function },
    )(input)
}

pub(crate) fn selector_only(input: &str) -> IResult<&str, Selector> {
    all_consuming(selector)(input)
}

fn selector(input: &str) -> IResult<&str, Selector> {
    map(
        delimited(
            ws(char('{')),
            terminated(separated_list0(ws(char(',')), filter), opt(ws(char(',')))),
            ws(char('}')),
        ),
        |filters| Selector { filters },
    )(input)
}

fn function(input: &str) -> IResult<&str, Function> {
    map(
        preceded(
            pair(ws(char('|')), tag("count")),
            terminated(
                opt(preceded(
                    ws(tag("==")),
                    map_res(digit1, |s: &str| s.parse::<u64>()),
                )),
                multispace0,
            ),
        ),
        |expected| Function::Count { expected },
    )(input)
}

fn filter(input: &str) -> IResult<&str, Filter> {
    alt((
        map(
            preceded(pair(terminated(char('!'), multispace0), tag("has")), parens),
            |path| Filter::NotHasKey(path.to_string()),
        ),
        map(preceded(tag("has"), parens), |path| {
            Filter::HasKey(path.to_string())
        }),
        map(separated_pair(path, ws(char('=')), literal), |(key, value)| {
            Filter::Eq {
                key: key.to_string(),
                value,
            }
        }),
    ))(input)
}

fn parens(input: &str) -> IResult<&str, &str> {
    delimited(ws(char('(')), path, ws(char(')')))(input)
}

fn path(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '[' | ']' | '@')
    })(input)
}

fn literal(input: &str) -> IResult<&str, Literal> {
    alt((
        map(string, Literal::String),
        value(Literal::Bool(true), tag("true")),
        value(Literal::Bool(false), tag("false")),
        value(Literal::Null, tag("null")),
        number,
    ))(input)
}

fn string(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((
                    value("\\", char('\\')),
                    value("\"", char('"')),
                    value("\n", char('n')),
                    value("\t", char('t')),
                )),
            )),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)
}

fn number(input: &str) -> IResult<&str, Literal> {
    map_res(recognize_float, |s: &str| {
        if s.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
            return s.parse::<f64>().map(Literal::Float);
        }
        if let Ok(i) = s.parse::<i64>() {
            return Ok(Literal::Integer(i));
        }
        match s.parse::<u64>() {
            Ok(u) => Ok(Literal::Unsigned(u)),
            Err(_) => s.parse::<f64>().map(Literal::Float),
        }
    })(input)
}
