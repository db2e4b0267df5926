mod ast;
mod error;
mod grammar;

pub use ast::{Filter, Function, Literal, Query, Selector};
pub use error::Error;

/// Parses a full check such as `{event_type="dns", dns.type="query"} | count == 2`.
pub fn parse(query: &str) -> Result<Query, Error> {
    grammar::query(query)
        .map(|(_, q)| q)
        .map_err(|e| Error::from_nom(query, e))
}

/// Parses a bare selector, rejecting any trailing `| count` stage.
pub fn parse_selector(selector: &str) -> Result<Selector, Error> {
    grammar::selector_only(selector)
        .map(|(_, s)| s)
        .map_err(|e| Error::from_nom(selector, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector() {
        let query = match parse(r#"{event_type="dns"}"#) {
            Ok(q) => q,
            Err(e) => panic!("{:?}", e),
        };

        assert_eq!(query.function, None);
        assert_eq!(
            query.selector.filters,
            vec![Filter::Eq {
                key: "event_type".to_string(),
                value: Literal::String("dns".to_string()),
            }]
        );

        let query = match parse(r#"{ event_type = "dns", dns.type="query" , }"#) {
            Ok(q) => q,
            Err(e) => panic!("{:?}", e),
        };

        assert_eq!(query.selector.filters.len(), 2);
        assert_eq!(
            query.selector.filters[1],
            Filter::Eq {
                key: "dns.type".to_string(),
                value: Literal::String("query".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_count() {
        let query = match parse(r#"{event_type="dns", dns.type="answer"} | count == 36"#) {
            Ok(q) => q,
            Err(e) => panic!("{:?}", e),
        };

        assert_eq!(query.selector.filters.len(), 2);
        assert_eq!(
            query.function,
            Some(Function::Count {
                expected: Some(36)
            })
        );

        let query = match parse(r#"{} | count"#) {
            Ok(q) => q,
            Err(e) => panic!("{:?}", e),
        };

        assert!(query.selector.filters.is_empty());
        assert_eq!(query.function, Some(Function::Count { expected: None }));
    }

    #[test]
    fn test_parse_literals() {
        let selector = match parse_selector(
            r#"{dest_port=53, flow.age=1.5, alert.blocked=false, tx_id=null, msg="say \"hi\"\n"}"#,
        ) {
            Ok(s) => s,
            Err(e) => panic!("{:?}", e),
        };

        let values: Vec<Literal> = selector
            .filters
            .into_iter()
            .map(|f| match f {
                Filter::Eq { value, .. } => value,
                other => panic!("unexpected filter {:?}", other),
            })
            .collect();
        assert_eq!(
            values,
            vec![
                Literal::Integer(53),
                Literal::Float(1.5),
                Literal::Bool(false),
                Literal::Null,
                Literal::String("say \"hi\"\n".to_string()),
            ]
        );

        let selector = parse_selector(
            r#"{flow_id=18446744073709551615, a=-9223372036854775808, b=18446744073709551616}"#,
        )
        .unwrap();
        let values: Vec<&Literal> = selector
            .filters
            .iter()
            .map(|f| match f {
                Filter::Eq { value, .. } => value,
                other => panic!("unexpected filter {:?}", other),
            })
            .collect();
        assert_eq!(values[0], &Literal::Unsigned(u64::MAX));
        assert_eq!(values[1], &Literal::Integer(i64::MIN));
        assert_eq!(values[2], &Literal::Float(18446744073709551616.0));

        let selector = parse_selector(r#"{rrname=""}"#).unwrap();
        assert_eq!(
            selector.filters[0],
            Filter::Eq {
                key: "rrname".to_string(),
                value: Literal::String(String::new()),
            }
        );
    }

    #[test]
    fn test_parse_key_presence() {
        let selector = match parse_selector(r#"{has(dns.answers[0].rdata), !has(alert), hash="x"}"#) {
            Ok(s) => s,
            Err(e) => panic!("{:?}", e),
        };

        assert_eq!(
            selector.filters,
            vec![
                Filter::HasKey("dns.answers[0].rdata".to_string()),
                Filter::NotHasKey("alert".to_string()),
                Filter::Eq {
                    key: "hash".to_string(),
                    value: Literal::String("x".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(r#"event_type="dns""#).is_err());
        assert!(parse(r#"{event_type=dns}"#).is_err());
        assert!(parse(r#"{event_type="dns"} | sum"#).is_err());
        assert!(parse_selector(r#"{event_type="dns"} | count"#).is_err());
        assert!(parse_selector(r#"{http/url="/index.html"}"#).is_err());

        match parse(r#"{event_type="dns" dns.type="query"}"#) {
            Err(Error::Syntax { offset, .. }) => assert!(offset > 0),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_display_filter() {
        let selector = parse_selector(r#"{event_type="dns", has(dns.id), !has(alert), dest_port=53}"#).unwrap();
        let rendered: Vec<String> = selector.filters.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                r#"event_type="dns""#,
                "has(dns.id)",
                "!has(alert)",
                "dest_port=53",
            ]
        );
    }
}
