use serde_json::{Map, Value};

use zbxapi::error::{ConfigError, Error};

/// Turn positional `name:value` tokens into request parameters.
///
/// `filter` and `search` values are `+`-separated `key:value` pairs whose
/// values split on `,` into lists. Bare `true`/`yes` strings become
/// booleans. Unless the caller says otherwise, results are capped at 10
/// records and search matches require every pattern, anchored at the
/// start.
pub fn parse_params(tokens: &[String]) -> Result<Map<String, Value>, Error> {
    let mut params = Map::new();
    for token in tokens {
        let (name, raw) = split_pair(token)?;
        let value = match name {
            "filter" | "search" => sub_map(raw)?,
            _ => scalar(raw),
        };
        params.insert(name.to_string(), value);
    }

    for (name, value) in [
        ("limit", Value::from(10)),
        ("searchByAny", Value::Bool(false)),
        ("startSearch", Value::Bool(true)),
    ] {
        params.entry(name).or_insert(value);
    }
    Ok(params)
}

fn split_pair(token: &str) -> Result<(&str, &str), Error> {
    token.split_once(':').ok_or_else(|| {
        Error::Config(ConfigError::InvalidField {
            field: "params",
            message: format!("expected name:value, got {token:?}"),
        })
    })
}

fn sub_map(raw: &str) -> Result<Value, Error> {
    let mut map = Map::new();
    for pair in raw.split('+') {
        let (name, values) = split_pair(pair)?;
        map.insert(
            name.to_string(),
            Value::Array(values.split(',').map(Value::from).collect()),
        );
    }
    Ok(Value::Object(map))
}

fn scalar(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("yes") {
        Value::Bool(true)
    } else {
        Value::String(raw.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::parse_params;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn fills_in_query_defaults() {
        let params = parse_params(&[]).unwrap();
        assert_eq!(params.get("limit"), Some(&json!(10)));
        assert_eq!(params.get("searchByAny"), Some(&json!(false)));
        assert_eq!(params.get("startSearch"), Some(&json!(true)));
    }

    #[test]
    fn caller_values_win_over_defaults() {
        let params = parse_params(&tokens(&["limit:50"])).unwrap();
        assert_eq!(params.get("limit"), Some(&json!("50")));
    }

    #[test]
    fn filter_values_split_into_lists() {
        let params = parse_params(&tokens(&["filter:host:web-01,web-02+status:0"])).unwrap();
        assert_eq!(
            params.get("filter"),
            Some(&json!({ "host": ["web-01", "web-02"], "status": ["0"] }))
        );
    }

    #[test]
    fn boolean_looking_strings_coerce() {
        let params = parse_params(&tokens(&["monitored_hosts:true", "withItems:YES"])).unwrap();
        assert_eq!(params.get("monitored_hosts"), Some(&json!(true)));
        assert_eq!(params.get("withItems"), Some(&json!(true)));
    }

    #[test]
    fn bare_tokens_are_rejected() {
        assert!(parse_params(&tokens(&["limit"])).is_err());
    }
}
