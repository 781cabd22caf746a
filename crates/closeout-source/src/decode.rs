use closeout_core::{ConnectionUnavailable, FetchError, IssueRecord, ProjectQuery};
use serde_json::{Map, Value};

const RESOLUTION_KEYS: [&str; 3] = ["resolution_date", "resolutionDate", "resolved"];

/// Decode a source payload into issue records for `query`.
///
/// Accepts `{"issues": [...]}` or a bare array. A payload carrying an `error`
/// key means the source answered but could not serve the request.
/// Results past `query.limit` are dropped.
pub fn decode_issues(
    payload: Value,
    query: &ProjectQuery,
    source: &str,
) -> Result<Vec<IssueRecord>, FetchError> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            match obj.get("error") {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) => {
                    return Err(ConnectionUnavailable::new(source, s.as_str()).into())
                }
                Some(other) => {
                    return Err(ConnectionUnavailable::new(source, other.to_string()).into())
                }
            }
            match obj.remove("issues") {
                Some(Value::Array(items)) => items,
                Some(Value::Null) => Vec::new(),
                Some(_) => {
                    return Err(FetchError::Malformed(
                        "`issues` is not an array".to_string(),
                    ))
                }
                None => {
                    return Err(FetchError::Malformed(
                        "response has no `issues` field".to_string(),
                    ))
                }
            }
        }
        other => {
            return Err(FetchError::Malformed(format!(
                "expected an issue list, got {}",
                json_type(&other)
            )))
        }
    };

    let mut records = Vec::with_capacity(items.len().min(query.limit as usize));
    for (i, item) in items.into_iter().take(query.limit as usize).enumerate() {
        let Value::Object(obj) = item else {
            return Err(FetchError::Malformed(format!("issue #{i} is not an object")));
        };
        records.push(decode_one(&obj, i, query)?);
    }
    Ok(records)
}

fn decode_one(
    obj: &Map<String, Value>,
    index: usize,
    query: &ProjectQuery,
) -> Result<IssueRecord, FetchError> {
    let key = match obj.get("key").and_then(|v| v.as_str()) {
        Some(k) if !k.trim().is_empty() => k.trim().to_string(),
        _ => return Err(FetchError::Malformed(format!("issue #{index} has no key"))),
    };
    let summary = obj
        .get("summary")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let priority = obj.get("priority").map(scalar_text).unwrap_or_default();
    let resolution_date = RESOLUTION_KEYS
        .iter()
        .find_map(|k| obj.get(*k))
        .and_then(|v| match v {
            Value::Null => None,
            other => Some(scalar_text(other)),
        });
    let project = obj
        .get("project")
        .and_then(|v| v.as_str())
        .filter(|p| !p.is_empty())
        .unwrap_or(&query.project_key)
        .to_string();

    Ok(IssueRecord {
        key,
        summary,
        priority,
        resolution_date,
        project,
    })
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
