//! Schema-mandated request headers
//!
//! Collects the required header parameters of an operation (inline and
//! `$ref`-indirected, path-level and operation-level) together with the single
//! value the API accepts for them.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::spec::resolve_local_ref;

/// Extract the required headers of an operation and their mandatory values.
///
/// A header parameter qualifies when it is declared `in: header` and
/// `required: true`. Its value is the only member of `schema.enum`, or else
/// `schema.default`. Operations without mandatory headers yield an empty map.
pub fn get_headers(spec: &Value, operation_id: &str) -> Result<BTreeMap<String, String>> {
    let mut headers = BTreeMap::new();

    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return Ok(headers);
    };

    for path_item in paths.values() {
        let Some(methods) = path_item.as_object() else {
            continue;
        };
        let path_level = methods.get("parameters");

        for (method, operation) in methods {
            if method == "parameters" {
                continue;
            }
            if operation.get("operationId").and_then(Value::as_str) != Some(operation_id) {
                continue;
            }

            let operation_level = operation.get("parameters");
            for source in [path_level, operation_level].into_iter().flatten() {
                for param in filter_header_params(source, spec)? {
                    let (name, value) = mandatory_value(param, operation_id)?;
                    headers.insert(name, value);
                }
            }
        }
    }

    Ok(headers)
}

/// Required header parameters from one `parameters` list, with `$ref`s resolved.
fn filter_header_params<'a>(params: &'a Value, spec: &'a Value) -> Result<Vec<&'a Value>> {
    let Some(params) = params.as_array() else {
        return Ok(Vec::new());
    };

    let (references, regular): (Vec<&Value>, Vec<&Value>) =
        params.iter().partition(|param| param.get("$ref").is_some());

    let mut header_params: Vec<&Value> =
        regular.into_iter().filter(|p| is_required_header(p)).collect();

    for param in references {
        let reference = param.get("$ref").and_then(Value::as_str).unwrap_or_default();
        let target = resolve_local_ref(spec, reference)?;
        if is_required_header(target) {
            header_params.push(target);
        }
    }

    Ok(header_params)
}

fn is_required_header(param: &Value) -> bool {
    param.get("in").and_then(Value::as_str) == Some("header")
        && param.get("required").and_then(Value::as_bool).unwrap_or(false)
}

fn mandatory_value(param: &Value, operation_id: &str) -> Result<(String, String)> {
    let name = param
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let schema = param.get("schema");

    let single_enum = schema
        .and_then(|s| s.get("enum"))
        .and_then(Value::as_array)
        .filter(|values| values.len() == 1)
        .and_then(|values| values.first());
    let default = schema.and_then(|s| s.get("default")).filter(|v| !v.is_null());

    match single_enum.or(default) {
        Some(value) => Ok((name, scalar_to_string(value))),
        None => Err(Error::AmbiguousHeaderDefault {
            operation_id: operation_id.to_string(),
            header: name,
        }),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Set each header only where no header of the same name (compared
/// case-insensitively) is present yet.
pub fn merge_missing<'a, I>(headers: &mut HeaderMap, defaults: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    for (name, value) in defaults {
        let (name, value) = parse_header(name, value)?;
        headers.entry(name).or_insert(value);
    }
    Ok(())
}

/// Parse a header pair, normalizing the name for case-insensitive comparison.
pub fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let invalid = || Error::InvalidHeader {
        name: name.to_string(),
    };
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
    let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
    Ok((header_name, header_value))
}
