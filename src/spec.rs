//! OpenAPI document → request paths
//!
//! Looks up operations by `operationId` in a parsed OpenAPI 3.0 document and
//! turns their path templates into request paths below the server base path.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Error, Result};

/// Path parameters filled in when the caller does not supply them.
pub const DEFAULT_PATH_PARAMETERS: &[(&str, &str)] = &[("version", "1")];

/// A matched operation inside a schema document.
#[derive(Debug, Clone, Copy)]
pub struct OperationRef<'a> {
    /// Path template as written in `paths` (e.g. "/zaken/{uuid}")
    pub path: &'a str,
    /// Lowercase method key (e.g. "get")
    pub method: &'a str,
    /// The operation object itself
    pub operation: &'a Value,
    /// The path item holding the operation, including path-level `parameters`
    pub path_item: &'a Value,
}

/// Find the first operation with the given `operationId`.
///
/// Paths and methods are scanned in document order; if an `operationId` is
/// duplicated, the first occurrence wins.
pub fn find_operation<'a>(spec: &'a Value, operation_id: &str) -> Option<OperationRef<'a>> {
    let paths = spec.get("paths")?.as_object()?;

    for (path, path_item) in paths {
        let Some(methods) = path_item.as_object() else {
            continue;
        };
        for (method, operation) in methods {
            if method == "parameters" {
                continue;
            }
            if operation.get("operationId").and_then(Value::as_str) == Some(operation_id) {
                return Some(OperationRef {
                    path,
                    method,
                    operation,
                    path_item,
                });
            }
        }
    }

    None
}

/// Resolve the request path for an operation, substituting path parameters.
///
/// The result is relative to the host: base path (from `base_url` if given,
/// otherwise from the first declared server) followed by the rendered path
/// template. `{version}` defaults to `1`.
pub fn operation_url<'p, I>(
    spec: &Value,
    operation_id: &str,
    base_url: Option<&str>,
    params: I,
) -> Result<String>
where
    I: IntoIterator<Item = (&'p str, &'p str)>,
{
    let op = lookup(spec, operation_id)?;

    let mut values: BTreeMap<&str, &str> = DEFAULT_PATH_PARAMETERS.iter().copied().collect();
    values.extend(params);

    let rendered = render_template(op.path, operation_id, &values)?;
    Ok(join_base_path(&base_path(spec, base_url), &rendered))
}

/// Resolve the unrendered path pattern for an operation (placeholders intact).
pub fn operation_pattern(
    spec: &Value,
    operation_id: &str,
    base_url: Option<&str>,
) -> Result<String> {
    let op = lookup(spec, operation_id)?;
    Ok(join_base_path(&base_path(spec, base_url), op.path))
}

fn lookup<'a>(spec: &'a Value, operation_id: &str) -> Result<OperationRef<'a>> {
    find_operation(spec, operation_id).ok_or_else(|| Error::OperationNotFound {
        operation_id: operation_id.to_string(),
    })
}

/// Path component of `base_url`, or of the first server URL, defaulting to `/`.
pub fn base_path(spec: &Value, base_url: Option<&str>) -> String {
    let url = match base_url {
        Some(url) => url,
        None => spec
            .get("servers")
            .and_then(Value::as_array)
            .and_then(|servers| servers.first())
            .and_then(|server| server.get("url"))
            .and_then(Value::as_str)
            .unwrap_or("/"),
    };
    path_component(url).to_string()
}

/// Textual path component of a URL or bare path.
///
/// Scheme and authority are stripped and query/fragment dropped without
/// percent-encoding anything, so `{placeholder}` segments survive intact.
pub fn path_component(url: &str) -> &str {
    let path = match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find(['/', '?', '#']) {
                Some(start) => &rest[start..],
                None => "",
            }
        }
        None => url,
    };
    match path.find(['?', '#']) {
        Some(end) => &path[..end],
        None => path,
    }
}

/// Concatenate a base path and a path without doubling or losing the `/` at the seam.
pub fn join_base_path(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) if !path.is_empty() => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

fn render_template(
    template: &str,
    operation_id: &str,
    values: &BTreeMap<&str, &str>,
) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|c| open + c) else {
            break;
        };
        let name = &rest[open + 1..close];
        let value = values.get(name).ok_or_else(|| Error::MissingPathParameter {
            operation_id: operation_id.to_string(),
            parameter: name.to_string(),
        })?;
        rendered.push_str(&rest[..open]);
        rendered.push_str(value);
        rest = &rest[close + 1..];
    }
    rendered.push_str(rest);

    Ok(rendered)
}

/// Resolve a same-document `$ref` such as `#/components/parameters/foo`.
///
/// Anything that is not a local reference is rejected as unsupported.
pub fn resolve_local_ref<'a>(spec: &'a Value, reference: &str) -> Result<&'a Value> {
    let Some(pointer) = reference.strip_prefix('#') else {
        return Err(Error::UnsupportedReference {
            reference: reference.to_string(),
        });
    };
    if !pointer.starts_with('/') || pointer.contains("//") {
        return Err(Error::UnsupportedReference {
            reference: reference.to_string(),
        });
    }
    spec.pointer(pointer).ok_or_else(|| Error::UnresolvableReference {
        reference: reference.to_string(),
    })
}
