//! Concrete URL + path pattern → path parameters

use std::collections::BTreeMap;

use crate::spec::path_component;

/// Path parameter values keyed by placeholder name.
pub type Params = BTreeMap<String, String>;

fn path_to_bits(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|bit| !bit.is_empty()).rev()
}

/// Given an actual URL and a pattern, extract the matching parameters.
///
/// Both are aligned from the end of their paths, so the URL may be hosted
/// below a sub-path the pattern knows nothing about:
///
/// ```
/// use oas_client::extract_params;
///
/// let params = extract_params(
///     "https://example.com/zrc/api/v1/zaken/1234",
///     "/api/v1/zaken/{uuid}",
/// );
/// assert_eq!(params["uuid"], "1234");
/// ```
///
/// Segments that are literally equal on both sides are treated as static,
/// even when the pattern segment is a placeholder.
pub fn extract_params(url: &str, pattern: &str) -> Params {
    let url_bits = path_to_bits(path_component(url));

    path_to_bits(path_component(pattern))
        .zip(url_bits)
        .filter(|(pattern_bit, url_bit)| pattern_bit != url_bit)
        .map(|(pattern_bit, url_bit)| {
            let name = pattern_bit.trim_start_matches('{').trim_end_matches('}');
            (name.to_string(), url_bit.to_string())
        })
        .collect()
}
