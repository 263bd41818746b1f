//! Share links.
//!
//! A share link is a base URL with the compiled query document in its
//! `source` parameter. Opening one decodes the document and decompiles it
//! back into selection state.

use facet_query::QueryDocument;
use serde_json::Value;
use url::{Url, form_urlencoded};

use crate::error::ShareError;

/// Name of the query parameter that carries the document.
pub const SOURCE_PARAM: &str = "source";

/// Builds a share link for `doc` on top of `base`.
///
/// Existing query parameters on `base` are kept; a previous `source` is
/// replaced.
pub fn share_url(base: &str, doc: &QueryDocument, include_facets: bool) -> Result<Url, ShareError> {
    let mut url = Url::parse(base).map_err(|source| ShareError::InvalidUrl {
        url: base.to_string(),
        source,
    })?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != SOURCE_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(SOURCE_PARAM, &doc.share_source(include_facets));
    }
    Ok(url)
}

/// Pulls the document text out of user input.
///
/// Accepts a full link, a bare query string (with or without the leading
/// `?`), or the JSON document itself.
pub fn extract_source(input: &str) -> Result<String, ShareError> {
    let input = input.trim();
    if input.starts_with('{') {
        return Ok(input.to_string());
    }
    if let Ok(url) = Url::parse(input) {
        return url
            .query_pairs()
            .find(|(k, _)| k == SOURCE_PARAM)
            .map(|(_, v)| v.into_owned())
            .ok_or(ShareError::MissingSource);
    }
    let query = input.strip_prefix('?').unwrap_or(input);
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == SOURCE_PARAM)
        .map(|(_, v)| v.into_owned())
        .ok_or(ShareError::MissingSource)
}

/// Decodes the document carried by user input.
///
/// Only fails when the input carries no document or the document is not a
/// JSON object; unfamiliar clauses are left for the decompiler to skip.
pub fn decode_source(input: &str) -> Result<Value, ShareError> {
    let source = extract_source(input)?;
    let doc = QueryDocument::parse(&source)?;
    Ok(doc.to_value())
}
