//! Recovers caller order from a batched response.
//!
//! Batched sub-requests are aliased `p0`, `p1`, ... by the query builder.
//! The response object makes no ordering promise (and serde_json's default
//! map sorts keys as strings, so `p10` lands before `p2`), so entries are
//! sorted by their numeric index instead.

use serde_json::{Map, Value};

use crate::transport::UpstreamError;

/// Index encoded in a `p<index>` alias.
pub fn alias_index(alias: &str) -> Option<usize> {
    alias.strip_prefix('p')?.parse().ok()
}

/// Values of `data` ordered by alias index, ascending.
pub fn reorder(data: Map<String, Value>) -> Result<Vec<(usize, Value)>, UpstreamError> {
    let mut entries = data
        .into_iter()
        .map(|(alias, value)| match alias_index(&alias) {
            Some(index) => Ok((index, value)),
            None => Err(UpstreamError::UnexpectedAlias(alias)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    entries.sort_by_key(|(index, _)| *index);
    Ok(entries)
}

/// Reorder a batched `data` payload and check it answers exactly the
/// `expected` sub-requests `p0..p{expected-1}`.
pub fn reorder_exact(data: Value, expected: usize) -> Result<Vec<Value>, UpstreamError> {
    let Value::Object(map) = data else {
        return Err(UpstreamError::MalformedResponse(
            "data is not an object".into(),
        ));
    };

    let entries = reorder(map)?;
    let mut values = Vec::with_capacity(expected);

    for (position, (index, value)) in entries.into_iter().enumerate() {
        if index != position {
            return Err(UpstreamError::MissingAlias(position));
        }
        if index >= expected {
            return Err(UpstreamError::UnexpectedAlias(crate::query::alias(index)));
        }
        values.push(value);
    }

    if values.len() != expected {
        return Err(UpstreamError::MissingAlias(values.len()));
    }

    Ok(values)
}
