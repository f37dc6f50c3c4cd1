//! JSON request bodies and query arguments.

use crate::{Error, Result};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Content type attached to every encoded payload.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Encodes a payload as a JSON body.
///
/// # Errors
///
/// Returns [`Error::SerializationFailed`] if the value cannot be represented
/// as JSON (for example a map with non-string keys).
pub fn encode_json<P>(payload: &P) -> Result<Bytes>
where
    P: Serialize + ?Sized,
{
    serde_json::to_vec(payload)
        .map(Bytes::from)
        .map_err(|e| Error::SerializationFailed(e.to_string()))
}

/// Converts a query argument into an ordered query map.
///
/// The value must serialize to a JSON object whose values are strings,
/// numbers or booleans. Numbers and booleans are stringified.
///
/// # Errors
///
/// Returns [`Error::CantUseAsQuery`] for any other shape.
///
/// # Examples
///
/// ```
/// use restree::payload::encode_query;
/// use std::collections::HashMap;
///
/// let mut query = HashMap::new();
/// query.insert("page", "2");
///
/// let encoded = encode_query(&query).unwrap();
/// assert_eq!(encoded.get("page").map(String::as_str), Some("2"));
///
/// assert!(encode_query(&vec!["page", "2"]).is_err());
/// ```
pub fn encode_query<Q>(query: &Q) -> Result<BTreeMap<String, String>>
where
    Q: Serialize + ?Sized,
{
    let Value::Object(map) = serde_json::to_value(query).map_err(|_| Error::CantUseAsQuery)?
    else {
        return Err(Error::CantUseAsQuery);
    };

    map.into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key, s)),
            Value::Number(n) => Ok((key, n.to_string())),
            Value::Bool(b) => Ok((key, b.to_string())),
            _ => Err(Error::CantUseAsQuery),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Filter {
        status: &'static str,
        limit: u32,
        archived: bool,
    }

    #[test]
    fn test_encode_json_struct() {
        let body = encode_json(&Filter {
            status: "open",
            limit: 10,
            archived: false,
        })
        .unwrap();

        assert_eq!(
            &body[..],
            br#"{"status":"open","limit":10,"archived":false}"#
        );
    }

    #[test]
    fn test_encode_json_rejects_non_string_keys() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], "value");

        assert!(matches!(
            encode_json(&map),
            Err(Error::SerializationFailed(_))
        ));
    }

    #[test]
    fn test_encode_query_from_struct() {
        let query = encode_query(&Filter {
            status: "open",
            limit: 10,
            archived: true,
        })
        .unwrap();

        let pairs: Vec<_> = query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![("archived", "true"), ("limit", "10"), ("status", "open")]
        );
    }

    #[test]
    fn test_encode_query_rejects_wrong_shapes() {
        assert!(matches!(encode_query("page=2"), Err(Error::CantUseAsQuery)));
        assert!(matches!(encode_query(&42), Err(Error::CantUseAsQuery)));
        assert!(matches!(
            encode_query(&serde_json::json!({"tags": ["a", "b"]})),
            Err(Error::CantUseAsQuery)
        ));
        assert!(matches!(
            encode_query(&serde_json::json!({"page": null})),
            Err(Error::CantUseAsQuery)
        ));
    }
}
