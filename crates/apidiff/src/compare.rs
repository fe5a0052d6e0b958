//! Structural response comparison
//!
//! Bodies that parse as JSON on both sides are compared as data trees,
//! ignoring object key order and array element order (arrays are matched
//! as multisets). Everything else falls back to exact text equality.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ApiResponse;

/// Headers compared between the two servers; all others are ignored
pub const COMPARED_HEADERS: [&str; 2] = ["content-type", "content-length"];

/// One difference found between the two response bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difference {
    /// Dotted/indexed path to the differing node, e.g. "items[2].name"
    pub path: String,
    pub kind: DiffKind,
    pub reference: Value,
    pub candidate: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Same JSON type, different value
    ValueChanged,
    /// Different JSON types at the same path
    TypeChanged,
    /// Present on the reference side only
    Missing,
    /// Present on the candidate side only
    Extra,
    /// Arrays of different lengths
    LengthChanged,
    /// Non-JSON bodies with different text
    TextChanged,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffKind::ValueChanged => write!(f, "VALUE"),
            DiffKind::TypeChanged => write!(f, "TYPE"),
            DiffKind::Missing => write!(f, "MISSING"),
            DiffKind::Extra => write!(f, "EXTRA"),
            DiffKind::LengthChanged => write!(f, "LENGTH"),
            DiffKind::TextChanged => write!(f, "TEXT"),
        }
    }
}

/// A mismatch in one of the compared headers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMismatch {
    pub reference: Option<String>,
    pub candidate: Option<String>,
}

/// Outcome of replaying one endpoint against both servers
///
/// Serialized untagged so the report keeps the flat per-endpoint shape:
/// a fully compared endpoint carries the match flags and diffs, while a
/// transport failure carries only the error text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComparisonResult {
    Compared(ComparedEndpoint),
    Failed(FailedEndpoint),
}

/// Both requests completed; the responses were compared field by field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparedEndpoint {
    pub method: String,
    pub path: String,
    pub status_match: bool,
    pub body_match: bool,
    pub headers_match: bool,
    pub reference_status: u16,
    pub candidate_status: u16,
    /// Differences between the bodies, `None` when they match
    pub body_diff: Option<Vec<Difference>>,
    /// Mismatches among the compared headers, keyed by header name
    pub header_diff: BTreeMap<String, HeaderMismatch>,
    /// `status_match && body_match`; header mismatches never affect this
    pub success: bool,
}

/// One of the two requests failed at the transport level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedEndpoint {
    pub method: String,
    pub path: String,
    /// Always false
    pub success: bool,
    pub error: String,
}

impl ComparisonResult {
    pub fn method(&self) -> &str {
        match self {
            ComparisonResult::Compared(c) => &c.method,
            ComparisonResult::Failed(f) => &f.method,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ComparisonResult::Compared(c) => &c.path,
            ComparisonResult::Failed(f) => &f.path,
        }
    }

    pub fn success(&self) -> bool {
        match self {
            ComparisonResult::Compared(c) => c.success,
            ComparisonResult::Failed(_) => false,
        }
    }

    /// Human-readable causes for a failed comparison, one per line
    ///
    /// Empty for a successful result.
    pub fn failure_lines(&self) -> Vec<String> {
        match self {
            ComparisonResult::Compared(c) => {
                let mut lines = Vec::new();
                if !c.status_match {
                    lines.push(format!(
                        "Status mismatch: {} vs {}",
                        c.reference_status, c.candidate_status
                    ));
                }
                if !c.body_match {
                    let count = c.body_diff.as_ref().map_or(0, Vec::len);
                    lines.push(format!("Body differs ({count} differences)"));
                }
                lines
            }
            ComparisonResult::Failed(f) => vec![format!("Error: {}", f.error)],
        }
    }
}

/// Order-insensitive deep diff of two JSON trees
///
/// Objects are compared key by key; arrays are matched as multisets, so
/// reorderings of deep-equal elements produce no differences.
pub fn diff_values(reference: &Value, candidate: &Value) -> Vec<Difference> {
    let mut differences = Vec::new();
    diff_at("", reference, candidate, &mut differences);
    differences
}

fn diff_at(path: &str, reference: &Value, candidate: &Value, differences: &mut Vec<Difference>) {
    match (reference, candidate) {
        (Value::Object(ref_obj), Value::Object(cand_obj)) => {
            for (key, ref_value) in ref_obj {
                let child = join_path(path, key);
                match cand_obj.get(key) {
                    Some(cand_value) => diff_at(&child, ref_value, cand_value, differences),
                    None => differences.push(Difference {
                        path: child,
                        kind: DiffKind::Missing,
                        reference: ref_value.clone(),
                        candidate: Value::Null,
                    }),
                }
            }
            for (key, cand_value) in cand_obj {
                if !ref_obj.contains_key(key) {
                    differences.push(Difference {
                        path: join_path(path, key),
                        kind: DiffKind::Extra,
                        reference: Value::Null,
                        candidate: cand_value.clone(),
                    });
                }
            }
        }
        (Value::Array(ref_arr), Value::Array(cand_arr)) => {
            if ref_arr.len() != cand_arr.len() {
                differences.push(Difference {
                    path: join_path(path, "length"),
                    kind: DiffKind::LengthChanged,
                    reference: ref_arr.len().into(),
                    candidate: cand_arr.len().into(),
                });
            }

            // Match elements as a multiset: each reference element consumes
            // the first unconsumed candidate element it is deep-equal to.
            let mut consumed = vec![false; cand_arr.len()];
            for (i, ref_elem) in ref_arr.iter().enumerate() {
                let matched = cand_arr
                    .iter()
                    .enumerate()
                    .find(|(j, cand_elem)| !consumed[*j] && values_equal(ref_elem, cand_elem));
                match matched {
                    Some((j, _)) => consumed[j] = true,
                    None => differences.push(Difference {
                        path: format!("{path}[{i}]"),
                        kind: DiffKind::Missing,
                        reference: ref_elem.clone(),
                        candidate: Value::Null,
                    }),
                }
            }
            for (j, cand_elem) in cand_arr.iter().enumerate() {
                if !consumed[j] {
                    differences.push(Difference {
                        path: format!("{path}[{j}]"),
                        kind: DiffKind::Extra,
                        reference: Value::Null,
                        candidate: cand_elem.clone(),
                    });
                }
            }
        }
        _ => {
            if json_type(reference) != json_type(candidate) {
                differences.push(Difference {
                    path: path.to_string(),
                    kind: DiffKind::TypeChanged,
                    reference: reference.clone(),
                    candidate: candidate.clone(),
                });
            } else if reference != candidate {
                differences.push(Difference {
                    path: path.to_string(),
                    kind: DiffKind::ValueChanged,
                    reference: reference.clone(),
                    candidate: candidate.clone(),
                });
            }
        }
    }
}

/// Order-insensitive deep equality over JSON trees
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a_obj), Value::Object(b_obj)) => {
            a_obj.len() == b_obj.len()
                && a_obj
                    .iter()
                    .all(|(k, av)| b_obj.get(k).map_or(false, |bv| values_equal(av, bv)))
        }
        (Value::Array(a_arr), Value::Array(b_arr)) => {
            if a_arr.len() != b_arr.len() {
                return false;
            }
            let mut consumed = vec![false; b_arr.len()];
            'outer: for av in a_arr {
                for (j, bv) in b_arr.iter().enumerate() {
                    if !consumed[j] && values_equal(av, bv) {
                        consumed[j] = true;
                        continue 'outer;
                    }
                }
                return false;
            }
            true
        }
        _ => a == b,
    }
}

/// Compare the allow-listed headers of two responses
///
/// Only headers in [`COMPARED_HEADERS`] may appear in the result; a header
/// absent on one side is recorded with `None` for that side.
pub fn diff_headers(
    reference: &ApiResponse,
    candidate: &ApiResponse,
) -> BTreeMap<String, HeaderMismatch> {
    let mut mismatches = BTreeMap::new();
    for header in COMPARED_HEADERS {
        let ref_value = reference.header(header);
        let cand_value = candidate.header(header);
        if ref_value != cand_value {
            mismatches.insert(
                header.to_string(),
                HeaderMismatch {
                    reference: ref_value.map(str::to_string),
                    candidate: cand_value.map(str::to_string),
                },
            );
        }
    }
    mismatches
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn response_with_headers(headers: Vec<(&str, &str)>) -> ApiResponse {
        ApiResponse {
            status: StatusCode::OK,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: None,
            raw_body: String::new(),
        }
    }

    #[test]
    fn test_identical_trees_have_no_diff() {
        let value = json!({"id": 1, "name": "Alice", "tags": ["a", "b"]});
        assert!(diff_values(&value, &value).is_empty());
    }

    #[test]
    fn test_key_order_is_ignored() {
        let reference = json!({"id": 1, "name": "Alice"});
        let candidate = json!({"name": "Alice", "id": 1});
        assert!(diff_values(&reference, &candidate).is_empty());
        assert!(values_equal(&reference, &candidate));
    }

    #[test]
    fn test_array_order_is_ignored() {
        let reference = json!([1, 2, 3]);
        let candidate = json!([3, 1, 2]);
        assert!(diff_values(&reference, &candidate).is_empty());
    }

    #[test]
    fn test_array_of_objects_order_is_ignored() {
        let reference = json!({"users": [{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]});
        let candidate = json!({"users": [{"name": "Bob", "id": 2}, {"name": "Alice", "id": 1}]});
        assert!(diff_values(&reference, &candidate).is_empty());
    }

    #[test]
    fn test_duplicate_elements_are_matched_as_multiset() {
        // [1, 1, 2] and [1, 2, 2] share the same element set but not the
        // same multiset, so they must not compare equal.
        let reference = json!([1, 1, 2]);
        let candidate = json!([1, 2, 2]);
        assert!(!values_equal(&reference, &candidate));

        let differences = diff_values(&reference, &candidate);
        assert!(differences
            .iter()
            .any(|d| d.kind == DiffKind::Missing && d.reference == json!(1)));
        assert!(differences
            .iter()
            .any(|d| d.kind == DiffKind::Extra && d.candidate == json!(2)));
    }

    #[test]
    fn test_value_change_records_path() {
        let reference = json!({"user": {"name": "Alice", "age": 30}});
        let candidate = json!({"user": {"name": "Bob", "age": 30}});

        let differences = diff_values(&reference, &candidate);
        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].path, "user.name");
        assert_eq!(differences[0].kind, DiffKind::ValueChanged);
        assert_eq!(differences[0].reference, json!("Alice"));
        assert_eq!(differences[0].candidate, json!("Bob"));
    }

    #[test]
    fn test_missing_and_extra_keys() {
        let reference = json!({"a": 1, "b": 2});
        let candidate = json!({"b": 2, "c": 3});

        let differences = diff_values(&reference, &candidate);
        assert_eq!(differences.len(), 2);
        assert!(differences
            .iter()
            .any(|d| d.path == "a" && d.kind == DiffKind::Missing));
        assert!(differences
            .iter()
            .any(|d| d.path == "c" && d.kind == DiffKind::Extra));
    }

    #[test]
    fn test_type_change() {
        let differences = diff_values(&json!({"id": 1}), &json!({"id": "1"}));
        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].kind, DiffKind::TypeChanged);
    }

    #[test]
    fn test_array_length_change() {
        let differences = diff_values(&json!(["a", "b"]), &json!(["a"]));
        assert!(differences
            .iter()
            .any(|d| d.kind == DiffKind::LengthChanged && d.path == "length"));
        assert!(differences
            .iter()
            .any(|d| d.kind == DiffKind::Missing && d.reference == json!("b")));
    }

    #[test]
    fn test_scalar_root_mismatch() {
        let differences = diff_values(&json!(true), &json!(false));
        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].path, "");
        assert_eq!(differences[0].kind, DiffKind::ValueChanged);
    }

    #[test]
    fn test_header_diff_only_covers_allow_list() {
        let reference = response_with_headers(vec![
            ("content-type", "application/json"),
            ("date", "Mon, 01 Jan 2026 00:00:00 GMT"),
        ]);
        let candidate = response_with_headers(vec![
            ("content-type", "application/json; charset=utf-8"),
            ("date", "Tue, 02 Jan 2026 00:00:00 GMT"),
        ]);

        let mismatches = diff_headers(&reference, &candidate);
        assert_eq!(mismatches.len(), 1);
        let mismatch = &mismatches["content-type"];
        assert_eq!(mismatch.reference.as_deref(), Some("application/json"));
        assert_eq!(
            mismatch.candidate.as_deref(),
            Some("application/json; charset=utf-8")
        );
        assert!(!mismatches.contains_key("date"));
    }

    #[test]
    fn test_header_absent_on_one_side() {
        let reference = response_with_headers(vec![("content-length", "42")]);
        let candidate = response_with_headers(vec![]);

        let mismatches = diff_headers(&reference, &candidate);
        let mismatch = &mismatches["content-length"];
        assert_eq!(mismatch.reference.as_deref(), Some("42"));
        assert_eq!(mismatch.candidate, None);
    }

    #[test]
    fn test_matching_headers_produce_no_diff() {
        let reference = response_with_headers(vec![("Content-Type", "application/json")]);
        let candidate = response_with_headers(vec![("content-type", "application/json")]);
        assert!(diff_headers(&reference, &candidate).is_empty());
    }

    #[test]
    fn test_failed_result_serialization_shape() {
        let result = ComparisonResult::Failed(FailedEndpoint {
            method: "GET".to_string(),
            path: "/users".to_string(),
            success: false,
            error: "connection refused".to_string(),
        });

        let value = serde_json::to_value(&result).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert_eq!(object["success"], json!(false));
        assert_eq!(object["error"], json!("connection refused"));
        assert!(!object.contains_key("status_match"));
    }

    #[test]
    fn test_comparison_result_roundtrip() {
        let result = ComparisonResult::Compared(ComparedEndpoint {
            method: "GET".to_string(),
            path: "/users/1".to_string(),
            status_match: true,
            body_match: false,
            headers_match: true,
            reference_status: 200,
            candidate_status: 200,
            body_diff: Some(vec![Difference {
                path: "name".to_string(),
                kind: DiffKind::ValueChanged,
                reference: json!("Alice"),
                candidate: json!("Bob"),
            }]),
            header_diff: BTreeMap::new(),
            success: false,
        });

        let json = serde_json::to_string(&result).unwrap();
        let back: ComparisonResult = serde_json::from_str(&json).unwrap();
        match back {
            ComparisonResult::Compared(c) => {
                assert!(!c.success);
                assert_eq!(c.body_diff.as_ref().map(Vec::len), Some(1));
            }
            ComparisonResult::Failed(_) => panic!("expected compared variant"),
        }
    }

    #[test]
    fn test_failure_lines() {
        let result = ComparisonResult::Compared(ComparedEndpoint {
            method: "GET".to_string(),
            path: "/users/1".to_string(),
            status_match: false,
            body_match: false,
            headers_match: true,
            reference_status: 200,
            candidate_status: 500,
            body_diff: Some(vec![Difference {
                path: "name".to_string(),
                kind: DiffKind::ValueChanged,
                reference: json!("Alice"),
                candidate: json!("Bob"),
            }]),
            header_diff: BTreeMap::new(),
            success: false,
        });

        let lines = result.failure_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("200 vs 500"));
        assert!(lines[1].contains("Body differs"));
    }
}
