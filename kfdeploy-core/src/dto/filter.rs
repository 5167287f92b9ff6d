//! List filters
//!
//! The service accepts a JSON-encoded predicate list in the `filter` query
//! parameter. Only name equality is needed here.

use serde::Serialize;

/// Predicate operator codes understood by the service
const OP_EQUALS: i32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Serialize)]
struct Predicate {
    key: String,
    op: i32,
    string_value: String,
}

impl Filter {
    /// Match resources whose name equals `name` exactly
    pub fn name_equals(name: impl Into<String>) -> Self {
        Self {
            predicates: vec![Predicate {
                key: "name".to_string(),
                op: OP_EQUALS,
                string_value: name.into(),
            }],
        }
    }

    /// JSON text for the `filter` query parameter
    pub fn to_query_value(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
