//! Result document written to stdout

use serde_json::{Map, Value, json};

use crate::error::ReconcileFailure;
use crate::reconciler::ReconcileResult;

/// `{"changed": .., ...resource}`; a non-object resource goes under `resource`.
pub fn success_document(result: &ReconcileResult) -> Value {
    let mut document = match &result.resource {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("resource".to_string(), other.clone());
            map
        }
    };
    document.insert("changed".to_string(), Value::Bool(result.changed));
    Value::Object(document)
}

pub fn failure_document(failure: &ReconcileFailure) -> Value {
    json!({
        "failed": true,
        "changed": failure.changed,
        "msg": failure.error.to_string(),
    })
}

pub fn emit(document: &Value) {
    println!("{}", document);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControllerError;

    #[test]
    fn test_success_flattens_resource() {
        let result = ReconcileResult {
            changed: true,
            resource: json!({"name": "projects/p/regions/global/operations/op-1", "done": false}),
        };
        assert_eq!(
            success_document(&result),
            json!({
                "changed": true,
                "name": "projects/p/regions/global/operations/op-1",
                "done": false
            })
        );
    }

    #[test]
    fn test_changed_overrides_resource_field() {
        let result = ReconcileResult {
            changed: false,
            resource: json!({"changed": "yes"}),
        };
        assert_eq!(success_document(&result), json!({"changed": false}));
    }

    #[test]
    fn test_non_object_resource() {
        let result = ReconcileResult {
            changed: false,
            resource: json!("text"),
        };
        assert_eq!(success_document(&result), json!({"changed": false, "resource": "text"}));
    }

    #[test]
    fn test_failure_document() {
        let failure = ReconcileFailure::after_change(ControllerError::Cancelled(
            "while waiting for cluster demo to become RUNNING".to_string(),
        ));
        assert_eq!(
            failure_document(&failure),
            json!({
                "failed": true,
                "changed": true,
                "msg": "Cancelled while waiting for cluster demo to become RUNNING"
            })
        );
    }
}
