//! Validation of assembled documents.
//!
//! Full OpenAPI validation belongs to an external validator plugged in through
//! [`SpecValidator`]. [`StructuralValidator`] covers the shape checks that do
//! not need a schema.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::document::Document;
use crate::error::FragResult;

/// HTTP verbs allowed as keys of a path item.
pub const HTTP_VERBS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// One problem found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// JSON pointer to the offending node
    pub pointer: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pointer, self.message)
    }
}

/// Errors and warnings reported by a validator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, pointer: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            pointer: pointer.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, pointer: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            pointer: pointer.into(),
            message: message.into(),
        });
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Something that can check an assembled document.
pub trait SpecValidator {
    fn validate(&self, doc: &Document) -> FragResult<ValidationReport>;
}

/// Schema-free shape checks for Swagger/OpenAPI documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralValidator;

impl SpecValidator for StructuralValidator {
    fn validate(&self, doc: &Document) -> FragResult<ValidationReport> {
        let mut report = ValidationReport::new();

        if doc.get("swagger").is_none() && doc.get("openapi").is_none() {
            report.add_error("", "Document has no 'swagger' or 'openapi' version field");
        }
        if !doc.get("info").is_some_and(Value::is_object) {
            report.add_error("/info", "Document has no 'info' object");
        }

        if let Some(paths) = doc.paths() {
            for (path, item) in paths {
                report.merge(Self::validate_path_item(path, item));
            }
        }

        let definitions = doc.definitions().cloned().unwrap_or_default();
        let mut refs = Vec::new();
        collect_refs(&doc.as_value(), "", &mut refs);
        for (pointer, target) in refs {
            if let Some(name) = target.strip_prefix("#/definitions/") {
                if !definitions.contains_key(&unescape(name)) {
                    report.add_warning(pointer, format!("Reference to unknown definition '{}'", name));
                }
            }
        }

        Ok(report)
    }
}

impl StructuralValidator {
    fn validate_path_item(path: &str, item: &Value) -> ValidationReport {
        let mut report = ValidationReport::new();
        let base = format!("/paths/{}", escape(path));

        if !path.starts_with('/') {
            report.add_error(&base, format!("Path '{}' must start with '/'", path));
        }

        let Some(operations) = item.as_object() else {
            report.add_error(&base, "Path item must be a mapping");
            return report;
        };

        for (verb, operation) in operations {
            let pointer = format!("{}/{}", base, escape(verb));
            if verb.starts_with("x-") || verb == "parameters" || verb == "$ref" {
                continue;
            }
            if !HTTP_VERBS.contains(&verb.as_str()) {
                report.add_error(&pointer, format!("Unknown HTTP verb '{}'", verb));
                continue;
            }
            report.merge(Self::validate_operation(&pointer, operation));
        }

        report
    }

    fn validate_operation(pointer: &str, operation: &Value) -> ValidationReport {
        let mut report = ValidationReport::new();
        let empty = Map::new();
        let operation = operation.as_object().unwrap_or(&empty);

        if !operation.get("responses").is_some_and(Value::is_object) {
            report.add_error(pointer, "Operation has no 'responses'");
        }
        if !operation.contains_key("operationId") {
            report.add_warning(pointer, "Operation has no 'operationId'");
        }

        report
    }
}

fn collect_refs(node: &Value, pointer: &str, refs: &mut Vec<(String, String)>) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("$ref") {
                refs.push((pointer.to_string(), target.clone()));
            }
            for (key, child) in map {
                collect_refs(child, &format!("{}/{}", pointer, escape(key)), refs);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_refs(child, &format!("{}/{}", pointer, index), refs);
            }
        }
        _ => {}
    }
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(value: Value) -> ValidationReport {
        StructuralValidator
            .validate(&Document::from_value(value).unwrap())
            .unwrap()
    }

    #[test]
    fn test_valid_document() {
        let report = validate(json!({
            "swagger": "2.0",
            "info": {"title": "Pets", "version": "1"},
            "paths": {"/pets": {
                "parameters": [],
                "get": {"operationId": "listPets", "responses": {"200": {
                    "description": "ok",
                    "schema": {"$ref": "#/definitions/Pet"}
                }}}
            }},
            "definitions": {"Pet": {"type": "object"}}
        }));
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_header_fields() {
        let report = validate(json!({"paths": {}}));
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_operation_checks() {
        let report = validate(json!({
            "swagger": "2.0",
            "info": {},
            "paths": {
                "pets": {"fetch": {}},
                "/users/{id}": {"get": {"responses": {}}}
            }
        }));

        let pointers: Vec<_> = report.errors.iter().map(|e| e.pointer.as_str()).collect();
        assert!(pointers.contains(&"/paths/pets"));
        assert!(pointers.contains(&"/paths/pets/fetch"));
        assert_eq!(report.warnings[0].pointer, "/paths/~1users~1{id}/get");
    }

    #[test]
    fn test_unknown_definition_warning() {
        let report = validate(json!({
            "swagger": "2.0",
            "info": {},
            "definitions": {"Owner": {"properties": {"pet": {"$ref": "#/definitions/Pet"}}}}
        }));
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.contains("Pet"));
    }
}
