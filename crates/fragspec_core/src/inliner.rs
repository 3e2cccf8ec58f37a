//! Substitution of internal references into a holding section.
//!
//! Shared header objects live under a root-level `headers` section that is
//! not part of the published document. Every `{"$ref": "#/headers/..."}`
//! node is replaced by a copy of its target, then the section is dropped.

use serde_json::Value;
use tracing::{debug, info};

use crate::document::{Document, Section};
use crate::error::{FragError, FragResult};

const REF_KEY: &str = "$ref";

/// Inlines every reference pointing into one root section.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceInliner {
    section: Section,
}

impl Default for ReferenceInliner {
    fn default() -> Self {
        Self::new(Section::Headers)
    }
}

impl ReferenceInliner {
    pub fn new(section: Section) -> Self {
        Self { section }
    }

    /// Replace references into the section, then remove the section.
    ///
    /// Returns the number of reference nodes replaced in the document body.
    pub fn apply(&self, doc: &mut Document) -> FragResult<usize> {
        let source = doc.as_value();
        let mut stack = Vec::new();
        let mut replaced = 0;

        for (key, node) in doc.root_mut().iter_mut() {
            if key == self.section.key() {
                continue;
            }
            replaced += self.walk(node, &source, &mut stack)?;
        }

        doc.take_section(self.section)?;
        if replaced > 0 {
            info!("Inlined {} {} references", replaced, self.section.key());
        }
        Ok(replaced)
    }

    fn walk(&self, node: &mut Value, source: &Value, stack: &mut Vec<String>) -> FragResult<usize> {
        if let Some(pointer) = self.target_of(node) {
            let pointer = pointer.to_string();
            *node = self.resolve(&pointer, source, stack)?;
            return Ok(1);
        }

        let mut replaced = 0;
        match node {
            Value::Object(map) => {
                for child in map.values_mut() {
                    replaced += self.walk(child, source, stack)?;
                }
            }
            Value::Array(items) => {
                for child in items.iter_mut() {
                    replaced += self.walk(child, source, stack)?;
                }
            }
            _ => {}
        }
        Ok(replaced)
    }

    /// A copy of the target with its own references already inlined.
    fn resolve(&self, pointer: &str, source: &Value, stack: &mut Vec<String>) -> FragResult<Value> {
        if stack.iter().any(|p| p == pointer) {
            return Err(FragError::ReferenceCycle(pointer.to_string()));
        }

        let mut target = source
            .pointer(&pointer[1..])
            .cloned()
            .ok_or_else(|| FragError::UnresolvedReference(pointer.to_string()))?;
        debug!("Inlining {}", pointer);

        stack.push(pointer.to_string());
        let result = self.walk(&mut target, source, stack);
        stack.pop();
        result?;

        Ok(target)
    }

    /// The pointer of a reference node aimed at this inliner's section.
    fn target_of<'a>(&self, node: &'a Value) -> Option<&'a str> {
        let pointer = node.as_object()?.get(REF_KEY)?.as_str()?;
        let rest = pointer.strip_prefix("#/")?;
        let section = self.section.key();
        match rest.strip_prefix(section) {
            Some("") => Some(pointer),
            Some(tail) if tail.starts_with('/') => Some(pointer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_inline_header() {
        let mut d = doc(json!({
            "headers": {"RateLimit": {"type": "integer"}},
            "paths": {"/users": {"get": {"responses": {"200": {
                "description": "ok",
                "headers": {"X-Rate-Limit": {"$ref": "#/headers/RateLimit"}}
            }}}}}
        }));

        let replaced = ReferenceInliner::default().apply(&mut d).unwrap();
        assert_eq!(replaced, 1);
        assert!(d.get("headers").is_none());
        assert_eq!(
            d.as_value()["paths"]["/users"]["get"]["responses"]["200"]["headers"]["X-Rate-Limit"],
            json!({"type": "integer"})
        );
    }

    #[test]
    fn test_other_references_untouched() {
        let mut d = doc(json!({
            "headers": {},
            "definitions": {"Pet": {"type": "object"}},
            "paths": {"/pets": {"get": {"responses": {"200": {
                "schema": {"$ref": "#/definitions/Pet"}
            }}}}}
        }));

        assert_eq!(ReferenceInliner::default().apply(&mut d).unwrap(), 0);
        assert_eq!(
            d.as_value()["paths"]["/pets"]["get"]["responses"]["200"]["schema"],
            json!({"$ref": "#/definitions/Pet"})
        );
    }

    #[test]
    fn test_similar_prefix_untouched() {
        let mut d = doc(json!({"x": {"$ref": "#/headersExtra/A"}}));
        assert_eq!(ReferenceInliner::default().apply(&mut d).unwrap(), 0);
        assert_eq!(d.as_value()["x"], json!({"$ref": "#/headersExtra/A"}));
    }

    #[test]
    fn test_nested_references() {
        let mut d = doc(json!({
            "headers": {
                "Base": {"type": "integer", "format": "int32"},
                "Limit": {"$ref": "#/headers/Base"},
                "Wrapped": {"description": "limit", "items": [{"$ref": "#/headers/Limit"}]}
            },
            "responses": {"ok": {"headers": {"X": {"$ref": "#/headers/Wrapped"}}}}
        }));

        ReferenceInliner::default().apply(&mut d).unwrap();
        assert_eq!(
            d.as_value()["responses"]["ok"]["headers"]["X"],
            json!({"description": "limit", "items": [{"type": "integer", "format": "int32"}]})
        );
    }

    #[test]
    fn test_cycle_detected() {
        let mut d = doc(json!({
            "headers": {
                "A": {"$ref": "#/headers/B"},
                "B": {"items": {"$ref": "#/headers/A"}}
            },
            "responses": {"ok": {"headers": {"X": {"$ref": "#/headers/A"}}}}
        }));

        let err = ReferenceInliner::default().apply(&mut d).unwrap_err();
        assert!(matches!(err, FragError::ReferenceCycle(ref p) if p == "#/headers/A"));
    }

    #[test]
    fn test_unresolved_reference() {
        let mut d = doc(json!({"responses": {"ok": {"$ref": "#/headers/Missing"}}}));
        let err = ReferenceInliner::default().apply(&mut d).unwrap_err();
        assert!(matches!(err, FragError::UnresolvedReference(_)));
    }

    #[test]
    fn test_section_removed_when_absent() {
        let mut d = doc(json!({"swagger": "2.0"}));
        ReferenceInliner::default().apply(&mut d).unwrap();
        assert_eq!(d.into_value(), json!({"swagger": "2.0"}));
    }

    #[test]
    fn test_escaped_pointer() {
        let mut d = doc(json!({
            "headers": {"a/b": {"type": "string"}},
            "x": {"$ref": "#/headers/a~1b"}
        }));
        ReferenceInliner::default().apply(&mut d).unwrap();
        assert_eq!(d.as_value()["x"], json!({"type": "string"}));
    }
}
