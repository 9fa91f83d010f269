//! Write model for `batchWrite` and `commit`.

use serde_json::{json, Map, Value};

use crate::locator::ResourceLocator;
use crate::mask::DocumentMask;
use crate::operation::Precondition;

/// Server-side transformation of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Only `REQUEST_TIME` is defined by the service.
    SetToServerValue(String),
    Increment(Value),
    Maximum(Value),
    Minimum(Value),
    AppendMissingElements(Vec<Value>),
    RemoveAllFromArray(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldTransform {
    pub field_path: String,
    pub transform: Transform,
}

impl FieldTransform {
    pub fn new(field_path: impl Into<String>, transform: Transform) -> Self {
        Self {
            field_path: field_path.into(),
            transform,
        }
    }

    pub fn request_time(field_path: impl Into<String>) -> Self {
        Self::new(
            field_path,
            Transform::SetToServerValue("REQUEST_TIME".to_string()),
        )
    }

    pub fn to_json(&self) -> Value {
        let (key, value) = match &self.transform {
            Transform::SetToServerValue(v) => ("setToServerValue", Value::String(v.clone())),
            Transform::Increment(v) => ("increment", v.clone()),
            Transform::Maximum(v) => ("maximum", v.clone()),
            Transform::Minimum(v) => ("minimum", v.clone()),
            Transform::AppendMissingElements(values) => {
                ("appendMissingElements", json!({ "values": values }))
            }
            Transform::RemoveAllFromArray(values) => {
                ("removeAllFromArray", json!({ "values": values }))
            }
        };
        let mut object = Map::new();
        object.insert("fieldPath".into(), Value::String(self.field_path.clone()));
        object.insert(key.into(), value);
        Value::Object(object)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteKind {
    /// Replace or merge a document. `document` holds the `fields` map.
    Update {
        document_path: String,
        document: Value,
        update_mask: DocumentMask,
    },
    Delete {
        document_path: String,
    },
    Transform {
        document_path: String,
        field_transforms: Vec<FieldTransform>,
    },
}

/// One write in a batch or commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub kind: WriteKind,
    /// Applied after an update, in order.
    pub update_transforms: Vec<FieldTransform>,
    pub current_document: Precondition,
}

impl Write {
    pub fn update(document_path: impl Into<String>, document: Value) -> Self {
        Self::from_kind(WriteKind::Update {
            document_path: document_path.into(),
            document,
            update_mask: DocumentMask::default(),
        })
    }

    pub fn delete(document_path: impl Into<String>) -> Self {
        Self::from_kind(WriteKind::Delete {
            document_path: document_path.into(),
        })
    }

    pub fn transform(document_path: impl Into<String>, field_transforms: Vec<FieldTransform>) -> Self {
        Self::from_kind(WriteKind::Transform {
            document_path: document_path.into(),
            field_transforms,
        })
    }

    fn from_kind(kind: WriteKind) -> Self {
        Self {
            kind,
            update_transforms: Vec::new(),
            current_document: Precondition::None,
        }
    }

    /// Only meaningful for update writes; ignored otherwise.
    pub fn with_update_mask(mut self, mask: DocumentMask) -> Self {
        if let WriteKind::Update { update_mask, .. } = &mut self.kind {
            *update_mask = mask;
        }
        self
    }

    pub fn with_update_transform(mut self, transform: FieldTransform) -> Self {
        self.update_transforms.push(transform);
        self
    }

    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.current_document = precondition;
        self
    }

    pub fn to_json(&self, locator: &ResourceLocator) -> Value {
        let mut object = Map::new();
        match &self.kind {
            WriteKind::Update {
                document_path,
                document,
                update_mask,
            } => {
                let mut doc = Map::new();
                doc.insert(
                    "name".into(),
                    Value::String(locator.document_name(document_path)),
                );
                if let Some(fields) = document.get("fields") {
                    doc.insert("fields".into(), fields.clone());
                } else if document.is_object() {
                    doc.insert("fields".into(), document.clone());
                }
                object.insert("update".into(), Value::Object(doc));
                if !update_mask.is_empty() {
                    object.insert("updateMask".into(), update_mask.to_json());
                }
            }
            WriteKind::Delete { document_path } => {
                object.insert(
                    "delete".into(),
                    Value::String(locator.document_name(document_path)),
                );
            }
            WriteKind::Transform {
                document_path,
                field_transforms,
            } => {
                object.insert(
                    "transform".into(),
                    json!({
                        "document": locator.document_name(document_path),
                        "fieldTransforms": field_transforms
                            .iter()
                            .map(FieldTransform::to_json)
                            .collect::<Vec<_>>(),
                    }),
                );
            }
        }
        if !self.update_transforms.is_empty() {
            object.insert(
                "updateTransforms".into(),
                Value::Array(
                    self.update_transforms
                        .iter()
                        .map(FieldTransform::to_json)
                        .collect(),
                ),
            );
        }
        if let Some(precondition) = self.current_document.to_json() {
            object.insert("currentDocument".into(), precondition);
        }
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::ParentResource;

    fn locator() -> ResourceLocator {
        ResourceLocator::resolve(&ParentResource::new("p", ""), "").unwrap()
    }

    #[test]
    fn update_with_mask_and_precondition() {
        let write = Write::update(
            "users/alice",
            json!({"fields": {"age": {"integerValue": "3"}}}),
        )
        .with_update_mask(DocumentMask::new("age"))
        .with_precondition(Precondition::Exists(true));

        assert_eq!(
            write.to_json(&locator()),
            json!({
                "update": {
                    "name": "projects/p/databases/(default)/documents/users/alice",
                    "fields": {"age": {"integerValue": "3"}}
                },
                "updateMask": {"fieldPaths": ["age"]},
                "currentDocument": {"exists": true}
            })
        );
    }

    #[test]
    fn delete_write() {
        assert_eq!(
            Write::delete("users/bob").to_json(&locator()),
            json!({"delete": "projects/p/databases/(default)/documents/users/bob"})
        );
    }

    #[test]
    fn transform_write() {
        let write = Write::transform(
            "stats/visits",
            vec![
                FieldTransform::new("count", Transform::Increment(json!({"integerValue": "1"}))),
                FieldTransform::request_time("seen"),
                FieldTransform::new(
                    "tags",
                    Transform::AppendMissingElements(vec![json!({"stringValue": "a"})]),
                ),
            ],
        );
        assert_eq!(
            write.to_json(&locator()),
            json!({
                "transform": {
                    "document": "projects/p/databases/(default)/documents/stats/visits",
                    "fieldTransforms": [
                        {"fieldPath": "count", "increment": {"integerValue": "1"}},
                        {"fieldPath": "seen", "setToServerValue": "REQUEST_TIME"},
                        {"fieldPath": "tags", "appendMissingElements": {"values": [{"stringValue": "a"}]}}
                    ]
                }
            })
        );
    }

    #[test]
    fn update_transforms_follow_update() {
        let write = Write::update("c/d", json!({}))
            .with_update_transform(FieldTransform::new(
                "n",
                Transform::Maximum(json!({"integerValue": "9"})),
            ));
        let value = write.to_json(&locator());
        assert_eq!(
            value["updateTransforms"],
            json!([{"fieldPath": "n", "maximum": {"integerValue": "9"}}])
        );
    }
}
