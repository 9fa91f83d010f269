use serde_json::{json, Value};

use crate::query::QueryParams;

/// A set of field paths restricting which fields are returned or updated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMask {
    field_paths: Vec<String>,
}

impl DocumentMask {
    /// Parse a comma-separated field list. Blank entries are dropped.
    pub fn new(fields: &str) -> Self {
        Self::from_fields(fields.split(','))
    }

    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let field_paths = fields
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        Self { field_paths }
    }

    pub fn is_empty(&self) -> bool {
        self.field_paths.is_empty()
    }

    pub fn field_paths(&self) -> &[String] {
        &self.field_paths
    }

    /// Emit one `<name>.fieldPaths=<field>` parameter per field.
    pub fn append_query(&self, name: &str, query: &mut QueryParams) {
        let key = format!("{name}.fieldPaths");
        for field in &self.field_paths {
            query.push(key.as_str(), field.as_str());
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "fieldPaths": self.field_paths })
    }
}

impl From<&str> for DocumentMask {
    fn from(fields: &str) -> Self {
        Self::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_list() {
        let mask = DocumentMask::new("name, age,,address.city ");
        assert_eq!(mask.field_paths(), ["name", "age", "address.city"]);
    }

    #[test]
    fn empty_mask_emits_nothing() {
        let mut query = QueryParams::default();
        DocumentMask::new("").append_query("mask", &mut query);
        assert!(query.is_empty());
    }

    #[test]
    fn one_param_per_field() {
        let mut query = QueryParams::default();
        DocumentMask::new("a,b").append_query("updateMask", &mut query);
        assert_eq!(
            query.to_query_string(),
            "updateMask.fieldPaths=a&updateMask.fieldPaths=b"
        );
    }

    #[test]
    fn json_form() {
        assert_eq!(
            DocumentMask::new("x").to_json(),
            json!({"fieldPaths": ["x"]})
        );
    }
}
