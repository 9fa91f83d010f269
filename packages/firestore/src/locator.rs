use std::fmt;

use crate::error::FirebaseError;

/// Database id substituted when none is given.
pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// Project and database a request targets. Either may be left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentResource {
    pub project_id: String,
    pub database_id: String,
}

impl ParentResource {
    pub fn new(project_id: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: database_id.into(),
        }
    }

    /// The app's project and the default database.
    pub fn app_default() -> Self {
        Self::default()
    }
}

/// Resolved `<project>/databases/<database>` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    project_id: String,
    database_id: String,
}

impl ResourceLocator {
    /// Resolve `parent`, falling back to `app_project_id` and `(default)`.
    ///
    /// Fails with [`FirebaseError::AppNotAssigned`] when neither names a project.
    pub fn resolve(parent: &ParentResource, app_project_id: &str) -> Result<Self, FirebaseError> {
        let project_id = if parent.project_id.is_empty() {
            app_project_id
        } else {
            parent.project_id.as_str()
        };
        if project_id.is_empty() {
            return Err(FirebaseError::AppNotAssigned);
        }

        let database_id = if parent.database_id.is_empty() {
            DEFAULT_DATABASE_ID
        } else {
            parent.database_id.as_str()
        };

        Ok(Self {
            project_id: project_id.to_string(),
            database_id: database_id.to_string(),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// `<project>/databases/<database>`
    pub fn base_path(&self) -> String {
        format!("{}/databases/{}", self.project_id, self.database_id)
    }

    /// Full resource name of a document, as used inside request bodies.
    pub fn document_name(&self, document_path: &str) -> String {
        format!(
            "projects/{}/documents/{}",
            self.base_path(),
            document_path.trim_start_matches('/')
        )
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/databases/{}", self.project_id, self.database_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_database_becomes_default() {
        let locator = ResourceLocator::resolve(&ParentResource::new("p", ""), "app").unwrap();
        assert_eq!(locator.base_path(), "p/databases/(default)");
    }

    #[test]
    fn explicit_ids_win() {
        let locator =
            ResourceLocator::resolve(&ParentResource::new("proj", "db2"), "app").unwrap();
        assert_eq!(locator.to_string(), "proj/databases/db2");
        assert_eq!(locator.project_id(), "proj");
        assert_eq!(locator.database_id(), "db2");
    }

    #[test]
    fn empty_project_falls_back_to_app() {
        let locator = ResourceLocator::resolve(&ParentResource::app_default(), "app-proj").unwrap();
        assert_eq!(locator.base_path(), "app-proj/databases/(default)");
    }

    #[test]
    fn no_project_anywhere_is_unauthorized() {
        assert_eq!(
            ResourceLocator::resolve(&ParentResource::default(), ""),
            Err(FirebaseError::AppNotAssigned)
        );
    }

    #[test]
    fn document_name_is_fully_qualified() {
        let locator = ResourceLocator::resolve(&ParentResource::new("p", ""), "").unwrap();
        assert_eq!(
            locator.document_name("/users/alice"),
            "projects/p/databases/(default)/documents/users/alice"
        );
    }
}
