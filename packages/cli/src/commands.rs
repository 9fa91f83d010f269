//! Command-line arguments and their mapping onto operations.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use firelink_firestore::{
    Consistency, DocumentMask, Index, IndexField, IndexFieldMode, ListDocumentsOptions, Operation,
    OperationDescriptor, ParentResource, Precondition, ReadConsistency, TransactionOptions,
};

use crate::error::CliError;

/// firelink - run single Firestore REST operations
#[derive(Parser, Debug)]
#[command(name = "firelink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project id (defaults to the token's project)
    #[arg(long, short = 'p', default_value = "")]
    pub project: String,

    /// Database id
    #[arg(long, short = 'd', default_value = "")]
    pub database: String,

    /// OAuth2 access token
    #[arg(long, env = "FIRELINK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Engine config file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the service URL from the config
    #[arg(long)]
    pub service_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read one document
    Get {
        path: String,
        #[arg(long, default_value = "")]
        mask: String,
        #[command(flatten)]
        read: ReadArgs,
    },
    /// List documents of a collection
    List {
        collection: String,
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        page_size: i32,
        #[arg(long, default_value = "")]
        page_token: String,
        #[arg(long, default_value = "")]
        order_by: String,
        #[arg(long)]
        show_missing: bool,
        #[arg(long, default_value = "")]
        mask: String,
    },
    /// Create a document at `collection` or `collection/id`
    Create {
        path: String,
        /// Document JSON
        #[arg(long)]
        data: String,
        #[arg(long, default_value = "")]
        mask: String,
    },
    /// Update a document
    Patch {
        path: String,
        #[arg(long)]
        data: String,
        #[arg(long, default_value = "")]
        update_mask: String,
        #[arg(long, default_value = "")]
        mask: String,
        #[command(flatten)]
        precondition: PreconditionArgs,
    },
    /// Delete a document
    Delete {
        path: String,
        #[command(flatten)]
        precondition: PreconditionArgs,
    },
    /// Run a structured query
    Query {
        /// StructuredQuery JSON
        query: String,
        #[arg(long, default_value = "")]
        parent: String,
        #[command(flatten)]
        read: ReadArgs,
    },
    /// List collection ids under a document (or the root)
    Collections {
        #[arg(default_value = "")]
        path: String,
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        page_size: i32,
        #[arg(long, default_value = "")]
        page_token: String,
    },
    /// Start a transaction
    Begin {
        #[arg(long)]
        read_only: bool,
    },
    /// Roll back a transaction
    Rollback { transaction: String },
    /// Export documents to Cloud Storage
    Export(TransferArgs),
    /// Import documents from Cloud Storage
    Import(TransferArgs),
    /// Composite index management
    #[command(subcommand)]
    Index(IndexCommand),
}

#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// List indexes of a collection group
    List {
        collection: String,
        #[arg(long, default_value = "")]
        filter: String,
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        page_size: i32,
        #[arg(long, default_value = "")]
        page_token: String,
    },
    Get { collection: String, id: String },
    Delete { collection: String, id: String },
    /// Create an index from `field:asc`, `field:desc` or `field:contains` specs
    Create {
        collection: String,
        #[arg(required = true)]
        fields: Vec<String>,
        #[arg(long, default_value = "COLLECTION")]
        scope: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct ReadArgs {
    /// Read inside this transaction
    #[arg(long, conflicts_with = "read_time")]
    pub transaction: Option<String>,
    /// Read as of this RFC 3339 time
    #[arg(long)]
    pub read_time: Option<String>,
}

impl ReadArgs {
    fn read_consistency(&self) -> ReadConsistency {
        match (&self.transaction, &self.read_time) {
            (Some(token), _) => ReadConsistency::Transaction(token.clone()),
            (None, Some(time)) => ReadConsistency::ReadTime(time.clone()),
            (None, None) => ReadConsistency::Default,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct PreconditionArgs {
    /// Require the document to exist (or not)
    #[arg(long, conflicts_with = "update_time")]
    pub exists: Option<bool>,
    /// Require this last update time
    #[arg(long)]
    pub update_time: Option<String>,
}

impl PreconditionArgs {
    fn precondition(&self) -> Precondition {
        match (self.exists, &self.update_time) {
            (Some(exists), _) => Precondition::Exists(exists),
            (None, Some(time)) => Precondition::UpdateTime(time.clone()),
            (None, None) => Precondition::None,
        }
    }
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    #[arg(long)]
    pub bucket: String,
    #[arg(long, default_value = "")]
    pub path: String,
    /// Comma-separated collection ids (all when empty)
    #[arg(long, default_value = "")]
    pub collections: String,
}

fn parse_json(text: &str) -> Result<Value, CliError> {
    serde_json::from_str(text).map_err(|source| CliError::InvalidJson {
        input: text.to_string(),
        source,
    })
}

fn parse_index_field(spec: &str) -> Result<IndexField, CliError> {
    let (field, mode) = spec.rsplit_once(':').unwrap_or((spec, "asc"));
    let mode = match mode.to_ascii_lowercase().as_str() {
        "asc" | "ascending" => IndexFieldMode::Ascending,
        "desc" | "descending" => IndexFieldMode::Descending,
        "contains" | "array-contains" => IndexFieldMode::ArrayContains,
        other => {
            return Err(CliError::InvalidArgument {
                message: format!("unknown index mode '{other}' in '{spec}'"),
            })
        }
    };
    Ok(IndexField::new(field, mode))
}

impl Cli {
    pub fn parent(&self) -> ParentResource {
        ParentResource::new(self.project.as_str(), self.database.as_str())
    }

    pub fn descriptor(&self) -> Result<OperationDescriptor, CliError> {
        Ok(OperationDescriptor::new(self.parent(), self.command.operation()?))
    }
}

impl Command {
    pub fn operation(&self) -> Result<Operation, CliError> {
        let operation = match self {
            Command::Get { path, mask, read } => {
                Operation::get_document(path.as_str(), DocumentMask::new(mask), read.read_consistency())
            }
            Command::List {
                collection,
                page_size,
                page_token,
                order_by,
                show_missing,
                mask,
            } => Operation::list_documents(
                collection.as_str(),
                ListDocumentsOptions {
                    page_size: *page_size,
                    page_token: page_token.clone(),
                    order_by: order_by.clone(),
                    mask: DocumentMask::new(mask),
                    show_missing: *show_missing,
                },
            ),
            Command::Create { path, data, mask } => {
                Operation::create_document_at(path, DocumentMask::new(mask), &parse_json(data)?)
            }
            Command::Patch {
                path,
                data,
                update_mask,
                mask,
                precondition,
            } => Operation::patch_document(
                path.as_str(),
                DocumentMask::new(update_mask),
                DocumentMask::new(mask),
                precondition.precondition(),
                &parse_json(data)?,
            ),
            Command::Delete { path, precondition } => {
                Operation::delete_document(path.as_str(), precondition.precondition())
            }
            Command::Query {
                query,
                parent,
                read,
            } => Operation::run_query(
                parent.as_str(),
                parse_json(query)?,
                Consistency::from(read.read_consistency()),
            ),
            Command::Collections {
                path,
                page_size,
                page_token,
            } => Operation::list_collection_ids(path.as_str(), *page_size, page_token.as_str()),
            Command::Begin { read_only } => Operation::begin_transaction(Some(if *read_only {
                TransactionOptions::read_only()
            } else {
                TransactionOptions::read_write()
            })),
            Command::Rollback { transaction } => Operation::rollback(transaction.as_str()),
            Command::Export(args) => Operation::export_documents(
                &args.collections,
                args.bucket.as_str(),
                args.path.as_str(),
            ),
            Command::Import(args) => Operation::import_documents(
                &args.collections,
                args.bucket.as_str(),
                args.path.as_str(),
            ),
            Command::Index(IndexCommand::List {
                collection,
                filter,
                page_size,
                page_token,
            }) => Operation::list_indexes(
                collection.as_str(),
                filter.as_str(),
                *page_size,
                page_token.as_str(),
            ),
            Command::Index(IndexCommand::Get { collection, id }) => {
                Operation::get_index(collection.as_str(), id.as_str())
            }
            Command::Index(IndexCommand::Delete { collection, id }) => {
                Operation::delete_index(collection.as_str(), id.as_str())
            }
            Command::Index(IndexCommand::Create {
                collection,
                fields,
                scope,
            }) => {
                let fields = fields
                    .iter()
                    .map(|spec| parse_index_field(spec))
                    .collect::<Result<Vec<_>, _>>()?;
                Operation::create_index(collection.as_str(), Index::new(scope.as_str(), fields))
            }
        };
        Ok(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firelink_firestore::{build_target, OperationKind, ResourceLocator};

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["firelink", "--token", "t"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn target(cli: &Cli) -> String {
        let descriptor = cli.descriptor().unwrap();
        let locator = ResourceLocator::resolve(&descriptor.parent, "fallback").unwrap();
        build_target(&locator, &descriptor.operation).to_string()
    }

    #[test]
    fn get_with_mask_and_read_time() {
        let cli = parse(&[
            "-p",
            "proj",
            "get",
            "users/alice",
            "--mask",
            "name,age",
            "--read-time",
            "2024-01-01T00:00:00Z",
        ]);
        assert_eq!(
            target(&cli),
            "proj/databases/(default)/documents/users/alice?mask.fieldPaths=name&mask.fieldPaths=age&readTime=2024-01-01T00%3A00%3A00Z"
        );
    }

    #[test]
    fn conflicting_read_selectors_are_rejected() {
        let parsed = Cli::try_parse_from([
            "firelink",
            "get",
            "c/d",
            "--transaction",
            "abc",
            "--read-time",
            "2024-01-01T00:00:00Z",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn list_defaults_leave_page_size_out() {
        let cli = parse(&["list", "users", "--order-by", "name"]);
        assert_eq!(
            target(&cli),
            "fallback/databases/(default)/documents/users?orderBy=name&showMissing=false"
        );
    }

    #[test]
    fn create_splits_path() {
        let cli = parse(&["-d", "db", "create", "users/alice", "--data", "{\"fields\":{}}"]);
        assert_eq!(
            target(&cli),
            "fallback/databases/db/documents/users?documentId=alice"
        );
    }

    #[test]
    fn invalid_json_is_reported() {
        let cli = parse(&["create", "users", "--data", "{not json"]);
        assert!(matches!(
            cli.descriptor(),
            Err(CliError::InvalidJson { .. })
        ));
    }

    #[test]
    fn index_create_parses_field_specs() {
        let cli = parse(&["index", "create", "users", "age:desc", "tags:contains", "name"]);
        match cli.command.operation().unwrap() {
            Operation::CreateIndex { index, .. } => {
                assert_eq!(index.query_scope, "COLLECTION");
                assert_eq!(
                    index.fields,
                    vec![
                        IndexField::new("age", IndexFieldMode::Descending),
                        IndexField::new("tags", IndexFieldMode::ArrayContains),
                        IndexField::new("name", IndexFieldMode::Ascending),
                    ]
                );
            }
            other => panic!("unexpected operation {other:?}"),
        }

        let bad = parse(&["index", "create", "users", "age:sideways"]);
        assert!(matches!(
            bad.command.operation(),
            Err(CliError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn every_command_maps_to_its_kind() {
        let cases: &[(&[&str], OperationKind)] = &[
            (&["delete", "c/d", "--exists", "true"], OperationKind::DeleteDocument),
            (&["patch", "c/d", "--data", "{}"], OperationKind::PatchDocument),
            (&["query", "{}"], OperationKind::RunQuery),
            (&["collections"], OperationKind::ListCollectionIds),
            (&["begin", "--read-only"], OperationKind::BeginTransaction),
            (&["rollback", "tx"], OperationKind::Rollback),
            (&["export", "--bucket", "b"], OperationKind::ExportDocuments),
            (&["import", "--bucket", "b"], OperationKind::ImportDocuments),
            (&["index", "list", "c"], OperationKind::ListIndexes),
            (&["index", "get", "c", "i"], OperationKind::GetIndex),
            (&["index", "delete", "c", "i"], OperationKind::DeleteIndex),
        ];
        for (args, kind) in cases {
            assert_eq!(parse(args).command.operation().unwrap().kind(), *kind);
        }
    }
}
