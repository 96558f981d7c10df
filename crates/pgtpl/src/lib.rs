//! # pgtpl
//!
//! A schema-driven dynamic SQL templating engine for PostgreSQL.
//!
//! pgtpl turns declarative descriptions of a query (target table, column
//! filters, sort orders, paging, set clauses) into parameterized SQL
//! executed against a live connection, with no hand-written SQL and no
//! per-table data-access code. It is built for applications that work
//! against many structurally similar tables, including horizontally
//! sharded tables distinguished by a numeric suffix (`orders_3`).
//!
//! ## Features
//!
//! - **Schema registry**: a concurrent table-name → schema cache, refreshed
//!   wholesale from live database metadata
//! - **Generic operations**: select / count / exists / insert / batch-insert /
//!   update / batch-update / delete against any registered table
//! - **Default backfill**: insert columns omitted by the caller are filled
//!   from the schema's registered defaults, and fail fast when neither exists
//! - **Collision-safe binding**: SET-clause parameters are bracket-wrapped so
//!   they never collide with a same-named predicate parameter
//! - **Narrow boundaries**: SQL text generation ([`SqlDialect`]), execution
//!   ([`Executor`]), introspection ([`SchemaIntrospector`]) and auditing
//!   ([`AuditSink`]) are traits with provided Postgres implementations
//!
//! ## Example
//!
//! ```ignore
//! use pgtpl::{Filter, PgExecutor, SchemaRegistry, TableSchema, Template, Value, ValueKind};
//!
//! let registry = SchemaRegistry::new();
//! registry.put(
//!     TableSchema::new("users")
//!         .with_columns(&[
//!             ("id", ValueKind::Long),
//!             ("name", ValueKind::Text),
//!             ("age", ValueKind::Int),
//!         ])
//!         .with_primary_key("id")
//!         .with_insert_columns(&["name", "age"])
//!         .with_default("age", Value::Int(0)),
//! );
//!
//! let template = Template::new(PgExecutor::new(client), registry);
//!
//! // INSERT INTO users (name, age) VALUES ($1, $2), age backfilled to 0
//! let mut values = std::collections::HashMap::new();
//! values.insert("name".to_string(), Value::from("alice"));
//! template.insert("users", &values, None).await?;
//!
//! // SELECT id, name, age FROM users WHERE name = $1
//! let rows = template
//!     .select_list("users", &[Filter::eq("name", Value::from("alice"))], &[], None, None)
//!     .await?;
//! ```

pub mod audit;
pub mod client;
pub mod defaults;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod filter;
pub mod introspect;
pub mod key;
pub mod placeholder;
pub mod refresh;
pub mod registry;
pub mod schema;
pub mod set;
pub mod statement;
pub mod template;
pub mod value;

pub use audit::{AuditEvent, AuditSink, TracingAuditSink};
pub use client::GenericClient;
pub use dialect::{PgDialect, SqlDialect};
pub use error::{TplError, TplResult};
pub use executor::{Executor, PgExecutor};
pub use filter::{Cmp, Filter, Order, Page, Parameter};
pub use introspect::PgIntrospector;
pub use refresh::{SchemaIntrospector, refresh, refresh_all};
pub use registry::SchemaRegistry;
pub use schema::TableSchema;
pub use statement::BoundStatement;
pub use template::{Template, join_table_name};
pub use value::{Value, ValueKind};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};
