//! Search Repository - fluent request building and repository operations
//! over an Elasticsearch-style search engine
//!
//! The crate assembles search, write and maintenance requests as owned JSON
//! documents and dispatches them through a per-cluster transport.
//!
//! ## Features
//!
//! - **Request Builder**: boolean buckets, ranges, date windows, sorting,
//!   pagination, aggregations, collapse and update scripts
//! - **Repository**: find, paginate, count, create, get, bulk, update by
//!   query, reindex and mapping creation, each leaving the builder clean
//! - **Cluster Registry**: one transport per named cluster, built once even
//!   under concurrent first access
//! - **Observability**: structured logging via `tracing`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use search_repository::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_file("config.toml")?;
//!     let registry = ClusterRegistry::new(&config);
//!
//!     let mut goods = Repository::connect(RequestBuilder::new("goods"), &registry).await?;
//!     let page = goods
//!         .paginate(
//!             &Conditions::new().term("status", 1).date_window("date", DateWindow::From("2024-01-01".into())),
//!             &QueryOptions::paginated(),
//!         )
//!         .await?;
//!
//!     println!("{} of {}", page.data.len(), page.total);
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod observability;
pub mod registry;
pub mod repository;
pub mod schema;
pub mod transport;

pub use config::Config;
pub use error::{Result, SearchError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::builder::{Clause, RequestBuilder, RequestParams, Script, SortOrder, TrackTotalHits};
    pub use crate::config::Config;
    pub use crate::error::{Result, SearchError};
    pub use crate::registry::{ClusterRegistry, TransportFactory};
    pub use crate::repository::{Conditions, DateWindow, Page, QueryOptions, Repository, SortSpec};
    pub use crate::schema::{SchemaProvider, StaticSchema};
    pub use crate::transport::{HttpTransport, Transport};
}
