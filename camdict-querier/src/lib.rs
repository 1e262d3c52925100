//! Dictionary lookups against the Cambridge site.
//!
//! The crate exposes a common [`Querier`] interface with two implementations:
//! [`Remote`], which speaks the site's redirect-based search protocol and
//! extracts lemmas on a bounded [`ParsePool`], and [`Cached`], which memoizes
//! any other querier in a [`Storage`].
//!
//! # Examples
//! ```no_run
//! use camdict_querier::{Querier, QueryError, Remote, RemoteConfig, SearchOutcome};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), QueryError> {
//! let remote = Remote::new(&RemoteConfig::default())?;
//! let cancel = CancellationToken::new();
//! if let SearchOutcome::Resolved(id) = remote.search(&cancel, "hello").await? {
//!     let lemmas = remote.get_lemma(&cancel, &id).await?;
//!     assert!(!lemmas.is_empty());
//! }
//! remote.close(&cancel).await?;
//! # Ok(())
//! # }
//! ```
pub mod cache;
pub mod config;
pub mod error;
pub mod page;
pub mod pool;
pub mod remote;
pub mod storage;
pub mod traits;

pub use cache::Cached;
pub use config::{CacheConfig, RemoteConfig};
pub use error::{ProtocolError, QueryError};
pub use page::{HtmlPageParser, JsonPageParser, PageParser};
pub use pool::ParsePool;
pub use remote::Remote;
pub use storage::{MemoryStorage, Storage, StorageError};
pub use traits::{Querier, SearchOutcome};
