//! Line-oriented file persistence
//!
//! A [`LineStore`] keeps every record of a file in memory and rewrites the
//! whole file atomically on save. [`BoundedLineStore`] adds a retention limit
//! read from [`Settings`](crate::config::Settings), so only the most recent
//! lines are persisted and the file can be dropped entirely when the limit
//! goes to zero.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use linestore::store::LineStore;
//!
//! let mut history = LineStore::<String>::open("data/cmd-history")?;
//! history.lines_mut().push("open example.com".to_string());
//! history.save()?;
//! ```

pub mod bounded;
pub mod error;
pub mod line;
pub mod lines;

pub use bounded::{BoundedLineStore, RetentionLimit, resolve_path};
pub use error::{Result, StoreError};
pub use line::{Line, Mode};
pub use lines::LineStore;
