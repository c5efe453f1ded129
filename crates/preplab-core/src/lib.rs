//! preplab-core: view-model logic for the preplab frontend.
//!
//! Everything here is plain data manipulation — no DOM, no network, no
//! async — so the whole crate compiles for `wasm32` and native alike and
//! is exercised by ordinary `cargo test`. The browser crate supplies the
//! storage backend and the HTTP client and calls into this crate for all
//! decisions: which workflow steps are reachable, which rows a page
//! shows, how a column is binned, what a frequency edit does.

pub mod browse;
pub mod cache;
pub mod error;
pub mod features;
pub mod models;
pub mod nav;
pub mod paginate;
pub mod stats;
pub mod store;
pub mod timeseries;

pub use cache::{AppData, FetchTicket};
pub use error::{PrepError, Result};
pub use models::{
    CompareOp, CreatedFeature, DataPreview, Row, UploadResponse, VariableChange, VariableType,
};
pub use nav::{NavOutcome, Step};
pub use paginate::Pager;
pub use store::{StateStore, StorageBackend};
pub use timeseries::TimeSeriesSession;
