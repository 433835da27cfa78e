//! Transport-neutral request surface for the OneRoster gradebook.
//!
//! An HTTP adapter maps routes onto [`GradebookApi`] methods one to one and
//! copies the returned [`ApiResponse`] onto the wire.

pub mod api;
pub mod config;
pub mod response;

pub use api::{BootstrapError, GradebookApi, ListParams};
pub use config::ApiConfig;
pub use response::{ApiResponse, TOTAL_COUNT_HEADER};
