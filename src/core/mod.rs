pub mod catalog;
pub mod error;
pub mod panel;
pub mod query;
pub mod response;
pub mod rows;
pub mod types;

pub use catalog::{AnnotationRegistry, AppContext, AttributeCatalog, Provenance};
pub use error::{ModelError, QueryError};
pub use panel::{LiveCount, Panel, PanelChange};
pub use query::{EmptySelectionPolicy, QueryBuilder, QueryString};
pub use response::{JobOutcome, JobResponse, UploadOutcome, UploadResponse};
pub use rows::{FilterRow, RowGroup, SelectionRow};
pub use types::*;
