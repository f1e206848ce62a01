pub mod backend;
pub mod dispatcher;

pub use backend::{Backend, BackendError, CatalogSource, HttpBackend};
pub use dispatcher::{load_context, BackendEvent, Dispatcher, JobKind};
