//! Issues backend requests on the runtime and routes completions back to the
//! UI loop over an unbounded channel.

use crate::core::catalog::{AnnotationRegistry, AppContext, Provenance};
use crate::core::query::{QueryBuilder, QueryString};
use crate::core::response::{
    provenance_from_value, AnnotationsResponse, CountResponse, JobOutcome, JobResponse,
    UploadOutcome, UploadResponse,
};
use crate::core::types::PanelRole;
use crate::services::backend::{Backend, BackendError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

/// Which form submitted a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Summary,
    Comparison,
    Annotation,
    Result,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Comparison => write!(f, "comparison"),
            Self::Annotation => write!(f, "annotation"),
            Self::Result => write!(f, "result"),
        }
    }
}

/// A finished request, applied by the UI on its next tick
#[derive(Debug)]
pub enum BackendEvent {
    Count {
        role: PanelRole,
        generation: u64,
        result: Result<u64, BackendError>,
    },
    Job {
        kind: JobKind,
        result: Result<JobOutcome, BackendError>,
    },
    Upload {
        result: Result<UploadOutcome, BackendError>,
    },
    Provenance {
        name: String,
        result: Result<Provenance, BackendError>,
    },
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    let body = value.to_string();
    serde_json::from_value(value).map_err(|source| {
        error!(body = %body, error = %source, "Reply has an unexpected shape");
        BackendError::Decode { source, body }
    })
}

#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    handle: Handle,
    tx: UnboundedSender<BackendEvent>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>, handle: Handle) -> (Self, UnboundedReceiver<BackendEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { backend, handle, tx }, rx)
    }

    fn spawn<F>(&self, work: F)
    where
        F: Future<Output = BackendEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            // The receiver is gone only when the app is shutting down
            let _ = tx.send(work.await);
        });
    }

    pub fn refresh_count(&self, role: PanelRole, generation: u64, query: QueryString) {
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = match backend.fetch(&query).await {
                Ok(value) => decode::<CountResponse>(value).map(|c| c.count),
                Err(e) => Err(e),
            };
            BackendEvent::Count { role, generation, result }
        });
    }

    pub fn submit_job(&self, kind: JobKind, query: QueryString) {
        info!("Submitting {} request: {}", kind, query);
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = match backend.fetch(&query).await {
                Ok(value) => JobResponse::from_value(&value)
                    .map(JobOutcome::from)
                    .map_err(|source| {
                        error!(body = %value, error = %source, "Job reply has an unexpected shape");
                        BackendError::Decode { source, body: value.to_string() }
                    }),
                Err(e) => Err(e),
            };
            BackendEvent::Job { kind, result }
        });
    }

    pub fn upload(&self, submitted_url: String, query: QueryString) {
        info!("Uploading {}", submitted_url);
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = match backend.fetch(&query).await {
                Ok(value) => decode::<UploadResponse>(value)
                    .map(|r| UploadOutcome::from_response(r, &submitted_url)),
                Err(e) => Err(e),
            };
            BackendEvent::Upload { result }
        });
    }

    pub fn provenance(&self, name: String, query: QueryString) {
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = backend
                .fetch(&query)
                .await
                .map(|value| provenance_from_value(&name, &value));
            BackendEvent::Provenance { name, result }
        });
    }
}

/// Load the attribute catalog and the annotation registry concurrently
pub async fn load_context(backend: &dyn Backend, builder: &QueryBuilder) -> Result<AppContext, BackendError> {
    let annotations_query = builder.annotations();
    let (catalog, annotations) = futures::try_join!(backend.fetch_catalog(), async {
        let value = backend.fetch(&annotations_query).await?;
        decode::<AnnotationsResponse>(value)
    })?;
    info!(
        "Loaded {} attributes and {} annotation datasets",
        catalog.len(),
        annotations.annotations.len()
    );
    Ok(AppContext::new(catalog, AnnotationRegistry::new(annotations.annotations)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::AttributeCatalog;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Answers by looking at the first query key
    struct FakeBackend {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Backend for FakeBackend {
        async fn fetch(&self, query: &QueryString) -> Result<Value, BackendError> {
            self.seen.lock().unwrap().push(query.to_string());
            let first = query.pairs().first().map(|(k, _)| k.as_str()).unwrap_or("");
            Ok(match first {
                "annotations" => json!({"annotations": ["genes", "enhancers"]}),
                "count" => json!({"query": {}, "count": 12}),
                "provenance" => json!({"name": "genes", "description": "GENCODE"}),
                "uploadUrl" => json!({"url": "http://h/a.bw", "format": "bigWig"}),
                _ => json!({"status": "DONE", "url": "x.bw", "view": "y.png"}),
            })
        }

        async fn fetch_catalog(&self) -> Result<AttributeCatalog, BackendError> {
            let mut entries = BTreeMap::new();
            entries.insert("chrom".to_string(), vec!["chr1".to_string()]);
            Ok(AttributeCatalog::new(entries))
        }
    }

    fn fake() -> Arc<FakeBackend> {
        Arc::new(FakeBackend { seen: Mutex::new(Vec::new()) })
    }

    #[tokio::test]
    async fn test_load_context() {
        let backend = fake();
        let ctx = load_context(backend.as_ref(), &QueryBuilder::default()).await.unwrap();
        assert_eq!(ctx.registry.first(), Some("genes"));
        assert!(ctx.catalog.is_legal("chrom", "chr1"));
        assert_eq!(backend.seen.lock().unwrap().clone(), vec!["annotations=1".to_string()]);
    }

    #[tokio::test]
    async fn test_events_are_routed_back() {
        let backend = fake();
        let (dispatcher, mut rx) = Dispatcher::new(backend.clone(), Handle::current());

        dispatcher.refresh_count(PanelRole::OperandB, 3, QueryString::new().with("count", "true"));
        match rx.recv().await.unwrap() {
            BackendEvent::Count { role, generation, result } => {
                assert_eq!(role, PanelRole::OperandB);
                assert_eq!(generation, 3);
                assert_eq!(result.unwrap(), 12);
            }
            other => panic!("unexpected event {other:?}"),
        }

        dispatcher.submit_job(JobKind::Summary, QueryString::new().with("wa", "unit mult"));
        match rx.recv().await.unwrap() {
            BackendEvent::Job { kind, result } => {
                assert_eq!(kind, JobKind::Summary);
                assert_eq!(
                    result.unwrap(),
                    JobOutcome::Success { url: "x.bw".into(), view: "y.png".into() }
                );
            }
            other => panic!("unexpected event {other:?}"),
        }

        dispatcher.upload("http://h/a.bw".into(), QueryString::new().with("uploadUrl", "http://h/a.bw"));
        match rx.recv().await.unwrap() {
            BackendEvent::Upload { result } => assert_eq!(
                result.unwrap(),
                UploadOutcome::Malformed { url: "http://h/a.bw".into(), format: "bigWig".into() }
            ),
            other => panic!("unexpected event {other:?}"),
        }

        dispatcher.provenance("genes".into(), QueryString::new().with("provenance", "genes"));
        match rx.recv().await.unwrap() {
            BackendEvent::Provenance { name, result } => {
                assert_eq!(name, "genes");
                assert_eq!(result.unwrap().description, "GENCODE");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
