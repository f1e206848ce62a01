//! End-to-end request flow against an in-process backend: startup load,
//! live counts with out-of-order replies, jobs and uploads

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use std::{collections::BTreeMap, sync::Arc};
use tempfile::NamedTempFile;
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;
use wiggletui::core::{
    AttributeCatalog, JobOutcome, Panel, PanelRole, QueryBuilder, QueryString, UploadOutcome,
};
use wiggletui::services::{
    load_context, Backend, BackendError, BackendEvent, CatalogSource, Dispatcher, HttpBackend,
    JobKind,
};

/// Answers from canned replies keyed by the first query key; count replies
/// for the first request are delayed so they arrive after the second
struct ScriptedBackend {
    replies: BTreeMap<&'static str, Value>,
    count_calls: Mutex<u32>,
}

impl ScriptedBackend {
    fn new() -> Self {
        let mut replies = BTreeMap::new();
        replies.insert("annotations", json!({"annotations": ["genes", "enhancers"]}));
        replies.insert("wa", json!({"status": "EMPTY"}));
        replies.insert("result", json!({"status": "LAUNCHED", "ID": 17}));
        replies.insert("uploadUrl", json!({"url": "http://h/a.bw", "format": "bigWig"}));
        replies.insert("provenance", json!({"name": "genes", "description": "GENCODE v19"}));
        Self { replies, count_calls: Mutex::new(0) }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn fetch(&self, query: &QueryString) -> Result<Value, BackendError> {
        let first = query.pairs().first().map(|(k, _)| k.as_str()).unwrap_or_default();
        if first == "count" {
            let call = {
                let mut calls = self.count_calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if call == 1 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            let n = query.values("A_chrom").count() as u64;
            return Ok(json!({"query": query.to_string(), "count": n * 10 + u64::from(call)}));
        }
        let key = if query.values("wa").next().is_some() { "wa" } else { first };
        self.replies
            .get(key)
            .cloned()
            .ok_or_else(|| BackendError::Status { status: "404 Not Found".into(), body: key.into() })
    }

    async fn fetch_catalog(&self) -> Result<AttributeCatalog, BackendError> {
        AttributeCatalog::from_json(r#"{"chrom": ["chr1", "chr2"], "cell": ["K562"]}"#)
            .map_err(|source| BackendError::Decode { source, body: String::new() })
    }
}

async fn next_event(events: &mut UnboundedReceiver<BackendEvent>) -> BackendEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a backend event")
        .expect("dispatcher dropped")
}

#[tokio::test]
async fn startup_loads_catalog_and_registry() {
    let backend = ScriptedBackend::new();
    let ctx = load_context(&backend, &QueryBuilder::default()).await.unwrap();
    assert_eq!(ctx.catalog.attributes().collect::<Vec<_>>(), vec!["cell", "chrom"]);
    assert_eq!(ctx.registry.first(), Some("genes"));
}

#[tokio::test]
async fn stale_count_never_overwrites_newer_one() {
    let backend = Arc::new(ScriptedBackend::new());
    let builder = QueryBuilder::default();
    let ctx = load_context(backend.as_ref(), &builder).await.unwrap();
    let (dispatcher, mut events) = Dispatcher::new(backend, tokio::runtime::Handle::current());

    let mut panel = Panel::new(PanelRole::Summary, ctx);
    panel.set_attribute(0, Some("chrom")).unwrap();
    panel.toggle_value(0, "chr1").unwrap();
    let first = panel.begin_count_request();
    dispatcher.refresh_count(panel.role(), first, builder.count(&panel).unwrap());

    panel.toggle_value(0, "chr2").unwrap();
    let second = panel.begin_count_request();
    dispatcher.refresh_count(panel.role(), second, builder.count(&panel).unwrap());

    // The second reply overtakes the delayed first one
    for _ in 0..2 {
        match next_event(&mut events).await {
            BackendEvent::Count { generation, result, .. } => {
                panel.apply_count(generation, result.unwrap());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(panel.live_count().value(), Some(22));
    assert!(!panel.live_count().is_pending());
}

#[tokio::test]
async fn job_upload_and_provenance_outcomes() {
    let backend = Arc::new(ScriptedBackend::new());
    let builder = QueryBuilder::default();
    let ctx = load_context(backend.as_ref(), &builder).await.unwrap();
    let (dispatcher, mut events) = Dispatcher::new(backend, tokio::runtime::Handle::current());
    let panel = Panel::new(PanelRole::Summary, ctx);

    dispatcher.submit_job(JobKind::Summary, builder.summary(&panel).unwrap());
    match next_event(&mut events).await {
        BackendEvent::Job { kind, result } => {
            assert_eq!(kind, JobKind::Summary);
            assert_eq!(result.unwrap(), JobOutcome::Empty);
        }
        other => panic!("unexpected event {other:?}"),
    }

    dispatcher.submit_job(JobKind::Result, builder.result("17").unwrap());
    match next_event(&mut events).await {
        BackendEvent::Job { result, .. } => {
            assert_eq!(result.unwrap(), JobOutcome::Launched { id: "17".into() });
        }
        other => panic!("unexpected event {other:?}"),
    }

    dispatcher.upload("http://h/a.bw".into(), builder.upload("http://h/a.bw", "").unwrap());
    match next_event(&mut events).await {
        BackendEvent::Upload { result } => assert_eq!(
            result.unwrap(),
            UploadOutcome::Malformed { url: "http://h/a.bw".into(), format: "bigWig".into() }
        ),
        other => panic!("unexpected event {other:?}"),
    }

    dispatcher.provenance("genes".into(), builder.provenance("genes"));
    match next_event(&mut events).await {
        BackendEvent::Provenance { result, .. } => {
            assert_eq!(result.unwrap().description, "GENCODE v19");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn http_backend_reads_local_catalog() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"chrom": ["chr1"], "type": ["regions", "signal"]}}"#).unwrap();
    let backend = HttpBackend::new(
        Url::parse("http://localhost/cgi-bin/wiggleCGI.py").unwrap(),
        CatalogSource::File(file.path().to_path_buf()),
        None,
    )
    .unwrap();
    let catalog = backend.fetch_catalog().await.unwrap();
    assert_eq!(catalog.values("type"), ["regions".to_string(), "signal".to_string()]);
}
