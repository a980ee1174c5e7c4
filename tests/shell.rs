//! End-to-end tests through the public library API with an in-memory catalog.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;

use coursemap::client::{CatalogClient, Payload};
use coursemap::error::{AppError, Result};
use coursemap::models::{ApiConfig, Config, QueryParams};
use coursemap::services::{NoProgress, QueryEngine, ResponseCache, UNKNOWN_COURSE};
use coursemap::shell::{CommandOutcome, Shell};
use coursemap::storage::{LocalStorage, RecordStorage};

/// Serves Monday/Wednesday sections in the catalog's page size of 20.
struct Campus {
    sections: Vec<Value>,
    courses: HashMap<String, Value>,
    requests: AtomicUsize,
}

impl Campus {
    fn new(count: usize) -> Self {
        let sections = (0..count)
            .map(|i| {
                json!({
                    "_id": format!("s{i}"),
                    "section_number": format!("{:03}", i + 1),
                    "course_reference": if i % 2 == 0 { "c-cs1337" } else { "c-missing" },
                    "instruction_mode": "face-to-face",
                    "meetings": [{
                        "meeting_days": ["Monday", "Wednesday"],
                        "start_time": format!("0000-01-01T{:02}:00:00-05:00", 8 + i % 10),
                        "end_time": format!("{:02}:15pm", 1 + i % 10),
                        "location": {"building": "ECSS", "room": "2.410"}
                    }]
                })
            })
            .collect();

        let mut courses = HashMap::new();
        courses.insert(
            "c-cs1337".to_string(),
            json!({"_id": "c-cs1337", "subject_prefix": "CS", "course_number": "1337", "catalog_year": "23"}),
        );

        Self {
            sections,
            courses,
            requests: AtomicUsize::new(0),
        }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for Campus {
    async fn get(&self, path: &str, params: &QueryParams) -> Result<Payload> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if let Some(id) = path.strip_prefix("course/") {
            return Ok(match self.courses.get(id) {
                Some(course) => Payload::Documents(course.clone()),
                None => Payload::NoDocuments,
            });
        }
        if path != "section" {
            return Err(AppError::transport(path, "unknown endpoint"));
        }

        let offset: usize = params
            .get("offset")
            .and_then(|o| o.parse().ok())
            .unwrap_or(0);
        if offset >= self.sections.len() {
            return Ok(Payload::NoDocuments);
        }
        let end = (offset + 20).min(self.sections.len());
        Ok(Payload::Documents(Value::Array(
            self.sections[offset..end].to_vec(),
        )))
    }
}

fn engine(campus: &Arc<Campus>) -> QueryEngine {
    QueryEngine::new(
        campus.clone(),
        Arc::new(ResponseCache::new()),
        &ApiConfig::default(),
    )
}

#[tokio::test]
async fn test_query_is_exhaustive_and_cached() {
    let campus = Arc::new(Campus::new(45));
    let mut engine = engine(&campus);

    let first = engine
        .run_query_args(&["session=23F"], &mut NoProgress)
        .await
        .unwrap()
        .sections
        .clone();
    assert_eq!(first.len(), 45);
    // offsets 0, 20, 40 and the sentinel at 60
    assert_eq!(campus.requests(), 4);

    let second = engine
        .run_query_args(&["session=23F"], &mut NoProgress)
        .await
        .unwrap();
    assert_eq!(second.sections, first);
    assert_eq!(campus.requests(), 4);
    assert_eq!(engine.network_requests(), 4);
}

#[tokio::test]
async fn test_schedule_labels_and_order() {
    let campus = Arc::new(Campus::new(4));
    let mut engine = engine(&campus);
    let result = engine
        .run_query_args(&["meetingDays=Monday"], &mut NoProgress)
        .await
        .unwrap()
        .clone();

    let agenda = engine
        .composer()
        .compose(&result.sections, &["Monday"])
        .await;

    let labels: Vec<_> = agenda.entries().map(|e| e.label.clone()).collect();
    assert_eq!(
        labels,
        vec![
            "CS 1337.001".to_string(),
            format!("{UNKNOWN_COURSE}.002"),
            "CS 1337.003".to_string(),
            format!("{UNKNOWN_COURSE}.004"),
        ]
    );
    let starts: Vec<_> = agenda.entries().map(|e| e.start).collect();
    assert!(starts.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_shell_session_exports_and_persists() {
    let tmp = TempDir::new().unwrap();
    let campus = Arc::new(Campus::new(21));
    let storage = Arc::new(LocalStorage::with_dirs(
        tmp.path().join("out"),
        tmp.path().join("cache"),
    ));

    let mut config = Config::default();
    config.logging.show_progress = false;
    let mut shell = Shell::new(engine(&campus), storage.clone(), &config);

    assert_eq!(
        shell.dispatch("query building=ECSS room=2.410").await,
        CommandOutcome::Continue
    );
    assert_eq!(shell.dispatch("schedule").await, CommandOutcome::Continue);
    assert_eq!(shell.dispatch("export").await, CommandOutcome::Continue);
    assert!(matches!(
        shell.dispatch("query building").await,
        CommandOutcome::Error(_)
    ));

    let exported = storage
        .load_export(&tmp.path().join("out").join("ECSS_2-410.json"))
        .await
        .unwrap();
    assert_eq!(exported.len(), 21);
    assert_eq!(exported[0].extra["instruction_mode"], "face-to-face");

    shell
        .run_with(&b"exit\n"[..], false, std::future::pending::<std::io::Result<()>>)
        .await
        .unwrap();
    let snapshot = storage
        .load_cache_snapshot(&storage.snapshot_path())
        .await
        .unwrap();

    // A fresh session seeded from the snapshot answers without the network.
    let cache = Arc::new(ResponseCache::new());
    let restored = cache.restore(snapshot);
    assert!(restored >= 3);
    assert_eq!(restored, cache.len());
    let offline = Arc::new(Campus::new(0));
    let mut engine = QueryEngine::new(offline.clone(), cache, &ApiConfig::default());
    let replay = engine
        .run_query_args(&["room=2.410", "building=ECSS"], &mut NoProgress)
        .await
        .unwrap();
    assert_eq!(replay.sections, exported);
    assert_eq!(offline.requests(), 0);
}
