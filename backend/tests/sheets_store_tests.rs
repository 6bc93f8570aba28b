// tests/sheets_store_tests.rs

use std::collections::HashMap;
use std::io::Write;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use quiz_backend::{
    config::SheetsConfig,
    error::StoreError,
    models::{
        question::Category,
        result_record::{ROW_HEADERS, ResultRecord},
    },
    store::{ResultsAdapter, ResultsStore, SheetsResultsStore},
};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use url::Url;

const TEST_KEY_PEM: &str = include_str!("fixtures/test_service_account_key.pem");
const ACCESS_TOKEN: &str = "test-access-token";

/// In-process stand-in for the Google token endpoint and Sheets values API.
#[derive(Clone)]
struct FakeGoogle {
    rows: Arc<Mutex<Vec<Vec<Value>>>>,
    token_requests: Arc<AtomicUsize>,
    append_params: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn issue_token(
    State(google): State<FakeGoogle>,
    body: String,
) -> impl IntoResponse {
    google.token_requests.fetch_add(1, Ordering::SeqCst);
    if !body.contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer")
        || !body.contains("assertion=")
    {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3600,
            "token_type": "Bearer"
        })),
    )
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", ACCESS_TOKEN))
        .unwrap_or(false)
}

async fn append_values(
    State(google): State<FakeGoogle>,
    Path((_id, range)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
    }
    if !range.ends_with(":append") {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "unknown method"})));
    }
    let raw = params.get("valueInputOption").map(String::as_str) == Some("RAW");
    google.append_params.lock().await.push(params);

    let mut rows = google.rows.lock().await;
    if let Some(values) = body["values"].as_array() {
        for row in values {
            let cells = row.as_array().cloned().unwrap_or_default();
            let stored = if raw {
                cells
            } else {
                cells.into_iter().map(user_entered).collect()
            };
            rows.push(stored);
        }
    }
    (StatusCode::OK, Json(json!({"updates": {"updatedRows": 1}})))
}

/// How Sheets stores a text cell typed in by a user: numeric text becomes a
/// number, date-time text becomes a date serial, formulas are evaluated.
fn user_entered(cell: Value) -> Value {
    let Some(text) = cell.as_str() else {
        return cell;
    };
    if text.starts_with('=') {
        return json!("#NAME?");
    }
    if let Ok(number) = text.parse::<f64>() {
        return json!(number);
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        let epoch = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let millis = (naive - epoch).num_milliseconds() as f64;
        return json!(millis / 86_400_000.0);
    }
    cell
}

async fn get_values(
    State(google): State<FakeGoogle>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
    }
    let rows = google.rows.lock().await.clone();
    (StatusCode::OK, Json(json!({"range": "Sheet1!A1:K100", "values": rows})))
}

/// Spawns the fake API and returns it with its base URL.
async fn spawn_fake_google(initial_rows: Vec<Vec<Value>>) -> (FakeGoogle, String) {
    let google = FakeGoogle {
        rows: Arc::new(Mutex::new(initial_rows)),
        token_requests: Arc::new(AtomicUsize::new(0)),
        append_params: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/token", post(issue_token))
        .route(
            "/v4/spreadsheets/{id}/values/{range}",
            get(get_values).post(append_values),
        )
        .with_state(google.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (google, address)
}

fn header_row() -> Vec<Value> {
    ROW_HEADERS.iter().map(|h| Value::from(*h)).collect()
}

/// Writes a service-account key file pointing at the fake token endpoint.
fn store_for(address: &str, key_file: &tempfile::NamedTempFile) -> SheetsResultsStore {
    let config = SheetsConfig {
        spreadsheet_id: "test-sheet".to_string(),
        range: "Sheet1".to_string(),
        api_base: Url::parse(&format!("{}/v4/", address)).unwrap(),
        credentials_path: key_file.path().to_path_buf(),
    };
    SheetsResultsStore::new(&config).expect("Failed to build sheets store")
}

fn key_file(address: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let key = json!({
        "type": "service_account",
        "client_email": "quiz-writer@test-project.iam.gserviceaccount.com",
        "private_key": TEST_KEY_PEM,
        "token_uri": format!("{}/token", address),
    });
    write!(file, "{}", key).unwrap();
    file
}

fn record(name: &str, raw_score: u32, accuracy: f64) -> ResultRecord {
    ResultRecord {
        candidate_name: name.to_string(),
        raw_score,
        accuracy_percent: accuracy,
        elapsed_seconds: 120,
        debug: 2,
        tracing: 1,
        concept: 0,
        ds: 0,
        xp: raw_score as f64 + accuracy,
        achieved_skills: vec![Category::Tracing, Category::Debug],
        completed_at: Utc::now(),
    }
}

#[tokio::test]
async fn append_and_read_back_through_sheet() {
    // Arrange
    let (google, address) = spawn_fake_google(vec![header_row()]).await;
    let key = key_file(&address);
    let store = store_for(&address, &key);

    let ada = record("Ada", 90, 11.54);

    // Act
    store.append(&ada).await.unwrap();
    store.append(&record("007", 30, 3.85)).await.unwrap();
    store.append(&record("=HYPERLINK(\"x\")", 10, 1.0)).await.unwrap();
    let records = store.read_all().await.unwrap();

    // Assert
    let names: Vec<_> = records.iter().map(|r| r.candidate_name.as_str()).collect();
    assert_eq!(names, vec!["Ada", "007", "=HYPERLINK(\"x\")"]);
    assert_eq!(records[0].raw_score, 90);
    assert_eq!(records[0].achieved_skills, vec![Category::Tracing, Category::Debug]);
    assert_eq!(records[0].timestamp_text(), ada.timestamp_text());

    let rows = google.rows.lock().await;
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1].len(), ROW_HEADERS.len());
    assert_eq!(rows[1][9], "Tracing,Debug");
    assert_eq!(rows[2][0], "007");

    let params = google.append_params.lock().await;
    assert!(
        params
            .iter()
            .all(|p| p.get("valueInputOption").map(String::as_str) == Some("RAW"))
    );

    // One token exchange serves every call while it is valid
    assert_eq!(google.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn legacy_ten_column_rows_are_skipped() {
    let mut legacy = record("Old", 30, 3.85).to_row();
    legacy.remove(9);
    let current = record("New", 60, 7.69).to_row();
    let (_google, address) = spawn_fake_google(vec![header_row(), legacy, current]).await;
    let key = key_file(&address);
    let store = store_for(&address, &key);

    let records = store.read_all().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].candidate_name, "New");
}

#[tokio::test]
async fn rejected_token_exchange_is_fail_soft_behind_adapter() {
    let (_google, address) = spawn_fake_google(vec![header_row()]).await;
    let mut key = tempfile::NamedTempFile::new().unwrap();
    write!(
        key,
        "{}",
        json!({
            "client_email": "quiz-writer@test-project.iam.gserviceaccount.com",
            "private_key": TEST_KEY_PEM,
            "token_uri": format!("{}/no-such-token-endpoint", address),
        })
    )
    .unwrap();
    let store = store_for(&address, &key);

    match store.read_all().await {
        Err(StoreError::Remote { status, .. }) => assert_eq!(status, 404),
        other => panic!("unexpected result: {:?}", other.map(|r| r.len())),
    }

    let adapter = ResultsAdapter::new(Arc::new(store));
    assert!(!adapter.append(&record("Ada", 30, 3.85)).await);
    assert!(adapter.leaderboard(5).await.is_empty());
}
