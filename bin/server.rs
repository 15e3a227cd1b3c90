// Hunt Analyzer - Web Server
// REST API with Axum over the in-memory hunt snapshot

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use hunt_analyzer::db::{self, event_types, HUNT_ENTITY};
use hunt_analyzer::library::{find_record, load_hunt_file, resolve_hunt_path};
use hunt_analyzer::{
    aggregate_by_zone, coerce_consistency, find_issues, find_pending, import_from_source,
    load_library, write_meta, AggregatedZone, AppConfig, Event, FilterOptions, HuntRecord,
    ImportSummary, IssueKind, LibraryStats, MetaUpdate, PendingRow, ZoneFilter,
};
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    records: Arc<RwLock<Vec<HuntRecord>>>,
    library: Arc<PathBuf>,
    source_folder: Option<Arc<PathBuf>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        data: None,
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

fn poisoned() -> Response {
    log::error!("Shared state lock poisoned");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Server state unavailable")
}

#[derive(Serialize)]
struct IssueResponse {
    kind: IssueKind,
    key: &'static str,
    message: &'static str,
}

impl From<IssueKind> for IssueResponse {
    fn from(kind: IssueKind) -> Self {
        Self {
            kind,
            key: kind.key(),
            message: kind.message(),
        }
    }
}

/// Pending row with readable issue messages
#[derive(Serialize)]
struct PendingResponse {
    #[serde(flatten)]
    row: PendingRow,
    messages: Vec<IssueResponse>,
}

#[derive(Serialize)]
struct FiltersResponse {
    #[serde(flatten)]
    options: FilterOptions,
    level_choices: Vec<String>,
}

#[derive(Serialize)]
struct HuntResponse {
    record: HuntRecord,
    issues: Vec<IssueResponse>,
    history: Vec<Event>,
}

#[derive(Serialize)]
struct RefreshResponse {
    import: Option<ImportSummary>,
    hunts: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/zones?vocation=&mode=&level= - Per-zone statistics
async fn get_zones(State(state): State<AppState>, Query(filter): Query<ZoneFilter>) -> Response {
    let Ok(records) = state.records.read() else {
        return poisoned();
    };
    let zones: Vec<AggregatedZone> = aggregate_by_zone(&records, &filter);
    ok(zones)
}

/// GET /api/pending - Hunts that need metadata
async fn get_pending(State(state): State<AppState>) -> Response {
    let Ok(records) = state.records.read() else {
        return poisoned();
    };
    let rows: Vec<PendingResponse> = find_pending(&records)
        .into_iter()
        .map(|row| PendingResponse {
            messages: row.issues.iter().copied().map(IssueResponse::from).collect(),
            row,
        })
        .collect();
    ok(rows)
}

/// GET /api/filters - Filter values present in complete hunts
async fn get_filters(State(state): State<AppState>) -> Response {
    let Ok(records) = state.records.read() else {
        return poisoned();
    };
    let options = FilterOptions::from_records(&records);
    ok(FiltersResponse {
        level_choices: options.level_choices(),
        options,
    })
}

/// GET /api/stats - Library totals
async fn get_stats(State(state): State<AppState>) -> Response {
    let Ok(records) = state.records.read() else {
        return poisoned();
    };
    ok(LibraryStats::from_records(&records))
}

/// GET /api/hunts/:file - One hunt with issues and history.
/// `Path` has already percent-decoded the file name.
async fn get_hunt(State(state): State<AppState>, Path(file): Path<String>) -> Response {

    let record = {
        let Ok(records) = state.records.read() else {
            return poisoned();
        };
        match find_record(&records, &file) {
            Some(record) => record.clone(),
            None => return error_response(StatusCode::NOT_FOUND, format!("No hunt {}", file)),
        }
    };

    let history = {
        let Ok(conn) = state.db.lock() else {
            return poisoned();
        };
        match db::get_events_for_entity(&conn, HUNT_ENTITY, record.file_name()) {
            Ok(events) => events,
            Err(e) => {
                log::error!("Error reading history for {}: {:#}", file, e);
                Vec::new()
            }
        }
    };

    ok(HuntResponse {
        issues: find_issues(&record).into_iter().map(IssueResponse::from).collect(),
        record,
        history,
    })
}

/// POST /api/hunts/:file/meta - Apply a metadata update
async fn update_hunt_meta(
    State(state): State<AppState>,
    Path(file): Path<String>,
    Json(update): Json<MetaUpdate>,
) -> Response {
    if update.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Empty update");
    }

    let path = match resolve_hunt_path(&state.library, &file) {
        Ok(path) => path,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    // Holding the db lock serializes writers
    let Ok(conn) = state.db.lock() else {
        return poisoned();
    };

    let current = match load_hunt_file(&path) {
        Ok(record) => record,
        Err(e) => return error_response(StatusCode::NOT_FOUND, format!("{:#}", e)),
    };

    let coerced = coerce_consistency(&update, Some(&current));
    if let Err(e) = write_meta(&path, &coerced) {
        log::error!("Metadata write failed: {}", e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    let event = Event::new(
        event_types::META_UPDATED,
        HUNT_ENTITY,
        &file,
        coerced.to_json(),
        "web",
    );
    if let Err(e) = db::insert_event(&conn, &event) {
        log::warn!("Event not recorded for {}: {:#}", file, e);
    }
    drop(conn);

    let updated = match load_hunt_file(&path) {
        Ok(record) => record,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)),
    };

    {
        let Ok(mut records) = state.records.write() else {
            return poisoned();
        };
        match records.iter_mut().find(|r| r.source_id == updated.source_id) {
            Some(slot) => *slot = updated.clone(),
            None => records.push(updated.clone()),
        }
    }

    ok(HuntResponse {
        issues: find_issues(&updated).into_iter().map(IssueResponse::from).collect(),
        record: updated,
        history: Vec::new(),
    })
}

/// POST /api/refresh - Import from the source folder (if configured) and reload
async fn refresh(State(state): State<AppState>) -> Response {
    let import = match &state.source_folder {
        Some(source) => {
            let Ok(conn) = state.db.lock() else {
                return poisoned();
            };
            match import_from_source(source, &state.library, &conn) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    log::error!("Import failed: {:#}", e);
                    return error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e));
                }
            }
        }
        None => None,
    };

    let fresh = load_library(&state.library);
    let hunts = fresh.len();
    let Ok(mut records) = state.records.write() else {
        return poisoned();
    };
    *records = fresh;

    ok(RefreshResponse { import, hunts })
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("🌐 Hunt Analyzer - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = AppConfig::load();
    let paths = config.paths();
    paths.ensure()?;

    let conn = db::open_database(&paths.db)?;
    println!("✓ Database opened: {:?}", paths.db);

    let records = load_library(&paths.library);
    println!("✓ Loaded {} hunts from {:?}", records.len(), paths.library);

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        records: Arc::new(RwLock::new(records)),
        library: Arc::new(paths.library.clone()),
        source_folder: config.source_folder.clone().map(Arc::new),
    };

    let app = build_app(state);

    // Start server
    let addr = std::env::var("HUNT_SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/zones", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_app(state: AppState) -> Router {
    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/zones", get(get_zones))
        .route("/pending", get(get_pending))
        .route("/filters", get(get_filters))
        .route("/stats", get(get_stats))
        .route("/hunts/:file", get(get_hunt))
        .route("/hunts/:file/meta", post(update_hunt_meta))
        .route("/refresh", post(refresh))
        .with_state(state);

    // Build main router
    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hunt_analyzer::normalize;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn state_with(records: Vec<HuntRecord>) -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        AppState {
            db: Arc::new(Mutex::new(conn)),
            records: Arc::new(RwLock::new(records)),
            library: Arc::new(PathBuf::from("json")),
            source_folder: None,
        }
    }

    /// Serve `app` on a local port and return the raw HTTP response to `GET path`
    async fn get_raw(app: Router, path: &str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    fn hunt(file: &str) -> HuntRecord {
        let raw = json!({
            "Vocation": "Knight", "Mode": "Solo", "Vocation duo": "none",
            "Zona": "Issavi", "Level": "301-350", "Session length": "1:00h"
        });
        normalize(file, raw.as_object().unwrap())
    }

    #[tokio::test]
    async fn test_hunt_name_with_literal_percent() {
        let app = build_app(state_with(vec![hunt("a%2520.json")]));

        // "%25" on the wire is one literal '%' in the file name
        let response = get_raw(app.clone(), "/api/hunts/a%252520.json").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
        assert!(response.contains("a%2520.json"));

        let response = get_raw(app, "/api/hunts/a%2520.json").await;
        assert!(response.starts_with("HTTP/1.1 404"), "{}", response);
    }

    #[tokio::test]
    async fn test_health() {
        let response = get_raw(build_app(state_with(Vec::new())), "/api/health").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"success\":true"));
    }
}
