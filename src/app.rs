use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use handlebars::Handlebars;
use log::{error, info};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;

use crate::align::ChartData;
use crate::chart::{self, ChartOptions, RenderError};
use crate::config::Config;
use crate::export;
use crate::page::{self, PageView};
use crate::saving;
use crate::series::Dataset;
use crate::session::{ChartSession, UploadedFile};

/// Multipart field carrying a session snapshot on restore
const SESSION_FIELD: &str = "session";

/// Name given to uploads that arrive without a file name
const UNNAMED_UPLOAD: &str = "upload.csv";

pub struct AppState {
    session: Mutex<ChartSession>,
    config: Config,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: Mutex::new(ChartSession::new()),
            config,
            templates: page::registry()?,
        })
    }

    // A panic while holding the lock leaves the datasets intact, so keep serving
    fn session(&self) -> MutexGuard<'_, ChartSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            width: self.config.chart_width,
            height: self.config.chart_height,
            ..ChartOptions::default()
        }
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    status: String,
    loaded: Vec<String>,
    errors: Vec<String>,
}

#[derive(Serialize)]
struct SeriesResponse {
    label: String,
    file_label: String,
    border_color: String,
    background_color: String,
    data: Vec<Option<f64>>,
    original_data: Vec<Option<f64>>,
    tooltips: Vec<String>,
}

#[derive(Serialize)]
struct ChartResponse {
    labels: Vec<String>,
    datasets: Vec<SeriesResponse>,
}

impl From<&ChartData> for ChartResponse {
    fn from(data: &ChartData) -> Self {
        let datasets = data
            .series
            .iter()
            .map(|s| SeriesResponse {
                label: s.label.clone(),
                file_label: s.file_label.clone(),
                border_color: s.border_color.clone(),
                background_color: s.background_color.clone(),
                data: s.normalized.clone(),
                original_data: s.original.clone(),
                tooltips: (0..s.original.len())
                    .map(|i| chart::tooltip_text(s, i))
                    .collect(),
            })
            .collect();

        Self {
            labels: data.label_strings(),
            datasets,
        }
    }
}

/// JSON error body returned by every failing endpoint
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(message: impl ToString) -> Self {
        let message = message.to_string();
        error!("{}", message);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = StatusResponse {
            status: "error".to_string(),
            message: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

// Keeps the status multer picked, e.g. 413 once the body limit is hit mid-stream
fn multipart_err(e: MultipartError) -> ApiError {
    ApiError::new(e.status(), e.body_text())
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::EmptyChart => ApiError::new(StatusCode::NOT_FOUND, e.to_string()),
            other => ApiError::internal(other),
        }
    }
}

/// Builds the application router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(serve_page))
        .route("/upload", post(upload_form))
        .route("/clear", post(clear_form))
        .route("/api/upload", post(upload_api))
        .route("/api/clear", post(clear_api))
        .route("/api/datasets", get(get_datasets))
        .route("/api/chart", get(get_chart_data))
        .route("/chart.svg", get(get_chart_svg))
        .route("/chart.png", get(get_chart_png))
        .route("/export/aligned.csv", get(export_csv))
        .route("/export/aligned.xlsx", get(export_xlsx))
        .route("/session", get(download_session).post(restore_session))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit))
        .with_state(state)
}

/// Starts the web server and blocks until it stops
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.bind_addr;
    let app_state = Arc::new(AppState::new(config)?);
    let app = router(app_state);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let session = state.session();

    let chart_error = if session.is_empty() {
        None
    } else {
        session.chart_data(&state.config).err().map(|e| e.to_string())
    };

    let view = PageView::from_session(&session, chart_error);
    let html = page::render_page(&state.templates, &view).map_err(ApiError::internal)?;
    Ok(Html(html))
}

// Reads every file field of the form; field names are not significant
async fn read_uploads(mut multipart: Multipart) -> Result<Vec<UploadedFile>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        let name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            Some(_) => continue,
            None => UNNAMED_UPLOAD.to_string(),
        };
        let contents = field.bytes().await.map_err(multipart_err)?;
        files.push(UploadedFile::new(name, contents.to_vec()));
    }

    Ok(files)
}

fn ingest(state: &AppState, files: &[UploadedFile]) -> UploadResponse {
    let mut session = state.session();
    let mut loaded = Vec::new();
    let mut errors = Vec::new();

    for result in session.add_files(files) {
        match result {
            Ok(label) => loaded.push(label),
            Err(e) => errors.push(e.to_string()),
        }
    }

    let status = if errors.is_empty() { "ok" } else { "error" };
    UploadResponse {
        status: status.to_string(),
        loaded,
        errors,
    }
}

async fn upload_form(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let files = read_uploads(multipart).await?;
    ingest(&state, &files);
    Ok(Redirect::to("/"))
}

async fn upload_api(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let files = read_uploads(multipart).await?;
    if files.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "No file data received"));
    }
    Ok(Json(ingest(&state, &files)))
}

async fn clear_form(State(state): State<Arc<AppState>>) -> Redirect {
    state.session().clear();
    Redirect::to("/")
}

async fn clear_api(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    state.session().clear();
    Json(StatusResponse {
        status: "ok".to_string(),
        message: None,
    })
}

async fn get_datasets(State(state): State<Arc<AppState>>) -> Json<Vec<Dataset>> {
    Json(state.session().datasets().to_vec())
}

fn current_chart(state: &AppState) -> Result<ChartData, ApiError> {
    state
        .session()
        .chart_data(&state.config)
        .map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
}

async fn get_chart_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChartResponse>, ApiError> {
    let data = current_chart(&state)?;
    Ok(Json(ChartResponse::from(&data)))
}

async fn get_chart_svg(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let data = current_chart(&state)?;
    let svg = chart::render_svg(&data, &state.chart_options())?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

async fn get_chart_png(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let data = current_chart(&state)?;
    let png = chart::render_png(&data, &state.chart_options())?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

fn attachment(content_type: &'static str, filename: &str, body: impl Into<Body>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(body.into())
        .unwrap_or_else(|e| ApiError::internal(e).into_response())
}

async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let data = current_chart(&state)?;
    let csv = export::aligned_csv(&data).map_err(ApiError::internal)?;
    Ok(attachment("text/csv; charset=utf-8", "aligned.csv", csv))
}

async fn export_xlsx(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let data = current_chart(&state)?;
    let xlsx = export::aligned_xlsx(&data).map_err(ApiError::internal)?;
    Ok(attachment(
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "aligned.xlsx",
        xlsx,
    ))
}

async fn download_session(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let bytes = saving::to_bytes(&state.session()).map_err(ApiError::internal)?;
    Ok(attachment("application/gzip", "session.bin.gz", bytes))
}

async fn restore_session(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<StatusResponse>, ApiError> {
    let mut file_data = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        if field.name() == Some(SESSION_FIELD) {
            file_data = field.bytes().await.map_err(multipart_err)?.to_vec();
        }
    }

    if file_data.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "No file data received"));
    }

    let restored = saving::from_bytes(&file_data).map_err(|e| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Failed to load session: {}", e),
        )
    })?;

    state.session().restore(restored.into_datasets());

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
        message: None,
    }))
}
