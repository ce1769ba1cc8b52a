//! REST API for the packing service.
//!
//! Exposes the engine over HTTP. Uses Axum as the web framework, allows
//! cross-origin requests and traces every request.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig};
use crate::layers::LayerCandidate;
use crate::model::{Container, Item, PackedItem, UnpackedItem, ValidationError};
use crate::optimizer::{
    PackingResult, PackingSummary, pack_items_with_config, pack_items_with_progress,
};
use crate::orientation::Orientation;

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes for swagger-ui-dist@5.17.14.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>afit_packer API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// The container as sent by clients. The id is optional.
#[derive(Deserialize, Clone, ToSchema)]
pub struct ContainerRequest {
    #[serde(default)]
    #[schema(nullable = true)]
    pub id: Option<usize>,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerRequest {
    fn into_container(self) -> Result<Container, ValidationError> {
        Container::new(self.id.unwrap_or_default(), self.length, self.width, self.height)
    }
}

/// Request structure for the packing endpoints.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "container": { "id": 1, "length": 587.0, "width": 233.0, "height": 220.0 },
        "items": [
            { "id": 1, "dim1": 108.0, "dim2": 76.0, "dim3": 30.0, "quantity": 40 },
            { "id": 2, "dim1": 110.0, "dim2": 43.0, "dim3": 25.0, "quantity": 33 }
        ]
    })
)]
pub struct PackRequest {
    pub container: ContainerRequest,
    pub items: Vec<Item>,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    container: Container,
    items: Vec<Item>,
}

impl ValidatedPackRequest {
    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn unit_count(&self) -> usize {
        self.items
            .iter()
            .fold(0usize, |acc, item| acc.saturating_add(item.quantity))
    }

    fn into_parts(self) -> (Container, Vec<Item>) {
        (self.container, self.items)
    }
}

#[derive(Debug)]
enum PackRequestValidationError {
    InvalidContainer(ValidationError),
    InvalidItem(ValidationError),
    TooManyUnits(ValidationError),
}

impl PackRequest {
    fn into_validated(self, max_units: usize) -> Result<ValidatedPackRequest, PackRequestValidationError> {
        let container = self
            .container
            .into_container()
            .map_err(PackRequestValidationError::InvalidContainer)?;

        for item in &self.items {
            item.validate()
                .map_err(PackRequestValidationError::InvalidItem)?;
        }

        let validated = ValidatedPackRequest {
            container,
            items: self.items,
        };
        let requested = validated.unit_count();
        if requested > max_units {
            return Err(PackRequestValidationError::TooManyUnits(
                ValidationError::TooManyUnits {
                    requested,
                    limit: max_units,
                },
            ));
        }
        Ok(validated)
    }
}

/// Response structure of the packing endpoint.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    /// Placed units in placement order, in (length, height, width) axes
    pub packed: Vec<PackedItem>,
    pub unpacked: Vec<UnpackedItem>,
    pub is_complete: bool,
    pub summary: PackingSummary,
}

impl PackResponse {
    /// Creates a PackResponse from a PackingResult.
    pub fn from_packing_result(result: PackingResult) -> Self {
        let is_complete = result.is_complete();
        let PackingResult {
            packed,
            unpacked,
            summary,
        } = result;

        Self {
            packed,
            unpacked,
            is_complete,
            summary,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn container_config_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid container configuration",
        details,
    )
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
    max_units: usize,
) -> Result<ValidatedPackRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    match payload.into_validated(max_units) {
        Ok(validated) => Ok(validated),
        Err(PackRequestValidationError::InvalidContainer(err)) => {
            Err(container_config_error(err.to_string()))
        }
        Err(PackRequestValidationError::InvalidItem(err))
        | Err(PackRequestValidationError::TooManyUnits(err)) => {
            Err(validation_error(err.to_string()))
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream),
    components(
        schemas(
            PackRequest,
            ContainerRequest,
            Item,
            PackResponse,
            PackedItem,
            UnpackedItem,
            PackingSummary,
            LayerCandidate,
            Orientation,
            ErrorResponse
        )
    ),
    tags((name = "packing", description = "Endpoints for single-container packing"))
)]
struct ApiDoc;

/// Builds the service router with all routes and layers.
pub fn router(optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { optimizer_config };

    Router::new()
        // API endpoints
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Liveness
        .route("/up", get(handle_up))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Starts the API server on the configured address.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    optimizer_config: OptimizerConfig,
) -> std::io::Result<()> {
    let app = router(optimizer_config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        tracing::info!("Local access: http://localhost:{}", config.port());
    }
    tracing::info!("API endpoints: POST /pack, POST /pack_stream, GET /up");
    tracing::info!("Documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for POST /pack endpoint.
///
/// Packs the requested items into the container and returns placements,
/// leftovers and a summary.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Packing finished", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        ),
        (status = INTERNAL_SERVER_ERROR, description = "Packing task failed", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let packing_config = state.optimizer_config.packing_config();
    let request = match parse_pack_request(payload, packing_config.max_units) {
        Ok(request) => request,
        Err(response) => return response,
    };

    tracing::info!(
        items = request.item_count(),
        units = request.unit_count(),
        "new pack request"
    );
    let (container, items) = request.into_parts();

    let outcome = tokio::task::spawn_blocking(move || {
        pack_items_with_config(&container, &items, packing_config)
    })
    .await;

    match outcome {
        Ok(Ok(result)) => {
            tracing::info!(
                packed = result.packed_count(),
                unpacked = result.unpacked_count(),
                "pack request done"
            );
            let response = PackResponse::from_packing_result(result);
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(err)) => validation_error(err.to_string()),
        Err(err) => {
            tracing::error!(error = %err, "packing task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Packing failed",
                err.to_string(),
            )
        }
    }
}

/// Handler for POST /pack_stream endpoint (SSE).
///
/// Streams pack events in real-time as Server-Sent Events (text/event-stream),
/// one JSON event per message.
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams pack events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let packing_config = state.optimizer_config.packing_config();
    let request = match parse_pack_request(payload, packing_config.max_units) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (container, items) = request.into_parts();
    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        let outcome = pack_items_with_progress(&container, &items, packing_config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver means the client left; remaining events are dropped.
                let _ = tx.blocking_send(json);
            }
        });
        if let Err(err) = outcome {
            tracing::warn!(error = %err, "streamed packing rejected");
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

async fn handle_up() -> &'static str {
    "ok"
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::PackingConfig;
    use axum::http::header;

    fn state() -> ApiState {
        ApiState {
            optimizer_config: OptimizerConfig::from(PackingConfig::default()),
        }
    }

    fn cube_request(quantity: usize) -> PackRequest {
        PackRequest {
            container: ContainerRequest {
                id: None,
                length: 10.0,
                width: 10.0,
                height: 10.0,
            },
            items: vec![Item {
                id: 1,
                dim1: 5.0,
                dim2: 5.0,
                dim3: 5.0,
                quantity,
            }],
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Body should be readable");
        serde_json::from_slice(&bytes).expect("Body should be JSON")
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        assert!(
            paths.contains_key("/pack"),
            "OpenAPI documentation is missing the /pack path"
        );
        assert!(
            paths.contains_key("/pack_stream"),
            "OpenAPI documentation is missing the /pack_stream path"
        );
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        let schemas = &components.schemas;
        for name in ["PackRequest", "PackResponse", "PackingSummary", "ErrorResponse"] {
            assert!(
                schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI spec",
                name
            );
        }
    }

    #[test]
    fn pack_request_parses_without_container_id() {
        let json = r#"{
            "container": {"length": 587.0, "width": 233.0, "height": 220.0},
            "items": [{"id": 1, "dim1": 108.0, "dim2": 76.0, "dim3": 30.0, "quantity": 40}]
        }"#;
        let request: PackRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        assert_eq!(request.container.id, None);
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].quantity, 40);

        let validated = request
            .into_validated(PackingConfig::DEFAULT_MAX_UNITS)
            .expect("Should validate successfully");
        assert_eq!(validated.container.id, 0);
        assert_eq!(validated.unit_count(), 40);
    }

    #[test]
    fn pack_request_rejects_missing_items_field() {
        let json = r#"{"container": {"length": 1.0, "width": 1.0, "height": 1.0}}"#;
        assert!(serde_json::from_str::<PackRequest>(json).is_err());
    }

    #[test]
    fn validation_distinguishes_container_and_item_errors() {
        let mut request = cube_request(1);
        request.container.width = -1.0;
        assert!(matches!(
            request.into_validated(10),
            Err(PackRequestValidationError::InvalidContainer(_))
        ));

        let mut request = cube_request(1);
        request.items[0].dim2 = 0.0;
        assert!(matches!(
            request.into_validated(10),
            Err(PackRequestValidationError::InvalidItem(_))
        ));

        assert!(matches!(
            cube_request(11).into_validated(10),
            Err(PackRequestValidationError::TooManyUnits(_))
        ));
    }

    #[tokio::test]
    async fn pack_handler_returns_placements() {
        let response = handle_pack(State(state()), Ok(Json(cube_request(8)))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["packed"].as_array().map(Vec::len), Some(8));
        assert_eq!(body["unpacked"].as_array().map(Vec::len), Some(0));
        assert_eq!(body["is_complete"], serde_json::Value::Bool(true));
        assert_eq!(body["summary"]["best_variant"], json!(1));
    }

    #[tokio::test]
    async fn pack_handler_rejects_invalid_item() {
        let mut request = cube_request(1);
        request.items[0].quantity = 0;

        let response = handle_pack(State(state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], json!("Invalid input data"));
    }

    #[tokio::test]
    async fn pack_handler_rejects_invalid_container() {
        let mut request = cube_request(1);
        request.container.height = f64::NAN;

        let response = handle_pack(State(state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], json!("Invalid container configuration"));
    }

    #[tokio::test]
    async fn pack_stream_handler_responds_with_event_stream() {
        let response = handle_pack_stream(State(state()), Ok(Json(cube_request(2)))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("text/event-stream")
        );
    }

    #[tokio::test]
    async fn liveness_probe_answers_ok() {
        assert_eq!(handle_up().await, "ok");
    }
}
