//! # energyboard-server
//!
//! Read-only HTTP API over the energyboard dataset registry.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use energyboard_core::{
    AverageTable, DatasetRegistry, EnergyError, Grouping, Period, PipelineConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Health check response.
#[derive(Serialize, Deserialize)]
pub struct Health {
    /// Server status ("ok" when healthy).
    pub status: String,
    /// Server version from Cargo.toml.
    pub version: String,
    /// Number of published tables.
    pub tables: usize,
}

/// JSON body of every error response.
#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error returned by handlers.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<EnergyError> for ApiError {
    fn from(err: EnergyError) -> Self {
        let status = match err {
            EnergyError::UnknownKey { .. } => StatusCode::NOT_FOUND,
            EnergyError::Config(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

type AppState = Arc<DatasetRegistry>;

/// Health check endpoint handler.
pub async fn health(State(registry): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tables: registry.keys().len(),
    })
}

/// Rows of one published table as `column -> value` records.
async fn table(
    State(registry): State<AppState>,
    Path((fuel, metric, grouping)): Path<(String, String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let table = registry.get_table_str(&fuel, &metric, &grouping)?;
    Ok(Json(serde_json::json!({
        "fuel": fuel,
        "metric": table.metric(),
        "grouping": table.grouping(),
        "unit": table.unit(),
        "columns": table.column_labels(),
        "rows": table.to_records(),
    })))
}

async fn offices(State(registry): State<AppState>) -> Json<Vec<String>> {
    Json(registry.list_offices().to_vec())
}

async fn properties(State(registry): State<AppState>) -> Json<Vec<String>> {
    Json(registry.list_properties().to_vec())
}

#[derive(Debug, Default, Deserialize)]
struct AveragesQuery {
    /// Comma-separated `<month>_<year>` labels.
    periods: Option<String>,
}

async fn averages(
    State(registry): State<AppState>,
    Path((grouping, entity)): Path<(String, String)>,
    Query(query): Query<AveragesQuery>,
) -> Result<Json<AverageTable>, ApiError> {
    let grouping: Grouping = grouping
        .parse()
        .map_err(|e: energyboard_core::ParseKeyError| ApiError::not_found(e.to_string()))?;
    let periods = query
        .periods
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(|label| label.parse::<Period>().map_err(ApiError::bad_request))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(registry.averages(grouping, &entity, &periods)?))
}

/// Create the application router.
///
/// This is separated from `main()` to allow testing.
pub fn create_router(registry: Arc<DatasetRegistry>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tables/:fuel/:metric/:grouping", get(table))
        .route("/offices", get(offices))
        .route("/properties", get(properties))
        .route("/averages/:grouping/:entity", get(averages))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

fn load_config() -> Result<PipelineConfig, EnergyError> {
    match std::env::var("ENERGYBOARD_CONFIG") {
        Ok(path) => PipelineConfig::from_yaml_file(path),
        Err(_) => Ok(PipelineConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let registry = Arc::new(DatasetRegistry::build(&config)?);
    let app = create_router(registry);

    let addr = std::env::var("ENERGYBOARD_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    info!(%addr, "energyboard-server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use energyboard_core::{EntityDirectory, Fuel, FuelSource, Workbook};
    use energyboard_sheet::{Book, CellValue, Sheet};
    use tower::ServiceExt;

    fn workbook(name: &str, unit: &str, rows: &[(&str, f64, f64)]) -> Workbook {
        let mut data = vec![vec![
            CellValue::from("Property Name"),
            CellValue::from(unit),
            CellValue::from("Total Amount"),
        ]];
        for (property, qty, amount) in rows {
            data.push(vec![
                CellValue::from(*property),
                CellValue::Float(*qty),
                CellValue::Float(*amount),
            ]);
        }
        let mut sheet = Sheet::from_data(data);
        sheet.name_columns_by_row(0).unwrap();
        let mut book = Book::new();
        book.add_sheet("2023-Jan", sheet).unwrap();
        Workbook::from_book(name, book).unwrap()
    }

    fn app() -> Router {
        let directory = EntityDirectory::from_pairs([
            ("Main St", Some("Assessor")),
            ("Annex", Some("Clerk")),
        ]);
        let registry = DatasetRegistry::from_sources(
            &directory,
            vec![
                FuelSource::new(
                    Fuel::Electricity,
                    vec![workbook(
                        "originalElectricity2023",
                        "kWh",
                        &[("Main St", 100.0, 12.0), ("Annex", 40.0, 5.0)],
                    )],
                ),
                FuelSource::new(
                    Fuel::Gas,
                    vec![workbook("originalGas2023", "therms", &[("Annex", 8.0, 9.0)])],
                ),
            ],
        )
        .unwrap();
        create_router(Arc::new(registry))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, body) = get_json(app(), "/health").await;
        assert_eq!(status, StatusCode::OK);

        let health: Health = serde_json::from_value(body).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(health.tables, 8);
    }

    #[tokio::test]
    async fn test_health_on_empty_registry() {
        let app = create_router(Arc::new(DatasetRegistry::default()));
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tables"], 0);
    }

    #[tokio::test]
    async fn test_table_endpoint() {
        let (status, body) = get_json(app(), "/tables/electricity/usage/Office").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unit"], "kWh");
        assert_eq!(body["grouping"], "Office");
        assert_eq!(body["columns"], serde_json::json!(["Jan_2023"]));
        assert_eq!(body["rows"][0]["Office"], "assessor");
        assert_eq!(body["rows"][0]["Jan_2023"], 100.0);
        assert_eq!(body["rows"][1]["Jan_2023"], 40.0);
    }

    #[tokio::test]
    async fn test_table_endpoint_spending_by_property() {
        let (status, body) = get_json(app(), "/tables/gas/spending/Property_Name").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unit"], "$");
        assert_eq!(body["rows"][0]["Property_Name"], "annex");
        assert_eq!(body["rows"][0]["Jan_2023"], 9.0);
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let (status, body) = get_json(app(), "/tables/water/usage/Office").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("water"));
    }

    #[tokio::test]
    async fn test_empty_registry_table_is_not_found() {
        let app = create_router(Arc::new(DatasetRegistry::default()));
        let (status, _) = get_json(app, "/tables/electricity/usage/Office").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_entity_lists() {
        let (_, offices) = get_json(app(), "/offices").await;
        assert_eq!(offices, serde_json::json!(["assessor", "clerk"]));

        let (_, properties) = get_json(app(), "/properties").await;
        assert_eq!(properties, serde_json::json!(["annex", "main_st"]));
    }

    #[tokio::test]
    async fn test_averages_endpoint() {
        let (status, body) = get_json(app(), "/averages/Office/clerk?periods=Jan_2023").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entity"], "clerk");
        assert_eq!(body["rows"][0]["period"]["month"], "Jan");
        assert_eq!(body["mean"]["electricity_usage"], 40.0);
        assert_eq!(body["mean"]["gas_spending"], 9.0);
    }

    #[tokio::test]
    async fn test_averages_bad_period() {
        let (status, body) = get_json(app(), "/averages/Office/clerk?periods=January").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_averages_unknown_grouping() {
        let (status, _) = get_json(app(), "/averages/County/clerk").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_not_found() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
