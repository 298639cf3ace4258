//! HTTP route handlers.

use std::future::Future;
use std::path::Path;

use axum::extract::rejection::JsonRejection;
use axum::{
    Json, Router,
    extract::{Path as UrlPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::carrier::LABEL_PREFIX;
use crate::domain::{Booking, BookingId, BookingStatus, Quotation, QuotationId, QuotationStatus};
use crate::workflow::{BookingInput, QuotationFailure, QuoteInput, WorkflowError};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
///
/// `label_dir` is where the carrier client saves shipping labels.
pub fn create_router(state: AppState, label_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bookings/rates", post(request_rates))
        .route("/quotations", get(list_saved_quotations))
        .route("/quotations/:id", get(get_quotation))
        .route("/quotations/:id/status", put(update_quotation_status))
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/cancel", put(cancel_booking))
        .nest_service(
            &format!("/{LABEL_PREFIX}"),
            ServeDir::new(label_dir.as_ref()),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Run a workflow on its own task so a dropped connection cannot abort it
/// halfway through.
async fn detached<F>(work: F) -> Result<F::Output, AppError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(work).await.map_err(|e| AppError::Internal {
        message: format!("workflow task failed: {e}"),
    })
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest {
            message: rejection.body_text(),
        })
}

fn quotation_id(raw: &str) -> Result<QuotationId, AppError> {
    QuotationId::parse(raw).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })
}

fn booking_id(raw: &str) -> Result<BookingId, AppError> {
    raw.trim()
        .parse()
        .map(BookingId)
        .map_err(|_| AppError::BadRequest {
            message: format!("Invalid booking id: {raw}"),
        })
}

/// Validate a rate request, store it as a quotation and shop rates.
async fn request_rates(
    State(state): State<AppState>,
    payload: Result<Json<QuoteInput>, JsonRejection>,
) -> Result<Json<QuoteResponse>, AppError> {
    let input = body(payload)?;
    let workflow = state.quotations.clone();

    let outcome = detached(async move { workflow.request_rates(input).await }).await??;
    Ok(Json(outcome.into()))
}

/// Mark a quotation saved.
async fn update_quotation_status(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<Quotation>, AppError> {
    let id = quotation_id(&id)?;
    let request = body(payload)?;

    let status = QuotationStatus::parse(&request.status).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    if status != QuotationStatus::Saved {
        return Err(AppError::BadRequest {
            message: format!("Status can only be set to Saved, not {status}"),
        });
    }

    let workflow = state.quotations.clone();
    let quotation = detached(async move { workflow.save(id).await }).await??;
    Ok(Json(quotation))
}

/// List saved quotations.
async fn list_saved_quotations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Quotation>>, AppError> {
    Ok(Json(state.quotations.saved().await?))
}

/// Get a quotation in any status.
async fn get_quotation(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<Quotation>, AppError> {
    let id = quotation_id(&id)?;
    Ok(Json(state.quotations.get(id).await?))
}

/// Store a booking and create its carrier shipment.
async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<BookingInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let input = body(payload)?;
    let workflow = state.bookings.clone();

    let booking = detached(async move { workflow.confirm(input).await }).await??;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// List bookings, newest first.
async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(BookingStatus::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest {
            message: e.to_string(),
        })?;

    Ok(Json(state.bookings.list(status).await?))
}

/// Get a booking with its items.
async fn get_booking(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<Booking>, AppError> {
    let id = booking_id(&id)?;
    Ok(Json(state.bookings.get(id).await?))
}

/// Cancel a booking.
async fn cancel_booking(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<Booking>, AppError> {
    let id = booking_id(&id)?;
    let workflow = state.bookings.clone();

    let booking = detached(async move { workflow.cancel(id).await }).await??;
    Ok(Json(booking))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Internal { message: String },
    Workflow(WorkflowError),
    Quotation(QuotationFailure),
}

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        AppError::Workflow(e)
    }
}

impl From<QuotationFailure> for AppError {
    fn from(e: QuotationFailure) -> Self {
        AppError::Quotation(e)
    }
}

fn workflow_status(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
        WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        WorkflowError::Auth(_)
        | WorkflowError::RateFetch(_)
        | WorkflowError::ShipmentCreation { .. } => StatusCode::BAD_GATEWAY,
    }
}

/// Persistence details stay in the log.
fn workflow_body(err: &WorkflowError) -> ErrorResponse {
    let message = match err {
        WorkflowError::Persistence(_) => "internal storage error".to_string(),
        other => other.to_string(),
    };
    let mut body = ErrorResponse::new(err.kind(), message);
    if let WorkflowError::ShipmentCreation {
        booking_id,
        partial,
        ..
    } = err
    {
        body.booking_id = Some(*booking_id);
        if !partial.is_empty() {
            body.partial = Some(partial.clone());
        }
    }
    body
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body, detail) = match &self {
            AppError::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("validation", message.clone()),
                message.clone(),
            ),
            AppError::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("internal", "internal error"),
                message.clone(),
            ),
            AppError::Workflow(err) => (workflow_status(err), workflow_body(err), err.to_string()),
            AppError::Quotation(failure) => {
                let mut body = workflow_body(&failure.error);
                body.quotation_id = failure.quotation_id;
                body.stage = Some(failure.stage.to_string());
                (
                    workflow_status(&failure.error),
                    body,
                    failure.to_string(),
                )
            }
        };

        if status.is_server_error() {
            error!(%status, kind = body.kind, "{detail}");
        } else {
            warn!(%status, kind = body.kind, "{detail}");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use serde_json::{Value, json};

    use super::*;
    use crate::carrier::fixtures::shipper;
    use crate::carrier::{CarrierError, CarrierGateway, Credentials, MockCarrier};
    use crate::domain::{CustomerId, Money, PartialShipment};
    use crate::store::{
        SqliteAddressBook, SqliteBookingStore, SqliteCustomerDirectory, SqliteQuotationStore,
        test_pool,
    };
    use crate::workflow::{
        BookingStores, BookingWorkflow, CarrierAccount, QuotationStage, QuotationWorkflow,
    };

    async fn state(carrier: MockCarrier) -> (AppState, CustomerId) {
        let pool = test_pool().await;
        let gateway: Arc<dyn CarrierGateway> = Arc::new(carrier);
        let account = CarrierAccount {
            credentials: Credentials::new("client", "secret"),
            shipper: shipper(),
            carrier_name: "UPS".into(),
        };

        let customers = SqliteCustomerDirectory::new(pool.clone());
        let customer = customers.create("Asha Rao", None, None).await.unwrap();
        let quotations = Arc::new(SqliteQuotationStore::new(pool.clone()));
        let stores = BookingStores {
            bookings: Arc::new(SqliteBookingStore::new(pool.clone())),
            quotations: quotations.clone(),
            customers: Arc::new(customers),
            address_book: Arc::new(SqliteAddressBook::new(pool)),
        };

        let state = AppState::new(
            QuotationWorkflow::new(gateway.clone(), quotations, account.clone()),
            BookingWorkflow::new(gateway, stores, account),
        );
        (state, customer)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn contact(name: &str) -> Value {
        json!({"name": name, "address": "1 Elm St", "city": "Fresno", "state": "CA",
               "postal_code": "93650", "country": "US"})
    }

    fn quote_input() -> QuoteInput {
        serde_json::from_value(json!({
            "ship_to": contact("Receiver"),
            "ship_from": contact("Sender"),
            "package_details": [{"package_type": "Document"}],
            "pickup_date": "2025-01-13",
            "pickup_time": "09:30"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn rate_request_then_save() {
        let (state, _) = state(MockCarrier::new()).await;

        let Json(quote) = request_rates(State(state.clone()), Ok(Json(quote_input())))
            .await
            .unwrap();
        assert_eq!(quote.shipping_rates.len(), 2);

        let id = quote.quotation_id.to_string();
        let Json(saved) = update_quotation_status(
            State(state.clone()),
            UrlPath(id.clone()),
            Ok(Json(StatusUpdateRequest {
                status: "saved".into(),
            })),
        )
        .await
        .unwrap();
        assert_eq!(saved.status, QuotationStatus::Saved);

        let Json(listed) = list_saved_quotations(State(state)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id.to_string(), id);
    }

    #[tokio::test]
    async fn only_saved_status_accepted() {
        let (state, _) = state(MockCarrier::new()).await;
        let err = update_quotation_status(
            State(state),
            UrlPath(QuotationId::generate().to_string()),
            Ok(Json(StatusUpdateRequest {
                status: "Rated".into(),
            })),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rate_failure_reports_stage_and_draft() {
        let (state, _) = state(MockCarrier::new().failing_rates("down")).await;
        let err = request_rates(State(state), Ok(Json(quote_input())))
            .await
            .unwrap_err();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["kind"], "rate_fetch");
        assert_eq!(body["stage"], QuotationStage::DraftPersisted.to_string());
        assert!(body["quotation_id"].is_string());
    }

    #[tokio::test]
    async fn booking_lifecycle() {
        let (state, customer) = state(MockCarrier::new()).await;
        let input: BookingInput = serde_json::from_value(json!({
            "customer_id": customer.0,
            "origin": contact("Sender"),
            "destination": contact("Receiver"),
            "service_code": "03",
            "items": [{"package_type": "Document", "cost": "12.50"}],
            "pickup_date": "2025-01-13",
            "pickup_time": "09:30"
        }))
        .unwrap();

        let (status, Json(booking)) = create_booking(State(state.clone()), Ok(Json(input)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(booking.status, BookingStatus::Booked);

        let Json(cancelled) = cancel_booking(State(state.clone()), UrlPath(booking.id.to_string()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(!cancelled.active);

        let Json(listed) = list_bookings(
            State(state),
            Query(BookingListQuery {
                status: Some("cancelled".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn bad_ids_are_bad_requests() {
        let (state, _) = state(MockCarrier::new()).await;

        let err = get_booking(State(state.clone()), UrlPath("abc".into()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = get_quotation(State(state.clone()), UrlPath("abc".into()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = get_booking(State(state), UrlPath("99".into()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn shipment_failure_body_carries_booking_and_partial() {
        let err = AppError::from(WorkflowError::ShipmentCreation {
            booking_id: BookingId(3),
            message: "no tracking number".into(),
            partial: PartialShipment {
                base_service_charge: Money::parse("9.10").ok(),
                ..Default::default()
            },
        });

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["kind"], "shipment_creation");
        assert_eq!(body["booking_id"], 3);
        assert_eq!(body["partial"]["base_service_charge"], "9.10");
    }

    #[tokio::test]
    async fn persistence_details_not_exposed() {
        let err = AppError::from(WorkflowError::Persistence(
            "storing booking: database error: disk I/O error".into(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "internal storage error");
    }

    #[tokio::test]
    async fn auth_failure_is_bad_gateway() {
        let (state, customer) = state(MockCarrier::new().failing_shipment(
            CarrierError::Auth("expired".into()),
        ))
        .await;
        let input: BookingInput = serde_json::from_value(json!({
            "customer_id": customer.0,
            "origin": contact("Sender"),
            "destination": contact("Receiver"),
            "service_code": "03",
            "items": [{"package_type": "Document", "cost": "12.50"}],
            "pickup_date": "2025-01-13",
            "pickup_time": "09:30"
        }))
        .unwrap();

        let err = create_booking(State(state), Ok(Json(input)))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
