//! HTTP surface for the reservation service.

use std::{any::Any, collections::BTreeMap, path::Path, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use kasse_core::{
    admission::{AdmissionController, ReservationRequest},
    models::{Day, Reservation},
};

type Controller = Arc<AdmissionController>;

/// Build the service router: the reservation API, permissive CORS, a
/// request trace layer, a panic catcher answering the generic failure
/// shape, and optionally the static frontend at the web root.
pub fn router(controller: Controller, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/api/reservations/status", get(status))
        .route("/api/reservations/count", get(count))
        .route("/api/reservations/add", post(add))
        .route("/api/reservations/all", get(all))
        .with_state(controller);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    day: Option<String>,
}

async fn status(
    State(controller): State<Controller>,
    Query(query): Query<StatusQuery>,
) -> Response {
    Json(controller.status(query.day.as_deref())).into_response()
}

#[derive(Debug, Serialize)]
struct CountResponse {
    count: BTreeMap<Day, u32>,
}

async fn count(State(controller): State<Controller>) -> Response {
    Json(CountResponse {
        count: controller.counts(),
    })
    .into_response()
}

async fn all(State(controller): State<Controller>) -> Response {
    Json(controller.all()).into_response()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddSuccess {
    success: bool,
    message: String,
    persons_for_day: u32,
    available_persons: i64,
    reservation: Reservation,
}

#[derive(Debug, Serialize)]
struct Failure {
    success: bool,
    message: String,
}

async fn add(
    State(controller): State<Controller>,
    Json(request): Json<ReservationRequest>,
) -> Response {
    match controller.add_reservation(&request) {
        Ok(receipt) => Json(AddSuccess {
            success: true,
            message: "Reservierung erfolgreich erstellt".to_string(),
            persons_for_day: receipt.persons_for_day,
            available_persons: receipt.available_persons,
            reservation: receipt.reservation,
        })
        .into_response(),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(Failure {
                success: false,
                message: err.to_string(),
            }),
        )
            .into_response(),
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::error!("request handler panicked: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Failure {
            success: false,
            message: "Fehler beim Verarbeiten der Reservierung".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use kasse_core::ledger::MemoryLedgerStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let store = Arc::new(MemoryLedgerStore::new());
        router(Arc::new(AdmissionController::new(store)), None)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn add_then_status_round_trip() {
        let app = test_router();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/reservations/add",
                json!({"day": "Dienstag", "personCount": 5, "email": "a@b.com"}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["personsForDay"], 5);
        assert_eq!(body["availablePersons"], 195);
        assert_eq!(body["reservation"]["day"], "Dienstag");

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/reservations/status?day=Dienstag")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["personsForDay"], 5);
        assert_eq!(body["maxPersons"], 200);
        assert_eq!(body["isFull"], false);
    }

    #[tokio::test]
    async fn status_without_valid_day_returns_the_ledger() {
        let app = test_router();
        for uri in [
            "/api/reservations/status",
            "/api/reservations/status?day=Montag",
        ] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert!(body.get("reservations").is_some());
            assert!(body.get("personsByDay").is_some());
        }
    }

    #[tokio::test]
    async fn count_reports_the_totals_map() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::get("/api/reservations/count")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(body["count"]["Dienstag"], 0);
        assert_eq!(body["count"]["Freitag"], 0);
    }

    #[tokio::test]
    async fn rejected_request_answers_bad_request() {
        let app = test_router();
        let response = app
            .oneshot(post_json(
                "/api/reservations/add",
                json!({"day": "Dienstag", "personCount": 21, "email": "a@b.com"}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Personenanzahl muss zwischen 1 und 20 liegen");
    }

    #[tokio::test]
    async fn all_returns_the_full_ledger() {
        let app = test_router();
        app.clone()
            .oneshot(post_json(
                "/api/reservations/add",
                json!({"day": "Freitag", "personCount": 2, "email": "a@b.com"}),
            ))
            .await
            .expect("response");

        let response = app
            .oneshot(
                Request::get("/api/reservations/all")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(body["reservations"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["personsByDay"]["Freitag"], 2);
    }
}
