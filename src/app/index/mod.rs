use axum::{response::IntoResponse, routing::get, Json, Router};

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

#[derive(serde::Serialize)]
struct IndexResponseBody {
    index: String,
}

#[tracing::instrument(name = "Welcome index")]
pub async fn index() -> impl IntoResponse {
    Json(IndexResponseBody {
        index: "Welcome to the Newsletter RESTful API".to_owned(),
    })
}
