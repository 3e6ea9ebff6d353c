use axum::{routing::get, Router};

use super::AppState;

pub mod route;
pub mod schema;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/newsletters",
            get(route::list_newsletters).post(route::create_newsletter),
        )
        .route(
            "/newsletters/:id",
            get(route::get_newsletter)
                .patch(route::update_newsletter)
                .delete(route::delete_newsletter),
        )
}
