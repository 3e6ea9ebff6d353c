use std::{io, net::IpAddr};

use axum::{http::Request, Router};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Settings;

mod error;
mod health;
mod index;
mod newsletter;

#[derive(Clone)]
pub struct AppState {
    db: SqlitePool,
    base_url: String,
}

fn app_router() -> Router<AppState> {
    health::router()
        .merge(index::router())
        .merge(newsletter::router())
}

pub struct App {
    listener: TcpListener,
    base_url: String,
}

impl App {
    pub async fn with(config: Settings) -> Self {
        let listener = tokio::net::TcpListener::bind(format!(
            "{}:{}",
            config.application.host, config.application.port
        ))
        .await
        .expect("The listener should be able to bind the address.");

        // Port 0 asks the OS for a free port; regenerate the base url so the
        // hyperlinks embedded in responses point at the bound address.
        let base_url = if config.application.port == 0 {
            format!(
                "http://{}",
                listener
                    .local_addr()
                    .expect("The listener should have a local address.")
            )
        } else {
            config.application.base_url
        };

        Self { listener, base_url }
    }

    pub fn host(&self) -> IpAddr {
        self.listener.local_addr().unwrap().ip()
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().unwrap().port()
    }

    pub async fn serve(self, db: SqlitePool) -> Result<(), io::Error> {
        let app = app_router()
            .with_state(AppState {
                db,
                base_url: self.base_url,
            })
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                    let id = uuid::Uuid::new_v4();
                    tracing::info_span!(
                        "request",
                        method = ?request.method(),
                        uri = ?request.uri(),
                        %id,
                    )
                }),
            );

        axum::serve(self.listener, app.into_make_service()).await
    }
}
