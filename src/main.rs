use anyhow::Context;
use newsletter_api::{app::App, config::get_configuration, db, telemetry::get_subscriber};
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration().expect("Failed to read configuration.");

    get_subscriber(&config.log_level, std::io::stderr).init();

    let db = db::connect(&config.database)
        .await
        .context("Could not connect to database")?;

    let app = App::with(config).await;

    tracing::info!(port = app.port(), "starting server");
    app.serve(db).await.expect("The server should be running");

    Ok(())
}
