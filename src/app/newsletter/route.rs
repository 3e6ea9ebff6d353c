use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::{Sqlite, SqliteExecutor, SqlitePool, Transaction};
use tracing::instrument;

use super::schema::{self, NewsletterResponseBody};
use crate::{
    app::{
        error::{AppError, AppResult},
        AppState,
    },
    domain::newsletter::{body::Body, title::Title, NewNewsletter, Newsletter},
};

#[instrument(name = "listing newsletters", skip(state))]
pub async fn list_newsletters(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<NewsletterResponseBody>>> {
    let newsletters = fetch_all_newsletters(&state.db)
        .await
        .context("Failed to fetch newsletters.")?;

    Ok(Json(
        newsletters
            .into_iter()
            .map(|newsletter| NewsletterResponseBody::from_record(newsletter, &state.base_url))
            .collect(),
    ))
}

#[instrument(name = "creating a newsletter", skip(state, body), fields(title = %body.title))]
pub async fn create_newsletter(
    State(state): State<AppState>,
    Json(body): Json<schema::CreateNewsletterBody>,
) -> AppResult<(StatusCode, Json<NewsletterResponseBody>)> {
    let new_newsletter = NewNewsletter::try_from(body).map_err(AppError::ValidationError)?;

    let newsletter = insert_newsletter(&state.db, new_newsletter)
        .await
        .context("Failed to save the new newsletter.")?;

    Ok((
        StatusCode::CREATED,
        Json(NewsletterResponseBody::from_record(
            newsletter,
            &state.base_url,
        )),
    ))
}

#[instrument(name = "fetching a newsletter", skip(state))]
pub async fn get_newsletter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<NewsletterResponseBody>> {
    let newsletter = fetch_newsletter(&state.db, id)
        .await
        .context("Failed to fetch the newsletter.")?
        .ok_or(AppError::NotFound)?;

    Ok(Json(NewsletterResponseBody::from_record(
        newsletter,
        &state.base_url,
    )))
}

#[instrument(name = "updating a newsletter", skip(state, body))]
pub async fn update_newsletter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<schema::UpdateNewsletterBody>,
) -> AppResult<Json<NewsletterResponseBody>> {
    // Lookup and write run in one transaction so a concurrent delete of the
    // same id cannot slip in between them.
    let mut transaction = state
        .db
        .begin()
        .await
        .context("Failed to start a database transaction.")?;

    let mut newsletter = fetch_newsletter(&mut *transaction, id)
        .await
        .context("Failed to fetch the newsletter to update.")?
        .ok_or(AppError::NotFound)?;

    if let Some(title) = body.title {
        let title = Title::try_from(title).map_err(AppError::ValidationError)?;
        newsletter.title = title.into();
    }
    if let Some(new_body) = body.body {
        let new_body = Body::try_from(new_body).map_err(AppError::ValidationError)?;
        newsletter.body = new_body.into();
    }

    // The row may have been deleted since the lookup; an update that hits
    // nothing must surface as not-found, not as success. Returning early
    // drops the transaction, which rolls it back.
    let updated = update_newsletter_record(&mut transaction, &newsletter)
        .await
        .context("Failed to persist the updated newsletter.")?;
    if !updated {
        return Err(AppError::NotFound);
    }

    transaction
        .commit()
        .await
        .context("Failed to commit the newsletter update.")?;

    Ok(Json(NewsletterResponseBody::from_record(
        newsletter,
        &state.base_url,
    )))
}

#[instrument(name = "deleting a newsletter", skip(state))]
pub async fn delete_newsletter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<schema::DeleteNewsletterResponseBody>> {
    let deleted = delete_newsletter_record(&state.db, id)
        .await
        .context("Failed to delete the newsletter.")?;

    if !deleted {
        return Err(AppError::NotFound);
    }

    Ok(Json(schema::DeleteNewsletterResponseBody {
        message: "record successfully deleted".to_owned(),
    }))
}

#[instrument(name = "fetching all newsletters from the database", skip(db))]
async fn fetch_all_newsletters(db: &SqlitePool) -> Result<Vec<Newsletter>, sqlx::Error> {
    sqlx::query_as::<_, Newsletter>(
        "SELECT id, title, body, published_at FROM newsletters ORDER BY id",
    )
    .fetch_all(db)
    .await
    .map_err(|e| {
        tracing::error!(detail = e.to_string(), "failed to fetch newsletters");
        e
    })
}

#[instrument(name = "inserting a new newsletter into the database", skip(db, newsletter), fields(title = %newsletter.title))]
async fn insert_newsletter(
    db: &SqlitePool,
    newsletter: NewNewsletter,
) -> Result<Newsletter, sqlx::Error> {
    sqlx::query_as::<_, Newsletter>(
        "INSERT INTO newsletters (title, body, published_at) VALUES (?, ?, ?) \
         RETURNING id, title, body, published_at",
    )
    .bind(newsletter.title.as_ref())
    .bind(newsletter.body.as_ref())
    .bind(Utc::now())
    .fetch_one(db)
    .await
    .map_err(|e| {
        tracing::error!(detail = e.to_string(), "failed to save new newsletter");
        e
    })
}

/// The one lookup-by-id used by every keyed handler, so a missing record is
/// handled the same way everywhere.
#[instrument(name = "fetching a newsletter from the database", skip(executor))]
async fn fetch_newsletter(
    executor: impl SqliteExecutor<'_>,
    id: i64,
) -> Result<Option<Newsletter>, sqlx::Error> {
    sqlx::query_as::<_, Newsletter>(
        "SELECT id, title, body, published_at FROM newsletters WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(|e| {
        tracing::error!(detail = e.to_string(), "failed to fetch newsletter");
        e
    })
}

#[instrument(name = "updating a newsletter in the database", skip(transaction, newsletter), fields(id = newsletter.id))]
async fn update_newsletter_record(
    transaction: &mut Transaction<'_, Sqlite>,
    newsletter: &Newsletter,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE newsletters SET title = ?, body = ? WHERE id = ?")
        .bind(&newsletter.title)
        .bind(&newsletter.body)
        .bind(newsletter.id)
        .execute(&mut **transaction)
        .await
        .map_err(|e| {
            tracing::error!(detail = e.to_string(), "failed to update newsletter");
            e
        })?;

    Ok(result.rows_affected() > 0)
}

#[instrument(name = "deleting a newsletter from the database", skip(db))]
async fn delete_newsletter_record(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM newsletters WHERE id = ?")
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| {
            tracing::error!(detail = e.to_string(), "failed to delete newsletter");
            e
        })?;

    Ok(result.rows_affected() > 0)
}
