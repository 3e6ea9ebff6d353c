use serde_json::Value;
use sqlx::Row;

use crate::helper::{id_from_self_link, spawn_app};

#[tokio::test]
async fn create_returns_201_and_the_serialized_newsletter() {
    let app = spawn_app().await;

    let response = app
        .post_newsletter(r#"{"title": "A", "body": "B"}"#)
        .await;

    assert_eq!(201, response.status().as_u16());

    let record = response
        .json::<Value>()
        .await
        .expect("The response should be a JSON record.");
    assert_eq!(record["title"], "A");
    chrono::DateTime::parse_from_rfc3339(record["published_at"].as_str().unwrap())
        .expect("`published_at` should be an RFC 3339 timestamp.");
    assert!(record["url"]["self"]
        .as_str()
        .unwrap()
        .contains("/newsletters/"));
    assert!(record["url"]["collection"]
        .as_str()
        .unwrap()
        .ends_with("/newsletters"));

    let saved = sqlx::query("SELECT title, body FROM newsletters")
        .fetch_one(&app.db_pool)
        .await
        .expect("The saved newsletter should exist.");
    assert_eq!(saved.get::<String, _>("title"), "A");
    assert_eq!(saved.get::<String, _>("body"), "B");
}

#[tokio::test]
async fn create_returns_a_422_when_data_is_missing() {
    let app = spawn_app().await;
    let test_cases = [
        (r#"{"title": "A"}"#, "missing the body"),
        (r#"{"body": "B"}"#, "missing the title"),
        ("{}", "missing both title and body"),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = app.post_newsletter(invalid_body).await;

        assert_eq!(
            422,
            response.status().as_u16(),
            "The API did not fail with 422 when the payload was {}",
            error_message
        )
    }
}

#[tokio::test]
async fn create_returns_a_400_when_fields_are_present_but_empty() {
    let app = spawn_app().await;
    let test_cases = [
        (r#"{"title": "", "body": "B"}"#, "empty title"),
        (r#"{"title": " ", "body": "B"}"#, "whitespace-only title"),
        (r#"{"title": "A", "body": ""}"#, "empty body"),
    ];

    for (body, description) in test_cases {
        let response = app.post_newsletter(body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 Bad Request when the payload was {}.",
            description
        );
    }
}

#[tokio::test]
async fn list_returns_an_empty_array_on_an_empty_store() {
    let app = spawn_app().await;

    let response = app.get_newsletters().await;

    assert_eq!(200, response.status().as_u16());

    let records = response
        .json::<Value>()
        .await
        .expect("The response should be JSON.");
    assert_eq!(records, serde_json::json!([]));
}

#[tokio::test]
async fn list_returns_created_newsletters_in_insertion_order() {
    let app = spawn_app().await;
    app.create_newsletter("A", "B").await;
    app.create_newsletter("C", "D").await;

    let response = app.get_newsletters().await;

    assert_eq!(200, response.status().as_u16());

    let records = response
        .json::<Value>()
        .await
        .expect("The response should be JSON.");
    let records = records.as_array().expect("The response should be an array.");
    assert_eq!(2, records.len());
    assert_eq!(records[0]["title"], "A");
    assert_eq!(records[1]["title"], "C");
}

#[tokio::test]
async fn read_returns_the_newsletter_by_id() {
    let app = spawn_app().await;
    let id = app.create_newsletter("A", "B").await;

    let response = app.get_newsletter(id).await;

    assert_eq!(200, response.status().as_u16());

    let record = response
        .json::<Value>()
        .await
        .expect("The response should be a JSON record.");
    assert_eq!(record["title"], "A");
    assert!(record["url"]["self"]
        .as_str()
        .unwrap()
        .ends_with(&format!("/newsletters/{}", id)));
    assert_eq!(id, id_from_self_link(&record));
}

#[tokio::test]
async fn serialized_records_never_expose_body_or_id() {
    let app = spawn_app().await;
    let id = app.create_newsletter("A", "B").await;

    for record in [
        app.get_newsletter(id).await.json::<Value>().await.unwrap(),
        app.get_newsletters().await.json::<Value>().await.unwrap()[0].clone(),
        app.patch_newsletter(id, r#"{"title": "C"}"#)
            .await
            .json::<Value>()
            .await
            .unwrap(),
    ] {
        let keys: Vec<_> = record.as_object().unwrap().keys().cloned().collect();
        let mut keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["published_at", "title", "url"]);
    }
}

#[tokio::test]
async fn read_returns_a_404_for_a_missing_newsletter() {
    let app = spawn_app().await;

    let response = app.get_newsletter(999_999).await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn update_rewrites_the_named_fields_and_nothing_else() {
    let app = spawn_app().await;
    let id = app.create_newsletter("A", "B").await;

    let response = app.patch_newsletter(id, r#"{"title": "C"}"#).await;

    assert_eq!(200, response.status().as_u16());

    let record = response
        .json::<Value>()
        .await
        .expect("The response should be a JSON record.");
    assert_eq!(record["title"], "C");

    let read_back = app
        .get_newsletter(id)
        .await
        .json::<Value>()
        .await
        .expect("The response should be a JSON record.");
    assert_eq!(read_back["title"], "C");

    let saved = sqlx::query("SELECT title, body FROM newsletters WHERE id = ?")
        .bind(id)
        .fetch_one(&app.db_pool)
        .await
        .expect("The updated newsletter should exist.");
    assert_eq!(saved.get::<String, _>("title"), "C");
    assert_eq!(saved.get::<String, _>("body"), "B");
}

#[tokio::test]
async fn update_returns_a_404_for_a_missing_newsletter() {
    let app = spawn_app().await;

    let response = app.patch_newsletter(999_999, r#"{"title": "C"}"#).await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn update_rejects_field_names_outside_the_allow_list() {
    let app = spawn_app().await;
    let id = app.create_newsletter("A", "B").await;
    let test_cases = [
        (r#"{"id": 99}"#, "rewriting the id"),
        (
            r#"{"published_at": "1970-01-01T00:00:00Z"}"#,
            "rewriting the publication timestamp",
        ),
        (r#"{"author": "nobody"}"#, "an unknown field"),
    ];

    for (body, description) in test_cases {
        let response = app.patch_newsletter(id, body).await;

        assert_eq!(
            422,
            response.status().as_u16(),
            "The API did not reject {}.",
            description
        );
    }

    let saved = sqlx::query("SELECT id, title FROM newsletters")
        .fetch_one(&app.db_pool)
        .await
        .expect("The newsletter should still exist.");
    assert_eq!(saved.get::<i64, _>("id"), id);
    assert_eq!(saved.get::<String, _>("title"), "A");
}

#[tokio::test]
async fn update_returns_a_400_when_a_named_field_is_empty() {
    let app = spawn_app().await;
    let id = app.create_newsletter("A", "B").await;

    let response = app.patch_newsletter(id, r#"{"title": ""}"#).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn delete_removes_the_newsletter() {
    let app = spawn_app().await;
    let id = app.create_newsletter("A", "B").await;

    let response = app.delete_newsletter(id).await;

    assert_eq!(200, response.status().as_u16());

    let body = response
        .json::<Value>()
        .await
        .expect("The response should be JSON.");
    assert_eq!(body["message"], "record successfully deleted");

    assert_eq!(404, app.get_newsletter(id).await.status().as_u16());
}

#[tokio::test]
async fn delete_returns_a_404_for_a_missing_newsletter() {
    let app = spawn_app().await;

    let response = app.delete_newsletter(999_999).await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn ids_are_never_reused() {
    let app = spawn_app().await;

    let first = app.create_newsletter("A", "B").await;
    assert_eq!(200, app.delete_newsletter(first).await.status().as_u16());

    let second = app.create_newsletter("C", "D").await;
    assert_ne!(first, second);
}

#[tokio::test]
async fn concurrent_update_and_delete_leave_the_store_clean() {
    let app = spawn_app().await;
    let id = app.create_newsletter("A", "B").await;

    let update = app.patch_newsletter(id, r#"{"title": "C"}"#);
    let delete = app.delete_newsletter(id);
    let (update_response, delete_response) = tokio::join!(update, delete);

    assert_eq!(200, delete_response.status().as_u16());
    let update_status = update_response.status().as_u16();
    assert!(
        update_status == 200 || update_status == 404,
        "The update should either win or observe a clean not-found, got {}.",
        update_status
    );

    assert_eq!(404, app.get_newsletter(id).await.status().as_u16());

    let remaining = sqlx::query("SELECT id FROM newsletters")
        .fetch_all(&app.db_pool)
        .await
        .expect("The store should still answer queries.");
    assert!(remaining.is_empty(), "No partially-written row may survive.");
}
