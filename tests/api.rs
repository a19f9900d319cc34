use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use bson::oid::ObjectId;
use registrar::{app, AppError, AppState, Document, DocumentStore, MemoryStore, UpdateMode};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;

const BODY_LIMIT: usize = 100 * 1024;

fn test_app() -> Router {
    app(AppState::new(Arc::new(MemoryStore::new())), BODY_LIMIT)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send_request(app, req).await
}

async fn send_request(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

async fn create(app: &Router, collection: &str, body: Value) -> Value {
    let (status, value) = send(app, Method::POST, &format!("/api/{}", collection), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {value}");
    value["data"].clone()
}

#[tokio::test]
async fn create_student_returns_envelope() {
    let app = test_app();
    let (status, body) = send(&app, Method::POST, "/api/students", Some(json!({"name": "Ada"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 24);
    assert_eq!(
        body,
        json!({"data": {"type": "students", "id": id, "attributes": {"name": "Ada"}}})
    );
}

#[tokio::test]
async fn create_then_get_returns_submitted_fields() {
    let app = test_app();
    let payload = json!({"name": "Grace", "year": 3, "courses": ["CS101", "MATH2"]});
    let created = create(&app, "students", payload.clone()).await;
    let (status, body) = send(&app, Method::GET, &format!("/api/students/{}", created["id"].as_str().unwrap()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["attributes"], payload);
    assert_eq!(body["data"]["id"], created["id"]);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = test_app();
    let created = create(&app, "students", json!({"name": "Linus"})).await;
    let uri = format!("/api/students/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], created);

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"][0]["status"], "404");

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_preserves_and_put_clears() {
    let app = test_app();
    let created = create(
        &app,
        "courses",
        json!({"code": "CS101", "title": "Intro", "description": "Basics", "url": "https://example.edu/cs101"}),
    )
    .await;
    let uri = format!("/api/courses/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({"title": "Intro to CS"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["attributes"],
        json!({"code": "CS101", "title": "Intro to CS", "description": "Basics", "url": "https://example.edu/cs101"})
    );

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({"code": "CS102", "title": "Data"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["attributes"], json!({"code": "CS102", "title": "Data"}));

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["data"]["attributes"], json!({"code": "CS102", "title": "Data"}));
}

#[tokio::test]
async fn list_returns_every_document_with_unique_ids() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/students", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": []}));

    let mut created = Vec::new();
    for n in 0..4 {
        created.push(create(&app, "students", json!({"name": format!("student {n}")})).await);
    }
    let (status, body) = send(&app, Method::GET, "/api/students", None).await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 4);
    let ids: HashSet<&str> = data.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids.len(), 4);
    assert_eq!(data, &created);
    assert!(data.iter().all(|r| r["type"] == "students"));
}

#[tokio::test]
async fn unknown_course_is_not_found() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/courses/000000000000000000000000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"error": [{
            "status": "404",
            "title": "Resource does not exist",
            "description": "We could not find a course with id: 000000000000000000000000"
        }]})
    );
}

#[tokio::test]
async fn malformed_id_is_not_found() {
    let app = test_app();
    for method in [Method::GET, Method::DELETE] {
        let (status, body) = send(&app, method, "/api/students/not-an-id", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"][0]["description"], "We could not find a student with id: not-an-id");
    }
    let (status, _) = send(&app, Method::PATCH, "/api/students/not-an-id", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_course_create_is_server_error() {
    let app = test_app();
    let (status, body) = send(&app, Method::POST, "/api/courses", Some(json!({"code": "CS101"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"errors": [{
            "status": "500",
            "title": "Server error",
            "description": "Problem saving document to the database."
        }]})
    );
    let (_, body) = send(&app, Method::GET, "/api/courses", None).await;
    assert_eq!(body, json!({"data": []}));
}

#[tokio::test]
async fn invalid_update_is_unprocessable() {
    let app = test_app();
    let created = create(&app, "courses", json!({"code": "CS101", "title": "Intro"})).await;
    let uri = format!("/api/courses/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({"code": "X".repeat(17)}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["status"], "422");

    let (status, _) = send(&app, Method::PUT, &uri, Some(json!({"title": "No code"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["data"]["attributes"], json!({"code": "CS101", "title": "Intro"}));
}

#[tokio::test]
async fn update_of_missing_document_is_not_found() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/courses/000000000000000000000000",
        Some(json!({"code": "CS1", "title": "T"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"][0]["title"], "Resource does not exist");
}

#[tokio::test]
async fn course_reads_populate_student() {
    let app = test_app();
    let student = create(&app, "students", json!({"name": "Ada"})).await;
    let course = create(
        &app,
        "courses",
        json!({"code": "CS101", "title": "Intro", "students": student["id"]}),
    )
    .await;
    assert_eq!(course["attributes"]["students"], student["id"]);

    let (_, body) = send(&app, Method::GET, &format!("/api/courses/{}", course["id"].as_str().unwrap()), None).await;
    assert_eq!(body["data"]["attributes"]["students"], student);

    let (_, body) = send(&app, Method::GET, "/api/courses", None).await;
    assert_eq!(body["data"][0]["attributes"]["students"], student);

    send(&app, Method::DELETE, &format!("/api/students/{}", student["id"].as_str().unwrap()), None).await;
    let (status, body) = send(&app, Method::GET, "/api/courses", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["attributes"]["students"], Value::Null);
}

#[tokio::test]
async fn bodies_are_sanitized() {
    let app = test_app();
    let created = create(
        &app,
        "students",
        json!({
            "_id": "000000000000000000000000",
            "id": "mine",
            "$where": "sleep(1000)",
            "name": "<b>Ada</b><script>alert(1)</script>",
            "profile": {"$gt": "", "city": "London"}
        }),
    )
    .await;
    assert_ne!(created["id"], "000000000000000000000000");
    assert_eq!(created["attributes"], json!({"name": "Ada", "profile": {"city": "London"}}));
}

#[tokio::test]
async fn course_schema_is_strict_and_trimmed() {
    let app = test_app();
    let created = create(
        &app,
        "courses",
        json!({"code": "  CS101 ", "title": "Intro", "room": "B12", "credits": 3}),
    )
    .await;
    assert_eq!(created["attributes"], json!({"code": "CS101", "title": "Intro"}));
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let app = test_app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/students")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send_request(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["status"], "400");

    let (status, _) = send(&app, Method::POST, "/api/students", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::POST, "/api/students", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["attributes"], json!({}));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = app(AppState::new(Arc::new(MemoryStore::new())), 64);
    let (status, body) = send(&app, Method::POST, "/api/students", Some(json!({"name": "x".repeat(200)}))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["errors"][0]["status"], "413");

    let payload = json!({"name": "x".repeat(200)}).to_string();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/students")
        .header("content-type", "application/json")
        .header("content-length", payload.len())
        .body(Body::from(payload))
        .unwrap();
    let (status, body) = send_request(&app, req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["errors"][0]["status"], "413");
    assert_eq!(body["errors"][0]["title"], "Payload too large");

    let (_, body) = send(&app, Method::GET, "/api/students", None).await;
    assert_eq!(body, json!({"data": []}));
}

#[tokio::test]
async fn collection_root_accepts_trailing_slash() {
    let app = test_app();
    let (status, body) = send(&app, Method::POST, "/api/students/", Some(json!({"name": "Ada"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, listed) = send(&app, Method::GET, "/api/students/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"], json!([body["data"]]));
}

#[tokio::test]
async fn operational_routes() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "database": "ok"}));

    let (_, body) = send(&app, Method::GET, "/version", None).await;
    assert_eq!(body["name"], "registrar");
}

/// Store whose every call fails, as when the database is unreachable.
struct UnavailableStore;

fn unavailable() -> AppError {
    AppError::Store("connection refused".into())
}

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn find_all(&self, _collection: &str) -> Result<Vec<Document>, AppError> {
        Err(unavailable())
    }

    async fn find_by_id(&self, _collection: &str, _id: &ObjectId) -> Result<Option<Document>, AppError> {
        Err(unavailable())
    }

    async fn find_by_ids(&self, _collection: &str, _ids: &[ObjectId]) -> Result<Vec<Document>, AppError> {
        Err(unavailable())
    }

    async fn insert(&self, _collection: &str, _doc: Document) -> Result<Document, AppError> {
        Err(unavailable())
    }

    async fn update(
        &self,
        _collection: &str,
        _id: &ObjectId,
        _fields: Map<String, Value>,
        _mode: UpdateMode,
    ) -> Result<Option<Document>, AppError> {
        Err(unavailable())
    }

    async fn delete(&self, _collection: &str, _id: &ObjectId) -> Result<Option<Document>, AppError> {
        Err(unavailable())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Err(unavailable())
    }
}

#[tokio::test]
async fn store_failures_map_per_operation() {
    let app = app(AppState::new(Arc::new(UnavailableStore)), BODY_LIMIT);
    let id = "000000000000000000000000";
    let uri = format!("/api/courses/{}", id);

    let (status, body) = send(&app, Method::GET, "/api/courses", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"errors": [{
            "status": "500",
            "title": "Server error",
            "description": "Problem reading from the database."
        }]})
    );

    let not_found = json!({"error": [{
        "status": "404",
        "title": "Resource does not exist",
        "description": format!("We could not find a course with id: {}", id)
    }]});
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);
    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({"title": "New"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);
    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);

    let (status, body) = send(&app, Method::POST, "/api/courses", Some(json!({"code": "CS1", "title": "T"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["errors"][0]["description"], "Problem saving document to the database.");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"status": "degraded", "database": "unavailable"}));
}
