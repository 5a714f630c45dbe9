//! Shared helpers for scolaris-semestres integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use scolaris_common::config::RelinkScope;
use scolaris_common::db::{init_memory_database, Element, Filiere, Professeur};
use scolaris_semestres::db::references;
use scolaris_semestres::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method

/// Related records seeded into every test store
pub struct Seed {
    pub filieres: Vec<Filiere>,
    pub professeurs: Vec<Professeur>,
    pub elements: Vec<Element>,
}

/// In-memory store with two records in each related collection
pub async fn setup_store() -> (SqlitePool, Seed) {
    let pool = init_memory_database()
        .await
        .expect("Should create in-memory database");

    let seed = Seed {
        filieres: vec![Filiere::new("Informatique"), Filiere::new("Mathématiques")],
        professeurs: vec![
            Professeur::new("Turing", "Alan"),
            Professeur::new("Hopper", "Grace"),
        ],
        elements: vec![Element::new("Compilation"), Element::new("Probabilités")],
    };

    for filiere in &seed.filieres {
        references::insert_filiere(&pool, filiere).await.unwrap();
    }
    for professeur in &seed.professeurs {
        references::insert_professeur(&pool, professeur).await.unwrap();
    }
    for element in &seed.elements {
        references::insert_element(&pool, element).await.unwrap();
    }

    (pool, seed)
}

/// Router over a freshly seeded store
pub async fn setup_app(relink_scope: RelinkScope) -> (Router, SqlitePool, Seed) {
    let (pool, seed) = setup_store().await;
    let app = build_router(AppState::new(pool.clone(), relink_scope));
    (app, pool, seed)
}

/// Request with a JSON body
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Request without a body
pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send a request and parse the JSON response
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = serde_json::from_slice(&bytes).expect("Should parse JSON");
    (status, body)
}

/// Create a semestre through the API and return its id
pub async fn create(app: &Router, body: Value) -> String {
    let (status, body) = send(app, json_request("POST", "/semestres", body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body["semestre"]["_id"].as_str().unwrap().to_string()
}
