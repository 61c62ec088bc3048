//! Fixtures shared by the pipeline and batch tests.

use std::time::Duration;

use articlesmith_publisher::Publisher;
use articlesmith_shared::{
    CatalogEntry, KeywordRecord, MatchedTask, ModelConfig, PersonaRecord, PublisherConfig,
};
use articlesmith_storage::ArticleStore;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::category::{CATEGORY_TABLE, CategoryResolver};
use crate::pipeline::Pipeline;

pub(crate) const DRAFT_MODEL: &str = "draft-model";
pub(crate) const SEO_MODEL: &str = "seo-model";
pub(crate) const LABEL: &str = "現役施設介護士";

/// Catalog covering every table label; the work-advice category has id 3.
pub(crate) fn catalog() -> Vec<CatalogEntry> {
    CATEGORY_TABLE
        .iter()
        .enumerate()
        .map(|(i, (_, name))| CatalogEntry {
            id: if *name == "お仕事の相談" { 3 } else { 10 + i as u32 },
            name: (*name).to_string(),
            slug: String::new(),
        })
        .collect()
}

pub(crate) fn resolver() -> CategoryResolver {
    CategoryResolver::new(&catalog())
}

pub(crate) fn task(keyword_id: &str, main_keyword: &str) -> MatchedTask {
    MatchedTask {
        persona: PersonaRecord {
            category: LABEL.into(),
            persona_detail: "30代の夜勤介護士".into(),
            ..Default::default()
        },
        keyword: KeywordRecord {
            id: keyword_id.into(),
            category: LABEL.into(),
            main_keyword: main_keyword.into(),
            ..Default::default()
        },
    }
}

pub(crate) fn pipeline(server: &MockServer) -> Pipeline {
    let config = ModelConfig {
        base_url: server.uri(),
        generation_model: DRAFT_MODEL.into(),
        optimization_model: SEO_MODEL.into(),
        timeout: Duration::from_secs(5),
        temperature: 0.7,
        top_p: 0.9,
    };
    Pipeline::from_config(&config, resolver()).expect("build pipeline")
}

/// Pipeline whose model URL cannot be parsed, so every task fails at once
/// without touching the network. Used to measure pacing on a paused clock.
pub(crate) fn offline_pipeline() -> Pipeline {
    let config = ModelConfig {
        base_url: "not-a-url".into(),
        generation_model: DRAFT_MODEL.into(),
        optimization_model: SEO_MODEL.into(),
        timeout: Duration::from_secs(5),
        temperature: 0.7,
        top_p: 0.9,
    };
    Pipeline::from_config(&config, resolver()).expect("build pipeline")
}

fn reply(inner: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": inner.to_string() }))
}

/// Draft requests mentioning `keyword` get a chatty reply with `title`.
pub(crate) async fn mount_draft(server: &MockServer, keyword: &str, title: &str) {
    let inner = serde_json::json!({ "title": title, "body": format!("{title} body") });
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({ "model": DRAFT_MODEL })))
        .and(body_string_contains(keyword))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": format!("Here is the article: {inner}")
            })),
        )
        .mount(server)
        .await;
}

/// Draft requests mentioning `keyword` fail with HTTP 500.
pub(crate) async fn mount_draft_failure(server: &MockServer, keyword: &str) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({ "model": DRAFT_MODEL })))
        .and(body_string_contains(keyword))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(server)
        .await;
}

/// Every optimization request gets an article titled `title`.
pub(crate) async fn mount_optimized(server: &MockServer, title: &str) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({ "model": SEO_MODEL })))
        .respond_with(reply(serde_json::json!({
            "title": title,
            "body": "optimized body, with comma\nand newline",
            "slug": "optimized-slug",
            "meta_title": format!("{title} | meta"),
            "meta_description": "description",
        })))
        .mount(server)
        .await;
}

pub(crate) fn temp_store() -> ArticleStore {
    ArticleStore::new(
        std::env::temp_dir()
            .join(format!("as_core_{}", uuid::Uuid::now_v7()))
            .join("articles.csv"),
    )
}

pub(crate) fn publisher_config(mock: bool) -> PublisherConfig {
    PublisherConfig {
        endpoint: None,
        health_endpoint: None,
        token: None,
        mock,
        timeout: Duration::from_secs(5),
        health_timeout: Duration::from_secs(5),
    }
}

pub(crate) fn mock_publisher() -> Publisher {
    Publisher::new(publisher_config(true)).expect("build publisher")
}
