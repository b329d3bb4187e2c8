mod helpers;

use autocrm::application::services::document_service::EMBED_BATCH_SIZE;
use autocrm::domain::entities::{Role, SearchRequest};
use autocrm::domain::errors::AiError;
use autocrm::domain::ports::DocumentRepository;
use autocrm::infrastructure::http::middleware::ApiError;
use helpers::*;

const REFUNDS: &str = "# Refunds\n\nA refund is issued to the original card. \
Every refund request needs the refund reference from the invoice.\n";
const PASSWORDS: &str = "# Resetting your password\n\nUse the forgot password link. \
A new password must be at least eight characters long.\n";

fn search(query: &str) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        category: None,
        match_threshold: None,
        match_count: None,
    }
}

async fn indexed_app() -> TestApp {
    let app = setup_test_app().await;
    write_doc(&app, "billing", "refunds", REFUNDS);
    write_doc(&app, "account", "passwords", PASSWORDS);

    let admin = create_test_user(app.db(), "admin@example.com", Role::Admin).await;
    app.state
        .document_service
        .reindex(&actor(&admin))
        .await
        .unwrap();
    app
}

#[tokio::test]
async fn test_reindex_counts_documents_and_chunks() {
    let app = setup_test_app().await;
    write_doc(&app, "billing", "refunds", REFUNDS);
    write_doc(&app, "account", "passwords", PASSWORDS);
    let admin = create_test_user(app.db(), "admin@example.com", Role::Admin).await;

    let response = app
        .state
        .document_service
        .reindex(&actor(&admin))
        .await
        .unwrap();
    assert_eq!(response.documents, 2);
    assert_eq!(response.chunks, 2);
    assert_eq!(response.removed, 0);
    assert_eq!(app.db().count_chunks().await.unwrap(), 2);

    // Running again replaces chunks rather than duplicating them
    app.state
        .document_service
        .reindex(&actor(&admin))
        .await
        .unwrap();
    assert_eq!(app.db().count_chunks().await.unwrap(), 2);
}

#[tokio::test]
async fn test_reindex_requires_admin() {
    let app = setup_test_app().await;
    let agent = create_test_user(app.db(), "agent@example.com", Role::Agent).await;

    let result = app.state.document_service.reindex(&actor(&agent)).await;
    assert!(matches!(result, Err(ApiError::Forbidden(_))));
    assert_eq!(app.embedder.calls(), 0);
}

#[tokio::test]
async fn test_reindex_without_docs_dir_is_empty() {
    let app = setup_test_app().await;
    let admin = create_test_user(app.db(), "admin@example.com", Role::Admin).await;

    let response = app
        .state
        .document_service
        .reindex(&actor(&admin))
        .await
        .unwrap();
    assert_eq!(response.documents, 0);
    assert_eq!(response.chunks, 0);
}

#[tokio::test]
async fn test_search_ranks_matching_chunk_first() {
    let app = indexed_app().await;

    let results = app
        .state
        .document_service
        .search(&search("How do I get a refund?"))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].category, "billing");
    assert_eq!(results[0].slug, "refunds");
    assert_eq!(results[0].title, "Refunds");
    assert_eq!(results[0].line_start, 1);
    assert!(results[0].similarity > 0.9);
}

#[tokio::test]
async fn test_search_category_filter_and_threshold() {
    let app = indexed_app().await;

    let mut req = search("refund");
    req.category = Some("account".to_string());
    let results = app.state.document_service.search(&req).await.unwrap();
    assert!(results.is_empty());

    let mut req = search("refund");
    req.match_threshold = Some(-1.0);
    req.match_count = Some(5);
    let results = app.state.document_service.search(&req).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].similarity >= results[1].similarity);
    assert_eq!(results[0].slug, "refunds");
}

#[tokio::test]
async fn test_search_validation() {
    let app = indexed_app().await;

    let result = app.state.document_service.search(&search("   ")).await;
    assert!(matches!(result, Err(ApiError::BadRequest(_))));

    let mut req = search("refund");
    req.match_count = Some(0);
    let result = app.state.document_service.search(&req).await;
    assert!(matches!(result, Err(ApiError::BadRequest(_))));
}

#[tokio::test]
async fn test_search_before_indexing_skips_embedding() {
    let app = setup_test_app().await;

    let results = app
        .state
        .document_service
        .search(&search("refund"))
        .await
        .unwrap();
    assert!(results.is_empty());
    assert_eq!(app.embedder.calls(), 0);
}

#[tokio::test]
async fn test_list_category_and_get_doc() {
    let app = setup_test_app().await;
    write_doc(&app, "billing", "refunds", REFUNDS);
    write_doc(&app, "billing", "invoices", "No heading here\n");

    let docs = app
        .state
        .document_service
        .list_category("billing")
        .await
        .unwrap();
    let slugs: Vec<&str> = docs.iter().map(|d| d.slug.as_str()).collect();
    assert_eq!(slugs, vec!["invoices", "refunds"]);
    assert_eq!(docs[0].title, "invoices");
    assert_eq!(docs[1].title, "Refunds");

    let doc = app
        .state
        .document_service
        .get_doc("billing", "refunds")
        .await
        .unwrap();
    assert_eq!(doc.title, "Refunds");
    assert_eq!(doc.content, REFUNDS);
}

#[tokio::test]
async fn test_missing_and_invalid_docs_are_not_found() {
    let app = setup_test_app().await;
    write_doc(&app, "billing", "refunds", REFUNDS);

    let service = &app.state.document_service;
    assert!(matches!(
        service.list_category("shipping").await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        service.list_category("../billing").await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        service.get_doc("billing", "missing").await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        service.get_doc("billing", "..").await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_reindex_drops_deleted_documents() {
    let app = indexed_app().await;
    let admin = create_test_user(app.db(), "admin2@example.com", Role::Admin).await;

    std::fs::remove_file(app.docs_path().join("billing").join("refunds.md")).unwrap();
    let response = app
        .state
        .document_service
        .reindex(&actor(&admin))
        .await
        .unwrap();

    assert_eq!(response.documents, 1);
    assert_eq!(response.removed, 1);
    assert_eq!(app.db().count_chunks().await.unwrap(), 1);

    let mut req = search("refund");
    req.match_threshold = Some(-1.0);
    let results = app.state.document_service.search(&req).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].slug, "passwords");
}

#[tokio::test]
async fn test_large_document_is_embedded_in_batches() {
    let app = setup_test_app().await;
    let paragraphs: Vec<String> = (0..20)
        .map(|i| {
            format!(
                "Step {}. {}",
                i,
                "The refund is processed after review. ".repeat(15).trim_end()
            )
        })
        .collect();
    write_doc(
        &app,
        "billing",
        "long-guide",
        &format!("# Long guide\n\n{}\n", paragraphs.join("\n\n")),
    );
    let admin = create_test_user(app.db(), "admin@example.com", Role::Admin).await;

    let response = app
        .state
        .document_service
        .reindex(&actor(&admin))
        .await
        .unwrap();

    assert_eq!(response.chunks, 20);
    assert_eq!(app.embedder.calls(), 20usize.div_ceil(EMBED_BATCH_SIZE));
    assert_eq!(app.embedder.inputs(), 20);
    assert_eq!(app.db().count_chunks().await.unwrap(), 20);
}

#[tokio::test]
async fn test_embedding_count_mismatch_fails_reindex() {
    let app = setup_test_app_with_embedder(FakeEmbedder::short()).await;
    write_doc(&app, "billing", "refunds", REFUNDS);
    let admin = create_test_user(app.db(), "admin@example.com", Role::Admin).await;

    let err = app
        .state
        .document_service
        .reindex(&actor(&admin))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Ai(AiError::Provider(_))));
    assert_eq!(app.db().count_chunks().await.unwrap(), 0);
}

#[tokio::test]
async fn test_front_matter_tags_reach_search_results() {
    let app = setup_test_app().await;
    write_doc(
        &app,
        "billing",
        "refunds",
        &format!("---\ntags: Payments, cards\n---\n{}", REFUNDS),
    );
    let admin = create_test_user(app.db(), "admin@example.com", Role::Admin).await;
    app.state
        .document_service
        .reindex(&actor(&admin))
        .await
        .unwrap();

    let results = app
        .state
        .document_service
        .search(&search("refund"))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tags, vec!["payments", "cards"]);
    assert_eq!(results[0].title, "Refunds");

    let doc = app
        .state
        .document_service
        .get_doc("billing", "refunds")
        .await
        .unwrap();
    assert_eq!(doc.content, REFUNDS);
    assert_eq!(doc.tags, vec!["payments", "cards"]);

    write_doc(&app, "account", "passwords", PASSWORDS);
    let plain = app
        .state
        .document_service
        .get_doc("account", "passwords")
        .await
        .unwrap();
    assert!(plain.tags.is_empty());
}
