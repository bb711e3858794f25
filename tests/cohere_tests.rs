//! Cohere embed and chat clients against a mock HTTP server.

use docqa::llm::{CohereChatClient, GroundingDocument, LLMClient};
use docqa::rag::{CohereEmbeddings, EmbeddingClient};
use docqa::types::AppError;
use docqa::utils::toml_config::{EmbeddingConfig, LlmConfig};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Returns one 3-dimensional vector per input text.
struct EchoEmbeddings;

impl Respond for EchoEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let count = body["texts"].as_array().map(|t| t.len()).unwrap_or(0);
        ResponseTemplate::new(200).set_body_json(json!({
            "id": "emb-1",
            "embeddings": vec![vec![0.1, 0.2, 0.3]; count],
        }))
    }
}

fn embeddings_for(server: &MockServer) -> CohereEmbeddings {
    let config = EmbeddingConfig {
        api_base: server.uri(),
        dimensions: 3,
        ..Default::default()
    };
    CohereEmbeddings::new(&config, "test-key".to_string())
}

fn chat_for(server: &MockServer) -> CohereChatClient {
    let config = LlmConfig {
        api_base: server.uri(),
        ..Default::default()
    };
    CohereChatClient::new(&config, "test-key".to_string())
}

#[tokio::test]
async fn test_embed_documents_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embed"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "embed-english-v3.0",
            "input_type": "search_document",
            "texts": ["first chunk", "second chunk"]
        })))
        .respond_with(EchoEmbeddings)
        .expect(1)
        .mount(&server)
        .await;

    let client = embeddings_for(&server);
    let vectors = client
        .embed_documents(&["first chunk".to_string(), "second chunk".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0], vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn test_embed_query_uses_query_input_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embed"))
        .and(body_partial_json(json!({
            "input_type": "search_query",
            "texts": ["what is revenue?"]
        })))
        .respond_with(EchoEmbeddings)
        .expect(1)
        .mount(&server)
        .await;

    let vector = embeddings_for(&server)
        .embed_query("what is revenue?")
        .await
        .unwrap();
    assert_eq!(vector.len(), 3);
}

#[tokio::test]
async fn test_large_inputs_are_split_into_sub_batches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embed"))
        .respond_with(EchoEmbeddings)
        .expect(3)
        .mount(&server)
        .await;

    let texts: Vec<String> = (0..200).map(|i| format!("chunk {i}")).collect();
    let vectors = embeddings_for(&server)
        .embed_documents(&texts)
        .await
        .unwrap();

    assert_eq!(vectors.len(), 200);
}

#[tokio::test]
async fn test_embed_rate_limit_maps_to_embedding_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embed"))
        .respond_with(ResponseTemplate::new(429).set_body_string("trial key limit"))
        .mount(&server)
        .await;

    let err = embeddings_for(&server)
        .embed_documents(&["text".to_string()])
        .await
        .unwrap_err();

    match err {
        AppError::Embedding(message) => {
            assert!(message.contains("429"));
            assert!(message.contains("trial key limit"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_embed_rejects_wrong_dimension() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.1, 0.2]] })),
        )
        .mount(&server)
        .await;

    let err = embeddings_for(&server)
        .embed_documents(&["text".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Embedding(_)));
}

#[tokio::test]
async fn test_embed_rejects_missing_vectors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.1, 0.2, 0.3]] })),
        )
        .mount(&server)
        .await;

    let err = embeddings_for(&server)
        .embed_documents(&["one".to_string(), "two".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Embedding(_)));
}

#[tokio::test]
async fn test_chat_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "command-r",
            "message": "What was revenue?",
            "preamble": "Answer from the documents.",
            "documents": [{ "text": "Revenue was 4M.", "source": "report.pdf" }]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "text": "Revenue was 4M.", "generation_id": "g-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let answer = chat_for(&server)
        .generate_grounded(
            "Answer from the documents.",
            "What was revenue?",
            &[GroundingDocument {
                text: "Revenue was 4M.".into(),
                source: "report.pdf".into(),
            }],
        )
        .await
        .unwrap();

    assert_eq!(answer, "Revenue was 4M.");
}

#[tokio::test]
async fn test_chat_without_documents_omits_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(|request: &Request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
            let text = if body.get("documents").is_some() {
                "documents sent"
            } else {
                "no documents"
            };
            ResponseTemplate::new(200).set_body_json(json!({ "text": text }))
        })
        .mount(&server)
        .await;

    let answer = chat_for(&server)
        .generate_grounded("system", "hello", &[])
        .await
        .unwrap();
    assert_eq!(answer, "no documents");
}

#[tokio::test]
async fn test_chat_failure_maps_to_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream error"))
        .mount(&server)
        .await;

    let err = chat_for(&server)
        .generate_grounded("system", "hello", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Generation(_)));
}
