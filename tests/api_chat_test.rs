//! Integration tests for the chat API endpoint

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use mockito::Matcher;
    use serde_json::json;
    use tower::util::ServiceExt;

    use crate::test_utils::{body_to_string, query_response, sse_body, test_app};

    fn chat_request(transcript: serde_json::Value) -> Request<Body> {
        Request::builder()
            .uri("/api/chat")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(transcript.to_string()))
            .unwrap()
    }

    /// Tests a turn goes embed -> query -> stream and the reply text
    /// arrives unchanged
    #[tokio::test]
    async fn it_streams_completion_for_transcript() {
        let mut server = mockito::Server::new_async().await;
        let embeddings = server
            .mock("POST", "/v1/embeddings")
            .match_body(Matcher::PartialJson(json!({
                "input": "Who teaches algorithms well?"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"index":0,"embedding":[0.1,0.2,0.3]}]}"#)
            .expect(1)
            .create_async()
            .await;
        let query = server
            .mock("POST", "/query")
            .match_body(Matcher::PartialJson(json!({
                "vector": [0.1, 0.2, 0.3],
                "topK": 3,
                "includeMetadata": true,
                "namespace": "ns1",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(query_response(&[
                ("Dr. Ada Byron", "Algorithms", 5.0),
                ("Dr. Alan Church", "Algorithms", 4.0),
                ("Dr. Grace Hopper", "Compilers", 3.0),
            ]))
            .expect(1)
            .create_async()
            .await;
        let completion = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({"model": "gpt-4", "stream": true})),
                Matcher::Regex(String::from("Professor: Dr. Ada Byron")),
                Matcher::Regex(String::from("Professor: Dr. Grace Hopper")),
            ]))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body(&["Try Dr. ", "Ada By", "ron."], true))
            .expect(1)
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(chat_request(json!([
                {"role": "assistant", "content": "Hi! How can I help you today?"},
                {"role": "user", "content": "Who teaches algorithms well?"}
            ])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let body = body_to_string(response.into_body()).await;
        assert_eq!(body, "Try Dr. Ada Byron.");

        embeddings.assert_async().await;
        query.assert_async().await;
        completion.assert_async().await;
    }

    /// Tests an empty retrieval still reaches the completion with an
    /// empty context block
    #[tokio::test]
    async fn it_completes_without_matches() {
        let mut server = mockito::Server::new_async().await;
        let _embeddings = server
            .mock("POST", "/v1/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"index":0,"embedding":[0.1]}]}"#)
            .create_async()
            .await;
        let _query = server
            .mock("POST", "/query")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"matches":[],"namespace":"ns1"}"#)
            .create_async()
            .await;
        let completion = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex(String::from(
                "Returned results from vector db",
            )))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body(&["No professors matched."], true))
            .expect(1)
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(chat_request(json!([
                {"role": "user", "content": "Who teaches underwater basket weaving?"}
            ])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert_eq!(body, "No professors matched.");
        completion.assert_async().await;
    }

    /// Tests an embedding failure is a 500 and nothing else is called
    #[tokio::test]
    async fn it_returns_500_when_embedding_fails() {
        let mut server = mockito::Server::new_async().await;
        let _embeddings = server
            .mock("POST", "/v1/embeddings")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;
        let query = server
            .mock("POST", "/query")
            .expect(0)
            .create_async()
            .await;
        let completion = server
            .mock("POST", "/v1/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(chat_request(json!([
                {"role": "user", "content": "Hello"}
            ])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("503"));
        query.assert_async().await;
        completion.assert_async().await;
    }

    /// Tests a vector index failure is a 500
    #[tokio::test]
    async fn it_returns_500_when_vector_index_fails() {
        let mut server = mockito::Server::new_async().await;
        let _embeddings = server
            .mock("POST", "/v1/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"index":0,"embedding":[0.1]}]}"#)
            .create_async()
            .await;
        let _query = server
            .mock("POST", "/query")
            .with_status(401)
            .with_body(r#"{"code":16,"message":"Invalid API Key"}"#)
            .create_async()
            .await;
        let completion = server
            .mock("POST", "/v1/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(chat_request(json!([
                {"role": "user", "content": "Hello"}
            ])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        completion.assert_async().await;
    }

    /// Tests a completion request rejected upstream is a 500 before
    /// any reply text is sent
    #[tokio::test]
    async fn it_returns_500_when_completion_request_fails() {
        let mut server = mockito::Server::new_async().await;
        let _embeddings = server
            .mock("POST", "/v1/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"index":0,"embedding":[0.1]}]}"#)
            .create_async()
            .await;
        let _query = server
            .mock("POST", "/query")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"matches":[]}"#)
            .create_async()
            .await;
        let completion = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit reached"}}"#)
            .expect(1)
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(chat_request(json!([
                {"role": "user", "content": "Hello"}
            ])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("429"));
        completion.assert_async().await;
    }

    /// Tests a completion that breaks off mid-reply ends the body in
    /// an error rather than a clean end of stream
    #[tokio::test]
    async fn it_errors_body_when_completion_fails_mid_stream() {
        let mut server = mockito::Server::new_async().await;
        let _embeddings = server
            .mock("POST", "/v1/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"index":0,"embedding":[0.1]}]}"#)
            .create_async()
            .await;
        let _query = server
            .mock("POST", "/query")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"matches":[]}"#)
            .create_async()
            .await;
        let _completion = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body(&["Hello"], false))
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(chat_request(json!([
                {"role": "user", "content": "Hello"}
            ])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let result = axum::body::to_bytes(response.into_body(), usize::MAX).await;
        assert!(result.is_err());
    }

    /// Tests an empty transcript is rejected
    #[tokio::test]
    async fn it_returns_400_for_empty_transcript() {
        let app = test_app("http://127.0.0.1:1");

        let response = app.oneshot(chat_request(json!([]))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// Tests a transcript that doesn't end with the user is rejected
    #[tokio::test]
    async fn it_returns_400_when_last_message_is_not_from_user() {
        let app = test_app("http://127.0.0.1:1");

        let response = app
            .oneshot(chat_request(json!([
                {"role": "user", "content": "Hello"},
                {"role": "assistant", "content": "Hi!"}
            ])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// Tests unknown roles are rejected at the boundary
    #[tokio::test]
    async fn it_returns_422_for_unknown_role() {
        let app = test_app("http://127.0.0.1:1");

        let response = app
            .oneshot(chat_request(json!([
                {"role": "moderator", "content": "Hello"}
            ])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
