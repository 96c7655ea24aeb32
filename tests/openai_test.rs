// OpenAI / Azure chat completions over HTTP, against a mock server

use mockito::{Matcher, Server};
use std::time::Duration;

use blueprint::config::SamplingParams;
use blueprint::providers::{CompletionRequest, LlmProvider, OpenAIProvider, ProviderError, RetryPolicy};

const OK_BODY: &str = r#"{
    "id": "chatcmpl-1",
    "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello there"}, "finish_reason": "stop"}],
    "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
}"#;

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

#[tokio::test]
async fn test_openai_request_and_response() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "gpt-4o-2024-11-20",
            "messages": [{"role": "user", "content": "Say hello"}],
            "top_p": 0.5,
            "max_tokens": 256
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(OK_BODY)
        .expect(1)
        .create_async()
        .await;

    let sampling = SamplingParams {
        top_p: 0.5,
        max_tokens: Some(256),
        ..SamplingParams::default()
    };
    let provider = OpenAIProvider::new_openai("sk-test".into())
        .unwrap()
        .with_base_url(server.url())
        .with_model("gpt-4o-2024-11-20")
        .with_sampling(sampling);

    let completion = provider
        .complete(&CompletionRequest::user("Say hello"))
        .await
        .unwrap();

    assert_eq!(completion.text, "Hello there");
    assert_eq!(completion.usage.prompt_tokens, 12);
    assert_eq!(completion.usage.completion_tokens, 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_azure_url_and_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/openai/deployments/gpt35/chat/completions")
        .match_query(Matcher::UrlEncoded(
            "api-version".into(),
            "2024-02-01".into(),
        ))
        .match_header("api-key", "azure-key")
        .with_status(200)
        .with_body(OK_BODY)
        .create_async()
        .await;

    let provider = OpenAIProvider::new_azure(
        "azure-key".into(),
        server.url(),
        "gpt35".into(),
        "2024-02-01".into(),
    )
    .unwrap();

    let completion = provider
        .complete(&CompletionRequest::user("hi"))
        .await
        .unwrap();
    assert_eq!(completion.text, "Hello there");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .with_body("overloaded")
        .expect(2)
        .create_async()
        .await;

    let provider = OpenAIProvider::new_openai("sk-test".into())
        .unwrap()
        .with_base_url(server.url())
        .with_retry_policy(fast_retry(2));

    let err = provider
        .complete(&CompletionRequest::user("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Api { status: 503, .. }));
    failing.assert_async().await;
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error": {"message": "Incorrect API key"}}"#)
        .expect(1)
        .create_async()
        .await;

    let provider = OpenAIProvider::new_openai("sk-bad".into())
        .unwrap()
        .with_base_url(server.url())
        .with_retry_policy(fast_retry(5));

    let err = provider
        .complete(&CompletionRequest::user("hi"))
        .await
        .unwrap_err();

    match err {
        ProviderError::Api { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Incorrect API key"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .with_header("retry-after", "0")
        .expect(1)
        .create_async()
        .await;

    let provider = OpenAIProvider::new_openai("sk-test".into())
        .unwrap()
        .with_base_url(server.url());

    let err = provider
        .complete_once(&CompletionRequest::user("hi"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProviderError::RateLimited {
            retry_after: Some(0)
        }
    ));
    assert!(err.is_retryable());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_garbage_body_is_invalid_response() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body("<html>proxy error</html>")
        .create_async()
        .await;

    let provider = OpenAIProvider::new_openai("sk-test".into())
        .unwrap()
        .with_base_url(server.url());

    let err = provider
        .complete_once(&CompletionRequest::user("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)));
}
