//! HTTP surface of the assistant.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Plain-text liveness line |
//! | `GET`  | `/health` | `{"status": "ok", "message": ...}` |
//! | `POST` | `/process_user_input` | Form field `prompt_form_input`, plain-text reply |
//! | `GET`  | `/ui` | `index.html` from the static folder |
//! | `GET`  | `/css/*`, `/js/*`, `/images/*` | Static assets |
//!
//! Pipeline failures never change the status code: the chat endpoint always
//! answers 200 with either `💬 <answer>` or `❌ Error: <message>`.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use pdf_rag_core::{PipelineFactory, RagError, RagService};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const LIVENESS_MESSAGE: &str =
    "✅ PDF RAG assistant is live. POST your question to /process_user_input";

/// Shared state handed to every handler.
pub struct AppState<F: PipelineFactory> {
    pub rag: RagService<F>,
    pub static_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct PromptForm {
    prompt_form_input: String,
}

pub fn router<F>(state: Arc<AppState<F>>) -> Router
where
    F: PipelineFactory + 'static,
{
    let static_dir = state.static_dir.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/process_user_input", post(handle_user_input::<F>))
        .route_service("/ui", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/css", ServeDir::new(static_dir.join("css")))
        .nest_service("/js", ServeDir::new(static_dir.join("js")))
        .nest_service("/images", ServeDir::new(static_dir.join("images")))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn run_server<F>(state: Arc<AppState<F>>, addr: SocketAddr) -> anyhow::Result<()>
where
    F: PipelineFactory + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "http server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn handle_root() -> &'static str {
    LIVENESS_MESSAGE
}

async fn handle_health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "PDF RAG assistant is running",
    }))
}

async fn handle_user_input<F>(
    State(state): State<Arc<AppState<F>>>,
    Form(form): Form<PromptForm>,
) -> String
where
    F: PipelineFactory + 'static,
{
    render_reply(state.rag.answer(&form.prompt_form_input).await)
}

pub fn render_reply(result: Result<String, RagError>) -> String {
    match result {
        Ok(answer) => format!("💬 {answer}"),
        Err(error) => {
            warn!(kind = ?error.kind(), %error, "query failed");
            format!("❌ Error: {error}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pdf_rag_core::{
        CharacterNgramEmbedder, ChatModel, InMemoryVectorStore, LlmError, RagPipeline,
        NO_CONTEXT_PLACEHOLDER,
    };
    use std::fs;
    use tempfile::tempdir;

    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            Ok(prompt.to_string())
        }
    }

    struct DownModel;

    #[async_trait]
    impl ChatModel for DownModel {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Upstream {
                status: 503,
                body: "service unavailable".to_string(),
            })
        }
    }

    struct StubFactory<M> {
        make_model: fn() -> M,
    }

    #[async_trait]
    impl<M: ChatModel + 'static> PipelineFactory for StubFactory<M> {
        type Store = InMemoryVectorStore;
        type Model = M;

        async fn create(&self) -> Result<RagPipeline<Self::Store, Self::Model>, RagError> {
            Ok(RagPipeline::new(
                Arc::new(CharacterNgramEmbedder::default()),
                InMemoryVectorStore::default(),
                (self.make_model)(),
            ))
        }
    }

    async fn spawn_app<M: ChatModel + 'static>(
        make_model: fn() -> M,
        static_dir: PathBuf,
        corpus_dir: PathBuf,
    ) -> String {
        let state = Arc::new(AppState {
            rag: RagService::new(StubFactory { make_model }, corpus_dir),
            static_dir,
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router(state)).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn chat_endpoint_returns_prefixed_answer() {
        let dir = tempdir().expect("tempdir");
        let base = spawn_app(|| EchoModel, dir.path().to_path_buf(), dir.path().to_path_buf()).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/process_user_input"))
            .form(&[("prompt_form_input", "hello")])
            .send()
            .await
            .expect("request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body = response.text().await.expect("body");
        assert!(body.starts_with("💬 "));
        assert!(body.contains(NO_CONTEXT_PLACEHOLDER));
    }

    #[tokio::test]
    async fn pipeline_failures_are_text_with_status_200() {
        let dir = tempdir().expect("tempdir");
        let base = spawn_app(|| DownModel, dir.path().to_path_buf(), dir.path().to_path_buf()).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/process_user_input"))
            .form(&[("prompt_form_input", "what is the travel policy?")])
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body = response.text().await.expect("body");
        assert!(body.starts_with("❌ Error:"), "unexpected body: {body}");
        assert!(body.contains("503"));

        let blank = client
            .post(format!("{base}/process_user_input"))
            .form(&[("prompt_form_input", "   ")])
            .send()
            .await
            .expect("request");
        assert_eq!(blank.status(), reqwest::StatusCode::OK);
        assert!(blank.text().await.expect("body").starts_with("❌ Error:"));
    }

    #[tokio::test]
    async fn missing_corpus_folder_is_reported_not_fatal() {
        let dir = tempdir().expect("tempdir");
        let base = spawn_app(|| EchoModel, dir.path().to_path_buf(), dir.path().join("absent")).await;

        let body = reqwest::Client::new()
            .post(format!("{base}/process_user_input"))
            .form(&[("prompt_form_input", "hello")])
            .send()
            .await
            .expect("request")
            .text()
            .await
            .expect("body");

        assert!(body.starts_with("❌ Error: ingestion failed"), "unexpected body: {body}");
    }

    #[tokio::test]
    async fn health_and_root_report_liveness() {
        let dir = tempdir().expect("tempdir");
        let base = spawn_app(|| EchoModel, dir.path().to_path_buf(), dir.path().to_path_buf()).await;
        let client = reqwest::Client::new();

        let health: serde_json::Value = client
            .get(format!("{base}/health"))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json body");
        assert_eq!(health["status"], "ok");
        assert!(health["message"].is_string());

        let root = client
            .get(format!("{base}/"))
            .send()
            .await
            .expect("request")
            .text()
            .await
            .expect("body");
        assert_eq!(root, LIVENESS_MESSAGE);
    }

    #[tokio::test]
    async fn serves_page_and_static_assets() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("index.html"), "<h1>Assistant</h1>").expect("write index");
        fs::create_dir(dir.path().join("css")).expect("css dir");
        fs::write(dir.path().join("css").join("site.css"), "body { margin: 0; }").expect("write css");
        let base = spawn_app(|| EchoModel, dir.path().to_path_buf(), dir.path().to_path_buf()).await;
        let client = reqwest::Client::new();

        let page = client.get(format!("{base}/ui")).send().await.expect("request");
        assert_eq!(page.status(), reqwest::StatusCode::OK);
        assert_eq!(page.text().await.expect("body"), "<h1>Assistant</h1>");

        let css = client
            .get(format!("{base}/css/site.css"))
            .send()
            .await
            .expect("request");
        assert_eq!(css.status(), reqwest::StatusCode::OK);
        assert_eq!(css.text().await.expect("body"), "body { margin: 0; }");

        let missing = client
            .get(format!("{base}/js/app.js"))
            .send()
            .await
            .expect("request");
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
