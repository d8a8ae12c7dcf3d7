use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::triage::Triage;

/// Example subject/body pairs offered in the form UI.
pub const EXAMPLES: [(&str, &str); 3] = [
    (
        "Question about API documentation",
        "Hello team, I've been looking at your API docs and I can't find information about rate limits. Could you point me to the right section? Thanks, Developer",
    ),
    (
        "Urgent issue with login page",
        "Support team, Our users are reporting that they can't log in to the system. The page just refreshes without any error message. This is affecting our business operations. Please help ASAP. Regards, Admin",
    ),
    (
        "Team meeting next Tuesday",
        "Hi everyone, Let's have our weekly team meeting next Tuesday at 10am. We'll discuss the Q3 roadmap and project assignments. Let me know if this time works for you. Best, Manager",
    ),
];

#[derive(Clone)]
pub struct AppState {
    triage: Arc<Triage>,
}

impl AppState {
    pub fn new(triage: Triage) -> Self {
        Self {
            triage: Arc::new(triage),
        }
    }
}

/// Build the axum router with all mailroom HTTP endpoints.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/examples", get(examples))
        .route("/api/classify", post(classify))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the given host and port.
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    log::info!("Listening on http://{}:{}", host, port);
    axum::serve(listener, app).await?;
    Ok(())
}

// --- Request / Response types ---

#[derive(Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Serialize)]
pub struct ClassifyResponse {
    /// The markdown report, or the prompt message for blank input
    pub report: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<HashMap<String, f32>>,
}

#[derive(Serialize)]
pub struct ExamplePair {
    pub subject: &'static str,
    pub body: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// --- Handlers ---

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn examples() -> Json<Vec<ExamplePair>> {
    Json(
        EXAMPLES
            .iter()
            .map(|&(subject, body)| ExamplePair { subject, body })
            .collect(),
    )
}

async fn classify(
    State(state): State<AppState>,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.triage.analyze(&req.subject, &req.body) {
        Ok(outcome) => {
            let (intent, confidence, scores) = match outcome.prediction {
                Some(p) => (Some(p.intent), Some(p.confidence), Some(p.scores)),
                None => (None, None, None),
            };
            Ok(Json(ClassifyResponse {
                report: outcome.report,
                intent,
                confidence,
                scores,
            }))
        }
        Err(e) => {
            log::error!("Classification failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// The form page: two fields, example buttons, rendered report panel.
const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Email Intent Classifier</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; color: #1a1a2e; }
  h1 { font-size: 1.5rem; }
  p.desc { color: #555; }
  label { display: block; margin-top: 1rem; font-weight: 600; }
  input, textarea { width: 100%; box-sizing: border-box; padding: 0.5rem; margin-top: 0.25rem; border: 1px solid #ccc; border-radius: 4px; font: inherit; }
  textarea { min-height: 8rem; }
  button { margin-top: 1rem; padding: 0.5rem 1.25rem; border: none; border-radius: 4px; background: #3b5bdb; color: #fff; font: inherit; cursor: pointer; }
  button.example { background: #eee; color: #333; margin-right: 0.5rem; font-size: 0.85rem; }
  #output { margin-top: 1.5rem; padding: 1rem; border: 1px solid #ddd; border-radius: 4px; min-height: 3rem; }
  #output table { border-collapse: collapse; margin-top: 0.5rem; }
  #output td, #output th { border: 1px solid #ccc; padding: 0.25rem 0.75rem; text-align: left; }
</style>
</head>
<body>
<h1>Email Intent Classifier</h1>
<p class="desc">Analyze emails to determine their primary intent or purpose.</p>
<div id="examples"></div>
<label for="subject">Email Subject</label>
<input id="subject" placeholder="Enter the email subject">
<label for="body">Email Body</label>
<textarea id="body" placeholder="Enter the email body"></textarea>
<button id="submit">Classify</button>
<div id="output"></div>
<script>
const el = id => document.getElementById(id);

// Minimal renderer for the report markdown: headings and pipe tables.
function renderMarkdown(md) {
  let html = '';
  let tableRows = [];
  const flush = () => {
    if (!tableRows.length) return;
    html += '<table>' + tableRows.map((cells, i) =>
      '<tr>' + cells.map(c => i === 0 ? '<th>' + c + '</th>' : '<td>' + c + '</td>').join('') + '</tr>'
    ).join('') + '</table>';
    tableRows = [];
  };
  for (const line of md.split('\n')) {
    if (line.startsWith('|')) {
      const cells = line.split('|').slice(1, -1);
      if (!cells.every(c => /^-+$/.test(c))) tableRows.push(cells);
    } else {
      flush();
      if (line.startsWith('### ')) html += '<h3>' + line.slice(4) + '</h3>';
      else if (line.startsWith('## ')) html += '<h2>' + line.slice(3) + '</h2>';
      else if (line.trim()) html += '<p>' + line + '</p>';
    }
  }
  flush();
  return html;
}

async function classify() {
  const resp = await fetch('/api/classify', {
    method: 'POST',
    headers: {'Content-Type': 'application/json'},
    body: JSON.stringify({subject: el('subject').value, body: el('body').value}),
  });
  const data = await resp.json();
  el('output').innerHTML = resp.ok ? renderMarkdown(data.report)
    : '<p>Error: ' + (data.error || resp.status) + '</p>';
}

async function loadExamples() {
  const resp = await fetch('/api/examples');
  const pairs = await resp.json();
  pairs.forEach((pair, i) => {
    const btn = document.createElement('button');
    btn.className = 'example';
    btn.textContent = 'Example ' + (i + 1);
    btn.onclick = () => { el('subject').value = pair.subject; el('body').value = pair.body; };
    el('examples').appendChild(btn);
  });
}

el('submit').onclick = classify;
loadExamples();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierError;
    use crate::labels::LabelSet;
    use crate::report::MISSING_INPUT_PROMPT;
    use crate::triage::IntentScorer;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct StubScorer(Vec<f32>);

    impl IntentScorer for StubScorer {
        fn score(&self, _text: &str) -> Result<Vec<f32>, ClassifierError> {
            Ok(self.0.clone())
        }
    }

    struct FailingScorer;

    impl IntentScorer for FailingScorer {
        fn score(&self, _text: &str) -> Result<Vec<f32>, ClassifierError> {
            Err(ClassifierError::ModelError("session exploded".into()))
        }
    }

    fn test_state(scorer: Arc<dyn IntentScorer>) -> AppState {
        AppState::new(Triage::new(scorer, LabelSet::default_intents()))
    }

    fn classify_request(subject: &str, body: &str) -> Request<Body> {
        let payload = serde_json::json!({"subject": subject, "body": body});
        Request::builder()
            .method("POST")
            .uri("/api/classify")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = router(test_state(Arc::new(StubScorer(vec![1.0; 6]))));
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_serves_form() {
        let app = router(test_state(Arc::new(StubScorer(vec![1.0; 6]))));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_examples_endpoint() {
        let app = router(test_state(Arc::new(StubScorer(vec![1.0; 6]))));
        let req = Request::builder()
            .uri("/api/examples")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_classify_happy_path() {
        let app = router(test_state(Arc::new(StubScorer(vec![
            0.05, 0.05, 0.7, 0.1, 0.05, 0.05,
        ]))));
        let resp = app
            .oneshot(classify_request("Login broken", "Users cannot log in"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["intent"], "problem");
        assert!(json["report"].as_str().unwrap().contains("PROBLEM"));
        assert_eq!(json["scores"].as_object().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_classify_blank_input_returns_prompt() {
        let app = router(test_state(Arc::new(StubScorer(vec![1.0; 6]))));
        let resp = app
            .oneshot(classify_request("", "non-empty body"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["report"], MISSING_INPUT_PROMPT);
        assert!(json.get("intent").is_none() || json["intent"].is_null());
    }

    #[tokio::test]
    async fn test_classify_scorer_failure_is_500() {
        let app = router(test_state(Arc::new(FailingScorer)));
        let resp = app
            .oneshot(classify_request("subject", "body"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("Model error"));
    }
}
