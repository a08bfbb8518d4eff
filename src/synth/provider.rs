//! Chat-completions provider abstraction shared by the translator and the
//! synthesis gateway.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::{BriefError, Result};

/// Bounded request to the generative collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmRequest {
    pub role_context: String,
    pub instructions: String,
    pub evidence_text: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl LlmRequest {
    /// User message: instructions followed by the evidence block.
    pub fn user_message(&self) -> String {
        if self.evidence_text.trim().is_empty() {
            self.instructions.clone()
        } else {
            format!("{}\n\n{}", self.instructions, self.evidence_text)
        }
    }
}

/// Low-level provider: does a *real* remote call (or pretends to).
pub trait LlmProvider: Send + Sync + 'static {
    fn complete<'a>(
        &'a self,
        req: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynProvider = Arc<dyn LlmProvider>;

impl<T: LlmProvider + ?Sized> LlmProvider for Arc<T> {
    fn complete<'a>(
        &'a self,
        req: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        (**self).complete(req)
    }
    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Factory: build a provider according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock` or `provider = "mock"`, returns a deterministic mock.
/// * Else if `enabled == false`, returns a disabled provider.
/// * Else builds the OpenAI-compatible provider; a missing key is a
///   `BriefError::Config` and the caller decides to run without AI.
pub fn build_provider(cfg: &AiConfig) -> Result<DynProvider> {
    let test_mode = std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false);
    if test_mode || cfg.provider == "mock" {
        return Ok(Arc::new(MockProvider::fixed("- Markets were mixed (mock).")));
    }
    if !cfg.enabled {
        return Ok(Arc::new(DisabledProvider));
    }
    match cfg.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(cfg)?)),
        other => Err(BriefError::Config(format!("unsupported ai provider: {other}"))),
    }
}

/// OpenAI-compatible Chat Completions provider.
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(cfg: &AiConfig) -> Result<Self> {
        let api_key = cfg.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("daily-brief/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| BriefError::Config(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            model: cfg.model.clone(),
            endpoint: format!("{}/chat/completions", cfg.base_url),
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}
#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}
#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

impl LlmProvider for OpenAiProvider {
    fn complete<'a>(
        &'a self,
        req: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let user = req.user_message();
            let body = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: &req.role_context,
                    },
                    Msg {
                        role: "user",
                        content: &user,
                    },
                ],
                temperature: req.temperature,
                max_tokens: req.max_output_tokens,
            };

            let resp = self
                .http
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(BriefError::Transport(format!("chat completions: HTTP {status}")));
            }
            let parsed: Resp = resp
                .json()
                .await
                .map_err(|e| BriefError::Parse(format!("chat completions body: {e}")))?;

            if let Some(u) = &parsed.usage {
                tracing::debug!(
                    target: "synthesis",
                    prompt_tokens = u.prompt_tokens,
                    completion_tokens = u.completion_tokens,
                    total_tokens = u.total_tokens,
                    "token usage"
                );
            }

            Ok(parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default())
        })
    }
    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Used when AI is disabled: every call is a `Config` error, which callers degrade.
pub struct DisabledProvider;

impl LlmProvider for DisabledProvider {
    fn complete<'a>(
        &'a self,
        _req: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async { Err(BriefError::Config("ai provider disabled".into())) })
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic provider for tests/local runs: answers from a closure.
pub struct MockProvider {
    answer: Box<dyn Fn(&LlmRequest) -> Result<String> + Send + Sync>,
}

impl MockProvider {
    pub fn new(answer: impl Fn(&LlmRequest) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            answer: Box::new(answer),
        }
    }

    pub fn fixed(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }
}

impl LlmProvider for MockProvider {
    fn complete<'a>(
        &'a self,
        req: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        let out = (self.answer)(req);
        Box::pin(async move { out })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}
