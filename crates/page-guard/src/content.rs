//! 콘텐츠 생성 — 수정 전략이 사용하는 텍스트 생성 능력
//!
//! [`ContentGenerator`]는 모델 응답을 구조화된 [`GeneratedContent`]
//! (`text` + `confidence`)로 반환합니다. 자동화 가능 여부를 모델의 산문에서
//! 역파싱하지 않습니다 — 자동화 신뢰도 판단은 분류기의 숫자 메트릭에서만
//! 내려집니다.
//!
//! 생성 실패는 best-effort로 취급됩니다: 전략의 결과가 `failed`로
//! 강등될 뿐, 컨트롤 루프 밖으로 전파되지 않습니다.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PageGuardError;

/// 생성 요청의 목적
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentPurpose {
    /// 새 게시물 제안
    PostSuggestion,
    /// 저품질 콘텐츠 재작성
    Rewrite,
    /// 게시 일정/구성 조언
    ScheduleAdvice,
}

impl ContentPurpose {
    /// 프롬프트 구성에 사용하는 목적 설명을 반환합니다.
    fn instruction(&self) -> &'static str {
        match self {
            Self::PostSuggestion => {
                "Write one short, engaging social media post for this page."
            }
            Self::Rewrite => {
                "Rewrite the given post to be clearer and more engaging. Keep the original intent."
            }
            Self::ScheduleAdvice => {
                "Suggest an improved posting mix for this page in one short paragraph."
            }
        }
    }
}

/// 콘텐츠 생성 요청
#[derive(Debug, Clone)]
pub struct ContentRequest {
    /// 대상 페이지 이름
    pub page_name: String,
    /// 생성 목적
    pub purpose: ContentPurpose,
    /// 추가 컨텍스트 (기존 게시물, 메트릭 요약 등)
    pub context: String,
}

/// 생성 결과 — 구조화된 텍스트 + 신뢰도
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// 생성된 텍스트
    pub text: String,
    /// 생성기 자체의 신뢰도 (0-1)
    pub confidence: f64,
}

/// 텍스트 생성 능력 trait
///
/// 프로덕션 구현은 [`ApiContentGenerator`], 테스트는 mock을 사용합니다.
pub trait ContentGenerator: Send + Sync + 'static {
    /// 요청에 대한 텍스트를 생성합니다.
    fn generate(
        &self,
        request: &ContentRequest,
    ) -> impl Future<Output = Result<GeneratedContent, PageGuardError>> + Send;
}

// --- chat-completions 호환 요청/응답 페이로드 ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// chat-completions 호환 API 기반 생성기
///
/// 생성기 신뢰도는 응답 길이에 따른 고정 규칙으로 산정합니다
/// (빈 응답 0.0, 비정상적으로 짧은 응답 0.5, 그 외 0.9).
/// 모델 산문에서 수치를 파싱하지 않습니다.
pub struct ApiContentGenerator {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: Option<String>,
}

impl ApiContentGenerator {
    /// 새 생성기를 만듭니다.
    ///
    /// API 키는 `api_key_env` 환경변수에서 읽으며, 없으면 요청 시점에
    /// `ContentGeneration` 에러를 반환합니다 (부팅은 막지 않음).
    pub fn new(
        api_base: impl Into<String>,
        model: impl Into<String>,
        api_key_env: &str,
        request_timeout: Duration,
    ) -> Result<Self, PageGuardError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PageGuardError::ContentGeneration(format!("http client: {e}")))?;

        let api_key = std::env::var(api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(
                env = api_key_env,
                "content api key not set, generation will fail until provided"
            );
        }

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            model: model.into(),
            api_key,
        })
    }

    fn score_confidence(text: &str) -> f64 {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            0.0
        } else if trimmed.len() < 20 {
            0.5
        } else {
            0.9
        }
    }
}

impl ContentGenerator for ApiContentGenerator {
    async fn generate(&self, request: &ContentRequest) -> Result<GeneratedContent, PageGuardError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PageGuardError::ContentGeneration("content api key not configured".to_owned())
        })?;

        let prompt = format!(
            "{}\n\nPage: {}\nContext: {}",
            request.purpose.instruction(),
            request.page_name,
            request.context,
        );
        debug!(page = %request.page_name, purpose = ?request.purpose, "requesting content generation");

        let payload = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/chat/completions", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PageGuardError::ContentGeneration(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageGuardError::ContentGeneration(format!(
                "generation endpoint returned http {status}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PageGuardError::ContentGeneration(format!("malformed response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                PageGuardError::ContentGeneration("response contained no choices".to_owned())
            })?;

        let confidence = Self::score_confidence(&text);
        Ok(GeneratedContent { text, confidence })
    }
}

/// 테스트용 Mock 콘텐츠 생성기
#[cfg(test)]
#[derive(Default)]
pub struct MockContentGenerator {
    /// 반환할 텍스트 (None이면 실패)
    pub response: Option<String>,
}

#[cfg(test)]
impl MockContentGenerator {
    /// 고정 응답을 반환하는 mock을 생성합니다.
    pub fn with_response(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
        }
    }

    /// 항상 실패하는 mock을 생성합니다.
    pub fn failing() -> Self {
        Self { response: None }
    }
}

#[cfg(test)]
impl ContentGenerator for MockContentGenerator {
    async fn generate(&self, _request: &ContentRequest) -> Result<GeneratedContent, PageGuardError> {
        match &self.response {
            Some(text) => Ok(GeneratedContent {
                text: text.clone(),
                confidence: 0.9,
            }),
            None => Err(PageGuardError::ContentGeneration(
                "mock generation failure".to_owned(),
            )),
        }
    }
}
