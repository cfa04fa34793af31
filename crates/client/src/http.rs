use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use remember_core::model::{
    Direction, ExamSelection, Progress, Question, QuestionId, QuizMode, SessionId, WordId,
};

use crate::config::QuizServiceConfig;
use crate::error::ApiError;
use crate::quiz_api::{ExamHistoryItem, QuizApi, RetryOptions, StartedExam};

/// Shown when a failure response carries no parseable `detail` body.
const GENERIC_ERROR_DETAIL: &str = "the quiz service request failed";

/// `QuizApi` implementation over the quiz service's JSON/HTTP endpoints.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    config: QuizServiceConfig,
}

impl HttpQuizApi {
    #[must_use]
    pub fn new(config: QuizServiceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build an API from `REMEMBER_WORD_API_URL` / `REMEMBER_WORD_API_TOKEN`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        QuizServiceConfig::from_env().map(Self::new)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url())
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.config.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn ensure_success(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .text()
            .await
            .ok()
            .and_then(|body| serde_json::from_str::<serde_json::Value>(&body).ok())
            .and_then(|value| {
                value
                    .get("detail")
                    .and_then(|detail| detail.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| GENERIC_ERROR_DETAIL.to_string());
        Err(ApiError::Status { status, detail })
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn start(&self, selection: &ExamSelection) -> Result<StartedExam, ApiError> {
        tracing::debug!(groups = selection.group_ids().len(), "starting quiz attempt");
        let response = self
            .authorize(self.client.post(self.url("/quizzes/start")))
            .json(&StartRequest::from(selection))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let body: StartResponseWire = response.json().await?;
        Ok(body.into())
    }

    async fn answer(
        &self,
        session_id: SessionId,
        question_id: QuestionId,
        is_correct: bool,
    ) -> Result<Progress, ApiError> {
        tracing::debug!(%session_id, %question_id, is_correct, "submitting answer");
        let payload = AnswerRequest {
            question_id: question_id.value(),
            // The service accepts free-text answers; self-graded attempts
            // always send null.
            answer: None,
            is_correct,
        };
        let path = format!("/quizzes/{session_id}/answer");
        let response = self
            .authorize(self.client.post(self.url(&path)))
            .json(&payload)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let body: ProgressWire = response.json().await?;
        Ok(body.into())
    }

    async fn retry(
        &self,
        session_id: SessionId,
        options: &RetryOptions,
    ) -> Result<StartedExam, ApiError> {
        tracing::debug!(%session_id, "retrying incorrect questions");
        let path = format!("/quizzes/{session_id}/retry");
        let response = self
            .authorize(self.client.post(self.url(&path)))
            .json(&RetryRequest::from(options))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let body: StartResponseWire = response.json().await?;
        Ok(body.into())
    }

    async fn stop(&self, session_id: SessionId) -> Result<(), ApiError> {
        tracing::debug!(%session_id, "deleting quiz session");
        let path = format!("/quizzes/{session_id}");
        let response = self
            .authorize(self.client.delete(self.url(&path)))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn progress(&self, session_id: SessionId) -> Result<Progress, ApiError> {
        let path = format!("/quizzes/{session_id}/progress");
        let response = self.authorize(self.client.get(self.url(&path))).send().await?;
        let response = Self::ensure_success(response).await?;
        let body: ProgressWire = response.json().await?;
        Ok(body.into())
    }

    async fn history(&self, limit: u32) -> Result<Vec<ExamHistoryItem>, ApiError> {
        let response = self
            .authorize(self.client.get(self.url("/quizzes/history")))
            .query(&[("limit", limit.clamp(1, 100))])
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let body: Vec<HistoryItemWire> = response.json().await?;
        Ok(body.into_iter().map(ExamHistoryItem::from).collect())
    }
}

// Wire payloads, kept private to this boundary. Required and optional
// fields follow the service schema, not whatever happens to deserialize.

#[derive(Debug, Serialize)]
struct StartRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    folder_id: Option<i64>,
    group_id: i64,
    group_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    random: bool,
    direction: Direction,
    mode: QuizMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_star: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    star_values: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    number_start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    number_end: Option<u32>,
}

impl From<&ExamSelection> for StartRequest {
    fn from(selection: &ExamSelection) -> Self {
        Self {
            folder_id: selection.folder_id().map(|id| id.value()),
            group_id: selection.primary_group_id().value(),
            group_ids: selection.group_ids().iter().map(|id| id.value()).collect(),
            profile_id: selection.profile_id().map(|id| id.value()),
            limit: selection.limit(),
            random: selection.random(),
            direction: selection.direction(),
            mode: selection.mode(),
            min_star: selection.min_star(),
            star_values: selection.star_values().to_vec(),
            number_start: selection.number_start(),
            number_end: selection.number_end(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AnswerRequest {
    question_id: i64,
    // Serialized as an explicit null, matching the endpoint contract.
    answer: Option<String>,
    is_correct: bool,
}

#[derive(Debug, Serialize)]
struct RetryRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    question_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    random: Option<bool>,
}

impl From<&RetryOptions> for RetryRequest {
    fn from(options: &RetryOptions) -> Self {
        Self {
            question_ids: options.question_ids.iter().map(|id| id.value()).collect(),
            random: options.random,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuestionWire {
    id: i64,
    word_id: i64,
    position: u32,
    prompt: String,
    answer: String,
    star: u8,
    reading: Option<String>,
}

impl From<QuestionWire> for Question {
    fn from(wire: QuestionWire) -> Self {
        Self {
            id: QuestionId::new(wire.id),
            word_id: WordId::new(wire.word_id),
            position: wire.position,
            prompt: wire.prompt,
            answer: wire.answer,
            star: wire.star,
            reading: wire.reading,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StartResponseWire {
    session_id: i64,
    total: u32,
    direction: Direction,
    questions: Vec<QuestionWire>,
}

impl From<StartResponseWire> for StartedExam {
    fn from(wire: StartResponseWire) -> Self {
        Self {
            session_id: SessionId::new(wire.session_id),
            total: wire.total,
            direction: wire.direction,
            questions: wire.questions.into_iter().map(Question::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProgressWire {
    session_id: i64,
    total: u32,
    answered: u32,
    correct: u32,
    remaining: u32,
    #[serde(default)]
    incorrect_question_ids: Vec<i64>,
}

impl From<ProgressWire> for Progress {
    fn from(wire: ProgressWire) -> Self {
        Self {
            session_id: SessionId::new(wire.session_id),
            total: wire.total,
            answered: wire.answered,
            correct: wire.correct,
            remaining: wire.remaining,
            incorrect_question_ids: wire
                .incorrect_question_ids
                .into_iter()
                .map(QuestionId::new)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryItemWire {
    session_id: i64,
    created_at: DateTime<Utc>,
    folder_name: Option<String>,
    #[serde(default)]
    group_names: Vec<String>,
    total: u32,
    correct: u32,
    incorrect: u32,
    score: f64,
    passed: bool,
}

impl From<HistoryItemWire> for ExamHistoryItem {
    fn from(wire: HistoryItemWire) -> Self {
        Self {
            session_id: SessionId::new(wire.session_id),
            created_at: wire.created_at,
            folder_name: wire.folder_name,
            group_names: wire.group_names,
            total: wire.total,
            correct: wire.correct,
            incorrect: wire.incorrect,
            score: wire.score,
            passed: wire.passed,
        }
    }
}
