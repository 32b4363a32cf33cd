use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use std::time::Instant;
use validator::Validate;

use crate::error::ReadingError;
use crate::models::{ReadingRequest, ReadingResult};
use crate::services::metrics;
use crate::services::prompt;
use crate::services::providers::{ChatMessage, GenerationParams};
use crate::startup::AppState;

const PROVIDER_LABEL: &str = "openai";

/// Upper bound on raw payload bytes included in diagnostic logs.
const RAW_LOG_LIMIT: usize = 2048;

/// Handle `POST /api/reading`.
///
/// Validates the request, builds the prompt pair, invokes the text
/// provider with JSON output requested, and normalizes the reply into the
/// `{cards, overall}` response shape.
#[tracing::instrument(skip(state, payload), fields(card_count))]
pub async fn create_reading(
    State(state): State<AppState>,
    payload: Result<Json<ReadingRequest>, JsonRejection>,
) -> Result<Json<ReadingResult>, ReadingError> {
    let result = process_reading(&state, payload).await;

    match &result {
        Ok(_) => metrics::record_reading_request("ok"),
        Err(e) => metrics::record_reading_request(e.code()),
    }

    result.map(Json)
}

async fn process_reading(
    state: &AppState,
    payload: Result<Json<ReadingRequest>, JsonRejection>,
) -> Result<ReadingResult, ReadingError> {
    let Json(request) = payload.map_err(|e| ReadingError::BadRequest(e.body_text()))?;
    request.validate()?;

    let paired = request.paired_cards();
    tracing::Span::current().record("card_count", paired.len());

    let messages = [
        ChatMessage::system(prompt::SYSTEM_PROMPT),
        ChatMessage::user(prompt::build_user_prompt(&request.question, &paired)),
    ];
    let params = GenerationParams {
        json_output: true,
        ..GenerationParams::default()
    };

    let model = state.config.models.text_model.clone();
    let started = Instant::now();
    let response = state
        .text_provider
        .generate(&messages, &params)
        .await
        .map_err(|e| {
            metrics::record_provider_error(PROVIDER_LABEL, e.error_type());
            tracing::error!(error = %e, "Text provider call failed");
            ReadingError::from(e)
        })?;

    metrics::record_provider_latency(PROVIDER_LABEL, &model, started.elapsed().as_secs_f64());
    metrics::record_tokens(&model, response.input_tokens, response.output_tokens);

    let raw = response.text.ok_or_else(|| {
        tracing::error!("Upstream response carried no extractable text");
        ReadingError::UpstreamFormat
    })?;

    parse_reading(&raw)
}

/// Normalize the raw provider text into a `ReadingResult`.
///
/// Parsing is staged so failures keep distinct codes: invalid JSON is a
/// parse error; valid JSON lacking `cards` or `overall` (or mismatched
/// inside them) is a schema error. The raw payload is logged either way,
/// never relayed as a success.
fn parse_reading(raw: &str) -> Result<ReadingResult, ReadingError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
        tracing::error!(error = %e, raw = %truncate_raw(raw), "Upstream reply is not valid JSON");
        ReadingError::Parse
    })?;

    for field in ["cards", "overall"] {
        if value.get(field).is_none() {
            tracing::error!(raw = %truncate_raw(raw), "Upstream reply is missing `{}`", field);
            return Err(ReadingError::Schema(format!("missing field `{}`", field)));
        }
    }

    serde_json::from_value(value).map_err(|e| {
        tracing::error!(error = %e, raw = %truncate_raw(raw), "Upstream reply does not match the reading schema");
        ReadingError::Schema(e.to_string())
    })
}

fn truncate_raw(raw: &str) -> &str {
    if raw.len() <= RAW_LOG_LIMIT {
        return raw;
    }
    let mut end = RAW_LOG_LIMIT;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_READING: &str = r#"{
        "cards": [
            {
                "name": "The Fool",
                "position": "과거",
                "keywords": ["시작", "모험"],
                "summary": "새로운 출발",
                "reading": "무모해 보여도 첫걸음이 중요합니다."
            }
        ],
        "overall": {"summary": "전체 요약", "advice": "조언"}
    }"#;

    #[test]
    fn parses_valid_reading() {
        let reading = parse_reading(VALID_READING).expect("should parse");
        assert_eq!(reading.cards.len(), 1);
        assert_eq!(reading.cards[0].name, "The Fool");
        assert_eq!(reading.overall.advice, "조언");
    }

    #[test]
    fn non_json_text_is_a_parse_error() {
        let err = parse_reading("the cards are unclear today").unwrap_err();
        assert_eq!(err.code(), "parse_error");
    }

    #[test]
    fn missing_cards_is_a_schema_error() {
        let err = parse_reading(r#"{"overall": {"summary": "s", "advice": "a"}}"#).unwrap_err();
        assert_eq!(err.code(), "schema_error");
    }

    #[test]
    fn missing_overall_is_a_schema_error() {
        let err = parse_reading(r#"{"cards": []}"#).unwrap_err();
        assert_eq!(err.code(), "schema_error");
    }

    #[test]
    fn non_object_json_is_a_schema_error() {
        let err = parse_reading("[1, 2, 3]").unwrap_err();
        assert_eq!(err.code(), "schema_error");
    }

    #[test]
    fn mismatched_cards_shape_is_a_schema_error() {
        let err =
            parse_reading(r#"{"cards": "not a list", "overall": {}}"#).unwrap_err();
        assert_eq!(err.code(), "schema_error");
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let raw = "질".repeat(RAW_LOG_LIMIT);
        let truncated = truncate_raw(&raw);
        assert!(truncated.len() <= RAW_LOG_LIMIT);
        assert!(raw.starts_with(truncated));
    }
}
