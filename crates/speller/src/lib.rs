//! Client for the Yandex Speller JSON API.
//!
//! Sends text to `checkText` and applies the first suggestion of every
//! reported misspelling. Long texts are checked in batches that stay under
//! the service's per-request limit.

use async_trait::async_trait;
use croco_core::{apply_corrections, Correction, Error, Result, Speller};
use reqwest::Client;
use std::time::Duration;

/// Public Yandex Speller endpoint.
pub const DEFAULT_BASE_URL: &str = "https://speller.yandex.net/services/spellservice.json";

/// Languages checked by default.
pub const DEFAULT_LANG: &str = "ru,en";

/// Largest text the service accepts in one request, in characters.
pub const MAX_REQUEST_CHARS: usize = 10_000;

/// Settings for [`YandexSpeller`].
#[derive(Debug, Clone)]
pub struct SpellerConfig {
    pub base_url: String,
    pub lang: String,
    /// Bit flags understood by the service (0 for defaults).
    pub options: u32,
    pub timeout: Duration,
}

impl Default for SpellerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            lang: DEFAULT_LANG.to_string(),
            options: 0,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Speller backed by the Yandex Speller web service.
#[derive(Debug, Clone)]
pub struct YandexSpeller {
    client: Client,
    config: SpellerConfig,
}

impl YandexSpeller {
    /// Create a speller from configuration.
    pub fn new(config: SpellerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::SpellerError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: SpellerConfig {
                base_url: config.base_url.trim_end_matches('/').to_owned(),
                ..config
            },
        })
    }

    /// Ask the service for the misspellings in one batch.
    async fn check_text(&self, text: &str) -> Result<Vec<Correction>> {
        let url = format!("{}/checkText", self.config.base_url);
        let options = self.config.options.to_string();
        let params = [
            ("text", text),
            ("lang", self.config.lang.as_str()),
            ("options", options.as_str()),
            ("format", "plain"),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::SpellerError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::SpellerError(format!(
                "checkText returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::SpellerError(format!("Unreadable response: {}", e)))
    }
}

#[async_trait]
impl Speller for YandexSpeller {
    async fn spelled(&self, text: &str) -> Result<String> {
        let batches = split_batches(text, MAX_REQUEST_CHARS);
        log::debug!("spell checking {} chars in {} batches", text.len(), batches.len());

        let mut corrected = Vec::with_capacity(batches.len());
        for batch in &batches {
            let corrections = self.check_text(batch).await?;
            log::debug!("speller reported {} corrections", corrections.len());
            corrected.push(apply_corrections(batch, &corrections));
        }

        Ok(corrected.join(" "))
    }
}

/// Split text at spaces into batches of at most `max_chars` characters.
///
/// A single word longer than `max_chars` forms its own batch.
fn split_batches(text: &str, max_chars: usize) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for word in text.split(' ') {
        let word_chars = word.chars().count();
        if current_chars > 0 && current_chars + 1 + word_chars > max_chars {
            batches.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }
    if !current.is_empty() || batches.is_empty() {
        batches.push(current);
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type SeenForms = Arc<Mutex<Vec<HashMap<String, String>>>>;

    /// Reports every "малако" in the text as a misspelling of "молоко".
    async fn fake_check_text(
        State(seen): State<SeenForms>,
        Form(form): Form<HashMap<String, String>>,
    ) -> Json<Value> {
        let text = form.get("text").cloned().unwrap_or_default();
        seen.lock().unwrap().push(form);

        let mut corrections = Vec::new();
        let mut pos = 0;
        for word in text.split(' ') {
            if word == "малако" {
                corrections.push(json!({
                    "code": 1, "pos": pos, "row": 0, "col": pos, "len": 6,
                    "word": word, "s": ["молоко", "малоко"]
                }));
            }
            pos += word.chars().count() + 1;
        }
        Json(Value::Array(corrections))
    }

    /// Serve `router` on a free local port; returns the speller base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/speller/", addr)
    }

    async fn fake_speller() -> (YandexSpeller, SeenForms) {
        let seen = SeenForms::default();
        let router = Router::new()
            .route("/speller/checkText", post(fake_check_text))
            .with_state(seen.clone());
        let speller = YandexSpeller::new(SpellerConfig {
            base_url: serve(router).await,
            ..SpellerConfig::default()
        })
        .unwrap();
        (speller, seen)
    }

    #[tokio::test]
    async fn test_spelled_posts_form_and_applies_corrections() {
        let (speller, seen) = fake_speller().await;

        let text = speller.spelled("малако кот малако").await.unwrap();

        assert_eq!(text, "молоко кот молоко");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["text"], "малако кот малако");
        assert_eq!(seen[0]["lang"], "ru,en");
        assert_eq!(seen[0]["options"], "0");
        assert_eq!(seen[0]["format"], "plain");
    }

    #[tokio::test]
    async fn test_spelled_checks_long_text_in_batches() {
        let (speller, seen) = fake_speller().await;
        // 2000 words of 6 characters: 13 999 characters in total.
        let text = vec!["малако"; 2000].join(" ");

        let corrected = speller.spelled(&text).await.unwrap();

        assert_eq!(corrected, vec!["молоко"; 2000].join(" "));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen
            .iter()
            .all(|form| form["text"].chars().count() <= MAX_REQUEST_CHARS));
    }

    #[tokio::test]
    async fn test_service_failure_is_a_speller_error() {
        let router = Router::new().route(
            "/speller/checkText",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let speller = YandexSpeller::new(SpellerConfig {
            base_url: serve(router).await,
            ..SpellerConfig::default()
        })
        .unwrap();

        let result = speller.spelled("малако").await;
        assert!(matches!(result, Err(Error::SpellerError(message)) if message.contains("500")));
    }

    #[test]
    fn test_split_batches_short_text_is_one_batch() {
        assert_eq!(split_batches("кот пёс", 100), vec!["кот пёс"]);
        assert_eq!(split_batches("", 100), vec![""]);
    }

    #[test]
    fn test_split_batches_respects_limit() {
        let batches = split_batches("aaa bbb ccc ddd", 7);
        assert_eq!(batches, vec!["aaa bbb", "ccc ddd"]);
        assert!(batches.iter().all(|b| b.chars().count() <= 7));
    }

    #[test]
    fn test_split_batches_counts_characters_not_bytes() {
        // Six Cyrillic words of three letters: 23 characters, 41 bytes.
        let text = "кот пёс ёжь лис бык рак";
        assert_eq!(split_batches(text, 23), vec![text]);
    }

    #[test]
    fn test_split_batches_oversized_word_stands_alone() {
        assert_eq!(
            split_batches("ab abcdefgh cd", 4),
            vec!["ab", "abcdefgh", "cd"]
        );
    }

    #[test]
    fn test_batches_rejoin_to_original() {
        let text = (0..5000).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let batches = split_batches(&text, MAX_REQUEST_CHARS);
        assert!(batches.len() > 1);
        assert_eq!(batches.join(" "), text);
    }

    #[test]
    fn test_service_response_decodes_into_corrections() {
        let body = r#"[
            {"code":1,"pos":0,"row":0,"col":0,"len":6,"word":"малако","s":["молоко","малоко"]},
            {"code":1,"pos":7,"row":0,"col":7,"len":4,"word":"qwzx","s":[]}
        ]"#;
        let corrections: Vec<Correction> = serde_json::from_str(body).unwrap();

        assert_eq!(corrections.len(), 2);
        assert_eq!(corrections[0].suggestions[0], "молоко");
        assert_eq!(apply_corrections("малако qwzx", &corrections), "молоко qwzx");
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let speller = YandexSpeller::new(SpellerConfig {
            base_url: "http://localhost:9/speller/".to_string(),
            ..SpellerConfig::default()
        })
        .unwrap();
        assert_eq!(speller.config.base_url, "http://localhost:9/speller");
    }
}
