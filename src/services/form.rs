use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};

const FORMS_API_URL: &str = "https://forms.googleapis.com/v1/forms";

/// Keeps the logging form's selectable food-item list in sync with the
/// saved-items table. Callers treat failures as best-effort.
#[async_trait]
pub trait FormClient: Send + Sync {
    async fn refresh_item_choices(&self, names: &[String]) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct FormResponse {
    items: Vec<FormItem>,
}

#[derive(Debug, Deserialize)]
struct FormItem {
    #[serde(rename = "itemId")]
    item_id: String,
    #[serde(rename = "questionItem")]
    question_item: Option<QuestionItem>,
}

#[derive(Debug, Deserialize)]
struct QuestionItem {
    question: Question,
}

#[derive(Debug, Deserialize)]
struct Question {
    #[serde(rename = "choiceQuestion")]
    choice_question: Option<serde_json::Value>,
}

pub struct GoogleFormsClient {
    client: Client,
    access_token: String,
    form_id: String,
    // Cache for the list question's item id
    list_item_id: Mutex<Option<String>>,
}

impl GoogleFormsClient {
    pub fn new(access_token: String, form_id: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            access_token,
            form_id,
            list_item_id: Mutex::new(None),
        }
    }

    /// Find the form's first choice question, fetching and caching its id.
    async fn get_list_item_id(&self) -> Result<String> {
        let mut cached = self.list_item_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let response = self
            .client
            .get(format!("{}/{}", FORMS_API_URL, self.form_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::FormsApi(format!("API error: {}", error_text)));
        }

        let form: FormResponse = response.json().await?;

        let item_id = form
            .items
            .into_iter()
            .find(|item| {
                item.question_item
                    .as_ref()
                    .is_some_and(|q| q.question.choice_question.is_some())
            })
            .map(|item| item.item_id)
            .ok_or_else(|| {
                AppError::FormsApi("Form has no choice question to refresh".to_string())
            })?;

        *cached = Some(item_id.clone());
        Ok(item_id)
    }
}

#[async_trait]
impl FormClient for GoogleFormsClient {
    async fn refresh_item_choices(&self, names: &[String]) -> Result<()> {
        let item_id = self.get_list_item_id().await?;

        let options: Vec<_> = names.iter().map(|name| json!({ "value": name })).collect();
        let body = json!({
            "requests": [{
                "updateItem": {
                    "item": {
                        "itemId": item_id,
                        "questionItem": {
                            "question": {
                                "choiceQuestion": {
                                    "type": "DROP_DOWN",
                                    "options": options
                                }
                            }
                        }
                    },
                    "location": { "index": 0 },
                    "updateMask": "questionItem.question.choiceQuestion.options"
                }
            }]
        });

        let response = self
            .client
            .post(format!("{}/{}:batchUpdate", FORMS_API_URL, self.form_id))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::FormsApi(format!("API error: {}", error_text)));
        }

        tracing::debug!("Refreshed form choices with {} saved items", names.len());
        Ok(())
    }
}
