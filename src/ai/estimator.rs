use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::MacroSet;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODEL: &str = "gpt-4-0613";

const SYSTEM_PROMPT: &str =
    "You are a nutrition expert who provides food macro information in JSON format.";

/// Estimates the macro content of a free-text food description.
#[async_trait]
pub trait MacroEstimator: Send + Sync {
    /// An empty item or an absent quantity short-circuits to a zero-filled
    /// result; this is the deliberate path for incomplete rows, not an error.
    async fn estimate(
        &self,
        item: &str,
        quantity: Option<f64>,
        unit: &str,
        brand_info: Option<&str>,
    ) -> Result<MacroSet>;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    functions: Vec<FunctionSpec>,
    function_call: FunctionCallRef,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct FunctionSpec {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct FunctionCallRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    /// JSON-encoded string holding the estimated values.
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct MacroArguments {
    fats: f64,
    carbohydrates: f64,
    fiber: f64,
    proteins: f64,
    calories: f64,
}

pub struct OpenAiEstimator {
    client: Client,
    api_key: String,
}

impl OpenAiEstimator {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, api_key }
    }
}

fn build_request(item: &str, quantity: f64, unit: &str, brand_info: Option<&str>) -> ChatRequest {
    let mut user_message = format!(
        "Estimate the fat, carbohydrates, fiber, proteins, and calories for {} {} of {}.",
        quantity, unit, item
    );
    if let Some(brand) = brand_info {
        user_message.push_str(&format!(" (brand information: {})", brand));
    }

    ChatRequest {
        model: OPENAI_MODEL.to_string(),
        messages: vec![
            Message {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: user_message,
            },
        ],
        functions: vec![FunctionSpec {
            name: "provide_macros".to_string(),
            description: "Provides the macronutrient breakdown for a given food item".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "fats": {
                        "type": "number",
                        "description": "The amount of fats in grams"
                    },
                    "carbohydrates": {
                        "type": "number",
                        "description": "The amount of carbohydrates in grams"
                    },
                    "fiber": {
                        "type": "number",
                        "description": "The amount of fiber in grams"
                    },
                    "proteins": {
                        "type": "number",
                        "description": "The amount of proteins in grams"
                    },
                    "calories": {
                        "type": "number",
                        "description": "The amount of calories"
                    }
                },
                "required": ["fats", "carbohydrates", "fiber", "proteins", "calories"]
            }),
        }],
        function_call: FunctionCallRef {
            name: "provide_macros".to_string(),
        },
    }
}

fn macros_from_response(response: ChatResponse) -> Result<MacroSet> {
    let arguments = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.function_call)
        .map(|call| call.arguments)
        .ok_or_else(|| AppError::OpenAiApi("No function call in response".to_string()))?;

    let macros: MacroArguments = serde_json::from_str(&arguments)?;

    // Fiber is subtracted out and never surfaced separately
    Ok(MacroSet {
        carbs: macros.carbohydrates - macros.fiber,
        fats: macros.fats,
        proteins: macros.proteins,
        calories: macros.calories,
    })
}

#[async_trait]
impl MacroEstimator for OpenAiEstimator {
    async fn estimate(
        &self,
        item: &str,
        quantity: Option<f64>,
        unit: &str,
        brand_info: Option<&str>,
    ) -> Result<MacroSet> {
        let Some(quantity) = quantity else {
            return Ok(MacroSet::ZERO);
        };
        if item.is_empty() {
            return Ok(MacroSet::ZERO);
        }

        let request = build_request(item, quantity, unit, brand_info);

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::OpenAiApi(format!("API error: {}", error_text)));
        }

        let chat_response: ChatResponse = response.json().await?;
        macros_from_response(chat_response)
    }
}
