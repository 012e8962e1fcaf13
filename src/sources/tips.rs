//! Daily travel tip generation.
//!
//! Tips come from a chat-completion model prompted with the user's trip
//! context. Any failure falls back to one of the built-in tips, so
//! generation itself never fails.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::metrics::UpstreamMetrics;

const DEFAULT_TIP_TITLE: &str = "Daily Travel Tip";
const PLAIN_TEXT_TIP_TITLE: &str = "Daily Travel Tip \u{2728}";

const SYSTEM_PROMPT: &str = r#"You are Waylo, a friendly AI travel companion. Generate a short, actionable daily travel tip.

Rules:
- Keep the tip concise (max 2 sentences for the body)
- Be practical and actionable
- Use a warm, encouraging tone
- Include an emoji in the title
- Don't be generic - make it specific and useful
- Vary the topics: packing, budgeting, culture, safety, photography, food, planning, etc.

Format your response as JSON with "title" and "body" fields.
Example: {"title": "Pack Light, Travel Right! 🎒", "body": "Roll your clothes instead of folding to save 30% more space in your luggage."}"#;

const BUILT_IN_TIPS: [(&str, &str); 8] = [
    (
        "Save on Currency Exchange 💰",
        "Use a travel-friendly debit card to avoid foreign transaction fees and get better exchange rates.",
    ),
    (
        "Pack a Power Strip 🔌",
        "One travel adapter + a power strip means you can charge all your devices at once.",
    ),
    (
        "Take Photos of Signs 📸",
        "Snap a photo of your hotel name, metro stops, and street signs to navigate easier without data.",
    ),
    (
        "Roll, Don't Fold! 🎒",
        "Rolling clothes instead of folding saves space and reduces wrinkles in your luggage.",
    ),
    (
        "Eat Where Locals Eat 🍽️",
        "Restaurants full of locals usually offer better food at lower prices than tourist spots.",
    ),
    (
        "Morning is Magic ☀️",
        "Visit popular attractions early morning - fewer crowds and better photos!",
    ),
    (
        "Learn Three Phrases 🗣️",
        "Hello, Thank you, and Excuse me in the local language go a long way in any country.",
    ),
    (
        "Email Yourself Copies 📧",
        "Send yourself photos of passport, insurance, and bookings as backup documents.",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    pub title: String,
    pub body: String,
}

impl Tip {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Trip summary supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripInfo {
    pub destination: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub status: String,
}

/// Prompt context: an active trip wins over a planned one; otherwise a
/// general inspiration tip is requested.
pub fn trip_context(trips: &[TripInfo]) -> String {
    if let Some(active) = trips.iter().find(|t| t.status == "active") {
        return format!(
            "The user is currently traveling to {}. Generate a tip relevant to their current trip - could be about exploring, saving money while traveling, staying safe, making memories, or local customs.",
            active.destination
        );
    }
    if let Some(planning) = trips.iter().find(|t| t.status == "planning") {
        return format!(
            "The user is planning a trip to {} starting on {}. Generate a preparation tip - could be about packing, researching, booking, or getting ready for the trip.",
            planning.destination, planning.start_date
        );
    }
    "The user doesn't have any upcoming trips. Generate a general travel inspiration tip - could be about dreaming destinations, travel planning benefits, or motivation to book their next adventure.".to_string()
}

/// Interpret model output: JSON `{title, body}` when possible, otherwise the
/// whole text becomes the body. Blank output yields `None`.
pub fn parse_tip(content: &str) -> Option<Tip> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }

    #[derive(Deserialize)]
    struct RawTip {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        body: Option<String>,
    }

    match serde_json::from_str::<RawTip>(trimmed) {
        Ok(raw) => Some(Tip::new(
            raw.title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TIP_TITLE.to_string()),
            raw.body
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| content.to_string()),
        )),
        Err(_) => Some(Tip::new(PLAIN_TEXT_TIP_TITLE, trimmed)),
    }
}

/// One of the built-in tips, chosen at random
pub fn default_tip() -> Tip {
    let mut rng = rand::rng();
    let (title, body) = BUILT_IN_TIPS
        .choose(&mut rng)
        .copied()
        .unwrap_or(BUILT_IN_TIPS[0]);
    Tip::new(title, body)
}

#[async_trait]
pub trait TipGenerator: Send + Sync {
    /// Always yields a tip
    async fn generate(&self, trips: &[TripInfo]) -> Tip;
}

/// Built-in tips only; used when no model key is configured
#[derive(Debug, Default)]
pub struct FallbackTipGenerator;

#[async_trait]
impl TipGenerator for FallbackTipGenerator {
    async fn generate(&self, _trips: &[TripInfo]) -> Tip {
        default_tip()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completion client
pub struct ChatTipGenerator {
    client: reqwest::Client,
    completions_url: String,
    api_key: String,
    model: String,
}

impl ChatTipGenerator {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            completions_url: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    async fn complete(&self, context: &str) -> Result<Option<String>, reqwest::Error> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: context,
                },
            ],
            temperature: 0.9,
            max_tokens: 150,
        };

        let response: ChatResponse = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[async_trait]
impl TipGenerator for ChatTipGenerator {
    #[tracing::instrument(name = "tips.generate", skip_all, fields(trips = trips.len()))]
    async fn generate(&self, trips: &[TripInfo]) -> Tip {
        let context = trip_context(trips);

        match self.complete(&context).await {
            Ok(Some(content)) => {
                UpstreamMetrics::record_success("tips");
                parse_tip(&content).unwrap_or_else(default_tip)
            }
            Ok(None) => {
                UpstreamMetrics::record_success("tips");
                tracing::warn!("Tip model returned no content, using built-in tip");
                default_tip()
            }
            Err(e) => {
                UpstreamMetrics::record_failure("tips");
                tracing::warn!(error = %e, "Tip generation failed, using built-in tip");
                default_tip()
            }
        }
    }
}
