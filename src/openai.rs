//! Script generation through an OpenAI-compatible chat-completions endpoint.
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, info};

use crate::config::OpenAi;
use crate::error::{Error, Result, Service};

/// Produces a markdown script for a video.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    async fn write_script(&self, title: &str, description: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    settings: OpenAi,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.settings.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(api_key: String, settings: OpenAi) -> anyhow::Result<Self> {
        let base = Url::parse(&settings.base_url).context("invalid openai.base_url")?;
        let endpoint = base
            .join("chat/completions")
            .context("invalid openai.base_url")?;
        let http = Client::builder()
            .user_agent("notion-scriptbot/0.1")
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            http,
            endpoint,
            api_key,
            settings,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ScriptWriter for OpenAiClient {
    async fn write_script(&self, title: &str, description: &str) -> Result<String> {
        let body = build_chat_request(&self.settings, title, description);
        debug!(url=%self.endpoint, model=%self.settings.model, "requesting script");

        let res = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| Error::Transport {
                service: Service::OpenAi,
                source,
            })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Status {
                service: Service::OpenAi,
                status,
                body,
            });
        }

        let text = res.text().await.map_err(|source| Error::Transport {
            service: Service::OpenAi,
            source,
        })?;
        let script = parse_completion(&text)?;
        info!(title, chars = script.chars().count(), "generated script");
        debug!(title, %script, "script body");
        Ok(script)
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Content of the first choice.
pub fn parse_completion(body: &str) -> Result<String> {
    let completion: ChatCompletion = serde_json::from_str(body).map_err(|source| Error::Decode {
        service: Service::OpenAi,
        source,
    })?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::Unexpected("OpenAI returned no completion content".into()))
}

pub fn build_chat_request(settings: &OpenAi, title: &str, description: &str) -> Value {
    json!({
        "model": settings.model,
        "messages": [
            { "role": "system", "content": writer_role() },
            { "role": "system", "content": channel_role(settings) },
            { "role": "user", "content": build_prompt(title, description) },
        ],
        "max_tokens": settings.max_tokens,
        "temperature": settings.temperature,
    })
}

fn writer_role() -> &'static str {
    "You are an expert YouTube script writer who creates engaging, well-structured video scripts \
     with proper markdown formatting that maximize viewer retention and engagement. Always write \
     complete dialogue and full scripts, never just outlines or bullet points."
}

fn channel_role(settings: &OpenAi) -> String {
    format!(
        "I have a YouTube channel named '{}' that focuses on {}. Please tailor the script to fit this niche.",
        settings.channel_name, settings.channel_niche
    )
}

/// User prompt for one video. The description line is left out when empty.
pub fn build_prompt(title: &str, description: &str) -> String {
    let context = if description.trim().is_empty() {
        String::new()
    } else {
        format!("Additional Context: {}\n", description.trim())
    };

    format!(
        r#"Create a detailed, engaging YouTube video script for the following video:

Title: {title}
{context}
Please structure the script with markdown formatting using the following sections:

# Video Script: {title}

## 🎯 Hook (0-15 seconds)
[Write an attention-grabbing opening that hooks viewers immediately]

## 👋 Introduction & Welcome
[Channel introduction and video overview]

## 📋 Main Content
### Section 1: [Topic Name]
[Main content broken into clear subsections]

### Section 2: [Topic Name]
[Continue with additional sections as needed]

### Section 3: [Topic Name]
[Add more sections based on the topic]

## 📞 Call-to-Action
[Subscribe, like, comment reminders]

## 👋 Outro
[Closing remarks and next video teasers]

---

**Formatting Guidelines:**
- Use markdown headers (##, ###) for sections
- Use **bold** for emphasis on key points
- Use [brackets] for visual/B-roll suggestions
- Include natural conversation flow
- Add retention hooks between sections
- Make it conversational and engaging
- Target 8-12 minutes of speaking content
- Include specific talking points, not just outlines

**Content Requirements:**
- Make it specific to the topic, not generic
- Include concrete examples and actionable advice
- Add personal touches and storytelling elements
- Include viewer engagement questions
- Provide clear value propositions
- Make some jokes or light-hearted comments to keep it fun
- Use a friendly, approachable tone
- Give code snippets or examples for programming topics

Generate the complete script with full dialogue, not just bullet points or outlines.
"#
    )
}

/// Script written back in place of a real one when generation fails.
pub fn fallback_script(err: &Error) -> String {
    format!(
        "# Error Generating Script\n\n**Error:** {}\n\nPlease check your OpenAI API key and try again.",
        err
    )
}
