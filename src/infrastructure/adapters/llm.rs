//! LLM Seed Generator - OpenAI 兼容的 Chat Completions 接口
//!
//! POST {url}/chat/completions
//! 模型被要求只返回 JSON 字符串数组，解析时容忍代码块包裹和列表格式

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http_support::{build_client, map_reqwest_error, read_json, trim_base, USER_AGENT};
use crate::application::ports::{ProviderError, SeedGeneratorPort};
use crate::config::LlmConfig;

const SERVICE: &str = "LLM";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// 提示词里附带的曲库艺术家上限
const LIBRARY_SAMPLE: usize = 50;

/// 回退解析时单个名称的最大长度
const MAX_NAME_CHARS: usize = 60;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

fn system_prompt(max_seeds: usize) -> String {
    format!(
        "You are a music discovery assistant. Given a listener's request, suggest up to {} \
         real recording artists that best match it. Respond with a JSON array of artist names \
         only, for example [\"Artist One\", \"Artist Two\"]. Do not add commentary.",
        max_seeds
    )
}

fn user_prompt(prompt: &str, library_names: &[String]) -> String {
    if library_names.is_empty() {
        return prompt.trim().to_string();
    }
    let sample: Vec<&str> = library_names
        .iter()
        .take(LIBRARY_SAMPLE)
        .map(String::as_str)
        .collect();
    format!(
        "{}\n\nArtists already in my library (prefer artists that are not listed): {}",
        prompt.trim(),
        sample.join(", ")
    )
}

/// 从模型回复中提取艺术家名称
fn parse_artist_list(content: &str, max_seeds: usize) -> Vec<String> {
    let content = content.trim();

    let from_json = content
        .find('[')
        .zip(content.rfind(']'))
        .filter(|(start, end)| start < end)
        .and_then(|(start, end)| serde_json::from_str::<Vec<String>>(&content[start..=end]).ok());

    let names = match from_json {
        Some(names) => names,
        None => parse_lines(content),
    };

    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .take(max_seeds)
        .collect()
}

/// 回退：逐行解析
///
/// 有列表标记（"1." / "2)" / "-" / "*"）时只取标记行；否则取每一行。
/// 以冒号结尾的引导语和过长的句子都不当作名称。
fn parse_lines(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .collect();
    let marked: Vec<&str> = lines.iter().filter_map(|line| list_item(line)).collect();
    let candidates = if marked.is_empty() { lines } else { marked };

    candidates
        .into_iter()
        .map(|line| line.trim_matches(|c| c == '"' || c == '*').trim())
        .filter(|name| is_plausible_name(name))
        .map(str::to_string)
        .collect()
}

fn list_item(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < line.len() {
        return rest.strip_prefix(['.', ')']).map(str::trim);
    }
    line.strip_prefix(['-', '*', '•']).map(str::trim)
}

fn is_plausible_name(name: &str) -> bool {
    !name.is_empty() && !name.ends_with(':') && name.chars().count() <= MAX_NAME_CHARS
}

/// OpenAI 兼容种子生成器
pub struct OpenAiSeedGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_seeds: usize,
}

impl OpenAiSeedGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self, ProviderError> {
        let base_url = if config.url.trim().is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            trim_base(config.url.trim())
        };
        Ok(Self {
            client: build_client(config.timeout_secs, USER_AGENT)?,
            base_url,
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            max_seeds: config.max_seed_artists.max(1),
        })
    }
}

#[async_trait]
impl SeedGeneratorPort for OpenAiSeedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        library_names: &[String],
    ) -> Result<Vec<String>, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(self.max_seeds),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(prompt, library_names),
                },
            ],
            temperature: 0.7,
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_reqwest_error(SERVICE, e))?;
        let reply: ChatResponse = read_json(SERVICE, response).await?;

        let content = reply
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("LLM returned no choices".to_string()))?;

        let seeds = parse_artist_list(&content, self.max_seeds);
        tracing::debug!(model = %self.model, seeds = seeds.len(), "LLM seeds parsed");
        Ok(seeds)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
