//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::DiscoveryRequest;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Library DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RefreshLibraryResult {
    pub artist_count: usize,
}

// ============================================================================
// WebSocket 客户端帧
// ============================================================================

/// 客户端帧：`{"action": ..., "data": ...}`
#[derive(Debug, Deserialize)]
pub struct ClientFrame {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

/// 解析后的客户端指令
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Start(DiscoveryRequest),
    Stop,
    LoadMore,
    AddArtist(String),
    RequestArtist(String),
    Preview(String),
    Prehear(String),
    SideBarOpened,
    PersonalSourcesPoll,
}

/// 取字符串，或对象中第一个存在的字符串字段
fn text_of(data: &Value, keys: &[&str]) -> Option<String> {
    match data {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => keys
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

fn required_text(action: &str, data: &Value, keys: &[&str]) -> Result<String, String> {
    text_of(data, keys).ok_or_else(|| format!("{} expects a string payload", action))
}

/// 勾选列表：字符串数组，或 `{"artists": [...]}`
fn selection_of(data: &Value) -> Result<Vec<String>, String> {
    let list = match data {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("artists") {
            Some(Value::Array(items)) => items,
            _ => return Err("start_req expects a list of artists".to_string()),
        },
        Value::Null => return Ok(Vec::new()),
        _ => return Err("start_req expects a list of artists".to_string()),
    };
    Ok(list
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

impl ClientFrame {
    pub fn parse(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("malformed frame: {}", e))
    }

    pub fn into_command(self) -> Result<ClientCommand, String> {
        let action = self.action.as_str();
        let data = &self.data;
        let command = match action {
            "start_req" => ClientCommand::Start(DiscoveryRequest::Selection(selection_of(data)?)),
            "ai_prompt_req" => ClientCommand::Start(DiscoveryRequest::Prompt(
                text_of(data, &["prompt"]).unwrap_or_default(),
            )),
            "search_req" => ClientCommand::Start(DiscoveryRequest::Search(
                text_of(data, &["query", "search"]).unwrap_or_default(),
            )),
            "user_recs_req" => ClientCommand::Start(DiscoveryRequest::PersonalSource(
                text_of(data, &["source"]).unwrap_or_default(),
            )),
            "stop_req" => ClientCommand::Stop,
            "load_more_artists" => ClientCommand::LoadMore,
            "adder" => ClientCommand::AddArtist(required_text(action, data, &["name", "artist"])?),
            "request_artist" => {
                ClientCommand::RequestArtist(required_text(action, data, &["name", "artist"])?)
            }
            "preview_req" => ClientCommand::Preview(required_text(action, data, &["name", "artist"])?),
            "prehear_req" => ClientCommand::Prehear(required_text(action, data, &["name", "artist"])?),
            "side_bar_opened" => ClientCommand::SideBarOpened,
            "personal_sources_poll" => ClientCommand::PersonalSourcesPoll,
            other => return Err(format!("unknown action: {}", other)),
        };
        Ok(command)
    }
}
