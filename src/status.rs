// Bot status as reported by the tournament bot's `/api/status` endpoint.

use serde::Serialize;
use serde_json::Value;

/// Result of one status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Online,
    Offline,
}

impl BotStatus {
    /// Classify the `status` field of a response body. Only the exact string
    /// `"online"` counts as online.
    pub fn from_field(status: Option<&Value>) -> Self {
        match status {
            Some(Value::String(s)) if s == "online" => BotStatus::Online,
            _ => BotStatus::Offline,
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, BotStatus::Online)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BotStatus::Online => "online",
            BotStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for BotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body returned by the bot backend, e.g.
/// `{"status": "online", "bot": "Duel Lords", "message": "Bot is running successfully!"}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusResponse {
    /// Raw `status` value; any JSON type is accepted and classified.
    pub status: Option<Value>,
    pub bot: Option<String>,
    pub message: Option<String>,
}

impl StatusResponse {
    /// Read the fields of a decoded body. Returns `None` when the body is not
    /// a JSON object. Unknown fields are ignored and mistyped `bot`/`message`
    /// values are treated as absent.
    pub fn from_body(body: &Value) -> Option<Self> {
        let map = body.as_object()?;
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_owned);
        Some(StatusResponse {
            status: map.get("status").cloned(),
            bot: text("bot"),
            message: text("message"),
        })
    }

    pub fn bot_status(&self) -> BotStatus {
        BotStatus::from_field(self.status.as_ref())
    }
}
