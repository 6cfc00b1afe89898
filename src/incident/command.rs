//! `/incident` slash command parsing and Slack replies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::Severity;

/// Form fields Slack posts for a slash command. Absent fields are empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SlashCommand {
    pub token: String,
    pub team_id: String,
    pub team_domain: String,
    pub channel_id: String,
    pub channel_name: String,
    pub user_id: String,
    pub user_name: String,
    pub command: String,
    pub text: String,
    pub api_app_id: String,
    pub response_url: String,
    pub trigger_id: String,
}

impl SlashCommand {
    pub fn from_form(body: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_bytes(body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentCommand {
    Start { severity: Severity, title: String },
    Update { id: String, message: String },
    Resolve { id: String },
}

/// Parse failures. The `Display` text is the ephemeral reply shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("❌ Invalid severity. Use: SEV-1, SEV-2, SEV-3, or SEV-4\n\nExample: `/incident start SEV-2 API timeout errors`")]
    InvalidSeverity,

    #[error("❌ Incident title required\n\nExample: `/incident start SEV-2 API timeout errors`")]
    MissingTitle,

    #[error("❌ Usage: `/incident update <incident-id> <status message>`")]
    UpdateUsage,

    #[error("❌ Usage: `/incident resolve <incident-id>`")]
    ResolveUsage,

    #[error(
        "❌ Unknown command: `{0}`\n\nAvailable commands:\n• `/incident start <SEV-X> <title>`\n• `/incident update <incident-id> <message>`\n• `/incident resolve <incident-id>`"
    )]
    Unknown(String),
}

impl IncidentCommand {
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let mut words = text.split_whitespace();
        let sub = words.next().unwrap_or_default();

        match sub {
            "start" => {
                let severity = words
                    .next()
                    .and_then(|s| s.parse::<Severity>().ok())
                    .ok_or(CommandError::InvalidSeverity)?;
                let title = words.collect::<Vec<_>>().join(" ");
                if title.is_empty() {
                    return Err(CommandError::MissingTitle);
                }
                Ok(IncidentCommand::Start { severity, title })
            }
            "update" => {
                let id = words.next().ok_or(CommandError::UpdateUsage)?.to_string();
                let message = words.collect::<Vec<_>>().join(" ");
                if message.is_empty() {
                    return Err(CommandError::UpdateUsage);
                }
                Ok(IncidentCommand::Update { id, message })
            }
            "resolve" => {
                let id = words.next().ok_or(CommandError::ResolveUsage)?.to_string();
                Ok(IncidentCommand::Resolve { id })
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            IncidentCommand::Start { .. } => "start",
            IncidentCommand::Update { .. } => "update",
            IncidentCommand::Resolve { .. } => "resolve",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Ephemeral,
    InChannel,
}

/// Slash command response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackReply {
    pub response_type: ResponseType,
    pub text: String,
}

impl SlackReply {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
        }
    }

    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text: text.into(),
        }
    }
}

impl From<CommandError> for SlackReply {
    fn from(err: CommandError) -> Self {
        SlackReply::ephemeral(err.to_string())
    }
}
