use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use serenity::all::{ChannelId, RoleId};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BotError, Result};
use crate::util::local_offset;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceConfig {
    /// Channel holding the start/stop buttons and the board.
    pub panel_channel_id: ChannelId,
    /// Channel receiving one audit embed per clock-in/clock-out.
    pub log_channel_id: ChannelId,
    /// Channel where members type a badge number to look it up.
    pub lookup_channel_id: ChannelId,
    #[serde(default = "default_board_recent_limit")]
    pub board_recent_limit: usize,
    #[serde(default = "default_lookup_history_limit")]
    pub lookup_history_limit: usize,
    #[serde(default = "default_lookup_ttl_secs")]
    pub lookup_ttl_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketConfig {
    pub panel_channel_id: ChannelId,
    pub log_channel_id: ChannelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<ChannelId>,
    /// Roles that can see every ticket and close it.
    #[serde(default)]
    pub authorized_role_ids: Vec<RoleId>,
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    pub attendance: AttendanceConfig,
    pub tickets: TicketConfig,
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    /// Offset used when printing hours. Falls back to the host's local offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

fn default_board_recent_limit() -> usize {
    10
}

fn default_lookup_history_limit() -> usize {
    20
}

fn default_lookup_ttl_secs() -> u64 {
    300
}

fn default_channel_prefix() -> String {
    "corregedoria".to_string()
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("database.json")
}

/// `$PONTO_BOT_CONFIG`, or `<config dir>/ponto-bot/config.json`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PONTO_BOT_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("ponto-bot").join("config.json"))
}

/// Bot token from `DISCORD_TOKEN`, or the older `TOKEN` variable.
pub fn discord_token() -> Result<String> {
    std::env::var("DISCORD_TOKEN")
        .or_else(|_| std::env::var("TOKEN"))
        .map_err(|_| BotError::Config("DISCORD_TOKEN is not set".into()))
}

impl BotConfig {
    pub fn load() -> Result<Self> {
        let path = config_path()
            .ok_or_else(|| BotError::Config("Cannot find config directory".into()))?;
        let content = std::fs::read_to_string(&path).map_err(|e| {
            BotError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&content)?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: BotConfig =
            serde_json::from_str(content).map_err(|e| BotError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.attendance.board_recent_limit == 0 || self.attendance.lookup_history_limit == 0 {
            return Err(BotError::Config("history limits must be positive".into()));
        }
        if self.tickets.channel_prefix.is_empty() {
            return Err(BotError::Config("ticket channel prefix is empty".into()));
        }
        if let Some(minutes) = self.utc_offset_minutes {
            if FixedOffset::east_opt(minutes * 60).is_none() {
                return Err(BotError::Config(format!("invalid UTC offset: {minutes} minutes")));
            }
        }
        Ok(())
    }

    pub fn display_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .and_then(|m| FixedOffset::east_opt(m * 60))
            .unwrap_or_else(local_offset)
    }

    pub fn lookup_ttl(&self) -> Duration {
        Duration::from_secs(self.attendance.lookup_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "attendance": {
            "panelChannelId": "1380998543254356089",
            "logChannelId": "1380998559335448637",
            "lookupChannelId": "1380998324265418872"
        },
        "tickets": {
            "panelChannelId": "1380998290899865690",
            "logChannelId": "1380998487415455864",
            "authorizedRoleIds": ["1380998072628281414", "1380998057562341477"]
        },
        "utcOffsetMinutes": -180
    }"#;

    #[test]
    fn test_defaults_applied() {
        let config = BotConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.attendance.board_recent_limit, 10);
        assert_eq!(config.attendance.lookup_history_limit, 20);
        assert_eq!(config.lookup_ttl(), Duration::from_secs(300));
        assert_eq!(config.tickets.channel_prefix, "corregedoria");
        assert_eq!(config.tickets.category_id, None);
        assert_eq!(config.tickets.authorized_role_ids.len(), 2);
        assert_eq!(config.ledger_path, PathBuf::from("database.json"));
        assert_eq!(
            config.attendance.panel_channel_id,
            ChannelId::new(1380998543254356089)
        );
        assert_eq!(config.display_offset(), FixedOffset::west_opt(3 * 3600).unwrap());
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero_limit = MINIMAL.replace(
            "\"lookupChannelId\": \"1380998324265418872\"",
            "\"lookupChannelId\": \"1380998324265418872\", \"boardRecentLimit\": 0",
        );
        assert!(matches!(
            BotConfig::from_json(&zero_limit),
            Err(BotError::Config(_))
        ));

        let bad_offset = MINIMAL.replace("-180", "100000");
        assert!(BotConfig::from_json(&bad_offset).is_err());

        assert!(BotConfig::from_json("{}").is_err());
    }
}
