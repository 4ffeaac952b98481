use chrono::FixedOffset;
use futures_util::future::join_all;
use serenity::all::{
    Cache, ChannelId, CreateChannel, CreateMessage, GetMessages, GuildId, Http, PermissionOverwrite,
    PermissionOverwriteType, Permissions, RoleId, UserId,
};
use std::sync::Arc;

use crate::config::BotConfig;
use crate::discord::render;
use crate::error::Result;
use crate::ledger::Board;
use crate::platform::{
    AttendancePlatform, AuditEntry, MemberCard, NewTicket, TicketChannel, TicketEvent, TicketPlatform,
};
use crate::util::parse_badge;

/// Platform ports over the Discord REST API, scoped to one guild.
pub struct DiscordGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
    guild_id: GuildId,
    config: Arc<BotConfig>,
    offset: FixedOffset,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>, guild_id: GuildId, config: Arc<BotConfig>) -> Self {
        let offset = config.display_offset();
        Self {
            http,
            cache,
            guild_id,
            config,
            offset,
        }
    }

    /// Scan cached guild members for a display name carrying `badge_number`.
    fn cached_member_with_badge(&self, badge_number: &str) -> Option<MemberCard> {
        let guild = self.guild_id.to_guild_cached(&self.cache)?;
        guild
            .members
            .values()
            .find(|m| parse_badge(m.display_name()).as_deref() == Some(badge_number))
            .map(|m| MemberCard {
                user_id: m.user.id,
                display_name: m.display_name().to_string(),
                avatar_url: Some(m.face()),
            })
    }
}

/// Delete the latest 100 messages of a channel. Individual failures are ignored.
pub async fn clear_channel(http: &Http, channel: ChannelId) -> Result<()> {
    let messages = channel.messages(http, GetMessages::new().limit(100)).await?;
    join_all(
        messages
            .iter()
            .map(|m| async move { channel.delete_message(http, m.id).await.ok() }),
    )
    .await;
    Ok(())
}

/// Clear the attendance channel and post the buttons followed by the board.
pub async fn post_attendance_panels(
    http: &Http,
    channel: ChannelId,
    board: &Board,
    offset: &FixedOffset,
) -> Result<()> {
    clear_channel(http, channel).await?;
    channel.send_message(http, render::attendance_panel()).await?;
    channel
        .send_message(http, render::board_message(board, offset))
        .await?;
    Ok(())
}

fn member_access(user: UserId) -> PermissionOverwrite {
    PermissionOverwrite {
        allow: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY,
        deny: Permissions::empty(),
        kind: PermissionOverwriteType::Member(user),
    }
}

fn staff_access(role: RoleId) -> PermissionOverwrite {
    PermissionOverwrite {
        allow: Permissions::VIEW_CHANNEL
            | Permissions::SEND_MESSAGES
            | Permissions::READ_MESSAGE_HISTORY
            | Permissions::MANAGE_CHANNELS,
        deny: Permissions::empty(),
        kind: PermissionOverwriteType::Role(role),
    }
}

impl AttendancePlatform for DiscordGateway {
    async fn publish_shift_audit(&self, entry: &AuditEntry) -> Result<()> {
        let embed = render::audit_embed(entry, &self.offset);
        self.config
            .attendance
            .log_channel_id
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await?;
        Ok(())
    }

    async fn refresh_board(&self, board: &Board) -> Result<()> {
        post_attendance_panels(
            &self.http,
            self.config.attendance.panel_channel_id,
            board,
            &self.offset,
        )
        .await
    }

    async fn find_member_by_badge(&self, badge_number: &str) -> Result<Option<MemberCard>> {
        Ok(self.cached_member_with_badge(badge_number))
    }
}

impl TicketPlatform for DiscordGateway {
    async fn find_channel_by_name(&self, name: &str) -> Result<Option<TicketChannel>> {
        let channels = self.guild_id.channels(&self.http).await?;
        Ok(channels
            .into_values()
            .find(|c| c.name == name)
            .map(|c| TicketChannel {
                id: c.id,
                name: c.name,
            }))
    }

    async fn create_ticket_channel(&self, ticket: &NewTicket) -> Result<TicketChannel> {
        let everyone = PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(self.guild_id.everyone_role()),
        };
        let mut overwrites = vec![everyone, member_access(ticket.owner)];
        overwrites.extend(ticket.staff_roles.iter().copied().map(staff_access));

        let mut builder = CreateChannel::new(ticket.name.clone())
            .topic(ticket.owner.to_string())
            .permissions(overwrites);
        if let Some(category) = ticket.category {
            builder = builder.category(category);
        }

        let channel = self.guild_id.create_channel(&self.http, builder).await?;
        Ok(TicketChannel {
            id: channel.id,
            name: channel.name,
        })
    }

    async fn post_ticket_controls(&self, channel: &TicketChannel, owner: UserId) -> Result<()> {
        channel
            .id
            .send_message(&self.http, render::ticket_controls(owner))
            .await?;
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<()> {
        channel.delete(&self.http).await?;
        Ok(())
    }

    async fn channel_owner(&self, channel: ChannelId) -> Result<Option<UserId>> {
        let channel = channel.to_channel(&self.http).await?;
        Ok(channel
            .guild()
            .and_then(|c| c.topic)
            .and_then(|topic| topic.trim().parse::<u64>().ok())
            .filter(|id| *id != 0)
            .map(UserId::new))
    }

    async fn direct_message(&self, user: UserId, text: &str) -> Result<()> {
        user.direct_message(&self.http, CreateMessage::new().content(text))
            .await?;
        Ok(())
    }

    async fn resolve_member(&self, raw: &str) -> Result<Option<UserId>> {
        let Some(id) = raw.parse::<u64>().ok().filter(|id| *id != 0) else {
            return Ok(None);
        };
        match self.guild_id.member(&self.http, UserId::new(id)).await {
            Ok(member) => Ok(Some(member.user.id)),
            Err(error) => {
                tracing::debug!(%error, id, "guild member lookup failed");
                Ok(None)
            }
        }
    }

    async fn grant_access(&self, channel: ChannelId, user: UserId) -> Result<()> {
        channel.create_permission(&self.http, member_access(user)).await?;
        Ok(())
    }

    async fn revoke_access(&self, channel: ChannelId, user: UserId) -> Result<()> {
        channel
            .delete_permission(&self.http, PermissionOverwriteType::Member(user))
            .await?;
        Ok(())
    }

    async fn publish_ticket_audit(&self, event: &TicketEvent) -> Result<()> {
        self.config
            .tickets
            .log_channel_id
            .send_message(&self.http, CreateMessage::new().content(render::ticket_audit_line(event)))
            .await?;
        Ok(())
    }
}
