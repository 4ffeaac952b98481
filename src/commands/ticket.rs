use serenity::all::{ChannelId, RoleId, UserId};
use tokio::sync::Mutex;

use crate::error::{BotError, Result};
use crate::platform::{Actor, NewTicket, TicketChannel, TicketEvent, TicketPlatform};
use crate::util::ticket_channel_name;

/// Private per-user ticket channels.
pub struct TicketController {
    channel_prefix: String,
    category: Option<ChannelId>,
    staff_roles: Vec<RoleId>,
    // Serializes the exists-check and creation so one requester gets one channel.
    open_lock: Mutex<()>,
}

impl TicketController {
    pub fn new(channel_prefix: &str, category: Option<ChannelId>, staff_roles: Vec<RoleId>) -> Self {
        Self {
            channel_prefix: channel_prefix.to_string(),
            category,
            staff_roles,
            open_lock: Mutex::new(()),
        }
    }

    pub async fn open<P: TicketPlatform>(&self, platform: &P, requester: &Actor) -> Result<TicketChannel> {
        let name = ticket_channel_name(&self.channel_prefix, &requester.username);

        let channel = {
            let _guard = self.open_lock.lock().await;
            if platform.find_channel_by_name(&name).await?.is_some() {
                return Err(BotError::DuplicateTicket);
            }
            platform
                .create_ticket_channel(&NewTicket {
                    name,
                    owner: requester.user_id,
                    category: self.category,
                    staff_roles: self.staff_roles.clone(),
                })
                .await?
        };

        tracing::info!(channel = %channel.name, owner = %requester.user_id, "ticket opened");
        platform.post_ticket_controls(&channel, requester.user_id).await?;
        let event = TicketEvent::Opened {
            channel: channel.id,
            by: requester.user_id,
        };
        if let Err(error) = platform.publish_ticket_audit(&event).await {
            tracing::warn!(%error, "failed to publish ticket audit");
        }
        Ok(channel)
    }

    /// Only members holding a staff role, or administrators, may close a ticket.
    pub fn can_close(&self, requester: &Actor) -> bool {
        requester.is_admin || requester.roles.iter().any(|r| self.staff_roles.contains(r))
    }

    pub async fn close<P: TicketPlatform>(
        &self,
        platform: &P,
        requester: &Actor,
        channel: &TicketChannel,
    ) -> Result<()> {
        if !self.can_close(requester) {
            return Err(BotError::Unauthorized);
        }
        platform.delete_channel(channel.id).await?;

        tracing::info!(channel = %channel.name, by = %requester.user_id, "ticket closed");
        let event = TicketEvent::Closed {
            channel_name: channel.name.clone(),
            by: requester.user_id,
        };
        if let Err(error) = platform.publish_ticket_audit(&event).await {
            tracing::warn!(%error, "failed to publish ticket audit");
        }
        Ok(())
    }

    /// Direct-message the ticket owner. Returns the owner on success.
    pub async fn notify<P: TicketPlatform>(&self, platform: &P, channel: &TicketChannel) -> Result<UserId> {
        let owner = platform
            .channel_owner(channel.id)
            .await?
            .ok_or(BotError::TargetNotFound)?;
        let text = format!(
            "📢 Um membro da corregedoria enviou uma notificação no seu ticket ({}). Verifique o servidor.",
            channel.name
        );
        if let Err(error) = platform.direct_message(owner, &text).await {
            tracing::debug!(%error, %owner, "ticket notification undeliverable");
            return Err(BotError::DeliveryFailed);
        }
        Ok(owner)
    }

    pub async fn add_person<P: TicketPlatform>(
        &self,
        platform: &P,
        channel: ChannelId,
        raw_target: &str,
    ) -> Result<UserId> {
        let target = resolve_target(platform, raw_target).await?;
        platform.grant_access(channel, target).await?;
        Ok(target)
    }

    pub async fn remove_person<P: TicketPlatform>(
        &self,
        platform: &P,
        channel: ChannelId,
        raw_target: &str,
    ) -> Result<UserId> {
        let target = resolve_target(platform, raw_target).await?;
        platform.revoke_access(channel, target).await?;
        Ok(target)
    }
}

async fn resolve_target<P: TicketPlatform>(platform: &P, raw: &str) -> Result<UserId> {
    match platform.resolve_member(raw.trim()).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(BotError::TargetNotFound),
        Err(error) => {
            tracing::debug!(%error, raw, "member resolution failed");
            Err(BotError::TargetNotFound)
        }
    }
}
