use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use ponto_bot_lib::error::{BotError, Result};
use ponto_bot_lib::ledger::Board;
use ponto_bot_lib::platform::{
    Actor, AttendancePlatform, AuditEntry, MemberCard, NewTicket, TicketChannel, TicketEvent,
    TicketPlatform,
};
use ponto_bot_lib::util::parse_badge;
use serenity::all::{ChannelId, RoleId, UserId};

/// Records every call the controllers make; failures are switched on per test.
#[derive(Default)]
pub struct MockPlatform {
    pub audits: Mutex<Vec<AuditEntry>>,
    pub boards: Mutex<Vec<Board>>,
    pub members: Vec<MemberCard>,
    pub fail_audit: bool,
    pub fail_board: bool,
    /// Only the first refresh is held back.
    pub first_board_delay: Option<Duration>,
    pub board_calls: AtomicUsize,

    pub channels: Mutex<Vec<TicketChannel>>,
    pub owners: Mutex<HashMap<ChannelId, UserId>>,
    pub created: Mutex<Vec<NewTicket>>,
    pub controls: Mutex<Vec<(ChannelId, UserId)>>,
    pub deleted: Mutex<Vec<ChannelId>>,
    pub dms: Mutex<Vec<(UserId, String)>>,
    pub fail_dm: bool,
    pub guild_members: Vec<UserId>,
    pub fail_member_lookup: bool,
    pub grants: Mutex<Vec<(ChannelId, UserId)>>,
    pub revokes: Mutex<Vec<(ChannelId, UserId)>>,
    pub ticket_events: Mutex<Vec<TicketEvent>>,
    pub next_channel: AtomicU64,
    pub create_delay: Option<Duration>,
}

impl MockPlatform {
    pub fn audits(&self) -> Vec<AuditEntry> {
        self.audits.lock().unwrap().clone()
    }

    pub fn boards(&self) -> Vec<Board> {
        self.boards.lock().unwrap().clone()
    }

    pub fn ticket_events(&self) -> Vec<TicketEvent> {
        self.ticket_events.lock().unwrap().clone()
    }
}

impl AttendancePlatform for MockPlatform {
    async fn publish_shift_audit(&self, entry: &AuditEntry) -> Result<()> {
        if self.fail_audit {
            return Err(BotError::Custom("audit channel unavailable".into()));
        }
        self.audits.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn refresh_board(&self, board: &Board) -> Result<()> {
        if self.fail_board {
            return Err(BotError::Custom("panel channel unavailable".into()));
        }
        let call = self.board_calls.fetch_add(1, Ordering::SeqCst);
        if let (0, Some(delay)) = (call, self.first_board_delay) {
            tokio::time::sleep(delay).await;
        }
        self.boards.lock().unwrap().push(board.clone());
        Ok(())
    }

    async fn find_member_by_badge(&self, badge_number: &str) -> Result<Option<MemberCard>> {
        Ok(self
            .members
            .iter()
            .find(|m| parse_badge(&m.display_name).as_deref() == Some(badge_number))
            .cloned())
    }
}

impl TicketPlatform for MockPlatform {
    async fn find_channel_by_name(&self, name: &str) -> Result<Option<TicketChannel>> {
        Ok(self
            .channels
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn create_ticket_channel(&self, ticket: &NewTicket) -> Result<TicketChannel> {
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        let id = ChannelId::new(1000 + self.next_channel.fetch_add(1, Ordering::SeqCst));
        let channel = TicketChannel {
            id,
            name: ticket.name.clone(),
        };
        self.channels.lock().unwrap().push(channel.clone());
        self.owners.lock().unwrap().insert(id, ticket.owner);
        self.created.lock().unwrap().push(ticket.clone());
        Ok(channel)
    }

    async fn post_ticket_controls(&self, channel: &TicketChannel, owner: UserId) -> Result<()> {
        self.controls.lock().unwrap().push((channel.id, owner));
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<()> {
        self.channels.lock().unwrap().retain(|c| c.id != channel);
        self.deleted.lock().unwrap().push(channel);
        Ok(())
    }

    async fn channel_owner(&self, channel: ChannelId) -> Result<Option<UserId>> {
        Ok(self.owners.lock().unwrap().get(&channel).copied())
    }

    async fn direct_message(&self, user: UserId, text: &str) -> Result<()> {
        if self.fail_dm {
            return Err(BotError::Custom("cannot send messages to this user".into()));
        }
        self.dms.lock().unwrap().push((user, text.to_string()));
        Ok(())
    }

    async fn resolve_member(&self, raw: &str) -> Result<Option<UserId>> {
        if self.fail_member_lookup {
            return Err(BotError::Custom("missing access".into()));
        }
        let Ok(id) = raw.parse::<u64>() else {
            return Ok(None);
        };
        Ok(self.guild_members.iter().copied().find(|u| u.get() == id))
    }

    async fn grant_access(&self, channel: ChannelId, user: UserId) -> Result<()> {
        self.grants.lock().unwrap().push((channel, user));
        Ok(())
    }

    async fn revoke_access(&self, channel: ChannelId, user: UserId) -> Result<()> {
        self.revokes.lock().unwrap().push((channel, user));
        Ok(())
    }

    async fn publish_ticket_audit(&self, event: &TicketEvent) -> Result<()> {
        self.ticket_events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn actor(id: u64, username: &str, display_name: &str) -> Actor {
    Actor {
        user_id: UserId::new(id),
        username: username.to_string(),
        display_name: display_name.to_string(),
        avatar_url: None,
        roles: Vec::new(),
        is_admin: false,
    }
}

pub fn staff(id: u64, username: &str, role: u64) -> Actor {
    Actor {
        roles: vec![RoleId::new(role)],
        ..actor(id, username, username)
    }
}
