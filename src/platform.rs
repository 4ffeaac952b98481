//! Seams between the controllers and the chat platform.
//!
//! The Discord gateway in [`crate::discord`] implements these; tests substitute a recorder.

use serenity::all::{ChannelId, RoleId, UserId};
use std::future::Future;
use std::time::Duration;

use crate::error::Result;
use crate::ledger::{BadgeSummary, Board};

/// The member pressing a button or submitting a form, as seen at that moment.
#[derive(Clone, Debug)]
pub struct Actor {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub roles: Vec<RoleId>,
    pub is_admin: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftAction {
    Started,
    Ended,
}

/// One entry for the attendance audit channel. Not stored in the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    pub action: ShiftAction,
    pub actor_id: UserId,
    pub actor_label: String,
    pub avatar_url: Option<String>,
    pub badge_number: String,
    pub started_at: i64,
    /// Worked time for `Ended`; time on duty so far for `Started`.
    pub duration: Duration,
}

/// A guild member whose display name carries a given badge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberCard {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupReport {
    pub badge_number: String,
    pub member: Option<MemberCard>,
    pub summary: BadgeSummary,
    pub now: i64,
}

pub trait AttendancePlatform: Send + Sync {
    fn publish_shift_audit(&self, entry: &AuditEntry) -> impl Future<Output = Result<()>> + Send;

    /// Clear the panel channel and re-post the buttons and the board.
    fn refresh_board(&self, board: &Board) -> impl Future<Output = Result<()>> + Send;

    fn find_member_by_badge(
        &self,
        badge_number: &str,
    ) -> impl Future<Output = Result<Option<MemberCard>>> + Send;
}

/// Request for a new private ticket channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTicket {
    pub name: String,
    pub owner: UserId,
    pub category: Option<ChannelId>,
    pub staff_roles: Vec<RoleId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketChannel {
    pub id: ChannelId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketEvent {
    Opened { channel: ChannelId, by: UserId },
    Closed { channel_name: String, by: UserId },
}

pub trait TicketPlatform: Send + Sync {
    fn find_channel_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<TicketChannel>>> + Send;

    /// Create the channel with its access list and record the owner on it.
    fn create_ticket_channel(
        &self,
        ticket: &NewTicket,
    ) -> impl Future<Output = Result<TicketChannel>> + Send;

    /// Post the greeting and the close/notify/add/remove buttons.
    fn post_ticket_controls(
        &self,
        channel: &TicketChannel,
        owner: UserId,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_channel(&self, channel: ChannelId) -> impl Future<Output = Result<()>> + Send;

    /// Owner recorded on the channel at creation, if any.
    fn channel_owner(
        &self,
        channel: ChannelId,
    ) -> impl Future<Output = Result<Option<UserId>>> + Send;

    fn direct_message(&self, user: UserId, text: &str) -> impl Future<Output = Result<()>> + Send;

    /// Resolve free-form form input to a member of the guild.
    fn resolve_member(&self, raw: &str) -> impl Future<Output = Result<Option<UserId>>> + Send;

    fn grant_access(
        &self,
        channel: ChannelId,
        user: UserId,
    ) -> impl Future<Output = Result<()>> + Send;

    fn revoke_access(
        &self,
        channel: ChannelId,
        user: UserId,
    ) -> impl Future<Output = Result<()>> + Send;

    fn publish_ticket_audit(&self, event: &TicketEvent) -> impl Future<Output = Result<()>> + Send;
}
