use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{BotError, Result};
use crate::ledger::{LedgerStore, ShiftRecord};
use crate::platform::{Actor, AttendancePlatform, AuditEntry, LookupReport, ShiftAction};
use crate::util::{as_badge_query, parse_badge};

/// Clock-in, clock-out and badge lookups on top of the shared ledger.
pub struct AttendanceController {
    store: Arc<LedgerStore>,
    board_recent_limit: usize,
    // Held from the board snapshot until it is posted, so the newest post is the newest snapshot.
    board_lock: Mutex<()>,
}

impl AttendanceController {
    pub fn new(store: Arc<LedgerStore>, board_recent_limit: usize) -> Self {
        Self {
            store,
            board_recent_limit,
            board_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    /// OFF_DUTY -> ON_DUTY. The badge is read from the actor's current display name
    /// and frozen into the record.
    pub async fn start<P: AttendancePlatform>(
        &self,
        platform: &P,
        actor: &Actor,
        now: i64,
    ) -> Result<ShiftRecord> {
        let badge = parse_badge(&actor.display_name).ok_or(BotError::InvalidNameFormat)?;
        let record = self
            .store
            .clock_in(&actor.user_id.to_string(), &actor.display_name, &badge, now)
            .await?;

        tracing::info!(
            user_id = %actor.user_id,
            badge = %record.badge_number,
            "shift started"
        );
        self.announce(platform, actor, &record, ShiftAction::Started, Duration::ZERO, now)
            .await;
        Ok(record)
    }

    /// ON_DUTY -> OFF_DUTY.
    pub async fn stop<P: AttendancePlatform>(
        &self,
        platform: &P,
        actor: &Actor,
        now: i64,
    ) -> Result<ShiftRecord> {
        let record = self
            .store
            .clock_out(&actor.user_id.to_string(), now)
            .await?;
        let worked = record.duration_at(now);

        tracing::info!(
            user_id = %actor.user_id,
            badge = %record.badge_number,
            worked_secs = worked.as_secs(),
            "shift ended"
        );
        self.announce(platform, actor, &record, ShiftAction::Ended, worked, now)
            .await;
        Ok(record)
    }

    /// Answer a lookup message. Text that is not a plain badge number yields `None`.
    pub async fn lookup<P: AttendancePlatform>(
        &self,
        platform: &P,
        text: &str,
        now: i64,
    ) -> Result<Option<LookupReport>> {
        let Some(badge) = as_badge_query(text) else {
            return Ok(None);
        };
        let summary = self.store.query_by_badge(badge, now).await;
        let member = platform.find_member_by_badge(badge).await?;
        Ok(Some(LookupReport {
            badge_number: badge.to_string(),
            member,
            summary,
            now,
        }))
    }

    /// Audit entry plus board refresh. The mutation is already committed, so
    /// failures here are only logged.
    async fn announce<P: AttendancePlatform>(
        &self,
        platform: &P,
        actor: &Actor,
        record: &ShiftRecord,
        action: ShiftAction,
        duration: Duration,
        now: i64,
    ) {
        let entry = AuditEntry {
            action,
            actor_id: actor.user_id,
            actor_label: actor.display_name.clone(),
            avatar_url: actor.avatar_url.clone(),
            badge_number: record.badge_number.clone(),
            started_at: record.started_at,
            duration,
        };
        if let Err(error) = platform.publish_shift_audit(&entry).await {
            tracing::warn!(%error, "failed to publish shift audit");
        }

        let _guard = self.board_lock.lock().await;
        let board = self.store.board(self.board_recent_limit, now).await;
        if let Err(error) = platform.refresh_board(&board).await {
            tracing::warn!(%error, "failed to refresh attendance board");
        }
    }
}
