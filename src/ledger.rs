use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{BotError, Result};
use crate::util::elapsed;

/// One clock-in, and once closed, its matching clock-out.
///
/// Field aliases accept the Portuguese layout the ledger file used before
/// (`id`, `nome`, `numero`, `inicio`, `fim`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRecord {
    #[serde(alias = "id")]
    pub person_id: String,
    #[serde(alias = "nome")]
    pub display_label: String,
    #[serde(alias = "numero")]
    pub badge_number: String,
    #[serde(alias = "inicio")]
    pub started_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "fim")]
    pub ended_at: Option<i64>,
}

impl ShiftRecord {
    /// Length of the shift; open shifts are measured up to `now`.
    pub fn duration_at(&self, now: i64) -> Duration {
        elapsed(self.started_at, self.ended_at.unwrap_or(now))
    }
}

/// Everything recorded for one badge number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BadgeSummary {
    pub active: Option<ShiftRecord>,
    /// Chronological closure order.
    pub closed: Vec<ShiftRecord>,
    pub total: Duration,
}

/// Snapshot rendered on the attendance panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pub active: Vec<ShiftRecord>,
    /// Most recent first.
    pub recent_closed: Vec<ShiftRecord>,
    pub now: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default, alias = "ativos")]
    pub active: Vec<ShiftRecord>,
    #[serde(default, alias = "encerrados")]
    pub closed: Vec<ShiftRecord>,
}

impl Ledger {
    pub fn clock_in(
        &mut self,
        person_id: &str,
        display_label: &str,
        badge_number: &str,
        now: i64,
    ) -> Result<ShiftRecord> {
        if self.active.iter().any(|r| r.person_id == person_id) {
            return Err(BotError::AlreadyActive);
        }
        let record = ShiftRecord {
            person_id: person_id.to_string(),
            display_label: display_label.to_string(),
            badge_number: badge_number.to_string(),
            started_at: now,
            ended_at: None,
        };
        self.active.push(record.clone());
        Ok(record)
    }

    /// Closes the person's active shift. `ended_at` never precedes `started_at`,
    /// even if the clock stepped backwards.
    pub fn clock_out(&mut self, person_id: &str, now: i64) -> Result<ShiftRecord> {
        let index = self
            .active
            .iter()
            .position(|r| r.person_id == person_id)
            .ok_or(BotError::NotActive)?;

        let mut record = self.active.remove(index);
        record.ended_at = Some(now.max(record.started_at));
        self.closed.push(record.clone());
        Ok(record)
    }

    pub fn query_by_badge(&self, badge_number: &str, now: i64) -> BadgeSummary {
        let closed: Vec<ShiftRecord> = self
            .closed
            .iter()
            .filter(|r| r.badge_number == badge_number)
            .cloned()
            .collect();
        let active = self
            .active
            .iter()
            .find(|r| r.badge_number == badge_number)
            .cloned();

        let total = closed
            .iter()
            .chain(active.iter())
            .map(|r| r.duration_at(now))
            .sum();

        BadgeSummary {
            active,
            closed,
            total,
        }
    }

    pub fn list_active(&self) -> &[ShiftRecord] {
        &self.active
    }

    pub fn list_recent_closed(&self, n: usize) -> Vec<ShiftRecord> {
        self.closed.iter().rev().take(n).cloned().collect()
    }
}

/// The ledger plus the file it is persisted to.
///
/// One lock covers the whole ledger and is held across the file write, so concurrent
/// handlers observe clock-in/clock-out as atomic steps. A mutation only reaches memory
/// after the rewritten file has been saved.
pub struct LedgerStore {
    path: PathBuf,
    ledger: Mutex<Ledger>,
}

impl LedgerStore {
    /// Load the ledger at `path`, starting empty if the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ledger = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ledger::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            path = %path.display(),
            active = ledger.active.len(),
            closed = ledger.closed.len(),
            "ledger loaded"
        );
        Ok(Self {
            path,
            ledger: Mutex::new(ledger),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn clock_in(
        &self,
        person_id: &str,
        display_label: &str,
        badge_number: &str,
        now: i64,
    ) -> Result<ShiftRecord> {
        self.mutate(|ledger| ledger.clock_in(person_id, display_label, badge_number, now))
            .await
    }

    pub async fn clock_out(&self, person_id: &str, now: i64) -> Result<ShiftRecord> {
        self.mutate(|ledger| ledger.clock_out(person_id, now)).await
    }

    pub async fn query_by_badge(&self, badge_number: &str, now: i64) -> BadgeSummary {
        self.ledger.lock().await.query_by_badge(badge_number, now)
    }

    pub async fn list_active(&self) -> Vec<ShiftRecord> {
        self.ledger.lock().await.list_active().to_vec()
    }

    pub async fn list_recent_closed(&self, n: usize) -> Vec<ShiftRecord> {
        self.ledger.lock().await.list_recent_closed(n)
    }

    pub async fn board(&self, recent: usize, now: i64) -> Board {
        let ledger = self.ledger.lock().await;
        Board {
            active: ledger.list_active().to_vec(),
            recent_closed: ledger.list_recent_closed(recent),
            now,
        }
    }

    /// Apply `op` to a copy, persist the copy, then commit it.
    async fn mutate<T>(&self, op: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
        let mut guard = self.ledger.lock().await;
        let mut next = guard.clone();
        let out = op(&mut next)?;
        self.save(&next).await?;
        *guard = next;
        Ok(out)
    }

    async fn save(&self, ledger: &Ledger) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(ledger)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}
