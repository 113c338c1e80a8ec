//! Local bookkeeping around the enhancement calls: a bounded
//! most-recent-first history of results and a per-day usage counter with a
//! hard limit. Both persist as small JSON files and are mutated only by the
//! completion path of the call that initiated them.

use crate::{
    config::{HistoryConfig, UsageConfig},
    error::{EnhanceError, Result},
    models::OperationKind,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub operation: OperationKind,
    /// The enhanced output only; originals are not stored, to keep the file
    /// small.
    pub photo_data_uri: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl HistoryItem {
    pub fn new(
        operation: OperationKind,
        photo_data_uri: impl Into<String>,
        file_name: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            operation,
            photo_data_uri: photo_data_uri.into(),
            timestamp: Utc::now(),
            file_name,
        }
    }
}

/// Newest-first history bounded to `limit` items. When the serialized file
/// would exceed the byte budget the store degrades gracefully: first to the
/// latest item only, then to an empty file, while the in-memory copy stays
/// intact for the current session.
pub struct HistoryStore {
    config: HistoryConfig,
    items: Vec<HistoryItem>,
}

impl HistoryStore {
    pub fn load(config: HistoryConfig) -> Self {
        let items = match fs::read_to_string(&config.path) {
            Ok(raw) => match serde_json::from_str::<Vec<HistoryItem>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    log::warn!(
                        "Discarding corrupt history file {}: {e}",
                        config.path.display()
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self { config, items }
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    /// Prepend an item, evict the oldest past the bound, and persist.
    pub fn add(&mut self, item: HistoryItem) -> Result<()> {
        self.items.insert(0, item);
        self.items.truncate(self.config.limit);
        self.persist()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let full = serde_json::to_string(&self.items)
            .map_err(|e| EnhanceError::StorageError(e.to_string()))?;
        let payload = if full.len() <= self.config.max_bytes {
            full
        } else {
            log::warn!(
                "History exceeds the {} byte budget; keeping only the most recent item on disk",
                self.config.max_bytes
            );
            let latest = serde_json::to_string(&self.items[..self.items.len().min(1)])
                .map_err(|e| EnhanceError::StorageError(e.to_string()))?;
            if latest.len() <= self.config.max_bytes {
                latest
            } else {
                log::error!(
                    "Even the latest history item exceeds the byte budget; persisting an empty \
                     history (the in-memory copy is kept for this session)"
                );
                "[]".to_string()
            }
        };
        fs::write(&self.config.path, payload)
            .map_err(|e| EnhanceError::StorageError(e.to_string()))
    }
}

/// Outcome of consuming one unit of the daily allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageVerdict {
    Allowed { remaining: u32 },
    /// Allowed, but the remaining count has dropped to the warning band.
    NearLimit { remaining: u32 },
    LimitReached,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UsageRecord {
    date: NaiveDate,
    count: u32,
}

/// Per-day usage counter. Resets when the UTC date changes.
pub struct UsageTracker {
    config: UsageConfig,
    record: UsageRecord,
}

impl UsageTracker {
    pub fn load(config: UsageConfig) -> Self {
        let today = Utc::now().date_naive();
        let record = fs::read_to_string(&config.path)
            .ok()
            .and_then(|raw| serde_json::from_str::<UsageRecord>(&raw).ok())
            .filter(|record| record.date == today)
            .unwrap_or(UsageRecord {
                date: today,
                count: 0,
            });
        Self { config, record }
    }

    pub fn used_today(&self) -> u32 {
        if self.record.date == Utc::now().date_naive() {
            self.record.count
        } else {
            0
        }
    }

    pub fn remaining(&self) -> u32 {
        self.config.daily_limit.saturating_sub(self.used_today())
    }

    /// Consume one unit of today's allowance, rolling the counter over on a
    /// date change first.
    pub fn try_consume(&mut self) -> Result<UsageVerdict> {
        let today = Utc::now().date_naive();
        if self.record.date != today {
            self.record = UsageRecord {
                date: today,
                count: 0,
            };
        }
        if self.record.count >= self.config.daily_limit {
            return Ok(UsageVerdict::LimitReached);
        }
        self.record.count += 1;
        self.persist()?;

        let remaining = self.config.daily_limit - self.record.count;
        if remaining <= self.config.warning_threshold {
            log::warn!("{remaining} enhancements left for today");
            Ok(UsageVerdict::NearLimit { remaining })
        } else {
            Ok(UsageVerdict::Allowed { remaining })
        }
    }

    fn persist(&self) -> Result<()> {
        let payload = serde_json::to_string(&self.record)
            .map_err(|e| EnhanceError::StorageError(e.to_string()))?;
        fs::write(&self.config.path, payload)
            .map_err(|e| EnhanceError::StorageError(e.to_string()))
    }
}
