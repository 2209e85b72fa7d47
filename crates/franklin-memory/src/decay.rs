// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory decay sweep.
//!
//! Low-importance memories that have gone unread for too long are deleted.
//! A memory that was never read ages from its creation time. Memories at or
//! above the importance floor are kept forever.

use chrono::{DateTime, Duration, Utc};
use franklin_config::model::DecayConfig;
use franklin_core::FranklinError;
use franklin_storage::format_timestamp;
use tracing::info;

use crate::store::MemoryStore;

/// Externally scheduled decay job.
#[derive(Clone)]
pub struct MemoryDecay {
    store: MemoryStore,
    importance_below: u8,
    max_age_days: u32,
}

impl MemoryDecay {
    pub fn new(store: MemoryStore, config: &DecayConfig) -> Self {
        Self {
            store,
            importance_below: config.importance_below,
            max_age_days: config.max_age_days,
        }
    }

    /// Sweep against the current time. Returns the number of memories removed.
    pub async fn run(&self) -> Result<usize, FranklinError> {
        self.run_at(Utc::now()).await
    }

    /// Sweep as if the current time were `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<usize, FranklinError> {
        let cutoff = format_timestamp(now - Duration::days(i64::from(self.max_age_days)));
        let removed = self
            .store
            .delete_decayed(self.importance_below, &cutoff)
            .await?;
        info!(
            removed,
            importance_below = self.importance_below,
            cutoff = %cutoff,
            "memory decay sweep complete"
        );
        Ok(removed)
    }
}
