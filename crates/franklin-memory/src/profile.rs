// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User profile service: name, preferences, coarse facts, internal notes.
//!
//! The coarse fact list lives beside the vector memory store and is not
//! reconciled with it.

use franklin_core::Channel;
use franklin_storage::queries::profiles;
use franklin_storage::{Database, UserProfile, now_timestamp};
use tracing::{debug, warn};

/// Profile reads fail open to an empty profile; writes fail silently.
#[derive(Clone)]
pub struct ProfileStore {
    db: Database,
    max_internal_notes: usize,
}

impl ProfileStore {
    pub fn new(db: Database, max_internal_notes: usize) -> Self {
        Self {
            db,
            max_internal_notes,
        }
    }

    /// Load the profile, creating it on first contact.
    pub async fn load(&self, user_id: &str, channel: Channel) -> UserProfile {
        match profiles::get_or_create_profile(&self.db, user_id, channel).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id, %channel, error = %e, "failed to load profile, using empty profile");
                UserProfile::new(user_id, channel, &now_timestamp())
            }
        }
    }

    pub async fn set_user_name(&self, user_id: &str, channel: Channel, name: &str) -> bool {
        let name = name.trim().to_string();
        if name.is_empty() {
            return false;
        }
        self.update(user_id, channel, "user_name", move |p| {
            if p.user_name.as_deref() == Some(name.as_str()) {
                return false;
            }
            p.user_name = Some(name);
            true
        })
        .await
    }

    /// Insert or replace one preference.
    pub async fn set_preference(
        &self,
        user_id: &str,
        channel: Channel,
        key: &str,
        value: &str,
    ) -> bool {
        let key = key.trim().to_string();
        if key.is_empty() {
            return false;
        }
        let value = value.trim().to_string();
        self.update(user_id, channel, "preference", move |p| {
            if p.preferences.get(&key) == Some(&value) {
                return false;
            }
            p.preferences.insert(key, value);
            true
        })
        .await
    }

    /// Append a coarse fact unless an identical one is already recorded.
    pub async fn add_fact(&self, user_id: &str, channel: Channel, fact: &str) -> bool {
        let fact = fact.trim().to_string();
        if fact.is_empty() {
            return false;
        }
        self.update(user_id, channel, "fact", move |p| {
            if p.facts.contains(&fact) {
                return false;
            }
            p.facts.push(fact);
            true
        })
        .await
    }

    /// Record a timestamped observation, keeping only the newest notes.
    pub async fn add_internal_note(&self, user_id: &str, channel: Channel, note: &str) -> bool {
        let note = note.trim();
        if note.is_empty() {
            return false;
        }
        let entry = format!("[{}] {note}", now_timestamp());
        let cap = self.max_internal_notes;
        self.update(user_id, channel, "internal_note", move |p| {
            p.internal_notes.push(entry);
            let excess = p.internal_notes.len().saturating_sub(cap);
            p.internal_notes.drain(..excess);
            true
        })
        .await
    }

    /// Returns whether the profile changed and was saved.
    async fn update<F>(&self, user_id: &str, channel: Channel, field: &'static str, mutate: F) -> bool
    where
        F: FnOnce(&mut UserProfile) -> bool + Send + 'static,
    {
        match profiles::update_profile(&self.db, user_id, channel, mutate).await {
            Ok((_, changed)) => {
                if changed {
                    debug!(user_id, %channel, field, "profile updated");
                }
                changed
            }
            Err(e) => {
                warn!(user_id, %channel, field, error = %e, "failed to update profile");
                false
            }
        }
    }
}
