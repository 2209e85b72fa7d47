// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for persisted entities and timestamp helpers.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use franklin_core::{Channel, Role};
use serde::{Deserialize, Serialize};

/// Format a UTC instant as stored in the database (`2026-01-01T00:00:00.000Z`).
///
/// Fixed millisecond precision keeps lexical and chronological order equal,
/// which the decay sweep and history ordering rely on.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current time in storage format.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Parse a stored timestamp back into a UTC instant.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// One message in a running dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: String,
    pub user_id: String,
    pub channel: Channel,
    pub role: Role,
    pub content: String,
    /// Insert time; the ordering key for history.
    pub created_at: String,
}

/// Per (user, channel) profile aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub channel: Channel,
    /// Best-effort display name.
    pub user_name: Option<String>,
    /// Stated or inferred settings, kept in key order.
    pub preferences: BTreeMap<String, String>,
    /// Flat, deduplicated list of short facts.
    pub facts: Vec<String>,
    /// Timestamped observations, oldest first.
    pub internal_notes: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserProfile {
    /// An empty profile for a first contact.
    pub fn new(user_id: &str, channel: Channel, now: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            channel,
            user_name: None,
            preferences: BTreeMap::new(),
            facts: Vec::new(),
            internal_notes: Vec::new(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}
