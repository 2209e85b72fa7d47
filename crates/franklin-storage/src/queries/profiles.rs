// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User profile operations.
//!
//! Preferences, facts, and internal notes are stored as JSON text columns.
//! Updates run as a read-modify-write inside one transaction on the
//! database thread, so concurrent updates to the same profile never lose
//! each other's changes.

use franklin_core::{Channel, FranklinError};
use rusqlite::{params, OptionalExtension, Transaction};

use crate::database::{map_tr_err, Database};
use crate::models::{now_timestamp, UserProfile};
use crate::queries::parse_column;

const SELECT_PROFILE: &str = "SELECT user_id, channel, user_name, preferences, facts, internal_notes, created_at, updated_at
     FROM user_profiles WHERE user_id = ?1 AND channel = ?2";

fn json_column<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        user_id: row.get(0)?,
        channel: parse_column(row, 1)?,
        user_name: row.get(2)?,
        preferences: json_column(row, 3)?,
        facts: json_column(row, 4)?,
        internal_notes: json_column(row, 5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn select_profile(
    tx: &Transaction<'_>,
    user_id: &str,
    channel: Channel,
) -> rusqlite::Result<Option<UserProfile>> {
    tx.query_row(SELECT_PROFILE, params![user_id, channel.as_str()], row_to_profile)
        .optional()
}

fn write_profile(tx: &Transaction<'_>, profile: &UserProfile) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO user_profiles
            (user_id, channel, user_name, preferences, facts, internal_notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(user_id, channel) DO UPDATE SET
            user_name = excluded.user_name,
            preferences = excluded.preferences,
            facts = excluded.facts,
            internal_notes = excluded.internal_notes,
            updated_at = excluded.updated_at",
        params![
            profile.user_id,
            profile.channel.as_str(),
            profile.user_name,
            to_json(&profile.preferences)?,
            to_json(&profile.facts)?,
            to_json(&profile.internal_notes)?,
            profile.created_at,
            profile.updated_at,
        ],
    )?;
    Ok(())
}

/// Fetch a profile without creating it.
pub async fn get_profile(
    db: &Database,
    user_id: &str,
    channel: Channel,
) -> Result<Option<UserProfile>, FranklinError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(SELECT_PROFILE, params![user_id, channel.as_str()], row_to_profile)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a profile, creating an empty one on first contact.
pub async fn get_or_create_profile(
    db: &Database,
    user_id: &str,
    channel: Channel,
) -> Result<UserProfile, FranklinError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let profile = match select_profile(&tx, &user_id, channel)? {
                Some(profile) => profile,
                None => {
                    let profile = UserProfile::new(&user_id, channel, &now_timestamp());
                    write_profile(&tx, &profile)?;
                    profile
                }
            };
            tx.commit()?;
            Ok(profile)
        })
        .await
        .map_err(map_tr_err)
}

/// Apply `mutate` to a profile (created if absent) and persist the result.
///
/// `updated_at` is refreshed only when `mutate` returns `true`. Returns the
/// stored profile and whether `mutate` reported a change.
pub async fn update_profile<F>(
    db: &Database,
    user_id: &str,
    channel: Channel,
    mutate: F,
) -> Result<(UserProfile, bool), FranklinError>
where
    F: FnOnce(&mut UserProfile) -> bool + Send + 'static,
{
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let now = now_timestamp();
            let existing = select_profile(&tx, &user_id, channel)?;
            let is_new = existing.is_none();
            let mut profile = existing.unwrap_or_else(|| UserProfile::new(&user_id, channel, &now));
            let changed = mutate(&mut profile);
            if changed {
                profile.updated_at = now;
            }
            if changed || is_new {
                write_profile(&tx, &profile)?;
            }
            tx.commit()?;
            Ok((profile, changed))
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn get_missing_profile_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_profile(&db, "u1", Channel::Web).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_or_create_is_lazy_and_stable() {
        let (db, _dir) = setup_db().await;

        let first = get_or_create_profile(&db, "u1", Channel::Web).await.unwrap();
        assert!(first.facts.is_empty());
        assert!(first.preferences.is_empty());

        let second = get_or_create_profile(&db, "u1", Channel::Web).await.unwrap();
        assert_eq!(first, second);
        assert!(get_profile(&db, "u1", Channel::Web).await.unwrap().is_some());
        assert!(get_profile(&db, "u1", Channel::Voice).await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_round_trips_json_columns() {
        let (db, _dir) = setup_db().await;

        let (_, changed) = update_profile(&db, "u1", Channel::Telegram, |p| {
            p.user_name = Some("Ada".to_string());
            p.preferences.insert("risk".to_string(), "low".to_string());
            p.facts.push("lives in Austin".to_string());
            p.internal_notes.push("[2026-01-01] asked about ETFs".to_string());
            true
        })
        .await
        .unwrap();
        assert!(changed);

        let loaded = get_profile(&db, "u1", Channel::Telegram)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.user_name.as_deref(), Some("Ada"));
        assert_eq!(loaded.preferences.get("risk").map(String::as_str), Some("low"));
        assert_eq!(loaded.facts, vec!["lives in Austin"]);
        assert_eq!(loaded.internal_notes.len(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unchanged_update_keeps_timestamp() {
        let (db, _dir) = setup_db().await;
        let created = get_or_create_profile(&db, "u1", Channel::Email).await.unwrap();
        let (after, changed) = update_profile(&db, "u1", Channel::Email, |_| false)
            .await
            .unwrap();
        assert!(!changed);
        assert_eq!(created.updated_at, after.updated_at);
        db.close().await.unwrap();
    }
}
