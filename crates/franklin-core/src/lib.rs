// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Franklin memory system.
//!
//! This crate provides the error taxonomy, adapter traits, and common types
//! shared by the storage layer, the provider adapters, and the memory core.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FranklinError;
pub use types::{AdapterType, Channel, HealthStatus, Role};

pub use traits::{EmbeddingAdapter, PluginAdapter, ProviderAdapter};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn franklin_error_display() {
        let err = FranklinError::Persistence {
            source: Box::new(std::io::Error::other("disk full")),
        };
        assert_eq!(err.to_string(), "persistence error: disk full");

        let err = FranklinError::embedding("quota exceeded");
        assert!(err.is_embedding_unavailable());
        assert_eq!(err.to_string(), "embedding unavailable: quota exceeded");

        let err = FranklinError::Timeout {
            duration: std::time::Duration::from_secs(5),
        };
        assert!(!err.is_embedding_unavailable());
        assert_eq!(err.to_string(), "operation timed out after 5s");
    }

    #[test]
    fn channel_round_trips_through_strings() {
        let channels = [
            Channel::Web,
            Channel::Telegram,
            Channel::Whatsapp,
            Channel::Voice,
            Channel::Email,
            Channel::Twitter,
        ];
        for channel in channels {
            assert_eq!(channel.to_string(), channel.as_str());
            assert_eq!(Channel::from_str(channel.as_str()).unwrap(), channel);
        }
        assert_eq!(Channel::from_str("Telegram").unwrap(), Channel::Telegram);
        assert!(Channel::from_str("carrier-pigeon").is_err());
    }

    #[test]
    fn channel_serializes_lowercase() {
        let json = serde_json::to_string(&Channel::Whatsapp).unwrap();
        assert_eq!(json, "\"whatsapp\"");
        let parsed: Channel = serde_json::from_str("\"voice\"").unwrap();
        assert_eq!(parsed, Channel::Voice);
    }

    #[test]
    fn role_round_trips() {
        for role in [Role::User, Role::Assistant, Role::System] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("no api key".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
    }
}
