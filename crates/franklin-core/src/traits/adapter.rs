// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and health surface shared by every external adapter.

use async_trait::async_trait;

use crate::error::FranklinError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Franklin adapters.
///
/// Provides identity and health check capabilities shared by the
/// embedding and language-model adapters.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Short stable name used in logs and `franklin doctor`.
    fn name(&self) -> &str;

    /// Adapter implementation version.
    fn version(&self) -> semver::Version;

    /// Returns the type of adapter (provider, embedding, ...).
    fn adapter_type(&self) -> AdapterType;

    /// Report readiness without spending provider quota.
    async fn health_check(&self) -> Result<HealthStatus, FranklinError>;
}
