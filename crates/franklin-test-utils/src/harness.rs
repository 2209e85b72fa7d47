// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` opens a temp SQLite database and wires a complete
//! [`MemorySystem`] around mock adapters.

use std::sync::Arc;

use franklin_config::FranklinConfig;
use franklin_core::FranklinError;
use franklin_memory::MemorySystem;
use franklin_storage::Database;

use crate::mock_embedder::MockEmbedder;
use crate::mock_provider::MockProvider;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    embedder: Option<MockEmbedder>,
    config: FranklinConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            embedder: None,
            config: FranklinConfig::default(),
        }
    }

    /// Set mock provider responses, consumed one per extraction call.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Replace the default finance-aware embedder.
    pub fn with_embedder(mut self, embedder: MockEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Adjust the configuration before the system is built.
    pub fn with_config(mut self, edit: impl FnOnce(&mut FranklinConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, FranklinError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| FranklinError::Persistence {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage.database_path = db_path.to_string_lossy().to_string();

        let db = Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;
        let mock_provider = Arc::new(MockProvider::with_responses(self.responses));
        let mock_embedder = Arc::new(self.embedder.unwrap_or_default());
        let system = MemorySystem::new(
            db.clone(),
            mock_embedder.clone(),
            mock_provider.clone(),
            &config,
        );

        Ok(TestHarness {
            db,
            system,
            mock_provider,
            mock_embedder,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete memory stack over a throwaway database.
pub struct TestHarness {
    /// Database handle (temp file, removed on drop).
    pub db: Database,
    /// The wired memory subsystem under test.
    pub system: MemorySystem,
    /// The mock extraction model.
    pub mock_provider: Arc<MockProvider>,
    /// The mock embedding provider.
    pub mock_embedder: Arc<MockEmbedder>,
    /// Configuration the system was built from.
    pub config: FranklinConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Build with defaults.
    pub async fn new() -> Result<Self, FranklinError> {
        Self::builder().build().await
    }
}
