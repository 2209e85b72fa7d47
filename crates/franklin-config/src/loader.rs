// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./franklin.toml` > `~/.config/franklin/franklin.toml` >
//! `/etc/franklin/franklin.toml`, with `FRANKLIN_` environment variables on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FranklinConfig;

/// Config sections, in the order their env prefixes are matched.
const SECTIONS: &[&str] = &[
    "agent",
    "storage",
    "embedding",
    "anthropic",
    "memory",
    "decay",
    "history",
    "profile",
];

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/franklin/franklin.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "franklin.toml";

/// Per-user config file under the XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("franklin").join("franklin.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/franklin/franklin.toml`
/// 3. `~/.config/franklin/franklin.toml`
/// 4. `./franklin.toml`
/// 5. `FRANKLIN_*` environment variables
pub fn load_config() -> Result<FranklinConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the defaults. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<FranklinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FranklinConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, plus env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FranklinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FranklinConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The unextracted Figment used by [`load_config`].
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FranklinConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Env provider mapping `FRANKLIN_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `FRANKLIN_MEMORY_SIMILARITY_THRESHOLD` maps to `memory.similarity_threshold`.
fn env_provider() -> Env {
    Env::prefixed("FRANKLIN_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key to its dotted config path.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
