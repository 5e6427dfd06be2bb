// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `/etc/qdesk/qdesk.toml`, then `~/.config/qdesk/qdesk.toml`,
//! then `./qdesk.toml`, then `QDESK_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::QdeskConfig;

/// Sections that env vars may address, e.g. `QDESK_GATEWAY_BEARER_TOKEN`.
const ENV_SECTIONS: &[&str] = &["site", "storage", "desk", "gateway", "bus"];

pub(crate) const SYSTEM_CONFIG: &str = "/etc/qdesk/qdesk.toml";
pub(crate) const LOCAL_CONFIG: &str = "qdesk.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("qdesk/qdesk.toml"))
        .unwrap_or_default()
}

/// Loads configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<QdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QdeskConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
        .extract()
}

/// Loads configuration from a TOML string over the compiled defaults, ignoring files and env.
pub fn load_config_from_str(toml_content: &str) -> Result<QdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QdeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads one explicit file, still honoring env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<QdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QdeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// `QDESK_` env provider mapping the first underscore after a known section to a dot.
///
/// `QDESK_STORAGE_DATABASE_PATH` becomes `storage.database_path`, not
/// `storage.database.path`. Catalog arrays cannot be set from the environment.
fn env_provider() -> Env {
    Env::prefixed("QDESK_")
        .map(|key| {
            let key_str = key.as_str();
            ENV_SECTIONS
                .iter()
                .find_map(|section| {
                    key_str
                        .strip_prefix(section)
                        .and_then(|rest| rest.strip_prefix('_'))
                        .map(|field| format!("{section}.{field}"))
                })
                .unwrap_or_else(|| key_str.to_string())
                .into()
        })
        .filter(|key| key.as_str().contains('.'))
}
