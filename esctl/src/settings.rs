//! Typed view of the cluster settings API
//!
//! `GET _cluster/settings?flat_settings=true` returns three sections keyed by
//! dotted setting names. Values are mostly strings, but lists, numbers and
//! booleans show up in the defaults section, so they are decoded into
//! [`SettingValue`] rather than an untyped map.

use crate::client::ClusterSettingsApi;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// A single setting value as returned by the cluster
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<SettingValue>),
    Map(BTreeMap<String, SettingValue>),
}

impl SettingValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Null => write!(f, "null"),
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Number(n) => write!(f, "{}", n),
            SettingValue::Text(s) => write!(f, "{}", s),
            SettingValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            SettingValue::Map(map) => {
                let json = serde_json::to_string(map).map_err(|_| fmt::Error)?;
                write!(f, "{}", json)
            }
        }
    }
}

/// Where a resolved setting came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    Transient,
    Persistent,
    Default,
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingSource::Transient => write!(f, "transient"),
            SettingSource::Persistent => write!(f, "persistent"),
            SettingSource::Default => write!(f, "default"),
        }
    }
}

/// Section a setting is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingScope {
    Persistent,
    Transient,
}

impl FromStr for SettingScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "persistent" => Ok(SettingScope::Persistent),
            "transient" => Ok(SettingScope::Transient),
            other => Err(Error::InvalidSettingScope(other.to_string())),
        }
    }
}

impl fmt::Display for SettingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingScope::Persistent => write!(f, "persistent"),
            SettingScope::Transient => write!(f, "transient"),
        }
    }
}

/// Decoded `GET _cluster/settings` response
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ClusterSettings {
    #[serde(default)]
    pub persistent: BTreeMap<String, SettingValue>,
    #[serde(default)]
    pub transient: BTreeMap<String, SettingValue>,
    #[serde(default)]
    pub defaults: BTreeMap<String, SettingValue>,
}

impl ClusterSettings {
    /// Effective value: transient wins over persistent, persistent over defaults.
    pub fn lookup(&self, name: &str) -> Option<(&SettingValue, SettingSource)> {
        if let Some(v) = self.transient.get(name) {
            return Some((v, SettingSource::Transient));
        }
        if let Some(v) = self.persistent.get(name) {
            return Some((v, SettingSource::Persistent));
        }
        self.defaults.get(name).map(|v| (v, SettingSource::Default))
    }

    /// Apply an update the way the cluster does: values replace, nulls remove.
    pub fn apply(&mut self, update: &SettingsUpdate) {
        for (scope, entries) in [
            (SettingScope::Persistent, &update.persistent),
            (SettingScope::Transient, &update.transient),
        ] {
            let section = match scope {
                SettingScope::Persistent => &mut self.persistent,
                SettingScope::Transient => &mut self.transient,
            };
            for (key, value) in entries {
                match value {
                    Some(v) => {
                        section.insert(key.clone(), SettingValue::Text(v.clone()));
                    }
                    None => {
                        section.remove(key);
                    }
                }
            }
        }
    }
}

/// Body for `PUT _cluster/settings`. `None` serializes as `null`, which
/// resets the key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub persistent: BTreeMap<String, Option<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub transient: BTreeMap<String, Option<String>>,
}

impl SettingsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, scope: SettingScope, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope_mut(scope).insert(key.into(), Some(value.into()));
        self
    }

    pub fn clear(mut self, scope: SettingScope, key: impl Into<String>) -> Self {
        self.scope_mut(scope).insert(key.into(), None);
        self
    }

    fn scope_mut(&mut self, scope: SettingScope) -> &mut BTreeMap<String, Option<String>> {
        match scope {
            SettingScope::Persistent => &mut self.persistent,
            SettingScope::Transient => &mut self.transient,
        }
    }
}

/// Resolve one setting by name.
pub async fn get_setting(
    api: &dyn ClusterSettingsApi,
    name: &str,
    include_defaults: bool,
) -> Result<(SettingValue, SettingSource)> {
    let settings = api.get_settings(include_defaults).await?;
    settings
        .lookup(name)
        .map(|(v, source)| (v.clone(), source))
        .ok_or_else(|| Error::SettingNotFound(name.to_string()))
}

pub async fn update_setting(
    api: &dyn ClusterSettingsApi,
    scope: SettingScope,
    name: &str,
    value: &str,
) -> Result<()> {
    info!(setting = name, %scope, value, "Updating cluster setting");
    api.put_settings(&SettingsUpdate::new().set(scope, name, value))
        .await
}

/// Reset a setting to its default by writing `null`.
pub async fn reset_setting(api: &dyn ClusterSettingsApi, scope: SettingScope, name: &str) -> Result<()> {
    info!(setting = name, %scope, "Resetting cluster setting");
    api.put_settings(&SettingsUpdate::new().clear(scope, name))
        .await
}
