use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Unknown setting '{0}'")]
    Unknown(SettingKey),

    #[error("Invalid setting key '{0}', expected 'section.option'")]
    InvalidKey(String),
}

/// Two-part address of an integer setting (`section.option`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SettingKey {
    pub section: String,
    pub option: String,
}

impl SettingKey {
    pub fn new(section: impl Into<String>, option: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            option: option.into(),
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.option)
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((section, option)) if !section.is_empty() && !option.is_empty() => {
                Ok(Self::new(section, option))
            }
            _ => Err(SettingsError::InvalidKey(s.to_string())),
        }
    }
}

impl TryFrom<String> for SettingKey {
    type Error = SettingsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SettingKey> for String {
    fn from(key: SettingKey) -> Self {
        key.to_string()
    }
}

/// Handle returned by [`Settings::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Change handler; receives the store and the key that changed
pub type ChangeHandler = Arc<dyn Fn(&Settings, &SettingKey) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    key: SettingKey,
    handler: ChangeHandler,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<Subscription>,
}

/// Runtime integer settings with change notification
///
/// Handlers run synchronously inside [`Settings::set`], in subscription
/// order, after the new value is visible through [`Settings::get`].
#[derive(Default)]
pub struct Settings {
    values: RwLock<BTreeMap<SettingKey, i64>>,
    subscribers: RwLock<Subscribers>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = (SettingKey, i64)>) -> Self {
        Self {
            values: RwLock::new(values.into_iter().collect()),
            subscribers: RwLock::default(),
        }
    }

    pub fn get(&self, key: &SettingKey) -> Result<i64, SettingsError> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values
            .get(key)
            .copied()
            .ok_or_else(|| SettingsError::Unknown(key.clone()))
    }

    pub fn contains(&self, key: &SettingKey) -> bool {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.contains_key(key)
    }

    /// Store `value` under `key` and notify subscribers of that key
    pub fn set(&self, key: &SettingKey, value: i64) {
        {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            values.insert(key.clone(), value);
        }
        tracing::debug!(%key, value, "Setting changed");

        let handlers: Vec<ChangeHandler> = {
            let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
            subscribers
                .entries
                .iter()
                .filter(|s| &s.key == key)
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };

        for handler in handlers {
            handler(self, key);
        }
    }

    pub fn subscribe<F>(&self, key: SettingKey, handler: F) -> SubscriptionId
    where
        F: Fn(&Settings, &SettingKey) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(subscribers.next_id);
        subscribers.next_id += 1;
        subscribers.entries.push(Subscription {
            id,
            key,
            handler: Arc::new(handler),
        });
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.entries.len();
        subscribers.entries.retain(|s| s.id != id);
        subscribers.entries.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
        subscribers.entries.len()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Settings")
            .field("values", &*values)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
