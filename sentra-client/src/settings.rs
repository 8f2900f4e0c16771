//! Access to persisted user settings.
//!
//! The file format belongs to whoever implements [`SettingsStore`]; the
//! client only goes through these accessors.

use crate::error::ClientResult;
use async_trait::async_trait;
use sentra_types::KeyBindings;
use tokio::sync::RwLock;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load_bindings(&self) -> ClientResult<KeyBindings>;

    async fn save_bindings(&self, bindings: &KeyBindings) -> ClientResult<()>;

    /// Whether the movement driver was last seen installed.
    async fn driver_installed(&self) -> ClientResult<bool>;

    async fn set_driver_installed(&self, installed: bool) -> ClientResult<()>;

    async fn theme(&self) -> ClientResult<String>;

    async fn set_theme(&self, theme: &str) -> ClientResult<()>;
}

#[derive(Debug, Clone)]
struct Settings {
    bindings: KeyBindings,
    driver_installed: bool,
    theme: String,
}

/// Settings held in memory only.
#[derive(Debug)]
pub struct MemorySettings {
    inner: RwLock<Settings>,
}

impl MemorySettings {
    #[must_use]
    pub fn new() -> Self {
        Self::with_bindings(KeyBindings::defaults())
    }

    #[must_use]
    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            inner: RwLock::new(Settings {
                bindings,
                driver_installed: false,
                theme: "dark".to_string(),
            }),
        }
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn load_bindings(&self) -> ClientResult<KeyBindings> {
        Ok(self.inner.read().await.bindings.clone())
    }

    async fn save_bindings(&self, bindings: &KeyBindings) -> ClientResult<()> {
        self.inner.write().await.bindings = bindings.clone();
        Ok(())
    }

    async fn driver_installed(&self) -> ClientResult<bool> {
        Ok(self.inner.read().await.driver_installed)
    }

    async fn set_driver_installed(&self, installed: bool) -> ClientResult<()> {
        self.inner.write().await.driver_installed = installed;
        Ok(())
    }

    async fn theme(&self) -> ClientResult<String> {
        Ok(self.inner.read().await.theme.clone())
    }

    async fn set_theme(&self, theme: &str) -> ClientResult<()> {
        self.inner.write().await.theme = theme.to_string();
        Ok(())
    }
}
