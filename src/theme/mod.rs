//! Theme preference.
//!
//! A [`ThemeStore`] is created once per process and handed to whoever needs
//! it. Its initial value comes from, in order: the persisted preference, the
//! system's dark-mode signal, then [`Theme::Light`]. Every change, including
//! the initial value, is applied to a [`ThemeTarget`] through one effect, and
//! every explicit change is persisted best-effort.
//!
//! ```rust
//! use std::sync::Arc;
//! use finance_client::theme::{FixedColorScheme, MemoryStorage, RootElement, Theme, ThemeStore};
//!
//! let root = Arc::new(RootElement::default());
//! let store = ThemeStore::new(
//!     Arc::new(MemoryStorage::new()),
//!     &FixedColorScheme(Some(true)),
//!     root.clone(),
//! );
//! assert_eq!(store.theme(), Theme::Dark);
//! assert!(root.has_class("dark"));
//!
//! store.toggle();
//! assert!(!root.has_class("dark"));
//! ```

mod storage;

pub use storage::{FileStorage, MemoryStorage, PreferenceStorage, StorageError};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use crate::reactive::{ReadSignal, Signal, Subscription};

/// Storage key holding the persisted theme.
pub const STORAGE_KEY: &str = "finance-app-theme";

/// Class present on the root element while the dark theme is active.
pub const DARK_CLASS: &str = "dark";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other theme.
    pub fn flipped(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown theme {0:?}, expected \"light\" or \"dark\"")]
pub struct ParseThemeError(String);

impl FromStr for Theme {
    type Err = ParseThemeError;

    /// Only the exact strings `"light"` and `"dark"` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(ParseThemeError(other.to_string())),
        }
    }
}

/// Source of the system's dark-mode preference.
pub trait ColorSchemeProbe {
    /// `Some(true)` when the system asks for dark, `None` when unknown.
    fn prefers_dark(&self) -> Option<bool>;
}

/// A probe with a fixed answer, typically from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedColorScheme(pub Option<bool>);

impl ColorSchemeProbe for FixedColorScheme {
    fn prefers_dark(&self) -> Option<bool> {
        self.0
    }
}

/// Where the active theme is applied.
pub trait ThemeTarget: Send + Sync {
    fn apply(&self, theme: Theme);
}

/// The visual root: a class list that carries `dark` iff the theme is dark.
#[derive(Debug, Default)]
pub struct RootElement {
    classes: RwLock<BTreeSet<String>>,
}

impl RootElement {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(class)
    }

    pub fn classes(&self) -> Vec<String> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl ThemeTarget for RootElement {
    fn apply(&self, theme: Theme) {
        let mut classes = self
            .classes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match theme {
            Theme::Dark => {
                classes.insert(DARK_CLASS.to_string());
            }
            Theme::Light => {
                classes.remove(DARK_CLASS);
            }
        }
    }
}

/// Resolve the starting theme: stored value, then system signal, then light.
///
/// Storage read failures are logged and treated as "nothing stored".
pub fn initial_theme(storage: &dyn PreferenceStorage, probe: &dyn ColorSchemeProbe) -> Theme {
    let stored = match storage.read(STORAGE_KEY) {
        Ok(value) => value.and_then(|v| v.parse::<Theme>().ok()),
        Err(err) => {
            tracing::warn!(name: "theme.storage.read_failed", error = %err, "Failed to read theme from storage");
            None
        }
    };

    stored.unwrap_or_else(|| {
        if probe.prefers_dark() == Some(true) {
            Theme::Dark
        } else {
            Theme::Light
        }
    })
}

/// Process-scoped theme state.
pub struct ThemeStore {
    theme: Signal<Theme>,
    storage: Arc<dyn PreferenceStorage>,
    _apply: Subscription,
}

impl ThemeStore {
    /// Resolve the initial theme and apply it to `target` immediately.
    pub fn new(
        storage: Arc<dyn PreferenceStorage>,
        probe: &dyn ColorSchemeProbe,
        target: Arc<dyn ThemeTarget>,
    ) -> Self {
        let initial = initial_theme(storage.as_ref(), probe);
        tracing::debug!(name: "theme.initialized", theme = %initial, "theme initialized");

        let theme = Signal::new(initial);
        let apply = theme.effect(move |theme| target.apply(*theme));

        Self {
            theme,
            storage,
            _apply: apply,
        }
    }

    /// Current theme.
    pub fn theme(&self) -> Theme {
        self.theme.get()
    }

    /// Read-only view of the theme cell, for subscribing.
    ///
    /// Changes go through [`ThemeStore::set`] so they are always persisted.
    pub fn signal(&self) -> ReadSignal<Theme> {
        self.theme.read_only()
    }

    /// Switch to `theme`, apply it, and persist it.
    ///
    /// A failed write is logged; the in-memory theme stays changed.
    pub fn set(&self, theme: Theme) {
        self.theme.set(theme);
        if let Err(err) = self.storage.write(STORAGE_KEY, theme.as_str()) {
            tracing::warn!(name: "theme.storage.write_failed", error = %err, theme = %theme, "Failed to save theme to storage");
        }
    }

    /// Flip between light and dark. Returns the new theme.
    pub fn toggle(&self) -> Theme {
        let next = self.theme().flipped();
        self.set(next);
        next
    }
}

impl fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeStore")
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}
