//! Bidirectional table between physical keys and logical actions.
//!
//! The key → action direction is on the hot path: the keyboard hook sees every
//! key event on the system and each one is looked up here.  It is therefore a
//! 256-entry array indexed by the VK code, so the lookup is a single index and
//! an unmapped key costs nothing beyond that.
//!
//! The action → key direction is used by configuration surfaces and is total:
//! a [`KeyMapping`] cannot be constructed unless every [`Action`] has a key.

pub mod windows_vk;

use thiserror::Error;

use crate::action::Action;
pub use windows_vk::VirtualKey;

/// Errors raised while building a [`KeyMapping`] or resolving an action name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyMapError {
    /// The same key was bound to two different actions.
    #[error("{key} is bound to both {first} and {second}")]
    DuplicateKey {
        key: VirtualKey,
        first: Action,
        second: Action,
    },

    /// An action was left without any key.
    #[error("no key is bound to {0}")]
    MissingAction(Action),

    /// A string did not name any action.
    #[error("unknown action: {0:?}")]
    UnknownAction(String),
}

/// Immutable key ↔ action table.
///
/// Each key maps to at most one action; each action has at least one key.
/// Several keys may engage the same action (both Shift keys engage
/// [`Action::SpeedUp`] in the default table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMapping {
    by_key: [Option<Action>; 256],
    primary: [VirtualKey; Action::COUNT],
}

impl KeyMapping {
    /// Builds a table from `(key, action)` pairs.
    ///
    /// The first pair seen for an action defines its primary key.  Binding the
    /// same key twice to the same action is accepted and ignored.
    ///
    /// # Errors
    ///
    /// - [`KeyMapError::DuplicateKey`] if a key is bound to two actions.
    /// - [`KeyMapError::MissingAction`] if some action has no key.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, KeyMapError>
    where
        I: IntoIterator<Item = (VirtualKey, Action)>,
    {
        let mut by_key: [Option<Action>; 256] = [None; 256];
        let mut primary: [Option<VirtualKey>; Action::COUNT] = [None; Action::COUNT];

        for (key, action) in pairs {
            match by_key[key.code() as usize] {
                Some(existing) if existing != action => {
                    return Err(KeyMapError::DuplicateKey {
                        key,
                        first: existing,
                        second: action,
                    });
                }
                _ => by_key[key.code() as usize] = Some(action),
            }
            primary[action.index()].get_or_insert(key);
        }

        let mut resolved = [VirtualKey(0); Action::COUNT];
        for action in Action::ALL {
            resolved[action.index()] =
                primary[action.index()].ok_or(KeyMapError::MissingAction(action))?;
        }

        Ok(Self {
            by_key,
            primary: resolved,
        })
    }

    /// Returns the action bound to `key`, or `None` if the key is not mapped.
    ///
    /// An unmapped key is not an error; callers simply ignore it.
    #[inline]
    pub fn action_for(&self, key: VirtualKey) -> Option<Action> {
        self.by_key[key.code() as usize]
    }

    /// Returns the primary key bound to `action`.
    pub fn key_for(&self, action: Action) -> VirtualKey {
        self.primary[action.index()]
    }

    /// Returns every key bound to `action`, primary key first.
    pub fn keys_for(&self, action: Action) -> Vec<VirtualKey> {
        let primary = self.key_for(action);
        let mut keys = vec![primary];
        // Linear scan is fine for the infrequent action -> keys direction.
        keys.extend(
            (0..=u8::MAX)
                .map(VirtualKey)
                .filter(|&k| k != primary && self.action_for(k) == Some(action)),
        );
        keys
    }

    /// Resolves an action by its [`Action::name`] and returns its primary key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyMapError::UnknownAction`] if `name` is not an action name.
    pub fn key_for_name(&self, name: &str) -> Result<VirtualKey, KeyMapError> {
        let action: Action = name.parse()?;
        Ok(self.key_for(action))
    }
}

impl Default for KeyMapping {
    /// The compiled-in F13–F24 / Shift / Ctrl table.
    fn default() -> Self {
        let mut by_key: [Option<Action>; 256] = [None; 256];
        let mut primary = [VirtualKey(0); Action::COUNT];
        let mut seen = [false; Action::COUNT];
        for (key, action) in windows_vk::DEFAULT_BINDINGS {
            by_key[key.code() as usize] = Some(action);
            if !seen[action.index()] {
                seen[action.index()] = true;
                primary[action.index()] = key;
            }
        }
        Self { by_key, primary }
    }
}
