use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{GameError, HubError};
use crate::game_trait::{ArcadeGame, GameKey, GameMetadata};

/// Produces a fresh game instance for every activation.
pub type GameFactory = Rc<dyn Fn() -> Result<Box<dyn ArcadeGame>, GameError>>;

/// A registrable game: key, display metadata and factory.
#[derive(Clone)]
pub struct GameDescriptor {
    pub key: GameKey,
    pub metadata: GameMetadata,
    pub factory: GameFactory,
}

impl GameDescriptor {
    pub fn new(
        key: impl Into<GameKey>,
        metadata: GameMetadata,
        factory: impl Fn() -> Result<Box<dyn ArcadeGame>, GameError> + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            metadata,
            factory: Rc::new(factory),
        }
    }

    /// Descriptor for a game type constructible with `Default`, taking the
    /// metadata from a throwaway instance.
    pub fn of<G: ArcadeGame + Default + 'static>(key: impl Into<GameKey>) -> Self {
        let metadata = G::default().metadata();
        Self::new(key, metadata, || {
            Ok(Box::new(G::default()) as Box<dyn ArcadeGame>)
        })
    }
}

impl std::fmt::Debug for GameDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameDescriptor")
            .field("key", &self.key)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Registry of available games, in registration order.
#[derive(Default)]
pub struct GameRegistry {
    entries: Vec<GameDescriptor>,
    index: HashMap<GameKey, usize>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. Keys are unique; a second registration fails and
    /// leaves the first in place.
    pub fn register(&mut self, descriptor: GameDescriptor) -> Result<(), HubError> {
        if self.index.contains_key(&descriptor.key) {
            return Err(HubError::DuplicateGameKey(descriptor.key));
        }
        self.index.insert(descriptor.key.clone(), self.entries.len());
        tracing::debug!(key = %descriptor.key, "game registered");
        self.entries.push(descriptor);
        Ok(())
    }

    pub fn get(&self, key: &GameKey) -> Option<&GameDescriptor> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, key: &GameKey) -> bool {
        self.index.contains_key(key)
    }

    /// Read-only snapshot of every registered descriptor.
    pub fn list(&self) -> Vec<GameDescriptor> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SpyGame;

    fn descriptor(key: &str) -> GameDescriptor {
        GameDescriptor::of::<SpyGame>(key)
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = GameRegistry::new();
        assert!(registry.is_empty());
        registry.register(descriptor("snake")).unwrap();
        assert!(registry.contains(&GameKey::from("snake")));
        assert!(registry.get(&GameKey::from("merge")).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut registry = GameRegistry::new();
        registry.register(descriptor("snake")).unwrap();
        let err = registry.register(descriptor("snake")).unwrap_err();
        assert_eq!(err, HubError::DuplicateGameKey(GameKey::from("snake")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn list_preserves_registration_order() {
        let mut registry = GameRegistry::new();
        for key in ["b", "a", "c"] {
            registry.register(descriptor(key)).unwrap();
        }
        let keys: Vec<_> = registry.list().into_iter().map(|d| d.key.0).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn factory_runs_once_per_call() {
        let calls = Rc::new(std::cell::Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut registry = GameRegistry::new();
        registry
            .register(GameDescriptor::new(
                "x",
                GameMetadata::new("X", "counts"),
                move || {
                    counter.set(counter.get() + 1);
                    Ok(Box::new(SpyGame::default()) as Box<dyn ArcadeGame>)
                },
            ))
            .unwrap();
        let d = registry.get(&GameKey::from("x")).unwrap();
        let _a = (d.factory)().unwrap();
        let _b = (d.factory)().unwrap();
        assert_eq!(calls.get(), 2);
    }
}
