use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error as ThisError;

/// The Store is responsible for managing the key space. Keys are arbitrary bytes and every key
/// maps to exactly one [`Entry`], either a string or a list. Operations that expect the other
/// variant fail with [`Error::WrongType`] without touching the stored value.
///
/// The store is designed to be thread-safe, allowing it to be shared and cloned cheaply using
/// reference counting. Each operation takes the lock for the duration of an in-memory update
/// only, so callers observe every operation as atomic.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<State>>,
}

#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    #[error("operation against a key holding the wrong kind of value")]
    WrongType,
}

type Key = Bytes;

#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    String(Bytes),
    /// Front of the deque is the head of the list. Never empty while stored.
    List(VecDeque<Bytes>),
}

#[derive(Default)]
pub struct State {
    keys: HashMap<Key, Entry>,
}

impl Store {
    pub fn new() -> Store {
        Self::default()
    }

    // No operation panics while holding the lock, so a poisoned lock still guards a consistent
    // map and it is safe to keep serving from it.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value` as a string at `key`, replacing whatever was there, lists included.
    pub fn set(&self, key: Key, value: Bytes) {
        self.write().keys.insert(key, Entry::String(value));
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>, Error> {
        match self.read().keys.get(key) {
            Some(Entry::String(value)) => Ok(Some(value.clone())),
            Some(Entry::List(_)) => Err(Error::WrongType),
            None => Ok(None),
        }
    }

    /// Inserts every value at the head of the list stored at `key`, one after the other, so the
    /// last value ends up first. The list is created if `key` does not exist.
    ///
    /// Returns the length of the list after the push.
    ///
    /// Pushing no values never creates the key, the current length is returned instead.
    pub fn lpush(&self, key: Key, values: Vec<Bytes>) -> Result<usize, Error> {
        let mut state = self.write();

        if values.is_empty() {
            return match state.keys.get(&key) {
                Some(Entry::List(list)) => Ok(list.len()),
                Some(Entry::String(_)) => Err(Error::WrongType),
                None => Ok(0),
            };
        }

        let list = match state
            .keys
            .entry(key)
            .or_insert_with(|| Entry::List(VecDeque::with_capacity(values.len())))
        {
            Entry::List(list) => list,
            Entry::String(_) => return Err(Error::WrongType),
        };

        for value in values {
            list.push_front(value);
        }

        Ok(list.len())
    }

    /// Removes and returns the head of the list stored at `key`. The key is deleted once its list
    /// runs empty.
    pub fn lpop(&self, key: &[u8]) -> Result<Option<Bytes>, Error> {
        let mut state = self.write();

        let list = match state.keys.get_mut(key) {
            Some(Entry::List(list)) => list,
            Some(Entry::String(_)) => return Err(Error::WrongType),
            None => return Ok(None),
        };

        let value = list.pop_front();
        if list.is_empty() {
            state.keys.remove(key);
        }

        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.read().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the whole key space at a single point in time.
    pub fn snapshot(&self) -> HashMap<Key, Entry> {
        self.read().keys.clone()
    }
}
