//! Named value registry shared by the steps of one test.
//!
//! Entries are a closed set of payload kinds; typed lookups go through
//! [`ValueStore::get`], which fails with [`HsaError::WrongKind`] instead of
//! casting.

use crate::dispatch::DispatchSetup;
use crate::error::{HsaError, Result};
use crate::executable::Brig;
use crate::image::{ImageParams, SamplerParams};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone)]
pub enum Entry {
    Value(Value),
    Values(Vec<Value>),
    Brig(Brig),
    ImageParams(ImageParams),
    SamplerParams(SamplerParams),
    DispatchSetup(DispatchSetup),
}

impl Entry {
    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Value(_) => Value::KIND,
            Entry::Values(_) => <Vec<Value>>::KIND,
            Entry::Brig(_) => Brig::KIND,
            Entry::ImageParams(_) => ImageParams::KIND,
            Entry::SamplerParams(_) => SamplerParams::KIND,
            Entry::DispatchSetup(_) => DispatchSetup::KIND,
        }
    }
}

/// A payload type that can be read back out of an [`Entry`].
pub trait FromEntry: Sized {
    const KIND: &'static str;

    fn from_entry(entry: &Entry) -> Option<Self>;
}

macro_rules! entry_kind {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl FromEntry for $ty {
            const KIND: &'static str = $kind;

            fn from_entry(entry: &Entry) -> Option<Self> {
                match entry {
                    Entry::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Entry {
            fn from(v: $ty) -> Self {
                Entry::$variant(v)
            }
        }
    };
}

entry_kind!(Value, Value, "a value");
entry_kind!(Vec<Value>, Values, "a value list");
entry_kind!(Brig, Brig, "a BRIG module");
entry_kind!(ImageParams, ImageParams, "image parameters");
entry_kind!(SamplerParams, SamplerParams, "sampler parameters");
entry_kind!(DispatchSetup, DispatchSetup, "a dispatch setup");

#[derive(Debug, Default)]
pub struct ValueStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Entry>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    pub fn get<T: FromEntry>(&self, key: &str) -> Result<T> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .get(key)
            .ok_or_else(|| HsaError::MissingValue(key.to_string()))?;
        T::from_entry(entry).ok_or_else(|| HsaError::WrongKind {
            key: key.to_string(),
            expected: T::KIND,
        })
    }

    /// Like [`get`](Self::get) but an absent key is `Ok(None)`.
    pub fn find<T: FromEntry>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            Ok(v) => Ok(Some(v)),
            Err(HsaError::MissingValue(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Re-keys an entry. The destination must be free.
    pub fn move_entry(&self, from: &str, to: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(to) {
            return Err(HsaError::DuplicateKey(to.to_string()));
        }
        let entry = entries
            .remove(from)
            .ok_or_else(|| HsaError::MissingValue(from.to_string()))?;
        entries.insert(to.to_string(), entry);
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Option<Entry> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
