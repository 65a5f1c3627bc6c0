// rflex - token classification for tabular test-specification files.
// Copyright (C) 2025 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! A cache of classified files, shared between threads.
//!
//! An editor typically has two versions of a file at once: the one saved on
//! disk and the one in its buffer.  [ParseCache] holds the most recent
//! classification of each, under a [Slot], keyed by whatever the caller uses
//! to identify files.

use std::{
    hash::Hash,
    path::Path,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use encoding_rs::Encoding;
use enum_map::{Enum, EnumMap};
use hashbrown::HashMap;
use log::{debug, error};

use crate::lex::{Cancellation, Error, SourceFile, TokenStream, Vocabulary, classify};

/// Which version of a file a cache entry holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Enum)]
pub enum Slot {
    /// The file as saved on disk.
    Disk,

    /// The file as edited in an editor buffer.
    Editor,
}

/// The contents of one slot.
///
/// `generation` is that of the classification that produced `stream`, or of
/// the invalidation that cleared it.  Only a classification that started
/// later may replace it.
#[derive(Clone, Debug, Default)]
struct Version {
    generation: u64,
    stream: Option<Arc<TokenStream>>,
}

type Entry = EnumMap<Slot, Version>;

pub struct ParseCache<K> {
    vocabulary: Arc<Vocabulary>,
    generation: AtomicU64,
    entries: Mutex<HashMap<K, Entry>>,
}

impl<K> Default for ParseCache<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new(Arc::new(Vocabulary::default()))
    }
}

impl<K> ParseCache<K>
where
    K: Clone + Eq + Hash,
{
    /// Returns an empty cache that classifies files with `vocabulary`.
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary,
            generation: AtomicU64::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    // A panic while the lock is held cannot leave an entry half-written,
    // because versions are only ever replaced whole.
    fn entries(&self) -> MutexGuard<'_, HashMap<K, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self, key: &K, slot: Slot) -> Option<Arc<TokenStream>> {
        self.entries()
            .get(key)
            .and_then(|entry| entry[slot].stream.clone())
    }

    /// Returns the editor version of `key` if there is one, otherwise the disk
    /// version.
    pub fn latest(&self, key: &K) -> Option<Arc<TokenStream>> {
        let entries = self.entries();
        let entry = entries.get(key)?;
        entry[Slot::Editor]
            .stream
            .clone()
            .or_else(|| entry[Slot::Disk].stream.clone())
    }

    pub fn insert(&self, key: K, slot: Slot, stream: Arc<TokenStream>) {
        let generation = self.next_generation();
        self.put(key, slot, generation, Some(stream));
    }

    /// Replaces `slot` for `key` unless a later classification or
    /// invalidation has already done so.  Returns true if it was replaced.
    fn put(&self, key: K, slot: Slot, generation: u64, stream: Option<Arc<TokenStream>>) -> bool {
        let mut entries = self.entries();
        let version = &mut entries.entry(key).or_default()[slot];
        if version.generation > generation {
            return false;
        }
        *version = Version { generation, stream };
        true
    }

    /// Classifies `source` and stores the result under `key` and `slot`,
    /// replacing any previous result.  The lock is not held while
    /// classifying, so classifications of the same slot may overlap; the one
    /// that started last wins, whatever order they finish in.
    ///
    /// If classification fails, logs the error and stores an empty stream.
    /// Returns `None`, storing nothing, if classification is cancelled or a
    /// later one has already stored its result.
    pub fn parse(
        &self,
        key: K,
        slot: Slot,
        source: &SourceFile,
        cancellation: &Cancellation,
    ) -> Option<Arc<TokenStream>> {
        let generation = self.next_generation();
        let result = classify(source, &self.vocabulary, cancellation);
        self.store(key, slot, generation, result)
    }

    /// Reads `path` in `encoding` (or a detected encoding), classifies it,
    /// and stores the result under `key` in the [Slot::Disk] slot, as for
    /// [ParseCache::parse].
    pub fn parse_file<P>(
        &self,
        key: K,
        path: P,
        encoding: Option<&'static Encoding>,
        cancellation: &Cancellation,
    ) -> Option<Arc<TokenStream>>
    where
        P: AsRef<Path>,
    {
        let generation = self.next_generation();
        let result = SourceFile::for_file(path, encoding)
            .and_then(|source| classify(&source, &self.vocabulary, cancellation));
        self.store(key, Slot::Disk, generation, result)
    }

    fn store(
        &self,
        key: K,
        slot: Slot,
        generation: u64,
        result: Result<TokenStream, Error>,
    ) -> Option<Arc<TokenStream>> {
        let stream = match result {
            Ok(stream) => stream,
            Err(Error::Cancelled) => {
                debug!("classification {generation} cancelled");
                return None;
            }
            Err(error) => {
                error!("{error}");
                TokenStream::default()
            }
        };
        let stream = Arc::new(stream);
        if self.put(key, slot, generation, Some(stream.clone())) {
            Some(stream)
        } else {
            debug!("classification {generation} superseded");
            None
        }
    }

    /// Discards the result in `slot` for `key`, along with the result of any
    /// classification of that slot still in progress.
    pub fn invalidate(&self, key: &K, slot: Slot) {
        let generation = self.next_generation();
        self.put(key.clone(), slot, generation, None);
    }

    /// Forgets `key` entirely.  Unlike [ParseCache::invalidate], this does not
    /// affect classifications still in progress, which store their results as
    /// usual.
    pub fn remove(&self, key: &K) {
        self.entries().remove(key);
    }

    /// Returns the number of files with at least one result.
    pub fn len(&self) -> usize {
        self.entries()
            .values()
            .filter(|entry| entry.values().any(|version| version.stream.is_some()))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
