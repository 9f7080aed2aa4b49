//! StreamHub - independent learning streams keyed by name.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::ArchetypeConfig;
use crate::error::{ArchetypeError, ArchetypeResult};
use crate::observation::Observation;
use crate::persistence::StreamStorage;

use super::stream::{LearningStream, TurnReport};

/// A stream shared between callers. The mutex covers a whole turn.
pub type SharedStream = Arc<Mutex<LearningStream>>;

/// Registry of named streams sharing one configuration.
///
/// Streams never share learned state. With `storage.root` configured each
/// stream persists under its own sanitized directory.
///
/// # Example
///
/// ```
/// use archetype_core::config::ArchetypeConfig;
/// use archetype_core::observation::ObservationBuilder;
/// use archetype_core::processor::StreamHub;
///
/// let hub = StreamHub::new(ArchetypeConfig::default()).expect("valid config");
/// let obs = ObservationBuilder::new("turn-1").outcome(0.7).build();
///
/// hub.process("alice", &obs);
/// hub.process("bob", &obs);
/// assert_eq!(hub.len(), 2);
/// ```
#[derive(Debug)]
pub struct StreamHub {
    config: ArchetypeConfig,
    streams: RwLock<HashMap<String, SharedStream>>,
}

impl StreamHub {
    /// Create a hub, returning an error if the config is invalid.
    pub fn new(config: ArchetypeConfig) -> ArchetypeResult<Self> {
        config.validate()?;
        if let Some(root) = &config.storage.root {
            std::fs::create_dir_all(root).map_err(|e| ArchetypeError::io(root, e))?;
        }
        Ok(Self {
            config,
            streams: RwLock::new(HashMap::new()),
        })
    }

    /// Get a stream, opening it on first use.
    ///
    /// Snapshots are read without holding the hub lock. When two callers
    /// open the same name at once the first insert wins and the other copy
    /// is dropped unused.
    pub fn get_or_create(&self, name: &str) -> SharedStream {
        if let Some(stream) = self.streams.read().get(name) {
            return Arc::clone(stream);
        }
        let opened = Arc::new(Mutex::new(self.open_stream(name)));
        let mut streams = self.streams.write();
        Arc::clone(streams.entry(name.to_string()).or_insert(opened))
    }

    /// Get a stream if it has been opened.
    pub fn get(&self, name: &str) -> Option<SharedStream> {
        self.streams.read().get(name).map(Arc::clone)
    }

    /// Run one turn on the named stream.
    pub fn process(&self, name: &str, obs: &Observation) -> TurnReport {
        let stream = self.get_or_create(name);
        let mut guard = stream.lock();
        guard.process(obs)
    }

    /// Write every open stream's snapshots; the first failure is returned.
    pub fn persist_all(&self) -> ArchetypeResult<()> {
        let streams: Vec<SharedStream> = self.streams.read().values().cloned().collect();
        let mut first = None;
        for stream in streams {
            if let Err(e) = stream.lock().persist() {
                first.get_or_insert(e);
            }
        }
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drop a stream from the hub after persisting it.
    ///
    /// The stream stays open when persisting fails so no learned state is
    /// lost; the caller can retry.
    pub fn close(&self, name: &str) -> ArchetypeResult<bool> {
        let stream = match self.get(name) {
            Some(stream) => stream,
            None => return Ok(false),
        };
        let guard = stream.lock();
        guard.persist()?;
        let mut streams = self.streams.write();
        if streams
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, &stream))
        {
            streams.remove(name);
        }
        drop(streams);
        drop(guard);
        tracing::info!(stream = %name, "STREAM_HUB: closed stream");
        Ok(true)
    }

    /// Names of the open streams, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.streams.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of open streams.
    pub fn len(&self) -> usize {
        self.streams.read().len()
    }

    /// Check if no stream is open.
    pub fn is_empty(&self) -> bool {
        self.streams.read().is_empty()
    }

    /// Get the configuration.
    pub fn config(&self) -> &ArchetypeConfig {
        &self.config
    }

    fn open_stream(&self, name: &str) -> LearningStream {
        let root = match &self.config.storage.root {
            Some(root) => root,
            None => {
                tracing::debug!(stream = %name, "STREAM_HUB: created in-memory stream");
                return LearningStream::named(name, self.config.clone());
            }
        };
        let storage = StreamStorage::new(root, name, &self.config.storage);
        match LearningStream::open(name, self.config.clone(), storage) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(
                    stream = %name,
                    error = %e,
                    "STREAM_HUB: Failed to open stream, continuing in memory"
                );
                LearningStream::named(name, self.config.clone())
            }
        }
    }
}
