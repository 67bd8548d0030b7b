//! The exam block dataset: title, version, registry and change observers.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use eb_core::{Config, Registry};
use tracing::{info, warn};

use crate::error::CodecError;
use crate::reader::{Document, read_dataset};
use crate::writer::write_dataset;

/// Receives a notification whenever the dataset changes.
///
/// `property` names what changed, for example `"loaded"`, `"version"` or a
/// caller-supplied name passed to [`ExamBlock::modify`].
pub trait ModelObserver {
    /// Called after the change has been applied.
    fn model_changed(&self, property: &str);
}

/// One loaded (or newly created) exam block.
///
/// # Examples
///
/// ```
/// use eb_codec::ExamBlock;
/// use eb_core::Room;
///
/// let mut block = ExamBlock::new();
/// block.modify("rooms", |registry| registry.add(Room::new("R1"))).unwrap();
///
/// let mut out = Vec::new();
/// block.write(&mut out).unwrap();
///
/// let copy = ExamBlock::read(out.as_slice()).unwrap();
/// assert_eq!(copy.title(), "Exam Block Model");
/// assert!(copy.registry().contains::<Room>("R1"));
/// ```
pub struct ExamBlock {
    title: String,
    version: f64,
    registry: Registry,
    filename: Option<Utf8PathBuf>,
    observers: Vec<Box<dyn ModelObserver>>,
}

impl ExamBlock {
    /// Creates an empty dataset with default title and version.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Creates an empty dataset with the configured title and version.
    #[must_use]
    pub fn with_config(config: &Config) -> Self {
        Self {
            title: config.dataset.default_title.clone(),
            version: config.dataset.default_version,
            registry: Registry::new(),
            filename: None,
            observers: Vec::new(),
        }
    }

    fn from_document(document: Document, filename: Option<Utf8PathBuf>) -> Self {
        Self {
            title: document.title,
            version: document.version,
            registry: document.registry,
            filename,
            observers: Vec::new(),
        }
    }

    /// Returns the dataset title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replaces the dataset title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.notify("title");
    }

    /// Returns the dataset version.
    #[must_use]
    pub const fn version(&self) -> f64 {
        self.version
    }

    /// Raises the version. Returns `false`, leaving the version unchanged,
    /// if `version` is not greater than the current one.
    pub fn set_version(&mut self, version: f64) -> bool {
        if !version.is_finite() || version <= self.version {
            warn!(
                current = self.version,
                requested = version,
                "Ignoring version that does not increase"
            );
            return false;
        }
        self.version = version;
        self.notify("version");
        true
    }

    /// Returns the file the dataset was last loaded from or saved to.
    #[must_use]
    pub fn filename(&self) -> Option<&Utf8Path> {
        self.filename.as_deref()
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Applies a change to the registry and notifies observers.
    ///
    /// Observers are notified whatever `change` returns; a rejected
    /// change leaves the registry as it was.
    pub fn modify<T>(&mut self, property: &str, change: impl FnOnce(&mut Registry) -> T) -> T {
        let result = change(&mut self.registry);
        self.notify(property);
        result
    }

    /// Registers an observer.
    pub fn add_observer(&mut self, observer: Box<dyn ModelObserver>) {
        self.observers.push(observer);
    }

    fn notify(&self, property: &str) {
        for observer in &self.observers {
            observer.model_changed(property);
        }
    }

    /// Reads a dataset from any buffered reader.
    pub fn read<R: BufRead>(input: R) -> Result<Self, CodecError> {
        read_dataset(input).map(|document| Self::from_document(document, None))
    }

    /// Loads a dataset from a file.
    pub fn load(path: &Utf8Path) -> Result<Self, CodecError> {
        let file = File::open(path).map_err(|source| CodecError::Open {
            path: path.to_owned(),
            source,
        })?;
        let document = read_dataset(BufReader::new(file))?;
        info!(path = %path, "Loaded exam block");
        Ok(Self::from_document(document, Some(path.to_owned())))
    }

    /// Replaces this dataset with the contents of a file, keeping the
    /// registered observers.
    ///
    /// On failure `self` is untouched.
    pub fn reload(&mut self, path: &Utf8Path) -> Result<(), CodecError> {
        let loaded = Self::load(path)?;
        self.title = loaded.title;
        self.version = loaded.version;
        self.registry = loaded.registry;
        self.filename = loaded.filename;
        self.notify("loaded");
        Ok(())
    }

    /// Writes the dataset to any writer.
    pub fn write<W: Write>(&self, out: W) -> Result<(), CodecError> {
        write_dataset(out, &self.title, self.version, &self.registry)
    }

    /// Saves the dataset to a file, creating or truncating it.
    pub fn save(&mut self, path: &Utf8Path) -> Result<(), CodecError> {
        let file = File::create(path).map_err(|source| CodecError::Open {
            path: path.to_owned(),
            source,
        })?;
        let mut out = BufWriter::new(file);
        self.write(&mut out)?;
        out.flush()?;
        info!(path = %path, version = self.version, "Saved exam block");
        self.filename = Some(path.to_owned());
        Ok(())
    }
}

impl Default for ExamBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExamBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamBlock")
            .field("title", &self.title)
            .field("version", &self.version)
            .field("filename", &self.filename)
            .field("registry", &self.registry)
            .field("observers", &self.observers.len())
            .finish()
    }
}
