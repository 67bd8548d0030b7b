//! The typed object registry.
//!
//! [`Registry`] holds one [`Table`] per [`EntityKind`]. Each table keeps its
//! entities in registration order alongside an identity index and an alias
//! index, so lookups are O(1) while `all` still reflects load order.
//!
//! # Registration
//!
//! Construction and registration are separate steps. Entities are built as
//! plain values and only become visible once [`Registry::add`] accepts them;
//! a rejected add leaves the registry exactly as it was.
//!
//! ```
//! use eb_core::{Registry, RegistryError, Room};
//!
//! let mut registry = Registry::new();
//! registry.add(Room::new("R1")).unwrap();
//!
//! let err = registry.add(Room::new("R1")).unwrap_err();
//! assert!(err.is_duplicate());
//! assert_eq!(registry.len::<Room>(), 1);
//! ```
//!
//! # Thread Safety
//!
//! The registry has no internal locking. It is `Send`, but callers must
//! serialize every access to one instance.

use std::fmt::{self, Write as _};

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::RegistryError;
use crate::identity::{Describe, Entity, EntityKind};
use crate::types::{Exam, Room, Session, Student, Subject, Unit, Venue};

/// Storage for every registered entity of one kind.
///
/// Entities are never removed individually; a table lives as long as the
/// dataset it was loaded for.
#[derive(Debug, Clone)]
pub struct Table<T> {
    /// Entities in registration order.
    items: Vec<T>,
    /// Identity string to position in `items`.
    index: FxHashMap<String, usize>,
    /// Alias to position in `items`; first registration wins.
    aliases: FxHashMap<String, usize>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: FxHashMap::default(),
            aliases: FxHashMap::default(),
        }
    }
}

impl<T: Entity> Table<T> {
    fn insert(&mut self, entity: T) -> Result<String, RegistryError> {
        entity.validate()?;
        let identity = entity.identity();
        if self.index.contains_key(&identity) {
            return Err(RegistryError::duplicate(T::KIND, identity));
        }

        let position = self.items.len();
        if let Some(alias) = entity.alias() {
            self.aliases.entry(alias).or_insert(position);
        }
        self.index.insert(identity.clone(), position);
        self.items.push(entity);

        trace!(kind = %T::KIND, identity = %identity, "Registered entity");
        Ok(identity)
    }

    /// Returns the entity with the given identity.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&T> {
        self.index.get(identity).map(|&position| &self.items[position])
    }

    fn get_mut(&mut self, identity: &str) -> Option<&mut T> {
        let position = *self.index.get(identity)?;
        self.items.get_mut(position)
    }

    fn resolve(&self, key: &str) -> Option<&T> {
        self.get(key).or_else(|| {
            self.aliases
                .get(key)
                .map(|&position| &self.items[position])
        })
    }

    /// Returns all entities in registration order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Returns the number of registered entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Either a plain [`Room`] or a [`Venue`], as seen through a room listing.
///
/// The discriminant is what keeps the Rooms section from writing venues a
/// second time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoomKind<'a> {
    /// A room that is not set up as a venue.
    Plain(&'a Room),
    /// A venue.
    Venue(&'a Venue),
}

impl RoomKind<'_> {
    /// Returns the room or venue id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Plain(room) => room.id(),
            Self::Venue(venue) => venue.id(),
        }
    }

    /// Returns `true` for a venue.
    #[must_use]
    pub const fn is_venue(&self) -> bool {
        matches!(self, Self::Venue(_))
    }
}

impl fmt::Display for RoomKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(room) => room.fmt(f),
            Self::Venue(venue) => venue.fmt(f),
        }
    }
}

/// Mutable access to one session alongside read access to everything the
/// allocation engine consults.
#[derive(Debug)]
pub struct SessionContext<'a> {
    /// The session being allocated.
    pub session: &'a mut Session,
    /// The venue the session is held in.
    pub venue: &'a Venue,
    /// Every registered exam.
    pub exams: &'a [Exam],
    /// Every registered student.
    pub students: &'a [Student],
}

/// The single source of truth for every entity of one loaded dataset.
///
/// # Examples
///
/// ```
/// use eb_core::{Registry, Subject};
///
/// let mut registry = Registry::new();
/// let id = registry.add(Subject::new("Accounting", "Ledgers and balances.")).unwrap();
///
/// assert_eq!(registry.get::<Subject>(&id).unwrap().title(), "Accounting");
/// assert!(registry.find::<Subject>("chemistry").is_none());
/// assert!(registry.get::<Subject>("chemistry").unwrap_err().is_not_found());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub(crate) subjects: Table<Subject>,
    pub(crate) units: Table<Unit>,
    pub(crate) students: Table<Student>,
    pub(crate) exams: Table<Exam>,
    pub(crate) rooms: Table<Room>,
    pub(crate) venues: Table<Venue>,
    pub(crate) sessions: Table<Session>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity under its derived identity and returns that
    /// identity.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidEntity`] if the entity fails its own
    /// validation, or [`RegistryError::DuplicateIdentity`] if an entity of
    /// the same kind already has this identity. The registry is left
    /// unchanged in both cases.
    pub fn add<T: Entity>(&mut self, entity: T) -> Result<String, RegistryError> {
        T::table_mut(self).insert(entity)
    }

    /// Looks an entity up by identity.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when nothing matches. Callers use
    /// this where absence means the dataset is broken.
    pub fn get<T: Entity>(&self, identity: &str) -> Result<&T, RegistryError> {
        self.find(identity)
            .ok_or_else(|| RegistryError::not_found(T::KIND, identity))
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut<T: Entity>(&mut self, identity: &str) -> Result<&mut T, RegistryError> {
        T::table_mut(self)
            .get_mut(identity)
            .ok_or_else(|| RegistryError::not_found(T::KIND, identity))
    }

    /// Looks an entity up by identity, returning `None` when absent.
    #[must_use]
    pub fn find<T: Entity>(&self, identity: &str) -> Option<&T> {
        T::table(self).get(identity)
    }

    /// Looks an entity up by identity, falling back to its alias.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if neither index matches.
    pub fn resolve<T: Entity>(&self, key: &str) -> Result<&T, RegistryError> {
        T::table(self)
            .resolve(key)
            .ok_or_else(|| RegistryError::not_found(T::KIND, key))
    }

    /// Returns `true` if an entity with this identity is registered.
    #[must_use]
    pub fn contains<T: Entity>(&self, identity: &str) -> bool {
        self.find::<T>(identity).is_some()
    }

    /// Returns every entity of a kind in registration order.
    #[must_use]
    pub fn all<T: Entity>(&self) -> &[T] {
        T::table(self).as_slice()
    }

    /// Returns the number of registered entities of a kind.
    #[must_use]
    pub fn len<T: Entity>(&self) -> usize {
        T::table(self).len()
    }

    /// Returns the number of registered entities of a kind tag.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Subject => self.subjects.len(),
            EntityKind::Unit => self.units.len(),
            EntityKind::Student => self.students.len(),
            EntityKind::Exam => self.exams.len(),
            EntityKind::Room => self.rooms.len(),
            EntityKind::Venue => self.venues.len(),
            EntityKind::Session => self.sessions.len(),
        }
    }

    /// Returns `true` if no entity of any kind is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.into_iter().all(|kind| self.count(kind) == 0)
    }

    /// Returns plain rooms followed by venues, each tagged with its kind.
    #[must_use]
    pub fn rooms(&self) -> Vec<RoomKind<'_>> {
        self.rooms
            .as_slice()
            .iter()
            .map(RoomKind::Plain)
            .chain(self.venues.as_slice().iter().map(RoomKind::Venue))
            .collect()
    }

    /// Counts the students taking a subject whose AARA flag equals `aara`.
    #[must_use]
    pub fn count_students(&self, subject_id: &str, aara: bool) -> usize {
        self.students
            .as_slice()
            .iter()
            .filter(|student| student.is_aara() == aara && student.takes(subject_id))
            .count()
    }

    /// Splits the registry into a mutable session and the read-only tables
    /// the allocation engine needs.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the session or its venue is
    /// not registered.
    pub fn session_context(&mut self, session_id: &str) -> Result<SessionContext<'_>, RegistryError> {
        let Self {
            sessions,
            venues,
            exams,
            students,
            ..
        } = self;

        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| RegistryError::not_found(EntityKind::Session, session_id))?;
        let venue = venues
            .get(session.venue_id())
            .ok_or_else(|| RegistryError::not_found(EntityKind::Venue, session.venue_id()))?;

        Ok(SessionContext {
            session,
            venue,
            exams: exams.as_slice(),
            students: students.as_slice(),
        })
    }

    /// Returns a numbered one-line-per-entity listing of a kind.
    #[must_use]
    pub fn listing<T: Entity + fmt::Display>(&self) -> String {
        let mut out = String::new();
        for (position, entity) in self.all::<T>().iter().enumerate() {
            let _ = writeln!(out, "{}. {entity}", position + 1);
        }
        out
    }

    /// Returns a numbered detailed dump of every entity of a kind.
    #[must_use]
    pub fn full_detail<T: Entity + Describe>(&self) -> String {
        let mut out = String::new();
        for (position, entity) in self.all::<T>().iter().enumerate() {
            let _ = write!(out, "{}. {}", position + 1, entity.full_detail(self));
        }
        out.push('\n');
        out
    }
}
