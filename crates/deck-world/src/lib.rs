#![forbid(unsafe_code)]

//! The domain object registry the shell's object-reference parameters
//! query.
//!
//! The shell engine itself never owns simulation state; it issues a small
//! set of queries against a [`Registry`]: look an object up by textual id,
//! enumerate objects with a capability (optionally scoped to a containing
//! object), and resolve part-class metadata by name. Objects carry enough
//! structure — module slots, reactor lines, connector ports — for the
//! index parameters to validate against an entity chosen earlier in the
//! command chain.

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;

/// Stable identifier of a registered object.
///
/// Ids render and parse as plain decimal, which is what operators type at
/// the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    /// The id no object ever gets.
    pub const INVALID: Self = Self(u32::MAX);

    /// The depot: the well-known root whose contents are *not installed*.
    pub const DEPOT: Self = Self(0);

    /// Construct from a raw id.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this id can refer to an object at all.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(Self)
    }
}

bitflags! {
    /// Dynamic capabilities an object advertises.
    ///
    /// The shell's "is-a" filters test these instead of downcasting.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u16 {
        /// A part that can be mounted into something.
        const MOUNTABLE   = 0b0000_0001;
        /// Exposes connector ports.
        const CONNECTABLE = 0b0000_0010;
        /// A module with slots.
        const MODULE      = 0b0000_0100;
        /// A reactor with power lines.
        const REACTOR     = 0b0000_1000;
        /// Can mount parts into itself.
        const CONTROLLER  = 0b0001_0000;
        /// A top-level aggregate (a whole mech).
        const AGGREGATE   = 0b0010_0000;
        /// Any plain part.
        const PART        = 0b0100_0000;
    }
}

/// One reactor power line.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerLine {
    /// Output voltage, volts.
    pub voltage: f32,
}

/// One connector port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    /// Human-readable description shown by completions.
    pub description: String,
}

/// Part-class metadata, resolved by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartClass {
    /// Class name, matched verbatim.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Capabilities instances of this class advertise.
    pub caps: Capabilities,
}

/// A registered simulation object.
#[derive(Debug, Clone)]
pub struct Object {
    /// Stable id.
    pub id: ObjectId,
    /// Display name.
    pub name: String,
    /// Part-class name, empty for ad-hoc objects.
    pub class_name: String,
    /// Advertised capabilities.
    pub caps: Capabilities,
    /// What a controller-capable object accepts for mounting.
    pub accepts: Capabilities,
    /// Containing object; [`ObjectId::DEPOT`] when not installed.
    pub container: ObjectId,
    /// Module slot labels.
    pub slots: Vec<String>,
    /// Reactor lines.
    pub lines: Vec<PowerLine>,
    /// Connector ports.
    pub ports: Vec<Port>,
}

impl Object {
    /// A bare object with a name and capabilities, living in the depot.
    pub fn new(id: ObjectId, name: impl Into<String>, caps: Capabilities) -> Self {
        Self {
            id,
            name: name.into(),
            class_name: String::new(),
            caps,
            accepts: Capabilities::empty(),
            container: ObjectId::DEPOT,
            slots: Vec::new(),
            lines: Vec::new(),
            ports: Vec::new(),
        }
    }

    /// Whether the object advertises every capability in `caps`.
    #[inline]
    pub fn is_a(&self, caps: Capabilities) -> bool {
        self.caps.contains(caps)
    }

    /// Installed means contained by anything but the depot.
    #[inline]
    pub fn is_installed(&self) -> bool {
        self.container != ObjectId::DEPOT
    }

    /// Number of module slots.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of reactor lines.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of connector ports.
    #[inline]
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }
}

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// An object with this id already exists.
    DuplicateId(ObjectId),
    /// A part class with this name already exists.
    DuplicateClass(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateId(id) => write!(f, "object id {id} already registered"),
            RegistryError::DuplicateClass(name) => {
                write!(f, "part class '{name}' already registered")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// The object registry.
///
/// Objects are stored in insertion order; enumeration is deterministic,
/// which the completion lists rely on.
#[derive(Debug, Default)]
pub struct Registry {
    objects: Vec<Object>,
    by_id: HashMap<ObjectId, usize>,
    classes: HashMap<String, PartClass>,
    next_id: u32,
}

impl Registry {
    /// An empty registry. Id 0 is reserved for the depot root.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            by_id: HashMap::new(),
            classes: HashMap::new(),
            next_id: 1,
        }
    }

    /// Register a fully formed object.
    pub fn insert(&mut self, object: Object) -> Result<ObjectId, RegistryError> {
        if self.by_id.contains_key(&object.id) {
            return Err(RegistryError::DuplicateId(object.id));
        }
        let id = object.id;
        self.next_id = self.next_id.max(id.raw() + 1);
        self.by_id.insert(id, self.objects.len());
        self.objects.push(object);
        Ok(id)
    }

    /// Create and register an object with the next free id.
    pub fn spawn(&mut self, name: impl Into<String>, caps: Capabilities) -> ObjectId {
        let id = ObjectId::new(self.next_id);
        self.insert(Object::new(id, name, caps))
            .unwrap_or_else(|_| unreachable!("next_id is never reused"))
    }

    /// Register part-class metadata.
    pub fn register_class(&mut self, class: PartClass) -> Result<(), RegistryError> {
        if self.classes.contains_key(&class.name) {
            return Err(RegistryError::DuplicateClass(class.name));
        }
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    /// Look an object up by id.
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.by_id.get(&id).map(|&i| &self.objects[i])
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        let i = *self.by_id.get(&id)?;
        Some(&mut self.objects[i])
    }

    /// Resolve a textual id as typed at the prompt.
    pub fn resolve(&self, token: &str) -> Option<&Object> {
        let id: ObjectId = token.parse().ok()?;
        self.get(id)
    }

    /// Find the first object with this exact name.
    pub fn find_by_name(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// All objects, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter()
    }

    /// Objects advertising every capability in `caps`.
    pub fn with_caps(&self, caps: Capabilities) -> impl Iterator<Item = &Object> {
        self.objects.iter().filter(move |o| o.is_a(caps))
    }

    /// Objects contained directly by `root`.
    pub fn contents_of(&self, root: ObjectId) -> impl Iterator<Item = &Object> {
        self.objects.iter().filter(move |o| o.container == root)
    }

    /// Part-class metadata by name.
    pub fn part_class(&self, name: &str) -> Option<&PartClass> {
        self.classes.get(name)
    }

    /// Registered part classes in arbitrary order.
    pub fn part_classes(&self) -> impl Iterator<Item = &PartClass> {
        self.classes.values()
    }

    /// Whether `controller` accepts mounting `object`.
    ///
    /// True when the controller advertises [`Capabilities::CONTROLLER`] and
    /// the object carries at least one capability the controller accepts.
    pub fn can_mount(&self, controller: ObjectId, object: ObjectId) -> bool {
        let (Some(ctl), Some(obj)) = (self.get(controller), self.get(object)) else {
            return false;
        };
        ctl.caps.contains(Capabilities::CONTROLLER) && obj.caps.intersects(ctl.accepts)
    }
}

pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::*;

    fn mountable() -> Capabilities {
        Capabilities::MOUNTABLE | Capabilities::PART
    }

    #[test]
    fn spawn_assigns_sequential_ids() {
        let mut reg = Registry::new();
        let a = reg.spawn("servo", mountable());
        let b = reg.spawn("gyro", mountable());
        assert_eq!(a, ObjectId::new(1));
        assert_eq!(b, ObjectId::new(2));
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut reg = Registry::new();
        let id = reg.spawn("servo", mountable());
        let err = reg.insert(Object::new(id, "other", mountable())).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId(id));
    }

    #[test]
    fn resolve_parses_decimal_tokens() {
        let mut reg = Registry::new();
        let id = reg.spawn("servo", mountable());
        assert_eq!(reg.resolve(&id.to_string()).map(|o| o.id), Some(id));
        assert!(reg.resolve("nonsense").is_none());
        assert!(reg.resolve("999").is_none());
    }

    #[test]
    fn with_caps_filters() {
        let mut reg = Registry::new();
        reg.spawn("servo", mountable());
        let reactor = reg.spawn("core", Capabilities::REACTOR);
        let reactors: Vec<_> = reg.with_caps(Capabilities::REACTOR).map(|o| o.id).collect();
        assert_eq!(reactors, vec![reactor]);
    }

    #[test]
    fn installed_means_outside_the_depot() {
        let mut reg = Registry::new();
        let mech = reg.spawn("atlas", Capabilities::AGGREGATE);
        let part = reg.spawn("servo", mountable());
        assert!(!reg.get(part).unwrap().is_installed());

        reg.get_mut(part).unwrap().container = mech;
        assert!(reg.get(part).unwrap().is_installed());
        let inside: Vec<_> = reg.contents_of(mech).map(|o| o.id).collect();
        assert_eq!(inside, vec![part]);
    }

    #[test]
    fn can_mount_requires_controller_and_accepted_caps() {
        let mut reg = Registry::new();
        let arm = reg.spawn("arm-bay", Capabilities::CONTROLLER);
        reg.get_mut(arm).unwrap().accepts = Capabilities::MOUNTABLE;
        let part = reg.spawn("servo", mountable());
        let reactor = reg.spawn("core", Capabilities::REACTOR);

        assert!(reg.can_mount(arm, part));
        assert!(!reg.can_mount(arm, reactor));
        assert!(!reg.can_mount(part, part));
        assert!(!reg.can_mount(arm, ObjectId::INVALID));
    }

    #[test]
    fn part_classes_resolve_by_name() {
        let mut reg = Registry::new();
        reg.register_class(PartClass {
            name: "servo".into(),
            description: "Rotary actuator".into(),
            caps: mountable(),
        })
        .unwrap();
        assert!(reg.part_class("servo").is_some());
        assert!(reg.part_class("laser").is_none());
        assert!(
            reg.register_class(PartClass {
                name: "servo".into(),
                description: String::new(),
                caps: Capabilities::empty(),
            })
            .is_err()
        );
    }

    #[test]
    fn invalid_id_polarity_is_obvious() {
        assert!(!ObjectId::INVALID.is_valid());
        assert!(ObjectId::new(0).is_valid());
        assert!(ObjectId::new(7).is_valid());
    }
}
