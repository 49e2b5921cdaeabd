#![forbid(unsafe_code)]

//! A small hangar used by the demo binary and the shell's integration
//! tests: one mech with a reactor and a module bay, plus loose parts in
//! the depot.

use crate::{Capabilities, ObjectId, PartClass, Port, PowerLine, Registry};

/// Ids of the notable objects in the [`hangar`] world.
#[derive(Debug, Clone, Copy)]
pub struct Hangar {
    /// The mech aggregate.
    pub mech: ObjectId,
    /// Its reactor (3 lines).
    pub reactor: ObjectId,
    /// Its module bay (2 slots, controller).
    pub bay: ObjectId,
    /// An installed servo part.
    pub servo: ObjectId,
    /// A loose cable part in the depot (connectable, 2 ports).
    pub cable: ObjectId,
}

/// Build the demo world.
pub fn hangar() -> (Registry, Hangar) {
    let mut reg = Registry::new();

    for (name, description, caps) in [
        (
            "servo",
            "Rotary actuator",
            Capabilities::MOUNTABLE | Capabilities::PART,
        ),
        (
            "cable",
            "Power cable",
            Capabilities::MOUNTABLE | Capabilities::PART | Capabilities::CONNECTABLE,
        ),
        ("fusion-core", "Compact fusion reactor", Capabilities::REACTOR),
    ] {
        reg.register_class(PartClass {
            name: name.into(),
            description: description.into(),
            caps,
        })
        .unwrap_or_else(|_| unreachable!("fixture classes are unique"));
    }

    let mech = reg.spawn("atlas", Capabilities::AGGREGATE);

    let reactor = reg.spawn("fusion-core", Capabilities::REACTOR);
    {
        let r = reg.get_mut(reactor).unwrap_or_else(|| unreachable!());
        r.class_name = "fusion-core".into();
        r.container = mech;
        r.lines = vec![
            PowerLine { voltage: 12.0 },
            PowerLine { voltage: 48.0 },
            PowerLine { voltage: 480.0 },
        ];
    }

    let bay = reg.spawn("module-bay", Capabilities::MODULE | Capabilities::CONTROLLER);
    {
        let b = reg.get_mut(bay).unwrap_or_else(|| unreachable!());
        b.container = mech;
        b.accepts = Capabilities::MOUNTABLE;
        b.slots = vec!["Primary actuator slot".into(), "Auxiliary slot".into()];
    }

    let servo = reg.spawn("servo", Capabilities::MOUNTABLE | Capabilities::PART);
    {
        let s = reg.get_mut(servo).unwrap_or_else(|| unreachable!());
        s.class_name = "servo".into();
        s.container = bay;
    }

    let cable = reg.spawn(
        "cable",
        Capabilities::MOUNTABLE | Capabilities::PART | Capabilities::CONNECTABLE,
    );
    {
        let c = reg.get_mut(cable).unwrap_or_else(|| unreachable!());
        c.class_name = "cable".into();
        c.ports = vec![
            Port { description: "Feed end".into() },
            Port { description: "Load end".into() },
        ];
    }

    (
        reg,
        Hangar {
            mech,
            reactor,
            bay,
            servo,
            cable,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hangar_shape() {
        let (reg, ids) = hangar();
        assert!(reg.get(ids.mech).unwrap().is_a(Capabilities::AGGREGATE));
        assert_eq!(reg.get(ids.reactor).unwrap().line_count(), 3);
        assert_eq!(reg.get(ids.bay).unwrap().slot_count(), 2);
        assert_eq!(reg.get(ids.cable).unwrap().port_count(), 2);
        assert!(reg.get(ids.servo).unwrap().is_installed());
        assert!(!reg.get(ids.cable).unwrap().is_installed());
        assert!(reg.can_mount(ids.bay, ids.cable));
    }
}
