#![forbid(unsafe_code)]

//! Parameter kinds.
//!
//! One enum covers every shape a command parameter can take; the filter on
//! object references is itself a small enum of predicates so command
//! definitions stay data, not subclasses. Parsing is pure with respect to
//! the context's already-bound values: a parse may read them (the slot,
//! line, and port kinds validate against an entity chosen earlier in the
//! chain) but only [`Param::prepare`] appends to them.

use std::fmt;

use deck_editor::Completion;
use deck_world::{Capabilities, Object};

use crate::context::ParamContext;
use crate::value::Value;

/// How many values a ranged-int parameter enumerates for completion.
const MAX_RANGE_COMPLETIONS: i64 = 20;

/// Predicate applied to object-reference parameters during both parse and
/// complete.
#[derive(Debug, Clone)]
pub enum ObjectFilter {
    /// Accept every registered object.
    Any,
    /// Accept objects advertising all of these capabilities.
    IsA(Capabilities),
    /// Accept objects mountable by the controller bound earlier in the
    /// context.
    MountableByBound,
    /// Accept objects still sitting in the depot.
    NotInstalled,
    /// Accept objects installed into something.
    Installed,
    /// Accept top-level aggregates only.
    TopLevel,
    /// Arbitrary predicate.
    Custom(fn(&ParamContext<'_>, &Object) -> bool),
}

impl ObjectFilter {
    /// Run the predicate.
    pub fn matches(&self, ctx: &ParamContext<'_>, object: &Object) -> bool {
        match self {
            ObjectFilter::Any => true,
            ObjectFilter::IsA(caps) => object.is_a(*caps),
            ObjectFilter::MountableByBound => ctx
                .previous_object(Capabilities::CONTROLLER, 0)
                .is_some_and(|controller| ctx.world.can_mount(controller.id, object.id)),
            ObjectFilter::NotInstalled => !object.is_installed(),
            ObjectFilter::Installed => object.is_installed(),
            ObjectFilter::TopLevel => object.is_a(Capabilities::AGGREGATE),
            ObjectFilter::Custom(f) => f(ctx, object),
        }
    }
}

/// The concrete parameter shapes.
#[derive(Debug, Clone)]
pub enum ParamKind {
    /// Whole number, optionally range-checked (inclusive bounds).
    Int {
        /// Smallest accepted value.
        min: Option<i64>,
        /// Largest accepted value.
        max: Option<i64>,
    },
    /// Float, optionally range-checked (inclusive bounds).
    Float {
        /// Smallest accepted value.
        min: Option<f64>,
        /// Largest accepted value.
        max: Option<f64>,
    },
    /// Verbatim string. A list holding exactly one of these is *free*.
    Str,
    /// One of a fixed set of named choices.
    Choice {
        /// The accepted tokens with their descriptions.
        options: Vec<Completion>,
    },
    /// Reference to a registered object, gated by a filter.
    ObjectRef {
        /// Predicate applied during parse and complete.
        filter: ObjectFilter,
    },
    /// Slot index into the module bound earlier in the context.
    SlotIndex,
    /// Power-line index into the reactor bound earlier in the context.
    ReactorLine,
    /// Port index into the connectable bound earlier in the context.
    ConnectorPort,
}

/// One named, typed parameter of a command.
///
/// The parsed value is stored in the parameter between prepare and
/// execute, which is what lets submenus see their ancestors' bindings.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    kind: ParamKind,
    value: Option<Value>,
}

impl Param {
    fn with_kind(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: None,
        }
    }

    /// An unbounded integer.
    pub fn int(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::Int { min: None, max: None })
    }

    /// An integer restricted to `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics when `max <= min`.
    pub fn int_range(name: impl Into<String>, min: i64, max: i64) -> Self {
        assert!(max > min, "int range must be non-empty");
        Self::with_kind(
            name,
            ParamKind::Int {
                min: Some(min),
                max: Some(max),
            },
        )
    }

    /// An unbounded float.
    pub fn float(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::Float { min: None, max: None })
    }

    /// A float restricted to `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics when `max <= min`.
    pub fn float_range(name: impl Into<String>, min: f64, max: f64) -> Self {
        assert!(max > min, "float range must be non-empty");
        Self::with_kind(
            name,
            ParamKind::Float {
                min: Some(min),
                max: Some(max),
            },
        )
    }

    /// A verbatim string.
    pub fn string(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::Str)
    }

    /// One of a fixed set of `(token, description)` choices.
    pub fn choice(name: impl Into<String>, options: &[(&str, &str)]) -> Self {
        Self::with_kind(
            name,
            ParamKind::Choice {
                options: options
                    .iter()
                    .map(|(text, desc)| Completion::new(*text, *desc))
                    .collect(),
            },
        )
    }

    /// An object reference gated by `filter`.
    pub fn object(name: impl Into<String>, filter: ObjectFilter) -> Self {
        Self::with_kind(name, ParamKind::ObjectRef { filter })
    }

    /// A slot index of the module bound earlier in the chain.
    pub fn slot(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::SlotIndex)
    }

    /// A line index of the reactor bound earlier in the chain.
    pub fn reactor_line(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::ReactorLine)
    }

    /// A port index of the connectable bound earlier in the chain.
    pub fn port(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::ConnectorPort)
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind tag.
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    /// The value bound by the last successful prepare.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Short type label used in signatures and diagnostics.
    pub fn type_label(&self) -> &'static str {
        match &self.kind {
            ParamKind::Int { min: None, max: None } => "int",
            ParamKind::Int { .. } => "range",
            ParamKind::Float { min: None, max: None } => "float",
            ParamKind::Float { .. } => "float-range",
            ParamKind::Str => "string",
            ParamKind::Choice { .. } => "choice",
            ParamKind::ObjectRef { .. } => "object",
            ParamKind::SlotIndex => "slot",
            ParamKind::ReactorLine => "line",
            ParamKind::ConnectorPort => "port",
        }
    }

    /// Parse one token into a value. Pure with respect to `ctx`.
    pub fn parse(&self, ctx: &ParamContext<'_>, token: &str) -> Option<Value> {
        match &self.kind {
            ParamKind::Int { min, max } => {
                let v: i64 = token.parse().ok()?;
                if min.is_some_and(|m| v < m) || max.is_some_and(|m| v > m) {
                    return None;
                }
                Some(Value::Int(v))
            }
            ParamKind::Float { min, max } => {
                let v: f64 = token.parse().ok()?;
                if min.is_some_and(|m| v < m) || max.is_some_and(|m| v > m) {
                    return None;
                }
                Some(Value::Float(v))
            }
            ParamKind::Str => Some(Value::Str(token.to_owned())),
            ParamKind::Choice { options } => options
                .iter()
                .any(|c| c.text == token)
                .then(|| Value::Str(token.to_owned())),
            ParamKind::ObjectRef { filter } => {
                let object = ctx.world.resolve(token)?;
                filter.matches(ctx, object).then_some(Value::Object(object.id))
            }
            ParamKind::SlotIndex => {
                let module = ctx.previous_object(Capabilities::MODULE, 0)?;
                let index: usize = token.parse().ok()?;
                (index < module.slot_count()).then_some(Value::Index(index))
            }
            ParamKind::ReactorLine => {
                let reactor = ctx.previous_object(Capabilities::REACTOR, 0)?;
                let index: usize = token.parse().ok()?;
                (index < reactor.line_count()).then_some(Value::Index(index))
            }
            ParamKind::ConnectorPort => {
                let connectable = ctx.previous_object(Capabilities::CONNECTABLE, 0)?;
                let index: usize = token.parse().ok()?;
                (index < connectable.port_count()).then_some(Value::Index(index))
            }
        }
    }

    /// Parse discarding the value.
    pub fn validate(&self, ctx: &ParamContext<'_>, token: &str) -> bool {
        self.parse(ctx, token).is_some()
    }

    /// Parse, store the value, and append it to the context.
    pub fn prepare(&mut self, ctx: &mut ParamContext<'_>, token: &str) -> bool {
        match self.parse(ctx, token) {
            Some(value) => {
                self.value = Some(value.clone());
                ctx.push(value);
                true
            }
            None => false,
        }
    }

    /// Advisory completions for a partial token. Never binds.
    pub fn complete(&self, ctx: &ParamContext<'_>, token: &str) -> Vec<Completion> {
        match &self.kind {
            ParamKind::Int {
                min: Some(min),
                max: Some(max),
            } => (*min..=*max)
                .take(MAX_RANGE_COMPLETIONS as usize)
                .map(|v| Completion::new(v.to_string(), ""))
                .collect(),
            ParamKind::Int { .. } | ParamKind::Float { .. } | ParamKind::Str => Vec::new(),
            ParamKind::Choice { options } => options
                .iter()
                .filter(|c| c.text.starts_with(token))
                .cloned()
                .collect(),
            ParamKind::ObjectRef { filter } => ctx
                .world
                .iter()
                .filter(|o| filter.matches(ctx, o))
                .map(|o| Completion::new(o.id.to_string(), o.name.clone()))
                .collect(),
            ParamKind::SlotIndex => ctx
                .previous_object(Capabilities::MODULE, 0)
                .map(|module| {
                    module
                        .slots
                        .iter()
                        .enumerate()
                        .map(|(i, label)| Completion::new(i.to_string(), label.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            ParamKind::ReactorLine => ctx
                .previous_object(Capabilities::REACTOR, 0)
                .map(|reactor| {
                    reactor
                        .lines
                        .iter()
                        .enumerate()
                        .map(|(i, line)| {
                            Completion::new(i.to_string(), format!("Plug {i} ({}V)", line.voltage))
                        })
                        .collect()
                })
                .unwrap_or_default(),
            ParamKind::ConnectorPort => ctx
                .previous_object(Capabilities::CONNECTABLE, 0)
                .map(|connectable| {
                    connectable
                        .ports
                        .iter()
                        .enumerate()
                        .map(|(i, port)| Completion::new(i.to_string(), port.description.clone()))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_label(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_world::{Capabilities, Registry};

    fn ctx_world() -> Registry {
        let (world, _) = deck_world::fixtures::hangar();
        world
    }

    #[test]
    fn int_parses_and_rejects() {
        let world = Registry::new();
        let mut out = Vec::new();
        let ctx = ParamContext::new(&mut out, &world);
        let p = Param::int("count");
        assert_eq!(p.parse(&ctx, "42"), Some(Value::Int(42)));
        assert_eq!(p.parse(&ctx, "-3"), Some(Value::Int(-3)));
        assert_eq!(p.parse(&ctx, "notAnInt"), None);
    }

    #[test]
    fn int_range_enforces_bounds() {
        let world = Registry::new();
        let mut out = Vec::new();
        let ctx = ParamContext::new(&mut out, &world);
        let p = Param::int_range("power", 0, 10);
        assert_eq!(p.parse(&ctx, "10"), Some(Value::Int(10)));
        assert_eq!(p.parse(&ctx, "11"), None);
        assert_eq!(p.parse(&ctx, "-1"), None);
        assert_eq!(p.complete(&ctx, "").len(), 11);
    }

    #[test]
    fn float_range_enforces_bounds() {
        let world = Registry::new();
        let mut out = Vec::new();
        let ctx = ParamContext::new(&mut out, &world);
        let p = Param::float_range("throttle", 0.0, 1.0);
        assert_eq!(p.parse(&ctx, "0.5"), Some(Value::Float(0.5)));
        assert_eq!(p.parse(&ctx, "1.5"), None);
        assert!(p.complete(&ctx, "").is_empty());
    }

    #[test]
    fn choice_accepts_only_listed_tokens() {
        let world = Registry::new();
        let mut out = Vec::new();
        let ctx = ParamContext::new(&mut out, &world);
        let p = Param::choice("mode", &[("auto", "Automatic"), ("manual", "Manual")]);
        assert_eq!(p.parse(&ctx, "auto"), Some(Value::Str("auto".into())));
        assert_eq!(p.parse(&ctx, "off"), None);
        let comps = p.complete(&ctx, "ma");
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].text, "manual");
    }

    #[test]
    fn object_ref_applies_filter_on_parse_and_complete() {
        let world = ctx_world();
        let mut out = Vec::new();
        let ctx = ParamContext::new(&mut out, &world);
        let p = Param::object("reactor", ObjectFilter::IsA(Capabilities::REACTOR));

        let reactor_id = world.find_by_name("fusion-core").unwrap().id;
        let servo_id = world.find_by_name("servo").unwrap().id;
        assert_eq!(
            p.parse(&ctx, &reactor_id.to_string()),
            Some(Value::Object(reactor_id))
        );
        assert_eq!(p.parse(&ctx, &servo_id.to_string()), None);
        assert_eq!(p.parse(&ctx, "bogus"), None);

        let comps = p.complete(&ctx, "");
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].description, "fusion-core");
    }

    #[test]
    fn not_installed_filter_checks_the_depot() {
        let world = ctx_world();
        let mut out = Vec::new();
        let ctx = ParamContext::new(&mut out, &world);
        let loose = Param::object("part", ObjectFilter::NotInstalled);
        let cable = world.find_by_name("cable").unwrap().id;
        let servo = world.find_by_name("servo").unwrap().id;
        assert!(loose.parse(&ctx, &cable.to_string()).is_some());
        assert!(loose.parse(&ctx, &servo.to_string()).is_none());
    }

    #[test]
    fn slot_index_validates_against_bound_module() {
        let world = ctx_world();
        let bay = world.find_by_name("module-bay").unwrap().id;
        let mut out = Vec::new();
        let mut ctx = ParamContext::new(&mut out, &world);
        let p = Param::slot("slot");

        // No module bound yet: nothing parses.
        assert_eq!(p.parse(&ctx, "0"), None);

        ctx.push(Value::Object(bay));
        assert_eq!(p.parse(&ctx, "0"), Some(Value::Index(0)));
        assert_eq!(p.parse(&ctx, "1"), Some(Value::Index(1)));
        assert_eq!(p.parse(&ctx, "2"), None);

        let comps = p.complete(&ctx, "");
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].description, "Primary actuator slot");
    }

    #[test]
    fn reactor_line_completions_describe_voltages() {
        let world = ctx_world();
        let reactor = world.find_by_name("fusion-core").unwrap().id;
        let mut out = Vec::new();
        let mut ctx = ParamContext::new(&mut out, &world);
        ctx.push(Value::Object(reactor));

        let p = Param::reactor_line("line");
        assert_eq!(p.parse(&ctx, "2"), Some(Value::Index(2)));
        assert_eq!(p.parse(&ctx, "3"), None);
        let comps = p.complete(&ctx, "");
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[1].description, "Plug 1 (48V)");
    }

    #[test]
    fn connector_port_uses_bound_connectable() {
        let world = ctx_world();
        let cable = world.find_by_name("cable").unwrap().id;
        let mut out = Vec::new();
        let mut ctx = ParamContext::new(&mut out, &world);
        ctx.push(Value::Object(cable));

        let p = Param::port("port");
        assert_eq!(p.parse(&ctx, "1"), Some(Value::Index(1)));
        assert_eq!(p.parse(&ctx, "2"), None);
        let comps = p.complete(&ctx, "");
        assert_eq!(comps[0].description, "Feed end");
    }

    #[test]
    fn mountable_filter_consults_bound_controller() {
        let world = ctx_world();
        let bay = world.find_by_name("module-bay").unwrap().id;
        let cable = world.find_by_name("cable").unwrap().id;
        let reactor = world.find_by_name("fusion-core").unwrap().id;
        let mut out = Vec::new();
        let mut ctx = ParamContext::new(&mut out, &world);

        let p = Param::object("part", ObjectFilter::MountableByBound);
        assert_eq!(p.parse(&ctx, &cable.to_string()), None);

        ctx.push(Value::Object(bay));
        assert!(p.parse(&ctx, &cable.to_string()).is_some());
        assert!(p.parse(&ctx, &reactor.to_string()).is_none());
    }

    #[test]
    fn prepare_stores_and_extends_context() {
        let world = Registry::new();
        let mut out = Vec::new();
        let mut ctx = ParamContext::new(&mut out, &world);
        let mut p = Param::int("count");
        assert!(p.prepare(&mut ctx, "7"));
        assert_eq!(p.value(), Some(&Value::Int(7)));
        assert_eq!(ctx.bound(), &[Value::Int(7)]);

        assert!(!p.prepare(&mut ctx, "x"));
        assert_eq!(ctx.bound().len(), 1);
    }

    #[test]
    fn display_shows_type_and_name() {
        assert_eq!(Param::int("n").to_string(), "int n");
        assert_eq!(Param::int_range("n", 0, 5).to_string(), "range n");
        assert_eq!(Param::string("text").to_string(), "string text");
    }
}
