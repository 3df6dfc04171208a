//! Event bus and hook contracts for server plugins.
//!
//! Plugin runtimes register handlers against the hook points below; the
//! server triggers them before running its default behavior. Payloads are
//! JSON tables carrying a packet's logical fields, so handlers never see
//! wire padding or byte order. A handler may set named flags during a
//! trigger; the server reads them afterwards to decide whether the default
//! still runs.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;
use tracing::{error, warn};

/// Hook points the server triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    PluginLoaded,
    Auth,
    Message,
    Position,
    Block,
}

/// Suppresses the default path when set during a trigger. Honoured by the
/// auth hook only; every other default is unconditional.
pub const NO_DEFAULT_CALL: &str = "NoDefaultCall";

/// Named flags handlers may set during a single trigger.
#[derive(Debug, Default)]
pub struct EventFlags(HashMap<String, bool>);

impl EventFlags {
    pub fn set(&mut self, name: &str, value: bool) {
        self.0.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

/// A subscriber. The session argument is the originating connection, when
/// there is one. Returning an error skips nothing but the handler itself.
pub type EventHandler =
    Box<dyn FnMut(&mut EventFlags, Option<SocketAddr>, &Value) -> Result<(), Box<dyn std::error::Error>>>;

/// Ordered publish/subscribe channels keyed by [`EventType`].
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventType, Vec<EventHandler>>,
    flags: EventFlags,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the subscriber list for `event`. Handlers run in
    /// registration order.
    pub fn register<F>(&mut self, event: EventType, handler: F)
    where
        F: FnMut(&mut EventFlags, Option<SocketAddr>, &Value) -> Result<(), Box<dyn std::error::Error>>
            + 'static,
    {
        self.handlers.entry(event).or_default().push(Box::new(handler));
    }

    /// Run every subscriber of `event` in order. Flags reset first, so
    /// [`EventBus::flag`] afterwards reflects this trigger only. A handler
    /// that errors or panics is logged and the remaining handlers still
    /// run; handler execution time is not bounded.
    pub fn trigger(&mut self, event: EventType, session: Option<SocketAddr>, payload: &Value) {
        self.flags.clear();
        let Some(handlers) = self.handlers.get_mut(&event) else {
            return;
        };
        for handler in handlers {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                handler(&mut self.flags, session, payload)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Event handler failed during {event:?}: {e}"),
                Err(_) => error!("Event handler panicked during {event:?}"),
            }
        }
    }

    /// Read a flag set during the most recent trigger.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn handlers_run_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["first", "second", "third"] {
            let order = order.clone();
            bus.register(EventType::Message, move |_, _, _| {
                order.borrow_mut().push(tag);
                Ok(())
            });
        }
        bus.trigger(EventType::Message, None, &json!({}));
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn flags_reset_each_trigger() {
        let mut bus = EventBus::new();
        bus.register(EventType::Auth, |flags, _, payload| {
            if payload["name"] == "veto" {
                flags.set(NO_DEFAULT_CALL, true);
            }
            Ok(())
        });

        bus.trigger(EventType::Auth, None, &json!({"name": "veto"}));
        assert!(bus.flag(NO_DEFAULT_CALL));

        bus.trigger(EventType::Auth, None, &json!({"name": "other"}));
        assert!(!bus.flag(NO_DEFAULT_CALL));
    }

    #[test]
    fn failing_handler_does_not_stop_later_ones() {
        let reached = Rc::new(RefCell::new(false));
        let mut bus = EventBus::new();
        bus.register(EventType::Block, |_, _, _| Err("boom".into()));
        {
            let reached = reached.clone();
            bus.register(EventType::Block, move |_, _, _| {
                *reached.borrow_mut() = true;
                Ok(())
            });
        }
        bus.trigger(EventType::Block, None, &json!({"x": 1}));
        assert!(*reached.borrow());
    }

    #[test]
    fn panicking_handler_is_isolated() {
        let reached = Rc::new(RefCell::new(false));
        let mut bus = EventBus::new();
        bus.register(EventType::Position, |_, _, _| panic!("hostile"));
        {
            let reached = reached.clone();
            bus.register(EventType::Position, move |_, _, _| {
                *reached.borrow_mut() = true;
                Ok(())
            });
        }
        bus.trigger(EventType::Position, None, &json!({}));
        assert!(*reached.borrow());
    }

    #[test]
    fn payload_fields_reach_handlers() {
        let seen = Rc::new(RefCell::new(None));
        let mut bus = EventBus::new();
        {
            let seen = seen.clone();
            bus.register(EventType::Block, move |_, _, payload| {
                *seen.borrow_mut() = Some(payload.clone());
                Ok(())
            });
        }
        bus.trigger(
            EventType::Block,
            None,
            &json!({"x": 5, "y": 6, "z": 7, "mode": 1, "type": 2}),
        );
        let payload = seen.borrow().clone().unwrap();
        assert_eq!(payload["x"], 5);
        assert_eq!(payload["type"], 2);
    }

    #[test]
    fn unsubscribed_event_is_a_no_op() {
        let mut bus = EventBus::new();
        bus.trigger(EventType::PluginLoaded, None, &json!({"name": "core"}));
        assert!(!bus.flag(NO_DEFAULT_CALL));
    }
}
