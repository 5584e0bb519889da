#![forbid(unsafe_code)]

//! Notification hooks.
//!
//! Handlers run synchronously, in subscription order, after the state
//! change that triggered them has been committed.

use std::fmt;

use crate::message::MsgId;

/// A committed change to the message list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Added { msgid: MsgId },
    Appended { msgid: MsgId, content: String },
    Replaced { msgid: MsgId, content: String },
    Deleted { msgid: MsgId },
}

impl ChatEvent {
    /// The message this event concerns.
    #[must_use]
    pub fn msgid(&self) -> MsgId {
        match self {
            Self::Added { msgid }
            | Self::Appended { msgid, .. }
            | Self::Replaced { msgid, .. }
            | Self::Deleted { msgid } => *msgid,
        }
    }
}

/// Handle returned by [`EventHooks::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

type Handler = Box<dyn FnMut(&ChatEvent)>;

/// Ordered list of event handlers.
#[derive(Default)]
pub struct EventHooks {
    handlers: Vec<(HookId, Handler)>,
    next_id: u64,
}

impl fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHooks")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl EventHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`; it runs after every previously registered one.
    pub fn subscribe(&mut self, handler: impl FnMut(&ChatEvent) + 'static) -> HookId {
        let id = HookId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler; `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: HookId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(hid, _)| *hid != id);
        self.handlers.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Deliver `event` to every handler in order.
    pub fn emit(&mut self, event: &ChatEvent) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn handlers_run_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = EventHooks::new();
        let l1 = Rc::clone(&log);
        hooks.subscribe(move |e| l1.borrow_mut().push(("first", e.msgid())));
        let l2 = Rc::clone(&log);
        hooks.subscribe(move |e| l2.borrow_mut().push(("second", e.msgid())));

        hooks.emit(&ChatEvent::Added { msgid: 4 });
        assert_eq!(*log.borrow(), vec![("first", 4), ("second", 4)]);
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let count = Rc::new(RefCell::new(0));
        let mut hooks = EventHooks::new();
        let c1 = Rc::clone(&count);
        let a = hooks.subscribe(move |_| *c1.borrow_mut() += 1);
        let c2 = Rc::clone(&count);
        hooks.subscribe(move |_| *c2.borrow_mut() += 10);

        assert!(hooks.unsubscribe(a));
        assert!(!hooks.unsubscribe(a));
        hooks.emit(&ChatEvent::Deleted { msgid: 0 });
        assert_eq!(*count.borrow(), 10);
        assert_eq!(hooks.len(), 1);
    }
}
