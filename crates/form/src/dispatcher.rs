//! Priority ordered listener table shared by a builder and the forms it builds.

use dynaform_types::{FormEventKind, Listener};
use indexmap::IndexMap;

struct RegisteredListener<F> {
    priority: i32,
    sequence: usize,
    listener: Listener<F>,
}

/// Per-field event listeners. Higher priorities run first; equal priorities
/// run in registration order.
pub struct EventDispatcher<F> {
    listeners: IndexMap<FormEventKind, Vec<RegisteredListener<F>>>,
    next_sequence: usize,
}

impl<F> Default for EventDispatcher<F> {
    fn default() -> Self {
        Self {
            listeners: IndexMap::new(),
            next_sequence: 0,
        }
    }
}

impl<F> EventDispatcher<F> {
    pub fn add_listener(&mut self, event: FormEventKind, listener: Listener<F>, priority: i32) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let entries = self.listeners.entry(event).or_default();
        entries.push(RegisteredListener {
            priority,
            sequence,
            listener,
        });
        entries.sort_by(|left, right| right.priority.cmp(&left.priority).then(left.sequence.cmp(&right.sequence)));
    }

    /// Listeners for `event` in call order. The returned list is detached from
    /// the table so callers can invoke it without holding a borrow.
    pub fn listeners(&self, event: FormEventKind) -> Vec<Listener<F>> {
        self.listeners
            .get(&event)
            .map(|entries| entries.iter().map(|entry| entry.listener.clone()).collect())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, event: FormEventKind) -> usize {
        self.listeners.get(&event).map(Vec::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use dynaform_types::FormEvent;
    use serde_json::Value;

    use super::*;

    #[test]
    fn orders_by_priority_then_registration() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher: EventDispatcher<()> = EventDispatcher::default();

        for (label, priority) in [("low", -1), ("first", 0), ("high", 100), ("second", 0)] {
            let calls = calls.clone();
            dispatcher.add_listener(
                FormEventKind::PostSubmit,
                Rc::new(move |_event: &mut FormEvent<()>| {
                    calls.borrow_mut().push(label);
                    Ok(())
                }),
                priority,
            );
        }

        let mut event = FormEvent::new((), Value::Null);
        for listener in dispatcher.listeners(FormEventKind::PostSubmit) {
            listener(&mut event).expect("listener succeeds");
        }

        assert_eq!(*calls.borrow(), vec!["high", "first", "second", "low"]);
        assert_eq!(dispatcher.listener_count(FormEventKind::PostSubmit), 4);
        assert_eq!(dispatcher.listener_count(FormEventKind::PreSetData), 0);
    }
}
