//! Explicit subscriptions for host notifications.
//!
//! Interested parties register a callback and keep the returned
//! [`SubscriptionToken`]; handing the token back unsubscribes. There is no
//! global bus, every [`Event`] lives inside the object that emits it.

/// Identifies one registered handler of an [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

pub struct Event<T> {
    handlers: Vec<(SubscriptionToken, Box<dyn FnMut(&T)>)>,
    next_token: u64,
}

impl<T> Event<T> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_token: 0,
        }
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&T) + 'static) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.handlers.push((token, Box::new(handler)));
        token
    }

    /// Returns false if the token was unknown or already unsubscribed.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(t, _)| *t != token);
        self.handlers.len() != before
    }

    /// Calls every handler in subscription order.
    pub fn emit(&mut self, value: &T) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
