//! The notification view passed to observers.

use crate::payload::Payload;
use crate::sender::Sender;

/// A notification being dispatched.
///
/// Borrowed from the poster for the duration of one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct Notification<'a> {
    name: &'a str,
    sender: Option<&'a Sender>,
    payload: Option<&'a dyn Payload>,
}

impl<'a> Notification<'a> {
    /// Create a notification.
    pub fn new(name: &'a str, sender: Option<&'a Sender>, payload: Option<&'a dyn Payload>) -> Self {
        Self {
            name,
            sender,
            payload,
        }
    }

    /// Notification name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The posting object, if one was given.
    pub fn sender(&self) -> Option<&'a Sender> {
        self.sender
    }

    /// The payload, if one was given.
    pub fn payload(&self) -> Option<&'a dyn Payload> {
        self.payload
    }

    /// The payload viewed as `T`, if it is a `T` or a subtype of `T`.
    pub fn payload_as<T: Payload>(&self) -> Option<&'a T> {
        self.payload?.downcast_ref::<T>()
    }
}
