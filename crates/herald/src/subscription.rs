//! Subscription records, filters and callback shapes.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::notification::Notification;
use crate::payload::{Payload, PayloadType};
use crate::sender::{Sender, SenderFilter};

/// Unique subscription ID within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique registrar ID within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrarId(pub(crate) u64);

impl fmt::Display for RegistrarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The arguments a callback was registered to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackShape {
    /// Receives the whole notification, whatever its payload.
    Notification,
    /// Receives only a typed payload.
    Payload,
    /// Receives the optional sender and a typed payload.
    SenderPayload,
}

impl CallbackShape {
    /// Whether the callback is handed the sender.
    pub fn wants_sender(&self) -> bool {
        matches!(self, CallbackShape::Notification | CallbackShape::SenderPayload)
    }
}

type Invoke = Box<dyn Fn(&Notification<'_>) + Send + Sync>;

/// An observer callback together with the shape it was declared with.
///
/// Typed shapes fix the subscription's payload filter to their parameter type.
pub struct Callback {
    shape: CallbackShape,
    payload_type: Option<PayloadType>,
    invoke: Invoke,
}

impl Callback {
    /// Payload-agnostic callback receiving the notification.
    pub fn notification<F>(f: F) -> Self
    where
        F: Fn(&Notification<'_>) + Send + Sync + 'static,
    {
        Self {
            shape: CallbackShape::Notification,
            payload_type: None,
            invoke: Box::new(f),
        }
    }

    /// Callback receiving payloads of type `T` or its subtypes.
    pub fn payload<T, F>(f: F) -> Self
    where
        T: Payload,
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            shape: CallbackShape::Payload,
            payload_type: Some(PayloadType::of::<T>()),
            invoke: Box::new(move |note| {
                if let Some(payload) = note.payload_as::<T>() {
                    f(payload);
                }
            }),
        }
    }

    /// Callback receiving the sender and payloads of type `T` or its subtypes.
    pub fn sender_payload<T, F>(f: F) -> Self
    where
        T: Payload,
        F: Fn(Option<&Sender>, &T) + Send + Sync + 'static,
    {
        Self {
            shape: CallbackShape::SenderPayload,
            payload_type: Some(PayloadType::of::<T>()),
            invoke: Box::new(move |note| {
                if let Some(payload) = note.payload_as::<T>() {
                    f(note.sender(), payload);
                }
            }),
        }
    }

    /// The declared shape.
    pub fn shape(&self) -> CallbackShape {
        self.shape
    }

    /// The payload type implied by the shape, if typed.
    pub fn payload_type(&self) -> Option<PayloadType> {
        self.payload_type
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("shape", &self.shape)
            .field("payload_type", &self.payload_type)
            .finish_non_exhaustive()
    }
}

/// A filter for subscriptions.
///
/// Both parts are optional and independent; a notification must pass every
/// part that is set.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    /// Only notifications from this sender.
    pub sender: Option<SenderFilter>,
    /// Only payloads of this type or its subtypes.
    pub payload_type: Option<PayloadType>,
}

impl SubscriptionFilter {
    /// Create a filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to notifications posted by `sender`.
    pub fn with_sender(mut self, sender: &Sender) -> Self {
        self.sender = Some(SenderFilter::new(sender));
        self
    }

    /// Restrict to payloads of `payload_type` or its subtypes.
    pub fn with_payload_type(mut self, payload_type: PayloadType) -> Self {
        self.payload_type = Some(payload_type);
        self
    }

    /// Returns `true` if `note` passes the filter.
    pub fn matches(&self, note: &Notification<'_>) -> bool {
        if let Some(sender) = &self.sender {
            if !sender.matches(note.sender()) {
                return false;
            }
        }

        match (&self.payload_type, note.payload()) {
            (None, _) => true,
            (Some(expected), Some(payload)) => expected.accepts(payload),
            (Some(_), None) => false,
        }
    }
}

/// One registered observation.
pub struct Subscription {
    id: SubscriptionId,
    owner: RegistrarId,
    name: String,
    filter: SubscriptionFilter,
    callback: Callback,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        owner: RegistrarId,
        name: impl Into<String>,
        sender: Option<SenderFilter>,
        callback: Callback,
    ) -> Self {
        let filter = SubscriptionFilter {
            sender,
            payload_type: callback.payload_type(),
        };

        Self {
            id,
            owner,
            name: name.into(),
            filter,
            callback,
            active: AtomicBool::new(true),
        }
    }

    /// Subscription ID.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Registrar that created this subscription.
    pub fn owner(&self) -> RegistrarId {
        self.owner
    }

    /// Notification name observed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sender and payload filter.
    pub fn filter(&self) -> &SubscriptionFilter {
        &self.filter
    }

    /// Callback shape.
    pub fn shape(&self) -> CallbackShape {
        self.callback.shape()
    }

    /// Whether the callback is handed the sender.
    pub fn wants_sender(&self) -> bool {
        self.callback.shape().wants_sender()
    }

    /// Returns `false` once the subscription has been removed from its registry.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Returns `true` if `note` should be delivered to this subscription.
    pub fn matches(&self, note: &Notification<'_>) -> bool {
        self.filter.matches(note)
    }

    pub(crate) fn deliver(&self, note: &Notification<'_>) {
        (self.callback.invoke)(note);
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("filter", &self.filter)
            .field("shape", &self.callback.shape())
            .field("active", &self.is_active())
            .finish()
    }
}
