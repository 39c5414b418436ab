//! Payload type model.
//!
//! Every value that can travel with a notification implements [`Payload`].
//! Subtyping is declared explicitly: a payload may expose a view of itself as
//! its supertype through [`Payload::parent`], usually by embedding the
//! supertype as a field. A subscription typed to `T` matches any payload whose
//! lineage (the payload, its parent, its grandparent, ...) contains a `T`.
//!
//! # Example
//!
//! ```rust
//! use herald::{impl_payload, Payload, PayloadType};
//!
//! #[derive(Debug)]
//! struct Animal { legs: u8 }
//!
//! #[derive(Debug)]
//! struct Cat { animal: Animal, indoor: bool }
//!
//! impl_payload!(Animal);
//! impl_payload!(Cat => animal);
//!
//! let cat = Cat { animal: Animal { legs: 4 }, indoor: true };
//! let payload: &dyn Payload = &cat;
//!
//! assert_eq!(payload.downcast_ref::<Animal>().map(|a| a.legs), Some(4));
//! assert!(PayloadType::of::<Animal>().accepts(payload));
//! assert!(!PayloadType::of::<Cat>().accepts(&Animal { legs: 2 }));
//! ```

use std::any::{Any, TypeId};
use std::fmt;

/// A value that can be posted with a notification.
///
/// Implement it with [`impl_payload!`](crate::impl_payload) rather than by hand.
pub trait Payload: Any + Send + Sync + 'static {
    /// Returns `self` as `Any` for concrete type checks.
    fn as_any(&self) -> &dyn Any;

    /// Returns this payload viewed as its declared supertype, if it has one.
    ///
    /// Successive parents must form a finite chain ending in a root that
    /// returns `None`. Returning `self` or a cycle makes matching loop forever.
    fn parent(&self) -> Option<&dyn Payload> {
        None
    }

    /// Name of the concrete payload type, for diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn Payload {
    /// Iterate over this payload and each of its supertype views, nearest first.
    pub fn lineage(&self) -> Lineage<'_> {
        Lineage { next: Some(self) }
    }

    /// Returns the first view in the lineage whose concrete type is `T`.
    pub fn downcast_ref<T: Payload>(&self) -> Option<&T> {
        self.lineage()
            .find_map(|view| view.as_any().downcast_ref::<T>())
    }

    /// Returns `true` if the payload is a `T` or a subtype of `T`.
    pub fn is<T: Payload>(&self) -> bool {
        PayloadType::of::<T>().accepts(self)
    }
}

impl fmt::Debug for dyn Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("type", &self.type_name())
            .finish()
    }
}

/// Iterator over a payload's supertype chain.
pub struct Lineage<'a> {
    next: Option<&'a dyn Payload>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a dyn Payload;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// Runtime descriptor of a payload type, used as a subscription filter.
#[derive(Clone, Copy)]
pub struct PayloadType {
    id: TypeId,
    name: &'static str,
}

impl PayloadType {
    /// Descriptor for `T`.
    pub fn of<T: Payload>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The described type's `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The described type's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if `payload` is this type or one of its subtypes.
    pub fn accepts(&self, payload: &dyn Payload) -> bool {
        payload
            .lineage()
            .any(|view| view.as_any().type_id() == self.id)
    }
}

impl PartialEq for PayloadType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PayloadType {}

impl fmt::Debug for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Implement [`Payload`] for one or more types.
///
/// `impl_payload!(A, B, C)` declares root types with no supertype.
/// `impl_payload!(Derived => field)` declares `Derived` a subtype of the type
/// of its `field`, which must itself implement [`Payload`].
#[macro_export]
macro_rules! impl_payload {
    ($ty:ty => $field:ident) => {
        impl $crate::Payload for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn parent(&self) -> ::std::option::Option<&dyn $crate::Payload> {
                ::std::option::Option::Some(&self.$field)
            }
        }
    };
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Payload for $ty {
                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }
            }
        )+
    };
}

impl_payload!(
    String,
    &'static str,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
);
