//! Destinations: the identified units a node's path is made of.
//!
//! The navigation core never renders anything. It carries a destination's identity and
//! preferred method, and asks the destination to produce an opaque renderable when the
//! host requests one.

mod provided;

pub use provided::ProvidedViews;

use crate::navigator::Navigator;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// How a destination wants to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMethod {
    Push,
    Sheet,
    Cover,
    ManagedSheet,
    ManagedCover,
}

impl NavigationMethod {
    /// Managed presentations get their own navigation stack.
    pub fn requires_navigation_stack(self) -> bool {
        matches!(
            self,
            NavigationMethod::ManagedSheet | NavigationMethod::ManagedCover
        )
    }

    pub fn is_presentation(self) -> bool {
        self != NavigationMethod::Push
    }

    pub fn slot(self) -> Option<crate::state::PresentationSlot> {
        use crate::state::PresentationSlot;
        match self {
            NavigationMethod::Push => None,
            NavigationMethod::Sheet | NavigationMethod::ManagedSheet => {
                Some(PresentationSlot::Sheet)
            }
            NavigationMethod::Cover | NavigationMethod::ManagedCover => {
                Some(PresentationSlot::Cover)
            }
        }
    }
}

/// Implemented by every concrete destination type.
pub trait Destination: Any + fmt::Debug + Send + Sync {
    fn method(&self) -> NavigationMethod {
        NavigationMethod::Push
    }

    fn produce(&self, context: &RenderContext) -> Rendered;
}

/// Stable identity of a destination value: its type plus its hashed contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DestinationId(u64);

impl DestinationId {
    fn of<D: Hash + 'static>(destination: &D) -> Self {
        let mut hasher = DefaultHasher::new();
        TypeId::of::<D>().hash(&mut hasher);
        destination.hash(&mut hasher);
        DestinationId(hasher.finish())
    }
}

/// Type-erased destination stored in paths and presentation slots.
#[derive(Clone)]
pub struct AnyDestination {
    wrapped: Arc<dyn Destination>,
    any: Arc<dyn Any + Send + Sync>,
    id: DestinationId,
    method: NavigationMethod,
    type_id: TypeId,
    type_name: &'static str,
}

impl AnyDestination {
    pub fn new<D: Destination + Hash>(destination: D) -> Self {
        let id = DestinationId::of(&destination);
        let method = destination.method();
        let shared = Arc::new(destination);
        Self {
            wrapped: shared.clone(),
            any: shared,
            id,
            method,
            type_id: TypeId::of::<D>(),
            type_name: std::any::type_name::<D>(),
        }
    }

    /// Override the destination's preferred method.
    pub fn with_method(mut self, method: NavigationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn id(&self) -> DestinationId {
        self.id
    }

    pub fn method(&self) -> NavigationMethod {
        self.method
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<D: Destination>(&self) -> bool {
        self.type_id == TypeId::of::<D>()
    }

    pub fn downcast_ref<D: Destination>(&self) -> Option<&D> {
        self.any.downcast_ref::<D>()
    }

    pub fn produce(&self, context: &RenderContext) -> Rendered {
        self.wrapped.produce(context)
    }
}

impl<D: Destination + Hash> From<D> for AnyDestination {
    fn from(destination: D) -> Self {
        AnyDestination::new(destination)
    }
}

impl PartialEq for AnyDestination {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AnyDestination {}

impl Hash for AnyDestination {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for AnyDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.wrapped, f)
    }
}

/// Opaque output of [`Destination::produce`].
pub enum Rendered {
    Content(Box<dyn Any + Send>),
    /// Shown when content could not be produced, such as a missing provider
    Placeholder(String),
}

impl Rendered {
    pub fn content<T: Any + Send>(value: T) -> Self {
        Rendered::Content(Box::new(value))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Rendered::Placeholder(_))
    }

    pub fn downcast<T: Any>(self) -> Option<T> {
        match self {
            Rendered::Content(content) => content.downcast::<T>().ok().map(|boxed| *boxed),
            Rendered::Placeholder(_) => None,
        }
    }
}

impl fmt::Debug for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendered::Content(_) => f.write_str("Rendered::Content(..)"),
            Rendered::Placeholder(reason) => write!(f, "Rendered::Placeholder({})", reason),
        }
    }
}

/// Handed to [`Destination::produce`]; gives access to the producing scope.
pub struct RenderContext {
    navigator: Navigator,
}

impl RenderContext {
    pub fn new(navigator: Navigator) -> Self {
        Self { navigator }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Resolve late-bound content for `destination` from the root's provided-view registry.
    pub fn provided<D: Destination>(&self, destination: &D) -> Rendered {
        let node = self.navigator.state();
        let resolved = node.services().provided.resolve(destination);
        match resolved {
            Some(rendered) => {
                node.log(crate::events::NavigationEvent::Providing(format!(
                    "{:?}",
                    destination
                )));
                rendered
            }
            None => {
                let message = format!("no provider registered for {}", std::any::type_name::<D>());
                node.log(crate::events::NavigationEvent::Warning(message.clone()));
                Rendered::Placeholder(message)
            }
        }
    }
}
