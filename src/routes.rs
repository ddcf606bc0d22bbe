//! Route tables: expand an application-defined token into actions.
//!
//! The navigation core never defines routes. Applications register handlers keyed by the
//! token's type on the root; `Action::PerformRoute` asks the registry at execution time.

use crate::action::Action;
use crate::error::NavigationError;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased route value.
#[derive(Clone)]
pub struct RouteToken {
    value: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    description: String,
}

impl RouteToken {
    pub fn new<R: Any + Send + Sync + fmt::Debug>(route: R) -> Self {
        Self {
            description: format!("{:?}", route),
            type_id: TypeId::of::<R>(),
            value: Arc::new(route),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn downcast_ref<R: Any>(&self) -> Option<&R> {
        self.value.downcast_ref::<R>()
    }
}

impl fmt::Debug for RouteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// A source of route expansions.
pub trait RouteTable: Send + Sync {
    /// `Err` carries a reason the token cannot be expanded.
    fn lookup(&self, token: &RouteToken) -> Result<Vec<Action>, String>;
}

struct TypedRoutes<R, F> {
    handler: F,
    _route: std::marker::PhantomData<fn(&R)>,
}

impl<R, F> RouteTable for TypedRoutes<R, F>
where
    R: Any + Send + Sync,
    F: Fn(&R) -> Vec<Action> + Send + Sync,
{
    fn lookup(&self, token: &RouteToken) -> Result<Vec<Action>, String> {
        token
            .downcast_ref::<R>()
            .map(&self.handler)
            .ok_or_else(|| format!("{:?} is not a {}", token, std::any::type_name::<R>()))
    }
}

/// Route tables keyed by token type.
#[derive(Default)]
pub struct RouteRegistry {
    tables: RwLock<HashMap<TypeId, Arc<dyn RouteTable>>>,
}

impl RouteRegistry {
    /// Register a plain function expanding tokens of type `R`.
    pub fn register<R, F>(&self, handler: F)
    where
        R: Any + Send + Sync,
        F: Fn(&R) -> Vec<Action> + Send + Sync + 'static,
    {
        let table = TypedRoutes {
            handler,
            _route: std::marker::PhantomData,
        };
        self.register_table::<R>(Arc::new(table));
    }

    /// Register a table responsible for tokens of type `R`.
    pub fn register_table<R: Any>(&self, table: Arc<dyn RouteTable>) {
        self.tables.write().insert(TypeId::of::<R>(), table);
    }

    pub fn unregister<R: Any>(&self) -> bool {
        self.tables.write().remove(&TypeId::of::<R>()).is_some()
    }

    pub fn expand(&self, token: &RouteToken) -> Result<Vec<Action>, NavigationError> {
        let table = self.tables.read().get(&token.type_id()).cloned();
        let table = table.ok_or_else(|| {
            NavigationError::RouteExpansion(format!("no route table handles {:?}", token))
        })?;
        table.lookup(token).map_err(NavigationError::RouteExpansion)
    }
}
