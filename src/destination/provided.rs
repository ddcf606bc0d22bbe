use super::{Destination, Rendered};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Resolver = Arc<dyn Fn(&dyn Any) -> Option<Rendered> + Send + Sync>;

/// Late-bound content resolvers keyed by destination type.
#[derive(Default)]
pub struct ProvidedViews {
    resolvers: RwLock<HashMap<TypeId, Resolver>>,
}

impl ProvidedViews {
    pub fn register<D, F>(&self, resolver: F)
    where
        D: Destination,
        F: Fn(&D) -> Rendered + Send + Sync + 'static,
    {
        let erased: Resolver = Arc::new(move |value: &dyn Any| {
            value.downcast_ref::<D>().map(&resolver)
        });
        self.resolvers.write().insert(TypeId::of::<D>(), erased);
    }

    pub fn unregister<D: Destination>(&self) -> bool {
        self.resolvers.write().remove(&TypeId::of::<D>()).is_some()
    }

    pub fn contains<D: Destination>(&self) -> bool {
        self.resolvers.read().contains_key(&TypeId::of::<D>())
    }

    /// None when no resolver is registered for `D`.
    pub fn resolve<D: Destination>(&self, destination: &D) -> Option<Rendered> {
        let resolver = self.resolvers.read().get(&TypeId::of::<D>()).cloned()?;
        resolver(destination as &dyn Any)
    }
}
