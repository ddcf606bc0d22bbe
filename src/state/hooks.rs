//! Hooks a node hands down to the scopes it mounts.
//!
//! Each hook carries its own inherit flag. A child receives a copy of the hook at first
//! attach only when the flag is set; the flag itself is always copied so the choice keeps
//! propagating down the tree.

use super::StateNode;
use crate::destination::{AnyDestination, RenderContext, Rendered};
use crate::navigator::Navigator;
use std::sync::Arc;

/// Rewrites a destination before it is rendered.
pub type DestinationMap = Arc<dyn Fn(AnyDestination) -> AnyDestination + Send + Sync>;

/// Wraps the renderable produced for a destination.
pub type ViewModifier = Arc<dyn Fn(Rendered, &AnyDestination) -> Rendered + Send + Sync>;

#[derive(Clone)]
pub struct InheritableHook<T> {
    hook: Option<T>,
    inherits: bool,
}

impl<T: Clone> InheritableHook<T> {
    pub fn new(inherits: bool) -> Self {
        Self {
            hook: None,
            inherits,
        }
    }

    pub fn set(&mut self, hook: T, inherits: bool) {
        self.hook = Some(hook);
        self.inherits = inherits;
    }

    pub fn get(&self) -> Option<&T> {
        self.hook.as_ref()
    }

    pub fn inherits(&self) -> bool {
        self.inherits
    }

    fn inherited(&self) -> Self {
        Self {
            hook: if self.inherits {
                self.hook.clone()
            } else {
                None
            },
            inherits: self.inherits,
        }
    }
}

#[derive(Clone)]
pub struct Hooks {
    pub navigation_map: InheritableHook<DestinationMap>,
    pub navigation_modifier: InheritableHook<ViewModifier>,
    pub presentation_modifier: InheritableHook<ViewModifier>,
    /// Overrides the configuration's auto destination mode for this subtree
    pub auto_destination_mode: Option<bool>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            navigation_map: InheritableHook::new(true),
            navigation_modifier: InheritableHook::new(false),
            presentation_modifier: InheritableHook::new(false),
            auto_destination_mode: None,
        }
    }
}

impl Hooks {
    /// The hooks a newly attached child starts with.
    pub(crate) fn inherited(&self) -> Hooks {
        Hooks {
            navigation_map: self.navigation_map.inherited(),
            navigation_modifier: self.navigation_modifier.inherited(),
            presentation_modifier: self.presentation_modifier.inherited(),
            auto_destination_mode: self.auto_destination_mode,
        }
    }
}

impl StateNode {
    pub fn set_navigation_map(
        &self,
        inherits: bool,
        map: impl Fn(AnyDestination) -> AnyDestination + Send + Sync + 'static,
    ) {
        self.inner
            .write()
            .hooks
            .navigation_map
            .set(Arc::new(map), inherits);
    }

    pub fn set_navigation_modifier(
        &self,
        inherits: bool,
        modifier: impl Fn(Rendered, &AnyDestination) -> Rendered + Send + Sync + 'static,
    ) {
        self.inner
            .write()
            .hooks
            .navigation_modifier
            .set(Arc::new(modifier), inherits);
    }

    pub fn set_presentation_modifier(
        &self,
        inherits: bool,
        modifier: impl Fn(Rendered, &AnyDestination) -> Rendered + Send + Sync + 'static,
    ) {
        self.inner
            .write()
            .hooks
            .presentation_modifier
            .set(Arc::new(modifier), inherits);
    }

    pub fn set_auto_destination_mode(&self, enabled: Option<bool>) {
        self.inner.write().hooks.auto_destination_mode = enabled;
    }

    pub fn auto_destination_mode(&self) -> bool {
        let inner = self.inner.read();
        inner
            .hooks
            .auto_destination_mode
            .unwrap_or(inner.configuration.auto_destination_mode)
    }

    pub fn hooks(&self) -> Hooks {
        self.inner.read().hooks.clone()
    }

    /// Apply this node's destination map, if any.
    pub fn map_destination(&self, destination: AnyDestination) -> AnyDestination {
        let map = self.inner.read().hooks.navigation_map.get().cloned();
        match map {
            Some(map) => map(destination),
            None => destination,
        }
    }

    /// Render a pushed destination through this node's map and navigation modifier.
    pub fn mapped_navigation_view(self: &Arc<Self>, destination: &AnyDestination) -> Rendered {
        let modifier = self.inner.read().hooks.navigation_modifier.get().cloned();
        self.render_with(destination, modifier)
    }

    /// Render a presented destination through this node's map and presentation modifier.
    pub fn mapped_presentation_view(self: &Arc<Self>, destination: &AnyDestination) -> Rendered {
        let modifier = self.inner.read().hooks.presentation_modifier.get().cloned();
        self.render_with(destination, modifier)
    }

    fn render_with(
        self: &Arc<Self>,
        destination: &AnyDestination,
        modifier: Option<ViewModifier>,
    ) -> Rendered {
        let mapped = self.map_destination(destination.clone());
        let context = RenderContext::new(Navigator::from_node(Arc::clone(self)));
        let rendered = mapped.produce(&context);
        match modifier {
            Some(modifier) => modifier(rendered, &mapped),
            None => rendered,
        }
    }
}
