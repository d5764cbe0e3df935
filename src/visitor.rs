//! Traversal of the merged view of a repository tree.

use std::sync::Arc;

use crate::resource::{ResourceItem, ResourceNamespace, ResourceType};

/// Whether a traversal should go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitResult {
    Continue,
    Abort,
}

/// Receives the visible items of a merged view.
///
/// The filters let a visitor skip whole namespaces or types without the
/// corresponding maps being merged.
pub trait ResourceVisitor {
    fn should_visit_namespace(&mut self, _namespace: &ResourceNamespace) -> bool {
        true
    }

    fn should_visit_resource_type(&mut self, _resource_type: ResourceType) -> bool {
        true
    }

    fn visit(&mut self, item: &Arc<ResourceItem>) -> VisitResult;
}

impl<F> ResourceVisitor for F
where
    F: FnMut(&Arc<ResourceItem>) -> VisitResult,
{
    fn visit(&mut self, item: &Arc<ResourceItem>) -> VisitResult {
        self(item)
    }
}

/// Collects every visited item, optionally restricted to one namespace and
/// a set of types.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    namespace: Option<ResourceNamespace>,
    types: Option<Vec<ResourceType>>,
    pub items: Vec<Arc<ResourceItem>>,
}

impl CollectingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: ResourceNamespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn types(mut self, types: Vec<ResourceType>) -> Self {
        self.types = Some(types);
        self
    }
}

impl ResourceVisitor for CollectingVisitor {
    fn should_visit_namespace(&mut self, namespace: &ResourceNamespace) -> bool {
        self.namespace.as_ref().is_none_or(|wanted| wanted == namespace)
    }

    fn should_visit_resource_type(&mut self, resource_type: ResourceType) -> bool {
        self.types
            .as_ref()
            .is_none_or(|types| types.contains(&resource_type))
    }

    fn visit(&mut self, item: &Arc<ResourceItem>) -> VisitResult {
        self.items.push(item.clone());
        VisitResult::Continue
    }
}
