use themekit_core::{Action, ResourceKind};

use super::ResourceTask;

/// Sort key: resource kind precedence first, then action precedence within the kind.
pub fn order_key(kind: ResourceKind, action: Action) -> (u8, u8) {
    (kind.precedence(), action.precedence())
}

/// Stable sort, so tasks with equal keys keep their insertion order.
pub fn sort_tasks(tasks: &mut [ResourceTask]) {
    tasks.sort_by_key(|t| order_key(t.payload.kind, t.payload.action));
}
