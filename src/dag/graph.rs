// src/dag/graph.rs

use crate::dag::plan::Plan;
use crate::engine::InvocationId;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct GraphNode {
    /// Invocations that must finish before this one can start.
    deps: Vec<InvocationId>,
    /// Invocations waiting on this one.
    dependents: Vec<InvocationId>,
}

/// Adjacency view of a [`Plan`], indexed by invocation id.
///
/// The plan is acyclic by construction (ids only ever point backwards), so
/// this only keeps adjacency information for scheduling and diagnostics.
#[derive(Debug, Clone)]
pub struct InvocationGraph {
    nodes: Vec<GraphNode>,
}

impl InvocationGraph {
    pub fn from_plan(plan: &Plan) -> Self {
        let mut nodes: Vec<GraphNode> = plan
            .invocations()
            .iter()
            .map(|inv| GraphNode {
                deps: inv.deps.clone(),
                dependents: Vec::new(),
            })
            .collect();

        for inv in plan.invocations() {
            for &dep in &inv.deps {
                if let Some(node) = nodes.get_mut(dep) {
                    node.dependents.push(inv.id);
                }
            }
        }

        Self { nodes }
    }

    /// Direct dependencies of `id`.
    pub fn dependencies_of(&self, id: InvocationId) -> &[InvocationId] {
        self.nodes
            .get(id)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Direct dependents of `id`.
    pub fn dependents_of(&self, id: InvocationId) -> &[InvocationId] {
        self.nodes
            .get(id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Invocations with no dependencies.
    pub fn roots(&self) -> impl Iterator<Item = InvocationId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.deps.is_empty())
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
