//! Cascading resets and refetches between dependent select fields.
//!
//! Dependencies form a DAG (`parent -> child`). A parent change is evaluated
//! once, here, against the graph: an unselected parent clears every
//! descendant in topological order; a selected parent refetches its direct
//! children concurrently and re-validates their selections when the lists
//! land.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use tracing::debug;

use admin_core::model::{SelectOption, contains_value};

use crate::catalog::{DependencySpec, OptionSource, StaticOptions};
use crate::error::ChainError;
use crate::options::{LoadOutcome, OptionCache};

/// Read/reset access to the current selections of a draft.
pub trait SelectionStore: Send + Sync {
    fn selection(&self, field: &str) -> Option<u64>;

    /// Reset `field` to unselected; returns `true` if it held a value.
    fn reset_selection(&self, field: &str) -> bool;
}

/// What one parent change did to its descendants.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Children whose option lists were refetched and applied.
    pub refreshed: Vec<&'static str>,
    /// Fields whose selection was reset to unselected.
    pub reset: Vec<&'static str>,
    /// Children whose option fetch failed.
    pub failed: Vec<&'static str>,
}

pub struct DependentSelectionChain {
    graph: DiGraph<&'static str, OptionSource>,
    nodes: HashMap<&'static str, NodeIndex>,
    order: Vec<NodeIndex>,
    cache: OptionCache,
}

impl DependentSelectionChain {
    /// # Errors
    ///
    /// Returns `ChainError::Cycle` if the dependencies are not acyclic.
    pub fn new(cache: OptionCache, dependencies: &[DependencySpec]) -> Result<Self, ChainError> {
        let mut chain = Self {
            graph: DiGraph::new(),
            nodes: HashMap::new(),
            order: Vec::new(),
            cache,
        };
        for dependency in dependencies {
            chain.register_dependency(*dependency)?;
        }
        Ok(chain)
    }

    /// Add `parent -> child`, keeping the graph acyclic.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::Cycle` and leaves the graph unchanged if the edge
    /// would close a cycle.
    pub fn register_dependency(&mut self, dependency: DependencySpec) -> Result<(), ChainError> {
        let parent = self.node(dependency.parent);
        let child = self.node(dependency.child);
        let edge = self.graph.add_edge(parent, child, dependency.source);
        match toposort(&self.graph, None) {
            Ok(order) => {
                self.order = order;
                Ok(())
            }
            Err(cycle) => {
                self.graph.remove_edge(edge);
                Err(ChainError::Cycle(self.graph[cycle.node_id()].to_string()))
            }
        }
    }

    #[must_use]
    pub fn cache(&self) -> &OptionCache {
        &self.cache
    }

    #[must_use]
    pub fn options(&self, field: &str) -> Vec<SelectOption> {
        self.cache.options(field)
    }

    #[must_use]
    pub fn is_parent(&self, field: &str) -> bool {
        self.nodes.get(field).is_some_and(|idx| {
            self.graph
                .neighbors_directed(*idx, Direction::Outgoing)
                .next()
                .is_some()
        })
    }

    /// Fields with no parent that have children, in topological order.
    #[must_use]
    pub fn roots(&self) -> Vec<&'static str> {
        self.order
            .iter()
            .filter(|idx| {
                self.graph
                    .neighbors_directed(**idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[*idx])
            .collect()
    }

    /// Every field reachable from `field`, excluding itself, in
    /// topological order.
    #[must_use]
    pub fn descendants(&self, field: &str) -> Vec<&'static str> {
        let Some(start) = self.nodes.get(field).copied() else {
            return Vec::new();
        };
        let mut reachable = HashSet::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(idx) = dfs.next(&self.graph) {
            if idx != start {
                reachable.insert(idx);
            }
        }
        self.order
            .iter()
            .filter(|idx| reachable.contains(*idx))
            .map(|idx| self.graph[*idx])
            .collect()
    }

    /// Load parentless option lists concurrently.
    pub async fn load_static(&self, lists: &[StaticOptions]) -> Vec<(&'static str, LoadOutcome)> {
        join_all(lists.iter().map(|list| async move {
            let outcome = self.cache.load(list.field, &list.source, None).await;
            (list.field, outcome)
        }))
        .await
    }

    /// Propagate a change of `field` to its descendants.
    pub async fn parent_changed(&self, field: &str, store: &dyn SelectionStore) -> CascadeReport {
        let mut report = CascadeReport::default();
        let Some(parent) = self.nodes.get(field).copied() else {
            return report;
        };

        let Some(value) = store.selection(field) else {
            self.clear_descendants(field, store, &mut report);
            return report;
        };

        let children: Vec<(&'static str, OptionSource)> = self
            .graph
            .edges_directed(parent, Direction::Outgoing)
            .map(|edge| (self.graph[edge.target()], *edge.weight()))
            .collect();
        debug!(field, value, children = children.len(), "refetching dependent options");

        let outcomes = join_all(children.iter().map(|(child, source)| async move {
            let outcome = self.cache.load(child, source, Some(value)).await;
            (*child, outcome)
        }))
        .await;

        for (child, outcome) in outcomes {
            match outcome {
                LoadOutcome::Superseded => continue,
                LoadOutcome::Loaded(_) => report.refreshed.push(child),
                LoadOutcome::Failed => report.failed.push(child),
            }
            self.revalidate(child, store, &mut report);
        }
        report
    }

    /// Reset `child` if its selection is not among its resolved options,
    /// then clear what hangs below it.
    fn revalidate(
        &self,
        child: &'static str,
        store: &dyn SelectionStore,
        report: &mut CascadeReport,
    ) {
        let Some(selected) = store.selection(child) else {
            return;
        };
        if contains_value(&self.cache.options(child), selected) {
            return;
        }
        debug!(field = child, selected, "selection no longer offered; resetting");
        if store.reset_selection(child) {
            report.reset.push(child);
        }
        self.clear_descendants(child, store, report);
    }

    fn clear_descendants(
        &self,
        field: &str,
        store: &dyn SelectionStore,
        report: &mut CascadeReport,
    ) {
        for descendant in self.descendants(field) {
            self.cache.clear(descendant);
            if store.reset_selection(descendant) {
                report.reset.push(descendant);
            }
        }
    }

    fn node(&mut self, field: &'static str) -> NodeIndex {
        if let Some(idx) = self.nodes.get(field) {
            return *idx;
        }
        let idx = self.graph.add_node(field);
        self.nodes.insert(field, idx);
        idx
    }
}
