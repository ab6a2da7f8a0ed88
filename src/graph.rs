//! Dependency graph construction and validation.
//!
//! Built once during `build` from the frozen registry's declared manifests:
//! one node per resolvable key, one edge per declared dependency (optional
//! edges are recorded but excluded from cycle detection). Validation runs
//! reachability, Tarjan SCC cycle detection, the lifetime rule, and
//! decorator coherence; eager construction asks the same graph for a
//! dependencies-first order over long-lived bindings.

use std::collections::HashMap;

use crate::descriptor::{DependencyRequest, DependencyTarget};
use crate::error::{BuildError, DependencyPath};
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::registry::FrozenRegistry;

#[derive(Clone)]
struct Edge {
    to: usize,
    optional: bool,
}

pub(crate) struct DependencyGraph {
    keys: Vec<ServiceKey>,
    index: HashMap<ServiceKey, usize>,
    edges: Vec<Vec<Edge>>,
    lifetimes: Vec<Lifetime>,
}

impl DependencyGraph {
    /// Builds the graph, failing on the first dangling non-optional edge or
    /// incoherent decorator.
    pub(crate) fn build(reg: &FrozenRegistry) -> Result<Self, BuildError> {
        let mut keys = Vec::new();
        let mut index = HashMap::new();
        let mut lifetimes = Vec::new();

        let mut add_node = |key: ServiceKey, lifetime: Lifetime| {
            let id = keys.len();
            index.insert(key.clone(), id);
            keys.push(key);
            lifetimes.push(lifetime);
        };
        for (key, desc) in &reg.bindings {
            add_node(key.clone(), desc.lifetime);
        }
        for (key, alias) in &reg.aliases {
            add_node(key.clone(), alias.lifetime);
        }
        for (key, field) in &reg.fields {
            add_node(key.clone(), field.lifetime);
        }

        let mut graph = DependencyGraph {
            edges: vec![Vec::new(); keys.len()],
            keys,
            index,
            lifetimes,
        };

        for (key, desc) in &reg.bindings {
            let from = graph.index[key];
            graph.add_requests(reg, from, key, &desc.dependencies)?;
            for decorator in reg.decorators_for(key) {
                graph.add_requests(reg, from, key, &decorator.dependencies)?;
            }
        }
        for (key, alias) in &reg.aliases {
            let from = graph.index[key];
            let to = graph.index[&alias.target];
            graph.edges[from].push(Edge { to, optional: false });
        }
        for (key, field) in &reg.fields {
            let from = graph.index[key];
            let to = graph.index[&field.owner];
            graph.edges[from].push(Edge { to, optional: false });
        }

        // Decorator coherence: every decorated key needs an underlying
        // non-decorator binding.
        for key in reg.decorators.keys() {
            if !reg.bindings.contains_key(key) {
                return Err(BuildError::DecoratorCoherence { key: key.clone() });
            }
        }

        tracing::debug!(
            target: "wirebox",
            nodes = graph.keys.len(),
            edges = graph.edges.iter().map(Vec::len).sum::<usize>(),
            "dependency graph built"
        );
        Ok(graph)
    }

    fn add_requests(
        &mut self,
        reg: &FrozenRegistry,
        from: usize,
        from_key: &ServiceKey,
        requests: &[DependencyRequest],
    ) -> Result<(), BuildError> {
        for request in requests {
            match &request.target {
                DependencyTarget::Binding(target) => match self.index.get(target).copied() {
                    Some(to) => self.edges[from].push(Edge {
                        to,
                        optional: request.optional,
                    }),
                    None if request.optional => {}
                    None => {
                        return Err(BuildError::MissingDependency {
                            dependent: from_key.clone(),
                            dependency: target.clone(),
                        });
                    }
                },
                DependencyTarget::Group(group, type_name) => {
                    // An empty group is a valid (empty) sequence, so group
                    // edges never dangle; each present member becomes an
                    // edge.
                    for i in 0..reg.group_len(group, type_name) {
                        let member = ServiceKey::GroupMember(group, type_name, i);
                        let to = self.index[&member];
                        self.edges[from].push(Edge {
                            to,
                            optional: request.optional,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Runs the cycle check (Tarjan SCC over non-optional edges) and the
    /// lifetime rule over every edge.
    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        self.check_cycles()?;
        self.check_lifetimes()
    }

    fn check_lifetimes(&self) -> Result<(), BuildError> {
        for (from, edges) in self.edges.iter().enumerate() {
            for edge in edges {
                if !self.lifetimes[from].may_depend_on(self.lifetimes[edge.to]) {
                    return Err(BuildError::LifetimeConflict {
                        dependent: self.keys[from].clone(),
                        dependency: self.keys[edge.to].clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_cycles(&self) -> Result<(), BuildError> {
        // Self-loops are cycles regardless of component size.
        for (from, edges) in self.edges.iter().enumerate() {
            if edges.iter().any(|e| !e.optional && e.to == from) {
                return Err(BuildError::CircularDependency {
                    path: DependencyPath(vec![
                        self.keys[from].clone(),
                        self.keys[from].clone(),
                    ]),
                });
            }
        }

        let mut state = TarjanState {
            graph: self,
            indices: vec![None; self.keys.len()],
            lowlinks: vec![0; self.keys.len()],
            on_stack: vec![false; self.keys.len()],
            stack: Vec::new(),
            next_index: 0,
        };
        for node in 0..self.keys.len() {
            if state.indices[node].is_none() {
                if let Some(cycle) = state.strongconnect(node) {
                    let mut path: Vec<ServiceKey> =
                        cycle.into_iter().map(|n| self.keys[n].clone()).collect();
                    if let Some(first) = path.first().cloned() {
                        path.push(first);
                    }
                    return Err(BuildError::CircularDependency {
                        path: DependencyPath(path),
                    });
                }
            }
        }
        Ok(())
    }

    /// Long-lived descriptor keys, dependencies first. Only valid on a
    /// graph that passed [`validate`](Self::validate).
    pub(crate) fn eager_order(&self, reg: &FrozenRegistry) -> Vec<ServiceKey> {
        let mut visited = vec![false; self.keys.len()];
        let mut order = Vec::new();
        for node in 0..self.keys.len() {
            if self.lifetimes[node] == Lifetime::Long {
                self.postorder(node, &mut visited, &mut order);
            }
        }
        order
            .into_iter()
            .map(|n| self.keys[n].clone())
            .filter(|k| reg.bindings.contains_key(k))
            .collect()
    }

    fn postorder(&self, node: usize, visited: &mut [bool], order: &mut Vec<usize>) {
        if visited[node] {
            return;
        }
        visited[node] = true;
        for edge in &self.edges[node] {
            if !edge.optional {
                self.postorder(edge.to, visited, order);
            }
        }
        order.push(node);
    }
}

struct TarjanState<'a> {
    graph: &'a DependencyGraph,
    indices: Vec<Option<usize>>,
    lowlinks: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
}

impl TarjanState<'_> {
    /// Returns the members of the first strongly connected component of
    /// size >= 2 reachable from `node`.
    fn strongconnect(&mut self, node: usize) -> Option<Vec<usize>> {
        let graph = self.graph;
        self.indices[node] = Some(self.next_index);
        self.lowlinks[node] = self.next_index;
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack[node] = true;

        for edge in &graph.edges[node] {
            if edge.optional {
                continue;
            }
            let to = edge.to;
            if self.indices[to].is_none() {
                if let Some(cycle) = self.strongconnect(to) {
                    return Some(cycle);
                }
                self.lowlinks[node] = self.lowlinks[node].min(self.lowlinks[to]);
            } else if self.on_stack[to] {
                self.lowlinks[node] = self.lowlinks[node].min(self.indices[to].unwrap());
            }
        }

        if self.lowlinks[node] == self.indices[node].unwrap() {
            let mut component = Vec::new();
            loop {
                let popped = self.stack.pop().unwrap();
                self.on_stack[popped] = false;
                component.push(popped);
                if popped == node {
                    break;
                }
            }
            if component.len() >= 2 {
                component.reverse();
                return Some(component);
            }
        }
        None
    }
}
