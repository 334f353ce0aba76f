//! The project dependency graph.
//!
//! Built once from the manifest and read-only afterwards. Nodes are the
//! named, versioned package directories; edges point from a package to
//! the sibling packages it depends on. Dependencies that resolve through
//! the alias table (subscriber packages) or fail to resolve at all are
//! recorded per node but are not graph nodes.

pub mod errors;
pub mod node_tree;

pub use errors::GraphError;
pub use node_tree::{PackageNode, PackageNodeTree};

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Topo;

use crate::core::manifest::ProjectManifest;
use crate::core::{PackageDependency, PackageId, ResolvedDependency};
use crate::util::InternedString;

/// The dependency graph over a project's package directories.
#[derive(Debug, Clone)]
pub struct PackageGraph {
    /// Package graph; edge a -> b means a depends on b
    graph: DiGraph<PackageId, ()>,

    /// Map from package name to node index
    name_to_node: HashMap<InternedString, NodeIndex>,

    /// Local dependency names per package, in declaration order
    local_deps: HashMap<InternedString, Vec<InternedString>>,

    /// Dependencies that resolved to subscriber packages via the alias table
    subscriber_deps: HashMap<InternedString, Vec<PackageDependency>>,

    /// Dependencies that resolved to nothing
    unresolved_deps: HashMap<InternedString, Vec<PackageDependency>>,
}

impl PackageGraph {
    /// Build the graph from a parsed manifest.
    ///
    /// Entries that are not packages (bare source directories) and named
    /// entries without a parseable version are left out; validation
    /// reports the latter separately.
    pub fn from_manifest(manifest: &ProjectManifest) -> Self {
        let mut graph = DiGraph::new();
        let mut name_to_node = HashMap::new();

        for entry in manifest.packages() {
            let Some(id) = entry.id() else { continue };
            if name_to_node.contains_key(&id.name()) {
                // Duplicate declaration; validation flags it, first wins here.
                continue;
            }
            let node = graph.add_node(id);
            name_to_node.insert(id.name(), node);
        }

        let mut local_deps: HashMap<InternedString, Vec<InternedString>> = HashMap::new();
        let mut subscriber_deps: HashMap<InternedString, Vec<PackageDependency>> = HashMap::new();
        let mut unresolved_deps: HashMap<InternedString, Vec<PackageDependency>> = HashMap::new();

        for entry in manifest.packages() {
            let Some(name) = entry.name else { continue };
            let Some(&from) = name_to_node.get(&name) else {
                continue;
            };

            for dep in &entry.dependencies {
                match dep.resolve(manifest) {
                    ResolvedDependency::Local { name: dep_name, .. } => {
                        if let Some(&to) = name_to_node.get(&dep_name) {
                            if from != to && !graph.contains_edge(from, to) {
                                graph.add_edge(from, to, ());
                            }
                        }
                        local_deps.entry(name).or_default().push(dep_name);
                    }
                    ResolvedDependency::Subscriber { .. } => {
                        subscriber_deps.entry(name).or_default().push(dep.clone());
                    }
                    ResolvedDependency::Unresolved { .. } => {
                        unresolved_deps.entry(name).or_default().push(dep.clone());
                    }
                }
            }
        }

        PackageGraph {
            graph,
            name_to_node,
            local_deps,
            subscriber_deps,
            unresolved_deps,
        }
    }

    /// Number of packages in the graph.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Check if a package is in the graph.
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_node.contains_key(&InternedString::new(name))
    }

    /// Get a package ID by name.
    pub fn get(&self, name: &str) -> Option<PackageId> {
        self.name_to_node
            .get(&InternedString::new(name))
            .map(|&node| self.graph[node])
    }

    /// All packages, in manifest declaration order.
    pub fn package_ids(&self) -> Vec<PackageId> {
        self.graph.node_weights().copied().collect()
    }

    /// Direct local dependencies of a package, in declaration order.
    pub fn deps(&self, name: &str) -> Vec<PackageId> {
        self.local_deps
            .get(&InternedString::new(name))
            .map(|deps| deps.iter().filter_map(|d| self.get(d)).collect())
            .unwrap_or_default()
    }

    /// Packages that directly depend on the given package.
    pub fn dependents(&self, name: &str) -> Vec<PackageId> {
        if let Some(&node) = self.name_to_node.get(&InternedString::new(name)) {
            self.graph
                .neighbors_directed(node, petgraph::Direction::Incoming)
                .map(|n| self.graph[n])
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Subscriber (alias-resolved) dependencies of a package.
    pub fn subscriber_deps(&self, name: &str) -> &[PackageDependency] {
        self.subscriber_deps
            .get(&InternedString::new(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Dependencies of a package that resolved to nothing.
    pub fn unresolved_deps(&self, name: &str) -> &[PackageDependency] {
        self.unresolved_deps
            .get(&InternedString::new(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All unresolved dependencies across the project, with the dependent's name.
    pub fn all_unresolved(&self) -> Vec<(InternedString, &PackageDependency)> {
        let mut out = Vec::new();
        for id in self.package_ids() {
            for dep in self.unresolved_deps(&id.name()) {
                out.push((id.name(), dep));
            }
        }
        out
    }

    /// Packages in install order (dependencies before dependents).
    ///
    /// Fails when the graph has a cycle, since no such order exists.
    pub fn topological_order(&self) -> Result<Vec<PackageId>, GraphError> {
        let mut topo = Topo::new(&self.graph);
        let mut order = Vec::new();

        while let Some(node) = topo.next(&self.graph) {
            order.push(self.graph[node]);
        }

        // Topo silently skips nodes that sit on a cycle.
        if order.len() != self.graph.node_count() {
            let packages = self
                .find_cycle()
                .unwrap_or_default()
                .iter()
                .map(|id| id.name().to_string())
                .collect();
            return Err(GraphError::CycleDetected { packages });
        }

        // Petgraph's Topo visits a before b for an edge a -> b, and our
        // edges point dependent -> dependency. Reverse for install order.
        order.reverse();
        Ok(order)
    }

    /// Find a dependency cycle, if one exists.
    ///
    /// Returns the cycle path with the entry node repeated at the end.
    pub fn find_cycle(&self) -> Option<Vec<PackageId>> {
        let mut state: HashMap<NodeIndex, VisitState> = HashMap::new();
        let mut stack: Vec<NodeIndex> = Vec::new();

        for start in self.graph.node_indices() {
            if let Some(cycle) = self.cycle_from(start, &mut state, &mut stack) {
                return Some(cycle);
            }
        }

        None
    }

    fn cycle_from(
        &self,
        node: NodeIndex,
        state: &mut HashMap<NodeIndex, VisitState>,
        stack: &mut Vec<NodeIndex>,
    ) -> Option<Vec<PackageId>> {
        match state.get(&node) {
            Some(VisitState::Done) => return None,
            Some(VisitState::InProgress) => {
                let pos = stack.iter().position(|&n| n == node).unwrap_or(0);
                let mut cycle: Vec<PackageId> =
                    stack[pos..].iter().map(|&n| self.graph[n]).collect();
                cycle.push(self.graph[node]);
                return Some(cycle);
            }
            None => {}
        }

        state.insert(node, VisitState::InProgress);
        stack.push(node);

        for next in self.graph.neighbors(node) {
            if let Some(cycle) = self.cycle_from(next, state, stack) {
                return Some(cycle);
            }
        }

        stack.pop();
        state.insert(node, VisitState::Done);
        None
    }

    /// All transitive local dependencies of a package.
    ///
    /// Returned in discovery order (breadth-first over declaration order),
    /// which keeps findings and reports stable.
    pub fn transitive_deps(&self, name: &str) -> Vec<PackageId> {
        self.walk(name, |n| self.deps(n))
    }

    /// All packages that transitively depend on the given package.
    pub fn transitive_dependents(&self, name: &str) -> Vec<PackageId> {
        let mut out = self.walk(name, |n| self.dependents(n));
        // Incoming-neighbor order is arbitrary; sort for stable output.
        out.sort();
        out
    }

    fn walk(
        &self,
        name: &str,
        next: impl Fn(&str) -> Vec<PackageId>,
    ) -> Vec<PackageId> {
        let mut seen: HashSet<PackageId> = HashSet::new();
        let mut out = Vec::new();
        let mut queue: Vec<PackageId> = next(name);

        let this = self.get(name);
        while !queue.is_empty() {
            let mut following = Vec::new();
            for id in queue {
                if Some(id) == this || !seen.insert(id) {
                    continue;
                }
                out.push(id);
                following.extend(next(&id.name()));
            }
            queue = following;
        }

        out
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn graph_for(content: &str) -> PackageGraph {
        let manifest =
            ProjectManifest::parse(content, Path::new("/tmp/sfdx-project.json")).unwrap();
        PackageGraph::from_manifest(&manifest)
    }

    const CHAIN: &str = r#"{
  "packageDirectories": [
    { "path": "pkgs/core", "package": "core", "versionNumber": "1.0.0.NEXT" },
    {
      "path": "pkgs/api",
      "package": "api",
      "versionNumber": "1.0.0.NEXT",
      "dependencies": [{ "package": "core", "versionNumber": "1.0.0.LATEST" }]
    },
    {
      "path": "pkgs/app",
      "package": "app",
      "versionNumber": "1.0.0.NEXT",
      "dependencies": [
        { "package": "api", "versionNumber": "1.0.0.LATEST" },
        { "package": "Marketing Base@2.1.0-4" }
      ]
    },
    { "path": "unpackaged" }
  ],
  "packageAliases": {
    "Marketing Base@2.1.0-4": "04t6F000000N2ZvQAK"
  }
}"#;

    #[test]
    fn test_graph_nodes_and_edges() {
        let graph = graph_for(CHAIN);

        assert_eq!(graph.len(), 3);
        assert!(graph.contains("core"));
        assert!(!graph.contains("unpackaged"));
        assert!(!graph.contains("Marketing Base@2.1.0-4"));

        let api_deps = graph.deps("api");
        assert_eq!(api_deps.len(), 1);
        assert_eq!(api_deps[0].name(), "core");

        let core_dependents = graph.dependents("core");
        assert_eq!(core_dependents.len(), 1);
        assert_eq!(core_dependents[0].name(), "api");
    }

    #[test]
    fn test_subscriber_deps_not_nodes() {
        let graph = graph_for(CHAIN);

        assert_eq!(graph.deps("app").len(), 1);
        assert_eq!(graph.subscriber_deps("app").len(), 1);
        assert_eq!(graph.subscriber_deps("app")[0].package, "Marketing Base@2.1.0-4");
        assert!(graph.unresolved_deps("app").is_empty());
    }

    #[test]
    fn test_unresolved_deps_recorded() {
        let graph = graph_for(
            r#"{
  "packageDirectories": [
    {
      "path": "pkgs/app",
      "package": "app",
      "versionNumber": "1.0.0.NEXT",
      "dependencies": [{ "package": "ghost", "versionNumber": "1.0.0.LATEST" }]
    }
  ]
}"#,
        );

        assert_eq!(graph.unresolved_deps("app").len(), 1);
        assert_eq!(graph.all_unresolved().len(), 1);
        assert!(graph.deps("app").is_empty());
    }

    #[test]
    fn test_topological_order() {
        let graph = graph_for(CHAIN);

        let order = graph.topological_order().unwrap();
        let pos = |name: &str| order.iter().position(|id| id.name() == name).unwrap();

        assert!(pos("core") < pos("api"));
        assert!(pos("api") < pos("app"));
    }

    #[test]
    fn test_cycle_detected() {
        let graph = graph_for(
            r#"{
  "packageDirectories": [
    {
      "path": "a",
      "package": "a",
      "versionNumber": "1.0.0.NEXT",
      "dependencies": [{ "package": "b", "versionNumber": "1.0.0.LATEST" }]
    },
    {
      "path": "b",
      "package": "b",
      "versionNumber": "1.0.0.NEXT",
      "dependencies": [{ "package": "a", "versionNumber": "1.0.0.LATEST" }]
    }
  ]
}"#,
        );

        let cycle = graph.find_cycle().unwrap();
        assert!(cycle.len() >= 3);
        assert_eq!(cycle.first().map(|id| id.name()), cycle.last().map(|id| id.name()));

        let err = graph.topological_order().unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));
    }

    #[test]
    fn test_transitive_deps() {
        let graph = graph_for(CHAIN);

        let deps = graph.transitive_deps("app");
        let names: Vec<_> = deps.iter().map(|id| id.name().to_string()).collect();
        assert_eq!(names, vec!["api", "core"]);

        let dependents = graph.transitive_dependents("core");
        let names: Vec<_> = dependents.iter().map(|id| id.name().to_string()).collect();
        assert_eq!(names, vec!["api", "app"]);
    }

    #[test]
    fn test_self_dependency_ignored_as_edge() {
        let graph = graph_for(
            r#"{
  "packageDirectories": [
    {
      "path": "a",
      "package": "a",
      "versionNumber": "1.0.0.NEXT",
      "dependencies": [{ "package": "a", "versionNumber": "1.0.0.LATEST" }]
    }
  ]
}"#,
        );

        // The self edge is dropped so ordering still works; validation
        // reports the declaration itself.
        assert!(graph.topological_order().is_ok());
        assert_eq!(graph.deps("a").len(), 1);
    }
}
