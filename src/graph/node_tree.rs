//! Nested per-package dependency trees.
//!
//! A `PackageNodeTree` is the rendered-friendly view of the flat
//! packageDirectories list: every top-level package (one nothing else
//! depends on) becomes a root, and its dependency list is expanded into
//! child nodes by repeated manifest lookups. Subscriber and unresolved
//! dependencies stay as leaves in their declared position.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::core::manifest::ProjectManifest;
use crate::core::version::PackageVersion;
use crate::core::{PackageId, ResolvedDependency};
use crate::graph::{GraphError, PackageGraph};

/// One package in the tree, with its dependencies expanded beneath it.
#[derive(Debug, Clone)]
pub struct PackageNode {
    /// The package at this node
    pub id: PackageId,

    /// Version the dependent pinned, when it differs from the declared one
    pub pinned: Option<PackageVersion>,

    /// True when this package was already expanded elsewhere in the tree
    pub repeated: bool,

    /// Dependencies in declaration order
    pub deps: Vec<DepNode>,
}

/// A dependency position under a package node.
#[derive(Debug, Clone)]
pub enum DepNode {
    /// A sibling package, expanded into a subtree
    Local(PackageNode),

    /// An external package version reachable through the alias table
    Subscriber { alias: String, subscriber_id: String },

    /// A dependency that resolves to nothing
    Unresolved { package: String },
}

/// The project's packages as a forest of dependency trees.
#[derive(Debug, Clone)]
pub struct PackageNodeTree {
    roots: Vec<PackageNode>,
}

impl PackageNodeTree {
    /// Build the forest for the whole project.
    ///
    /// Roots are the packages no sibling depends on, in declaration
    /// order. A package shared between roots is expanded once and marked
    /// repeated afterwards.
    pub fn build(manifest: &ProjectManifest) -> Self {
        let graph = PackageGraph::from_manifest(manifest);
        let mut seen = HashSet::new();

        let roots = graph
            .package_ids()
            .into_iter()
            .filter(|id| graph.dependents(&id.name()).is_empty())
            .map(|id| build_node(manifest, &graph, id, None, &mut seen))
            .collect();

        PackageNodeTree { roots }
    }

    /// Build the tree rooted at a single package.
    pub fn subtree(manifest: &ProjectManifest, name: &str) -> Result<PackageNode, GraphError> {
        let graph = PackageGraph::from_manifest(manifest);

        let Some(id) = graph.get(name) else {
            let suggestions = graph
                .package_ids()
                .iter()
                .map(|id| id.name().to_string())
                .filter(|candidate| candidate.contains(name) || name.contains(candidate.as_str()))
                .collect();
            return Err(GraphError::PackageNotFound {
                package: name.to_string(),
                suggestions,
            });
        };

        let mut seen = HashSet::new();
        Ok(build_node(manifest, &graph, id, None, &mut seen))
    }

    /// Root nodes in declaration order.
    pub fn roots(&self) -> &[PackageNode] {
        &self.roots
    }

    /// Render the forest as an ascii tree.
    pub fn render(&self, max_depth: Option<usize>) -> String {
        let max_depth = max_depth.unwrap_or(usize::MAX);
        let mut out = String::new();
        for root in &self.roots {
            root.render_into(&mut out, 0, max_depth);
        }
        out
    }
}

impl PackageNode {
    /// Render this subtree as an ascii tree.
    pub fn render(&self, max_depth: Option<usize>) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0, max_depth.unwrap_or(usize::MAX));
        out
    }

    fn render_into(&self, out: &mut String, depth: usize, max_depth: usize) {
        if depth > max_depth {
            return;
        }

        let prefix = tree_prefix(depth);
        let repeat_marker = if self.repeated { " (*)" } else { "" };
        let pin = match &self.pinned {
            Some(version) => format!(" (requires {})", version),
            None => String::new(),
        };

        let _ = writeln!(out, "{}{}{}{}", prefix, self.id, pin, repeat_marker);

        for dep in &self.deps {
            match dep {
                DepNode::Local(node) => node.render_into(out, depth + 1, max_depth),
                DepNode::Subscriber {
                    alias,
                    subscriber_id,
                } => {
                    if depth + 1 <= max_depth {
                        let _ = writeln!(
                            out,
                            "{}{} [{}]",
                            tree_prefix(depth + 1),
                            alias,
                            subscriber_id
                        );
                    }
                }
                DepNode::Unresolved { package } => {
                    if depth + 1 <= max_depth {
                        let _ = writeln!(
                            out,
                            "{}{} (unresolved)",
                            tree_prefix(depth + 1),
                            package
                        );
                    }
                }
            }
        }
    }

    /// Number of local packages in this subtree, the node itself included.
    pub fn local_count(&self) -> usize {
        1 + self
            .deps
            .iter()
            .map(|dep| match dep {
                DepNode::Local(node) => node.local_count(),
                _ => 0,
            })
            .sum::<usize>()
    }
}

fn tree_prefix(depth: usize) -> String {
    if depth == 0 {
        String::new()
    } else {
        format!("{}├── ", "│   ".repeat(depth - 1))
    }
}

fn build_node(
    manifest: &ProjectManifest,
    graph: &PackageGraph,
    id: PackageId,
    pinned: Option<PackageVersion>,
    seen: &mut HashSet<PackageId>,
) -> PackageNode {
    let repeated = !seen.insert(id);

    let mut deps = Vec::new();
    if !repeated {
        if let Some(entry) = manifest.package(&id.name()) {
            for dep in &entry.dependencies {
                match dep.resolve(manifest) {
                    ResolvedDependency::Local { name, version } => {
                        if let Some(dep_id) = graph.get(&name) {
                            // Only pins that differ from the declared version
                            // are worth surfacing.
                            let pin = version.filter(|v| v != dep_id.version());
                            deps.push(DepNode::Local(build_node(
                                manifest, graph, dep_id, pin, seen,
                            )));
                        } else {
                            deps.push(DepNode::Unresolved {
                                package: dep.package.clone(),
                            });
                        }
                    }
                    ResolvedDependency::Subscriber {
                        alias,
                        subscriber_id,
                    } => {
                        deps.push(DepNode::Subscriber {
                            alias,
                            subscriber_id,
                        });
                    }
                    ResolvedDependency::Unresolved { package } => {
                        deps.push(DepNode::Unresolved { package });
                    }
                }
            }
        }
    }

    PackageNode {
        id,
        pinned,
        repeated,
        deps,
    }
}
