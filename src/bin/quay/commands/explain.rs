//! `quay explain` command

use anyhow::Result;

use crate::cli::ExplainArgs;
use quay::core::{DxProject, PackageId, ResolvedDependency};
use quay::graph::{GraphError, PackageGraph};
use quay::util::diagnostic::emit;
use quay::util::GlobalContext;

pub fn execute(args: ExplainArgs, color: bool) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let project = DxProject::discover(&ctx)?;

    let manifest = project.manifest();
    let graph = PackageGraph::from_manifest(manifest);

    let Some(id) = graph.get(&args.package) else {
        let err = GraphError::PackageNotFound {
            package: args.package.clone(),
            suggestions: graph
                .package_ids()
                .iter()
                .map(|id| id.name().to_string())
                .filter(|c| c.contains(&args.package) || args.package.contains(c.as_str()))
                .collect(),
        };
        emit(&err.to_diagnostic(), color);
        std::process::exit(1);
    };

    // Package header
    println!("{}", id);

    // Reverse dependency chain (package -> roots)
    print_reverse_chain(&graph, id, 0);

    println!();

    // Direct dependencies, external ones included
    let entry = manifest.package(&args.package);
    let deps = entry.map(|e| e.dependencies.as_slice()).unwrap_or_default();
    if !deps.is_empty() {
        println!("Direct dependencies:");
        for dep in deps {
            match dep.resolve(manifest) {
                ResolvedDependency::Local { name, .. } => {
                    if let Some(dep_id) = graph.get(&name) {
                        println!("  → {}", dep_id);
                    } else {
                        println!("  → {} (not in graph)", name);
                    }
                }
                ResolvedDependency::Subscriber {
                    alias,
                    subscriber_id,
                } => {
                    println!("  → {} [{}]", alias, subscriber_id);
                }
                ResolvedDependency::Unresolved { package } => {
                    println!("  → {} (unresolved)", package);
                }
            }
        }
    }

    Ok(())
}

/// Print the reverse dependency chain from the package up to the roots.
fn print_reverse_chain(graph: &PackageGraph, id: PackageId, depth: usize) {
    let dependents = graph.dependents(&id.name());

    if dependents.is_empty() {
        let indent = "     ".repeat(depth);
        println!("{}└─ (root)", indent);
        return;
    }

    for dep_id in dependents {
        let indent = "     ".repeat(depth);
        println!("{}└─ required by: {}", indent, dep_id);
        print_reverse_chain(graph, dep_id, depth + 1);
    }
}
