//! `quay tree` command

use anyhow::Result;

use crate::cli::TreeArgs;
use quay::core::DxProject;
use quay::graph::PackageNodeTree;
use quay::util::diagnostic::emit;
use quay::util::GlobalContext;

pub fn execute(args: TreeArgs, color: bool) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let project = DxProject::discover(&ctx)?;

    let rendered = match &args.package {
        Some(package) => match PackageNodeTree::subtree(project.manifest(), package) {
            Ok(node) => node.render(args.depth),
            Err(e) => {
                emit(&e.to_diagnostic(), color);
                std::process::exit(1);
            }
        },
        None => {
            let tree = PackageNodeTree::build(project.manifest());
            if tree.roots().is_empty() {
                eprintln!("no packages declared in sfdx-project.json");
                return Ok(());
            }
            tree.render(args.depth)
        }
    };

    print!("{}", rendered);

    Ok(())
}
