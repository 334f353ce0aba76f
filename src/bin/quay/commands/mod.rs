//! Command implementations

pub mod changed;
pub mod completions;
pub mod doctor;
pub mod explain;
pub mod init;
pub mod install;
pub mod new;
pub mod pack;
pub mod plan;
pub mod tree;
pub mod validate;
pub mod version;

use std::path::Path;

use anyhow::Result;

use quay::core::ReleaseDefinition;
use quay::util::Config;

/// Load the release definition named on the command line, if any.
pub fn load_release(path: Option<&Path>) -> Result<Option<ReleaseDefinition>> {
    path.map(ReleaseDefinition::load).transpose()
}

/// Resolve the target org: the command-line flag wins, then the release
/// definition, then the configured default.
pub fn target_org(
    flag: Option<&str>,
    release: Option<&ReleaseDefinition>,
    config: &Config,
) -> Result<String> {
    flag.map(str::to_string)
        .or_else(|| release.and_then(|r| r.org.clone()))
        .or_else(|| config.install.default_org.clone())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no target org\n\
                 help: Pass `--org <alias>`, set `org:` in the release definition, \
                 or set `install.default_org` in config.toml"
            )
        })
}
