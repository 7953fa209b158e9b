use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use host_model::HostCatalog;
use loadstone::{LoadPhase, Registry, write_dump};

/// Load every package in a directory and dump the loaded content
#[derive(Parser)]
pub struct Dump {
    /// Directory containing package directories
    dir: PathBuf,

    /// Host version to load against
    #[arg(long, default_value = "0.0.0")]
    host_version: String,
}

impl Dump {
    pub fn execute(self) -> Result<()> {
        let registry = load_all(&self.dir, &self.host_version)?;
        let mut stdout = std::io::stdout().lock();
        write_dump(&registry, &mut stdout).context("writing dump")?;
        Ok(())
    }
}

/// List discoverable packages and their manifests
#[derive(Parser)]
pub struct Packages {
    /// Directory containing package directories
    dir: PathBuf,
}

impl Packages {
    pub fn execute(self) -> Result<()> {
        let registry = Registry::new(Rc::new(HostCatalog::default()));
        let packages = registry.discover_packages(&self.dir);
        if packages.is_empty() {
            bail!("no packages found under {}", self.dir.display());
        }
        for package in packages {
            match package.manifest() {
                Some(manifest) => {
                    let name = if manifest.name.is_empty() {
                        package.id()
                    } else {
                        &manifest.name
                    };
                    println!(
                        "{}  {}  {}  ({} archives)",
                        package.id(),
                        name,
                        manifest.version,
                        package.archives().len()
                    );
                }
                None => println!("{}  ({} archives)", package.id(), package.archives().len()),
            }
        }
        Ok(())
    }
}

/// Discovers and loads every package under `dir` against a fresh catalog,
/// running the full startup sequence.
fn load_all(dir: &PathBuf, host_version: &str) -> Result<Registry> {
    let registry = Registry::new(Rc::new(HostCatalog::new(host_version)));
    let packages = registry.discover_packages(dir);
    if packages.is_empty() {
        bail!("no packages found under {}", dir.display());
    }

    for phase in [
        LoadPhase::PreCacheInit,
        LoadPhase::PostCacheInit,
        LoadPhase::PreLibraryInit,
        LoadPhase::PostLibraryInit,
    ] {
        registry.advance_phase(phase)?;
    }
    Ok(registry)
}
