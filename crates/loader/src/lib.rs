//! Runtime loader for declarative content packages.
//!
//! A package is a directory of JSON content documents plus binary asset
//! archives, registered under a case-insensitive id. This crate wires the
//! packages, the per-category content managers, and the four-checkpoint
//! startup lifecycle into a single explicit [`Registry`] the embedding host
//! drives. Package content merges into the host's native caches in place,
//! so handles the host already holds observe overrides without relookup.
//!
//! Modules are organized by responsibility:
//! - [`registry`] hosts the context object everything hangs off
//! - [`package`] and [`archive`] hold per-package content and blob stores
//! - [`manager`] owns per-category identity, caching, and duplicate policy
//! - [`phase`] is the ordered lifecycle state machine
//! - [`category`] is the static content taxonomy
//! - [`document`] parses and cross-links declarative documents

pub mod archive;
pub mod category;
pub mod dump;
pub mod error;
pub mod manager;
pub mod package;
pub mod phase;
pub mod registry;

mod document;

pub use archive::Archive;
pub use category::Category;
pub use dump::write_dump;
pub use error::{LoaderError, Result};
pub use manager::{
    Cache, ConditionCacheAdapter, ConditionManager, ContentManager, ItemCacheAdapter, ItemManager,
    OwnedCache, ShopkeepManager, SkillCacheAdapter, SkillManager,
};
pub use package::{MANIFEST_FILE, Package, PackageManifest, PhaseCallback};
pub use phase::{LoadPhase, PhaseObserver, StateMachine};
pub use registry::Registry;
