//! Diagnostic dump of everything the registry loaded.

use std::io::{self, Write};

use strum::IntoEnumIterator;

use crate::category::Category;
use crate::registry::Registry;

/// Writes a human-readable listing per package: every loaded object's
/// natural key per category, then every archive and its entry names.
pub fn write_dump(registry: &Registry, out: &mut dyn Write) -> io::Result<()> {
    for package in registry.packages() {
        writeln!(out, "Package: {}", package.id())?;

        for category in Category::iter().filter(|c| !c.is_abstract()) {
            let objects = package.objects_of(category);
            if objects.is_empty() {
                continue;
            }
            writeln!(out, "  Category: {category}")?;
            for asset in &objects {
                let key = registry
                    .manager_for(category)
                    .and_then(|m| m.object_identity(asset))
                    .unwrap_or_else(|| "<unkeyed>".to_string());
                writeln!(out, "    {key}")?;
            }
        }

        for archive in package.archives().iter() {
            writeln!(out, "  Archive: {}", archive.name())?;
            for name in archive.asset_names() {
                writeln!(out, "    {name}")?;
            }
        }
    }
    Ok(())
}
