//! Predefined channels exposed through the named-channel endpoints.
//!
//! The catalogue is plain data handed to the aggregator at construction. A
//! TOML file can replace the built-in list:
//!
//! ```toml
//! [[channel]]
//! slug = "fireship"
//! id = "UCsBjURrPoezykLs9EqgamOA"
//! name = "Fireship"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub slug: String,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelCatalogue {
    entries: Vec<CatalogueEntry>,
}

#[derive(Deserialize)]
struct CatalogueFile {
    #[serde(default, rename = "channel")]
    channels: Vec<CatalogueEntry>,
}

impl ChannelCatalogue {
    /// Builds a catalogue, rejecting blank fields and duplicate slugs.
    pub fn new(entries: Vec<CatalogueEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.slug.trim().is_empty() || entry.id.trim().is_empty() {
                bail!("catalogue entries need a slug and an id: {entry:?}");
            }
            if !seen.insert(entry.slug.to_ascii_lowercase()) {
                bail!("duplicate catalogue slug {}", entry.slug);
            }
        }
        Ok(Self { entries })
    }

    pub fn builtin() -> Self {
        let entries = [
            ("fireship", "UCsBjURrPoezykLs9EqgamOA", "Fireship"),
            ("golang", "UC_BzFbxG2za3bp5NRRRXJSw", "The Go Programming Language"),
            ("traversy", "UC29ju8bIPH5as8OGnQzwJyA", "Traversy Media"),
            ("freecodecamp", "UC8butISFwT-Wl7EV0hUK0BQ", "freeCodeCamp.org"),
        ]
        .into_iter()
        .map(|(slug, id, name)| CatalogueEntry {
            slug: slug.to_string(),
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect();
        Self { entries }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogueFile = toml::from_str(content).context("parsing channel catalogue")?;
        Self::new(file.channels)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading channel catalogue {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("loading {}", path.display()))
    }

    /// Case-insensitive lookup by slug.
    pub fn get(&self, slug: &str) -> Option<&CatalogueEntry> {
        self.entries
            .iter()
            .find(|entry| entry.slug.eq_ignore_ascii_case(slug))
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builtin_catalogue_is_valid() {
        let builtin = ChannelCatalogue::builtin();
        let rebuilt = ChannelCatalogue::new(builtin.entries().to_vec()).unwrap();
        assert_eq!(builtin, rebuilt);
        assert!(builtin.get("Fireship").is_some());
    }

    #[test]
    fn loads_channels_from_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            "[[channel]]\nslug = \"go\"\nid = \"UC1\"\nname = \"Go\"\n\n[[channel]]\nslug = \"rust\"\nid = \"UC2\"\nname = \"Rust\"\n"
        )?;

        let catalogue = ChannelCatalogue::load(file.path())?;
        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue.get("rust").map(|entry| entry.id.as_str()), Some("UC2"));
        assert!(catalogue.get("python").is_none());
        Ok(())
    }

    #[test]
    fn empty_file_gives_empty_catalogue() -> Result<()> {
        assert!(ChannelCatalogue::from_toml("")?.is_empty());
        Ok(())
    }

    #[test]
    fn duplicate_slugs_are_rejected() {
        let toml = "[[channel]]\nslug = \"go\"\nid = \"UC1\"\nname = \"Go\"\n[[channel]]\nslug = \"GO\"\nid = \"UC2\"\nname = \"Go again\"\n";
        assert!(ChannelCatalogue::from_toml(toml).is_err());
    }

    #[test]
    fn blank_ids_are_rejected() {
        let toml = "[[channel]]\nslug = \"go\"\nid = \"  \"\nname = \"Go\"\n";
        assert!(ChannelCatalogue::from_toml(toml).is_err());
    }
}
