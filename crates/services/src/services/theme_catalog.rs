//! Fixed tables the theme selector draws from.

use std::path::Path;

use db::models::theme::{Density, FontPair, Palette};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static BUILTIN: Lazy<ThemeCatalog> = Lazy::new(ThemeCatalog::default);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog table `{0}` is empty")]
    EmptyTable(&'static str),
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeCatalog {
    pub palettes: Vec<Palette>,
    pub font_pairs: Vec<FontPair>,
    pub densities: Vec<Density>,
    pub max_widths: Vec<String>,
    pub border_radii: Vec<String>,
    pub card_shadows: Vec<String>,
}

impl ThemeCatalog {
    pub fn builtin() -> &'static ThemeCatalog {
        &BUILTIN
    }

    /// Load a replacement catalog; every table must be non-empty.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let catalog: ThemeCatalog = serde_json::from_str(&raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let tables = [
            ("palettes", self.palettes.is_empty()),
            ("font_pairs", self.font_pairs.is_empty()),
            ("densities", self.densities.is_empty()),
            ("max_widths", self.max_widths.is_empty()),
            ("border_radii", self.border_radii.is_empty()),
            ("card_shadows", self.card_shadows.is_empty()),
        ];
        match tables.into_iter().find(|(_, empty)| *empty) {
            Some((name, _)) => Err(CatalogError::EmptyTable(name)),
            None => Ok(()),
        }
    }
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self {
            palettes: vec![
                Palette::new("#1d4ed8", "#0ea5e9", "#f8fafc", "#0f172a"),
                Palette::new("#166534", "#65a30d", "#f7fdf4", "#14251a"),
                Palette::new("#c2410c", "#f59e0b", "#fffbf5", "#2b1a10"),
                Palette::new("#7e22ce", "#db2777", "#fdf8ff", "#2a1235"),
                Palette::new("#334155", "#64748b", "#f1f5f9", "#0b1220"),
                Palette::new("#0f766e", "#14b8a6", "#f0fdfa", "#122826"),
                Palette::new("#b91c1c", "#f43f5e", "#fff7f7", "#2a0f12"),
                Palette::new("#6366f1", "#22d3ee", "#0b1020", "#e2e8f0"),
            ],
            font_pairs: vec![
                FontPair::new("Playfair Display", "Inter"),
                FontPair::new("Merriweather", "Open Sans"),
                FontPair::new("Montserrat", "Lato"),
                FontPair::new("Poppins", "Roboto"),
                FontPair::new("Lora", "Source Sans 3"),
                FontPair::new("Space Grotesk", "IBM Plex Sans"),
                FontPair::new("DM Serif Display", "DM Sans"),
                FontPair::new("Oswald", "Work Sans"),
            ],
            densities: vec![Density::Cozy, Density::Balanced, Density::Airy],
            max_widths: ["680px", "760px", "860px", "960px"]
                .map(String::from)
                .to_vec(),
            border_radii: ["4px", "8px", "12px", "18px"].map(String::from).to_vec(),
            card_shadows: [
                "none",
                "0 1px 3px rgba(15, 23, 42, 0.12)",
                "0 10px 30px rgba(15, 23, 42, 0.15)",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_builtin_table_sizes() {
        let catalog = ThemeCatalog::builtin();
        assert_eq!(catalog.palettes.len(), 8);
        assert_eq!(catalog.font_pairs.len(), 8);
        assert_eq!(catalog.densities.len(), 3);
        assert_eq!(catalog.max_widths.len(), 4);
        assert_eq!(catalog.border_radii.len(), 4);
        assert_eq!(catalog.card_shadows.len(), 3);
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_validate_names_first_empty_table() {
        let catalog = ThemeCatalog {
            border_radii: vec![],
            ..ThemeCatalog::default()
        };
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::EmptyTable("border_radii"))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let catalog = ThemeCatalog {
            palettes: vec![Palette::new("#000000", "#111111", "#ffffff", "#222222")],
            ..ThemeCatalog::default()
        };
        file.write_all(serde_json::to_string(&catalog).unwrap().as_bytes())
            .unwrap();

        let loaded = ThemeCatalog::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn test_from_json_file_rejects_empty_tables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let catalog = ThemeCatalog {
            font_pairs: vec![],
            ..ThemeCatalog::default()
        };
        file.write_all(serde_json::to_string(&catalog).unwrap().as_bytes())
            .unwrap();

        assert!(matches!(
            ThemeCatalog::from_json_file(file.path()),
            Err(CatalogError::EmptyTable("font_pairs"))
        ));
    }
}
