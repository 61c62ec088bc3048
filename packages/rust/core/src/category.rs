//! Persona category label → catalog id resolution.
//!
//! Labels map to catalog names through a fixed table; catalog names map to ids
//! through the external catalog. Every table entry must resolve to exactly one
//! catalog entry, which [`CategoryResolver::validate`] checks at startup.

use std::collections::HashMap;

use articlesmith_shared::{ArticleSmithError, CatalogEntry, CategoryId, Result};

/// Persona category label → catalog category name.
pub const CATEGORY_TABLE: &[(&str, &str)] = &[
    ("現役施設介護士", "お仕事の相談"),
    ("在宅介護中の家族", "在宅介護の悩み"),
    ("介護職への転職希望者", "転職・キャリア"),
    ("介護福祉士受験生", "資格・スキルアップ"),
    ("ケアマネジャー", "制度・サービス"),
];

/// Resolves persona category labels against the catalog.
#[derive(Debug, Clone)]
pub struct CategoryResolver {
    table: &'static [(&'static str, &'static str)],
    /// Catalog name → every id carrying that name.
    catalog: HashMap<String, Vec<u32>>,
}

impl CategoryResolver {
    pub fn new(entries: &[CatalogEntry]) -> Self {
        Self::with_table(CATEGORY_TABLE, entries)
    }

    pub fn with_table(
        table: &'static [(&'static str, &'static str)],
        entries: &[CatalogEntry],
    ) -> Self {
        let mut catalog: HashMap<String, Vec<u32>> = HashMap::new();
        for entry in entries {
            catalog.entry(entry.name.clone()).or_default().push(entry.id);
        }
        Self { table, catalog }
    }

    /// Every label in the table, in table order.
    pub fn labels(&self) -> Vec<&'static str> {
        self.table.iter().map(|(label, _)| *label).collect()
    }

    /// Resolve a persona category label to its catalog id.
    pub fn resolve(&self, label: &str) -> Result<u32> {
        let label = label.trim();
        let name = self
            .table
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, name)| *name)
            .ok_or_else(|| ArticleSmithError::UnknownCategory {
                label: label.to_string(),
                valid: self.labels().into_iter().map(String::from).collect(),
            })?;

        match self.catalog.get(name).map(Vec::as_slice) {
            Some([id]) => Ok(*id),
            Some(ids) if ids.len() > 1 => Err(ArticleSmithError::config(format!(
                "category '{name}' (for label '{label}') appears {} times in the catalog",
                ids.len()
            ))),
            _ => Err(ArticleSmithError::config(format!(
                "category '{name}' (for label '{label}') is not in the catalog"
            ))),
        }
    }

    /// Turn a `Label` into an `Id`; ids pass through unchanged.
    pub fn resolve_category(&self, category: &CategoryId) -> Result<CategoryId> {
        match category {
            CategoryId::Id(id) => Ok(CategoryId::Id(*id)),
            CategoryId::Label(label) => self.resolve(label).map(CategoryId::Id),
        }
    }

    /// Check that every table label resolves to exactly one catalog entry.
    pub fn validate(&self) -> Result<()> {
        for (label, _) in self.table {
            self.resolve(label)?;
        }
        Ok(())
    }
}
