//! Load manifest management
//!
//! The load manifest is stored as `manifest/loader.yml` and describes the
//! tenants, the access-control table and the columns each destination table
//! accepts.
//!
//! Example format:
//! ```yaml
//! tenant_column: confinamento_id
//! access:
//!   table: user_confinamentos
//!   tenant_column: confinamento_id
//!   principal_column: user_id
//! tenants:
//!   - id: confinamento_teste
//!     key: 00000000-0000-0000-0000-000000000001
//! tables:
//!   - name: fato_trato
//!     columns: [data, curral, realizado_kg, unique_key, confinamento_id]
//! ```

use crate::client::AccessTable;
use crate::transform::ColumnAllowList;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Tenant entry mapping a human slug to the key stored in records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TenantEntry {
    /// Slug used on the command line and for log directories
    pub id: String,
    /// Tenant key written into the tenant column
    pub key: String,
}

impl TenantEntry {
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
        }
    }
}

/// Destination table with its accepted columns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableEntry {
    pub name: String,
    pub columns: Vec<String>,
}

impl TableEntry {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

fn default_tenant_column() -> String {
    "confinamento_id".to_string()
}

/// Load manifest structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadManifest {
    /// Column holding the tenant key in every destination table
    #[serde(default = "default_tenant_column")]
    pub tenant_column: String,
    #[serde(default)]
    pub access: AccessTable,
    #[serde(default)]
    pub tenants: Vec<TenantEntry>,
    /// Tables with a column allow-list; tables not listed keep all columns
    #[serde(default)]
    pub tables: Vec<TableEntry>,
}

impl Default for LoadManifest {
    fn default() -> Self {
        Self {
            tenant_column: default_tenant_column(),
            access: AccessTable::default(),
            tenants: Vec::new(),
            tables: Vec::new(),
        }
    }
}

impl LoadManifest {
    /// Manifest with the feedlot fact tables and their known columns
    pub fn builtin() -> Self {
        Self {
            tables: vec![
                TableEntry::new(
                    "fato_resumo",
                    &[
                        "id_curral",
                        "curral",
                        "setor",
                        "lote",
                        "data",
                        "qtd_animais",
                        "dias_confinamento",
                        "data_entrada",
                        "leitura_cocho",
                        "ajuste_kg",
                        "leitura_noturna",
                        "sexo",
                        "grupo_genetico",
                        "peso_entrada_kg",
                        "peso_medio_estimado_kg",
                        "cms_previsto_kg",
                        "cms_realizado_kg",
                        "cmn_previsto_kg",
                        "cmn_realizado_kg",
                        "ms_dieta_meta_pc",
                        "ms_dieta_real_pc",
                        "cms_real_pc_pv",
                        "area_m2",
                        "area_cocho_m",
                        "m2_cab",
                        "cocho_cab_m",
                        "unique_key",
                        "confinamento_id",
                        "gmd_padrao",
                        "peso_estimado_corrigido",
                        "eficiencia_cms",
                        "status_lote",
                    ],
                ),
                TableEntry::new(
                    "fato_trato",
                    &[
                        "data",
                        "hora_trato",
                        "trato",
                        "id_trato",
                        "curral",
                        "setor",
                        "dieta",
                        "tipo_dieta",
                        "ingrediente",
                        "tipo_ingrediente",
                        "previsto_kg",
                        "realizado_kg",
                        "desvio_kg",
                        "desvio_pc",
                        "desvio_abs_pc",
                        "status",
                        "categoria_desvio",
                        "id_curral",
                        "unique_key",
                        "confinamento_id",
                    ],
                ),
                TableEntry::new(
                    "fato_carregamento",
                    &[
                        "data",
                        "hora_carregamento",
                        "carregamento",
                        "id_carregamento",
                        "pazeiro",
                        "vagao",
                        "dieta",
                        "tipo_dieta",
                        "ingrediente",
                        "tipo_ingrediente",
                        "previsto_kg",
                        "realizado_kg",
                        "desvio_kg",
                        "desvio_pc",
                        "desvio_abs_pc",
                        "status",
                        "categoria_desvio",
                        "id_curral",
                        "unique_key",
                        "confinamento_id",
                    ],
                ),
            ],
            ..Self::default()
        }
    }

    /// Read the manifest at `path`, or the built-in one if it does not exist
    pub fn read_or_builtin(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            log::debug!("Loading manifest from {}", path.display());
            Self::read(path)
        } else {
            log::debug!(
                "No manifest at {}, using built-in table definitions",
                path.display()
            );
            Ok(Self::builtin())
        }
    }

    /// Read manifest from YAML file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read load manifest: {}", path.as_ref().display())
        })?;

        let manifest: Self = serde_yaml::from_str(&content)
            .with_context(|| "Failed to parse load manifest YAML")?;

        Ok(manifest)
    }

    /// Write manifest to YAML file
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .with_context(|| "Failed to serialize load manifest to YAML")?;

        std::fs::write(path.as_ref(), yaml).with_context(|| {
            format!("Failed to write load manifest: {}", path.as_ref().display())
        })?;

        Ok(())
    }

    /// Resolve a tenant slug (or a literal tenant UUID) to its tenant key.
    ///
    /// Unknown slugs are an error rather than falling back to some default
    /// tenant.
    pub fn resolve_tenant(&self, tenant: &str) -> Result<String> {
        if let Some(entry) = self.tenants.iter().find(|t| t.id == tenant) {
            return Ok(entry.key.clone());
        }

        if let Ok(uuid) = Uuid::parse_str(tenant) {
            return Ok(uuid.hyphenated().to_string());
        }

        Err(eyre!(
            "Tenant '{}' not found in manifest and is not a UUID. Known tenants: {}",
            tenant,
            self.tenants
                .iter()
                .map(|t| t.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    /// Column allow-list built from the table entries
    pub fn column_allow_list(&self) -> ColumnAllowList {
        ColumnAllowList::from_tables(
            self.tables
                .iter()
                .map(|t| (t.name.clone(), t.columns.clone())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_or_builtin_missing() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = LoadManifest::read_or_builtin(temp_dir.path().join("loader.yml")).unwrap();
        assert_eq!(manifest.tables.len(), 3);
        assert_eq!(manifest.tenant_column, "confinamento_id");
        assert_eq!(manifest.access, AccessTable::default());
    }

    #[test]
    fn test_write_read_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest/loader.yml");

        let mut manifest = LoadManifest::default();
        manifest.tenants.push(TenantEntry::new(
            "confinamento_teste",
            "00000000-0000-0000-0000-000000000001",
        ));
        manifest.tables.push(TableEntry::new("t1", &["unique_key", "v"]));
        manifest.write(&path).unwrap();

        let read = LoadManifest::read(&path).unwrap();
        assert_eq!(read, manifest);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let manifest: LoadManifest =
            serde_yaml::from_str("tenants:\n  - id: a\n    key: k\n").unwrap();
        assert_eq!(manifest.tenant_column, "confinamento_id");
        assert_eq!(manifest.access.table, "user_confinamentos");
        assert!(manifest.tables.is_empty());
    }

    #[test]
    fn test_resolve_tenant() {
        let mut manifest = LoadManifest::default();
        manifest
            .tenants
            .push(TenantEntry::new("ganadera_7_montes", "tenant-key-7"));

        assert_eq!(
            manifest.resolve_tenant("ganadera_7_montes").unwrap(),
            "tenant-key-7"
        );
        assert_eq!(
            manifest
                .resolve_tenant("6D3C8BBB-1E1C-4FDE-A2E7-744C552C95D8")
                .unwrap(),
            "6d3c8bbb-1e1c-4fde-a2e7-744c552c95d8"
        );

        let err = manifest.resolve_tenant("unknown").unwrap_err();
        assert!(err.to_string().contains("ganadera_7_montes"));
    }

    #[test]
    fn test_column_allow_list() {
        let allow = LoadManifest::builtin().column_allow_list();
        assert!(allow.has_table("fato_trato"));
        assert!(!allow.has_table("other"));
    }
}
