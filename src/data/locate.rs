use std::path::{Path, PathBuf};

use super::model::Table;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Column detection rules
// ---------------------------------------------------------------------------

/// How to find one logical column in a table whose header names vary.
///
/// Exact aliases are tried in order (first alias present wins); if none is
/// present, the first column satisfying `fallback` is taken.
pub struct ColumnRule {
    pub role: &'static str,
    pub aliases: &'static [&'static str],
    pub fallback: fn(&str) -> bool,
}

impl ColumnRule {
    /// Return the detected column name, if any.
    pub fn detect<'t>(&self, columns: &'t [String]) -> Option<&'t str> {
        self.aliases
            .iter()
            .find_map(|alias| columns.iter().find(|c| c.as_str() == *alias))
            .or_else(|| columns.iter().find(|c| (self.fallback)(c.as_str())))
            .map(String::as_str)
    }
}

pub const MATERIAL_ID: ColumnRule = ColumnRule {
    role: "Material ID",
    aliases: &[
        "Material-ID",
        "Material_ID",
        "material-id",
        "material_id",
        "materialid",
        "MaterialID",
        "Material Id",
    ],
    fallback: mentions_material_id,
};

// NOTE: the substring fallback also matches unrelated names such as
// "CIF_reference_note".
pub const CIF_AVAILABLE: ColumnRule = ColumnRule {
    role: "CIF availability",
    aliases: &["cif_available", "cif available", "cif", "has_cif", "cif_available?"],
    fallback: mentions_cif,
};

fn mentions_material_id(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("material") && lower.contains("id")
}

fn mentions_cif(name: &str) -> bool {
    name.to_lowercase().contains("cif")
}

// ---------------------------------------------------------------------------
// Eligible materials
// ---------------------------------------------------------------------------

/// Which rows of the composition table have a viewable structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureIndex {
    pub id_column: Option<String>,
    pub availability_column: Option<String>,
    /// Identifiers whose availability flag is "yes", in row order.
    pub materials: Vec<String>,
}

impl StructureIndex {
    pub fn from_table(table: &Table) -> Self {
        let id_column = MATERIAL_ID.detect(&table.columns).map(str::to_string);
        let availability_column = CIF_AVAILABLE.detect(&table.columns).map(str::to_string);

        log::debug!(
            "detected id column {id_column:?}, availability column {availability_column:?}"
        );

        let materials = match &id_column {
            Some(id_col) => eligible_materials(table, id_col, availability_column.as_deref()),
            None => Vec::new(),
        };

        StructureIndex {
            id_column,
            availability_column,
            materials,
        }
    }

    /// The warning to show when the identifier column could not be found.
    pub fn detection_error(&self) -> Option<DashboardError> {
        self.id_column
            .is_none()
            .then_some(DashboardError::ColumnNotDetected {
                role: MATERIAL_ID.role,
            })
    }
}

/// Per-row flag: does the availability cell normalise to `"yes"`?
///
/// Without an availability column every row is `false`.
pub fn availability_mask(table: &Table, availability_column: Option<&str>) -> Vec<bool> {
    match availability_column.and_then(|col| table.column(col)) {
        Some(cells) => cells
            .map(|v| v.to_text().trim().to_lowercase() == "yes")
            .collect(),
        None => vec![false; table.len()],
    }
}

/// Identifier values (as text) of the rows flagged available.
/// Row order and duplicates are preserved.
pub fn eligible_materials(
    table: &Table,
    id_column: &str,
    availability_column: Option<&str>,
) -> Vec<String> {
    let Some(ids) = table.column(id_column) else {
        return Vec::new();
    };
    ids.zip(availability_mask(table, availability_column))
        .filter(|(_, available)| *available)
        .map(|(id, _)| id.to_text())
        .collect()
}

// ---------------------------------------------------------------------------
// Path resolution
// ---------------------------------------------------------------------------

/// Find the structure file for `material` under `base_dir`.
///
/// Tries `<material>.<ext>` first, then the same name with every space
/// replaced by an underscore. Reports the primary path when neither exists.
pub fn resolve_structure_path(
    base_dir: &Path,
    material: &str,
    extension: &str,
) -> Result<PathBuf, DashboardError> {
    let primary = base_dir.join(format!("{material}.{extension}"));
    if primary.is_file() {
        return Ok(primary);
    }

    let alternate = base_dir.join(format!("{}.{extension}", material.replace(' ', "_")));
    if alternate.is_file() {
        log::debug!("using underscore variant {}", alternate.display());
        return Ok(alternate);
    }

    Err(DashboardError::MissingFile { path: primary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
        Table::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    #[test]
    fn test_every_id_alias_is_detected() {
        for alias in MATERIAL_ID.aliases {
            let columns = vec!["Formula".to_string(), alias.to_string(), "Tc".to_string()];
            assert_eq!(MATERIAL_ID.detect(&columns), Some(*alias), "alias {alias}");
        }
    }

    #[test]
    fn test_id_fallback_is_case_insensitive_substring() {
        let columns = vec!["Tc".to_string(), "MATERIAL ID (text mined)".to_string()];
        assert_eq!(
            MATERIAL_ID.detect(&columns),
            Some("MATERIAL ID (text mined)")
        );
    }

    #[test]
    fn test_alias_order_beats_column_order() {
        let columns = vec!["material_id".to_string(), "Material-ID".to_string()];
        assert_eq!(MATERIAL_ID.detect(&columns), Some("Material-ID"));
    }

    #[test]
    fn test_numeric_ids_with_gaps_use_float_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.csv");
        std::fs::write(&path, "Material-ID,cif_available\n7,yes\n,no\n12,yes\n").unwrap();
        let t = crate::data::loader::load_table(&path).unwrap();

        let index = StructureIndex::from_table(&t);
        assert_eq!(index.materials, vec!["7.0", "12.0"]);
    }

    #[test]
    fn test_no_id_column_yields_warning_only() {
        let t = table(&["Formula", "Tc"], vec![vec![text("YBCO"), CellValue::Float(92.0)]]);
        let index = StructureIndex::from_table(&t);
        assert_eq!(index.id_column, None);
        assert!(index.materials.is_empty());
        let err = index.detection_error().unwrap();
        assert!(matches!(err, DashboardError::ColumnNotDetected { .. }));
        assert_eq!(err.level(), crate::error::BannerLevel::Warning);
    }

    #[test]
    fn test_availability_normalisation() {
        let t = table(
            &["Material-ID", "cif_available"],
            vec![
                vec![text("A"), text("Yes")],
                vec![text("B"), text(" yes ")],
                vec![text("C"), text("YES")],
                vec![text("D"), text("no")],
                vec![text("E"), CellValue::Null],
            ],
        );
        let index = StructureIndex::from_table(&t);
        assert_eq!(index.availability_column.as_deref(), Some("cif_available"));
        assert_eq!(index.materials, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_no_availability_column_is_fail_safe() {
        let t = table(
            &["Material-ID", "Tc"],
            vec![vec![text("A"), CellValue::Float(1.0)]],
        );
        assert_eq!(availability_mask(&t, None), vec![false]);
        let index = StructureIndex::from_table(&t);
        assert_eq!(index.id_column.as_deref(), Some("Material-ID"));
        assert!(index.materials.is_empty());
        assert!(index.detection_error().is_none());
    }

    #[test]
    fn test_duplicates_and_order_preserved() {
        let t = table(
            &["MaterialID", "Has CIF file"],
            vec![
                vec![CellValue::Integer(7), text("yes")],
                vec![CellValue::Integer(3), text("yes")],
                vec![CellValue::Integer(7), text("yes")],
            ],
        );
        let index = StructureIndex::from_table(&t);
        assert_eq!(index.availability_column.as_deref(), Some("Has CIF file"));
        assert_eq!(index.materials, vec!["7", "3", "7"]);
    }

    #[test]
    fn test_resolve_prefers_underscore_variant_when_only_it_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Mat_1.cif"), "data_x\n").unwrap();

        let path = resolve_structure_path(dir.path(), "Mat 1", "cif").unwrap();
        assert_eq!(path, dir.path().join("Mat_1.cif"));
    }

    #[test]
    fn test_resolve_prefers_literal_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Mat 1.cif"), "data_x\n").unwrap();
        std::fs::write(dir.path().join("Mat_1.cif"), "data_x\n").unwrap();

        let path = resolve_structure_path(dir.path(), "Mat 1", "cif").unwrap();
        assert_eq!(path, dir.path().join("Mat 1.cif"));
    }

    #[test]
    fn test_resolve_not_found_reports_primary_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_structure_path(dir.path(), "Mat 2", "cif").unwrap_err();
        match err {
            DashboardError::MissingFile { path } => {
                assert_eq!(path, dir.path().join("Mat 2.cif"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
