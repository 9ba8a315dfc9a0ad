use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell in a table column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a dataframe reader
/// would infer for a CSV column.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Coerce the value to text the way a dataframe `astype(str)` does:
    /// missing values become `"nan"`, integral floats keep one decimal and
    /// booleans are capitalised.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) if v.is_nan() => "nan".to_string(),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => format!("{v:.1}"),
            CellValue::Float(v) => v.to_string(),
            CellValue::Bool(true) => "True".to_string(),
            CellValue::Bool(false) => "False".to_string(),
            CellValue::Null => "nan".to_string(),
        }
    }

    /// Text shown in a table cell. Missing values render empty.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Whether the value is numeric (right-aligned in tables).
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }
}

// ---------------------------------------------------------------------------
// Table – an ordered, column-named grid of cells
// ---------------------------------------------------------------------------

/// A loaded tabular file: ordered columns and ordered rows.
///
/// Every row holds exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Table { columns, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of a column, top to bottom. `None` if the column is unknown.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &CellValue> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text_matches_dataframe_coercion() {
        assert_eq!(CellValue::String("YBCO".into()).to_text(), "YBCO");
        assert_eq!(CellValue::Integer(42).to_text(), "42");
        assert_eq!(CellValue::Float(1.0).to_text(), "1.0");
        assert_eq!(CellValue::Float(92.5).to_text(), "92.5");
        assert_eq!(CellValue::Bool(true).to_text(), "True");
        assert_eq!(CellValue::Null.to_text(), "nan");
    }

    #[test]
    fn test_display_text_hides_null() {
        assert_eq!(CellValue::Null.display_text(), "");
        assert_eq!(CellValue::Integer(3).display_text(), "3");
    }

    #[test]
    fn test_column_access() {
        let table = Table::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![CellValue::Integer(1), CellValue::String("x".into())],
                vec![CellValue::Integer(2), CellValue::Null],
            ],
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_index("b"), Some(1));
        let b: Vec<_> = table.column("b").unwrap().cloned().collect();
        assert_eq!(b, vec![CellValue::String("x".into()), CellValue::Null]);
        assert!(table.column("c").is_none());
    }
}
