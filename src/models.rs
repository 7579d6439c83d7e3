use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column holding the branch name in every warehouse query.
pub const BRANCH_COLUMN: &str = "Nama_Cabang";
/// Column holding the ratio (overall) or share (per branch) in aggregate queries.
pub const PERCENTAGE_COLUMN: &str = "persentase";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Accu,
    Kopling,
    Pb,
    Ban,
}

impl Category {
    pub const ALL: [Category; 4] = [Self::Accu, Self::Kopling, Self::Pb, Self::Ban];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accu => "accu",
            Self::Kopling => "kopling",
            Self::Pb => "pb",
            Self::Ban => "ban",
        }
    }

    pub fn status_column(self) -> &'static str {
        match self {
            Self::Accu => "Status_ACCU",
            Self::Kopling => "Status_Kopling",
            Self::Pb => "Status_PB",
            Self::Ban => "Status_Ban",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Accu => "ACCU",
            Self::Kopling => "Kopling",
            Self::Pb => "PB",
            Self::Ban => "Ban",
        }
    }
}

/// Aggregate bundles. The detail table is not a bundle and is cached on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleKind {
    Overall,
    ByBranch,
}

impl BundleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overall => "overall",
            Self::ByBranch => "by-branch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Null => None,
            Self::Integer(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            Self::Text(value) => value.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Text form used for labels; `None` only for SQL NULL.
    pub fn to_label(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(value) => Some(value.to_string()),
            Self::Real(value) => Some(value.to_string()),
            Self::Text(value) => Some(value.clone()),
        }
    }
}

/// Tabular query result. Rows always have `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Case-insensitive column lookup.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|cells| cells.get(column))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    Connectivity,
    QueryFailed,
    EmptyResult,
    ColumnNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardWarning {
    pub kind: WarningKind,
    pub category: Option<Category>,
    pub message: String,
}

/// One table per category, plus the warnings raised while fetching them.
/// Every category is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultBundle {
    tables: BTreeMap<Category, Table>,
    warnings: Vec<DashboardWarning>,
}

impl ResultBundle {
    pub fn new() -> Self {
        Self {
            tables: Category::ALL
                .into_iter()
                .map(|category| (category, Table::empty()))
                .collect(),
            warnings: Vec::new(),
        }
    }

    pub fn insert(&mut self, category: Category, table: Table) {
        self.tables.insert(category, table);
    }

    pub fn get(&self, category: Category) -> Option<&Table> {
        self.tables.get(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &Table)> {
        self.tables.iter().map(|(category, table)| (*category, table))
    }

    pub fn push_warning(&mut self, warning: DashboardWarning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[DashboardWarning] {
        &self.warnings
    }
}

impl Default for ResultBundle {
    fn default() -> Self {
        Self::new()
    }
}

/// Detail rows of one filter, with the warnings raised while fetching them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailResult {
    pub table: Table,
    pub warnings: Vec<DashboardWarning>,
}

impl DetailResult {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusBucket {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NOT OK")]
    NotOk,
}

impl StatusBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotOk => "NOT OK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBranchMetric {
    pub branch: String,
    pub bucket: StatusBucket,
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::{CellValue, Category, ResultBundle, Table};

    #[test]
    fn new_bundle_holds_an_empty_table_per_category() {
        let bundle = ResultBundle::new();
        for category in Category::ALL {
            assert!(bundle.get(category).is_some_and(Table::is_empty));
        }
        assert!(bundle.warnings().is_empty());
    }

    #[test]
    fn column_lookup_ignores_case() {
        let table = Table::new(
            vec!["Nama_Cabang".to_string(), "Status_ACCU".to_string()],
            Vec::new(),
        );
        assert_eq!(table.find_column("status_accu"), Some(1));
        assert_eq!(table.find_column("Status_Accu"), Some(1));
        assert_eq!(table.find_column("Status_Ban"), None);
    }

    #[test]
    fn cell_values_convert_to_numbers() {
        assert_eq!(CellValue::Real(0.6).as_f64(), Some(0.6));
        assert_eq!(CellValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(CellValue::Text(" 0.25 ".to_string()).as_f64(), Some(0.25));
        assert_eq!(CellValue::Null.as_f64(), None);
    }
}
