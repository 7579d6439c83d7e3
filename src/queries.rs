use crate::errors::{AppError, AppResult};
use crate::filter::CompiledPredicate;
use crate::models::{BundleKind, Category, BRANCH_COLUMN, PERCENTAGE_COLUMN};
use std::collections::BTreeMap;

pub const DEFAULT_TABLE: &str = "SLA_HMS";
pub const FILTER_PLACEHOLDER: &str = "{branch_filter}";

/// Fixed restriction of the clutch category: automatic transmissions have no clutch.
pub const MANUAL_TRANSMISSION_ONLY: &str = "tipe_transmisi <> 'A/T'";

const DETAIL_COLUMNS: &[&str] = &[
    "Nomor_Customer",
    "Nama_Customer",
    "Nama_Cabang",
    "Nomor_Equipment",
    "Nomor_Polisi",
    "Kelompok_Model",
    "kategori_unit",
    "Tipe_Transmisi",
    "km_harian",
    "Last_KM_Update",
    "Last_KM_ACCU",
    "Last_Tgl_Release_ACCU_SPK",
    "Konsumsi_ACCU",
    "Indikator_ACCU",
    "Status_ACCU",
    "Tgl_Plan_Pergantian_ACCU",
    "Last_KM_Kopling",
    "Last_Tgl_Release_Kopling_SPK",
    "Konsumsi_Kopling",
    "Indikator_Kopling",
    "Status_Kopling",
    "Tgl_Plan_Pergantian_Kopling",
    "Last_KM_Ban",
    "Last_Tgl_Release_Ban_SPK",
    "Konsumsi_Ban",
    "Indikator_Ban",
    "Status_Ban",
    "Last_KM_PB",
    "Tgl_Last_Service_PB",
    "Selisih_KM_Service",
    "Status_PB",
    "Next_Plan_KM_Service",
    "Tanggal_Plan_Service",
];

pub type QueryBundle = BTreeMap<Category, String>;

/// SQL templates for one warehouse table. Each template carries a single
/// `{branch_filter}` placeholder that receives a compiled predicate.
///
/// Aggregate templates return exactly one row per query (overall) or one row per
/// (branch, status) pair (by branch). Percentage derivation relies on the former.
#[derive(Debug, Clone)]
pub struct QuerySet {
    table: String,
}

impl QuerySet {
    pub fn new(table: &str) -> AppResult<Self> {
        if !is_identifier(table) {
            return Err(AppError::Config(format!("invalid warehouse table name: {:?}", table)));
        }
        Ok(Self {
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn overall_template(&self, category: Category) -> String {
        format!(
            "SELECT ROUND((SUM(CASE WHEN {status} = 'OK' THEN 1 END) * 1.0 / COUNT(*)), 3) \
             AS {pct} FROM {table} WHERE {base} {placeholder}",
            status = category.status_column(),
            pct = PERCENTAGE_COLUMN,
            table = self.table,
            base = base_restriction(category),
            placeholder = FILTER_PLACEHOLDER,
        )
    }

    pub fn by_branch_template(&self, category: Category) -> String {
        format!(
            "SELECT {branch}, {status}, \
             ROUND((COUNT(*) * 1.0 / SUM(COUNT(*)) OVER (PARTITION BY {branch})) * 100, 2) \
             AS {pct} FROM {table} WHERE {base} {placeholder} \
             GROUP BY {branch}, {status}",
            branch = BRANCH_COLUMN,
            status = category.status_column(),
            pct = PERCENTAGE_COLUMN,
            table = self.table,
            base = base_restriction(category),
            placeholder = FILTER_PLACEHOLDER,
        )
    }

    pub fn detail_template(&self) -> String {
        format!(
            "SELECT {} FROM {} WHERE 1=1 {}",
            DETAIL_COLUMNS.join(", "),
            self.table,
            FILTER_PLACEHOLDER
        )
    }

    pub fn distinct_branches(&self) -> String {
        format!("SELECT DISTINCT {} FROM {}", BRANCH_COLUMN, self.table)
    }

    /// Builds the per-category SQL of an aggregate bundle with the predicate substituted.
    pub fn build(&self, kind: BundleKind, predicate: &CompiledPredicate) -> QueryBundle {
        let template: fn(&Self, Category) -> String = match kind {
            BundleKind::Overall => Self::overall_template,
            BundleKind::ByBranch => Self::by_branch_template,
        };
        Category::ALL
            .into_iter()
            .map(|category| (category, substitute(&template(self, category), predicate)))
            .collect()
    }

    pub fn build_detail(&self, predicate: &CompiledPredicate) -> String {
        substitute(&self.detail_template(), predicate)
    }
}

impl Default for QuerySet {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

pub fn substitute(template: &str, predicate: &CompiledPredicate) -> String {
    template.replace(FILTER_PLACEHOLDER, predicate.sql())
}

fn base_restriction(category: Category) -> &'static str {
    match category {
        Category::Kopling => MANUAL_TRANSMISSION_ONLY,
        _ => "1=1",
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::{QuerySet, FILTER_PLACEHOLDER, MANUAL_TRANSMISSION_ONLY};
    use crate::filter::{compile, FilterSelection};
    use crate::models::{BundleKind, Category};

    #[test]
    fn clutch_queries_always_exclude_automatics() {
        let queries = QuerySet::default();
        for selection in [FilterSelection::all(), FilterSelection::new(["Jakarta", "Medan"])] {
            let predicate = compile(&selection);
            for kind in [BundleKind::Overall, BundleKind::ByBranch] {
                let bundle = queries.build(kind, &predicate);
                assert!(bundle[&Category::Kopling].contains(MANUAL_TRANSMISSION_ONLY));
                assert!(!bundle[&Category::Accu].contains(MANUAL_TRANSMISSION_ONLY));
            }
        }
    }

    #[test]
    fn predicate_is_substituted_into_every_category() {
        let queries = QuerySet::default();
        let predicate = compile(&FilterSelection::new(["Jakarta"]));
        let bundle = queries.build(BundleKind::ByBranch, &predicate);
        assert_eq!(bundle.len(), 4);
        for sql in bundle.values() {
            assert!(sql.contains("AND Nama_Cabang IN ('Jakarta')"));
            assert!(!sql.contains(FILTER_PLACEHOLDER));
            assert!(sql.contains("PARTITION BY Nama_Cabang"));
        }
    }

    #[test]
    fn unrestricted_predicate_leaves_no_placeholder() {
        let queries = QuerySet::default();
        let predicate = compile(&FilterSelection::default());
        let sql = queries.build_detail(&predicate);
        assert!(sql.ends_with("WHERE 1=1 "));
        assert!(sql.contains("Tanggal_Plan_Service"));
    }

    #[test]
    fn templates_target_the_configured_table() {
        let queries = QuerySet::new("dw.SLA_HMS").expect("valid table");
        assert_eq!(queries.table(), "dw.SLA_HMS");
        let bundle = queries.build(BundleKind::ByBranch, &compile(&FilterSelection::all()));
        assert!(bundle.values().all(|sql| sql.contains("FROM dw.SLA_HMS WHERE")));
        assert!(queries.distinct_branches().ends_with("FROM dw.SLA_HMS"));
    }

    #[test]
    fn table_name_must_be_identifier() {
        assert!(QuerySet::new("dw.SLA_HMS").is_ok());
        assert!(QuerySet::new("SLA_HMS; DROP TABLE x").is_err());
        assert!(QuerySet::new("").is_err());
    }
}
