use crate::errors::{AppError, AppResult};
use crate::models::{
    CellValue, Category, NormalizedBranchMetric, ResultBundle, StatusBucket, Table, BRANCH_COLUMN,
    PERCENTAGE_COLUMN,
};
use std::collections::BTreeMap;

pub fn bucket_status(value: Option<&str>) -> StatusBucket {
    match value {
        Some(status) if status.to_uppercase() == "OK" => StatusBucket::Ok,
        _ => StatusBucket::NotOk,
    }
}

/// Rewrites the status column to OK / NOT OK labels. The column is matched
/// case-insensitively; a missing column leaves the table to the caller.
pub fn bucket(table: &Table, status_column: &str) -> AppResult<Table> {
    let index = required_column(table, status_column)?;

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if let Some(cell) = row.get_mut(index) {
                let label = cell.to_label();
                *cell = CellValue::Text(bucket_status(label.as_deref()).as_str().to_string());
            }
            row
        })
        .collect();

    Ok(Table::new(table.columns.clone(), rows))
}

/// Bucketed per-branch rows, one per (branch, original status) pair, in table order.
pub fn branch_metrics(table: &Table, category: Category) -> AppResult<Vec<NormalizedBranchMetric>> {
    let bucketed = bucket(table, category.status_column())?;
    let status = required_column(&bucketed, category.status_column())?;
    let branch = required_column(&bucketed, BRANCH_COLUMN)?;
    let percentage = required_column(&bucketed, PERCENTAGE_COLUMN)?;

    Ok(bucketed
        .rows
        .iter()
        .map(|row| NormalizedBranchMetric {
            branch: row
                .get(branch)
                .and_then(CellValue::to_label)
                .unwrap_or_default(),
            bucket: bucket_status(row.get(status).and_then(CellValue::as_text)),
            percentage: row.get(percentage).and_then(CellValue::as_f64).unwrap_or(0.0),
        })
        .collect())
}

fn required_column(table: &Table, name: &str) -> AppResult<usize> {
    table
        .find_column(name)
        .ok_or_else(|| AppError::ColumnNotFound(name.to_string()))
}

/// Sum of the shares per branch. Each branch is expected to total ~100.
pub fn branch_totals(metrics: &[NormalizedBranchMetric]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for metric in metrics {
        *totals.entry(metric.branch.clone()).or_insert(0.0) += metric.percentage;
    }
    totals
}

/// Overall SLA percentage of a category in [0, 100].
///
/// The overall templates return a single row holding a ratio; only the first row is
/// read. An empty or missing table, or a NULL ratio, yields 0.
pub fn percentage(bundle: &ResultBundle, category: Category) -> f64 {
    let Some(table) = bundle.get(category) else {
        return 0.0;
    };
    if table.is_empty() {
        return 0.0;
    }
    let column = table.find_column(PERCENTAGE_COLUMN).unwrap_or(0);
    table
        .cell(0, column)
        .and_then(CellValue::as_f64)
        .map(|ratio| ratio * 100.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::{branch_metrics, branch_totals, bucket, bucket_status, percentage};
    use crate::errors::AppError;
    use crate::models::{CellValue, Category, ResultBundle, StatusBucket, Table};

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    fn branch_table() -> Table {
        Table::new(
            vec!["Nama_Cabang".to_string(), "Status_ACCU".to_string(), "persentase".to_string()],
            vec![
                vec![text("Jakarta"), text("OK"), CellValue::Real(66.67)],
                vec![text("Jakarta"), text("LATE"), CellValue::Real(33.33)],
                vec![text("Medan"), CellValue::Null, CellValue::Real(100.0)],
            ],
        )
    }

    #[test]
    fn bucketing_is_total() {
        for ok in ["ok", "OK", "Ok", "oK"] {
            assert_eq!(bucket_status(Some(ok)), StatusBucket::Ok);
        }
        for not_ok in ["", "PENDING", "OK ", "NOT OK", "okay"] {
            assert_eq!(bucket_status(Some(not_ok)), StatusBucket::NotOk);
        }
        assert_eq!(bucket_status(None), StatusBucket::NotOk);
    }

    #[test]
    fn bucket_matches_column_case_insensitively() {
        let table = bucket(&branch_table(), "Status_Accu").expect("bucket");
        let labels: Vec<_> = table.rows.iter().map(|row| row[1].clone()).collect();
        assert_eq!(labels, vec![text("OK"), text("NOT OK"), text("NOT OK")]);
        assert_eq!(table.columns, branch_table().columns);
    }

    #[test]
    fn missing_column_is_reported() {
        let err = bucket(&branch_table(), "Status_Ban").expect_err("column missing");
        assert!(matches!(err, AppError::ColumnNotFound(ref name) if name == "Status_Ban"));
    }

    #[test]
    fn branch_metrics_keep_one_row_per_status() {
        let metrics = branch_metrics(&branch_table(), Category::Accu).expect("metrics");
        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[0].branch, "Jakarta");
        assert_eq!(metrics[0].bucket, StatusBucket::Ok);
        assert_eq!(metrics[2].bucket, StatusBucket::NotOk);

        let totals = branch_totals(&metrics);
        assert!((totals["Jakarta"] - 100.0).abs() < 0.05);
        assert!((totals["Medan"] - 100.0).abs() < 0.05);
    }

    #[test]
    fn percentage_defaults_to_zero() {
        let bundle = ResultBundle::new();
        assert_eq!(percentage(&bundle, Category::Accu), 0.0);

        let mut bundle = ResultBundle::new();
        let null_ratio = Table::new(vec!["persentase".to_string()], vec![vec![CellValue::Null]]);
        bundle.insert(Category::Pb, null_ratio);
        assert_eq!(percentage(&bundle, Category::Pb), 0.0);
    }

    #[test]
    fn percentage_scales_first_row_ratio() {
        let mut bundle = ResultBundle::new();
        bundle.insert(
            Category::Ban,
            Table::new(vec!["PERSENTASE".to_string()], vec![vec![CellValue::Real(0.875)]]),
        );
        assert!((percentage(&bundle, Category::Ban) - 87.5).abs() < 1e-9);
    }
}
