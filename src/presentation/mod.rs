pub mod json;

use crate::errors::AppResult;
use crate::models::{Category, NormalizedBranchMetric, Table, BRANCH_COLUMN, PERCENTAGE_COLUMN};
pub use crate::models::{DashboardWarning, WarningKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Gauges are laid out in this order.
pub const GAUGE_ORDER: [Category; 4] =
    [Category::Accu, Category::Kopling, Category::Pb, Category::Ban];
/// Per-branch bar charts are laid out in this order.
pub const BAR_CHART_ORDER: [Category; 4] =
    [Category::Accu, Category::Ban, Category::Kopling, Category::Pb];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GaugeBand {
    Red,
    Orange,
    Green,
}

impl GaugeBand {
    pub fn for_value(value: f64) -> Self {
        if value < 50.0 {
            Self::Red
        } else if value < 80.0 {
            Self::Orange
        } else {
            Self::Green
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeSpec {
    pub category: Category,
    pub title: String,
    pub value: f64,
    pub suffix: &'static str,
    pub range: (f64, f64),
    pub band: GaugeBand,
}

impl GaugeSpec {
    pub fn new(category: Category, value: f64) -> Self {
        let value = value.clamp(0.0, 100.0);
        Self {
            category,
            title: format!("SLA Percentage {}", category.display_name()),
            value,
            suffix: "%",
            range: (0.0, 100.0),
            band: GaugeBand::for_value(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChartSpec {
    pub category: Category,
    pub title: String,
    pub x_column: &'static str,
    pub y_column: &'static str,
    pub color_column: Option<String>,
    pub stacked: bool,
    pub colors: BTreeMap<&'static str, &'static str>,
    pub rows: Vec<NormalizedBranchMetric>,
    /// Unmodified per-branch table, kept when the status column could not be bucketed.
    pub raw: Option<Table>,
}

impl BarChartSpec {
    pub fn new(
        category: Category,
        color_column: Option<String>,
        rows: Vec<NormalizedBranchMetric>,
    ) -> Self {
        Self {
            category,
            title: format!("SLA Achievement {} by Branch", category.display_name()),
            x_column: BRANCH_COLUMN,
            y_column: PERCENTAGE_COLUMN,
            color_column,
            stacked: true,
            colors: BTreeMap::from([("OK", "lightgreen"), ("NOT OK", "red")]),
            rows: sort_by_branch_total(rows),
            raw: None,
        }
    }

    pub fn fallback(category: Category, raw: Table) -> Self {
        let mut spec = Self::new(category, None, Vec::new());
        spec.raw = Some(raw);
        spec
    }
}

/// Everything the presentation layer needs for one render pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub session_id: String,
    pub last_refreshed: String,
    pub branch_options: Vec<String>,
    pub selected_branches: Vec<String>,
    pub percentages: BTreeMap<Category, f64>,
    pub gauges: Vec<GaugeSpec>,
    pub bar_charts: Vec<BarChartSpec>,
    pub detail: Table,
    pub warnings: Vec<DashboardWarning>,
    pub notice: Option<String>,
}

pub trait Presenter {
    fn present(&mut self, view: &DashboardView) -> AppResult<()>;
}

// Bars with the largest branch total come first; ties keep table order.
fn sort_by_branch_total(rows: Vec<NormalizedBranchMetric>) -> Vec<NormalizedBranchMetric> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for row in &rows {
        *totals.entry(row.branch.clone()).or_insert(0.0) += row.percentage;
    }
    let mut rows = rows;
    rows.sort_by(|a, b| {
        let total_a = totals.get(&a.branch).copied().unwrap_or(0.0);
        let total_b = totals.get(&b.branch).copied().unwrap_or(0.0);
        total_b
            .partial_cmp(&total_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.branch.cmp(&b.branch))
    });
    rows
}
