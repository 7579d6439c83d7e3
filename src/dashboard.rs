use crate::db::DataSource;
use crate::errors::{AppError, AppResult};
use crate::filter::{self, FilterSelection};
use crate::models::{
    BundleKind, Category, DashboardWarning, DetailResult, ResultBundle, Table, WarningKind,
    BRANCH_COLUMN,
};
use crate::normalize;
use crate::presentation::{
    BarChartSpec, DashboardView, GaugeSpec, Presenter, BAR_CHART_ORDER, GAUGE_ORDER,
};
use crate::queries::{QueryBundle, QuerySet};
use crate::session::{format_refresh_time, DashboardSession};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;

/// Drives one session: compiles the filter, serves bundles from the session cache,
/// fetches on a miss, and prepares the view for the presentation layer.
pub struct SlaDashboard {
    source: Box<dyn DataSource>,
    queries: QuerySet,
    session: DashboardSession,
    notice: Option<String>,
}

impl SlaDashboard {
    pub fn new(source: Box<dyn DataSource>, queries: QuerySet, session: DashboardSession) -> Self {
        Self {
            source,
            queries,
            session,
            notice: None,
        }
    }

    /// Drops every cached result of the session. The next render fetches again.
    pub fn refresh(&mut self) -> DateTime<Local> {
        let refreshed = self.session.cache_mut().invalidate_all();
        self.notice = Some(format!("Data refreshed at {}", format_refresh_time(refreshed)));
        tracing::info!(session_id = %self.session.session_id(), "dashboard refreshed");
        refreshed
    }

    /// Distinct branches for the filter, sentinel first. Not cached.
    pub fn branch_options(&self, warnings: &mut Vec<DashboardWarning>) -> Vec<String> {
        let sql = self.queries.distinct_branches();
        match self.source.fetch(&sql) {
            Ok(table) => {
                let column = table.find_column(BRANCH_COLUMN).unwrap_or(0);
                filter::branch_options(
                    table
                        .rows
                        .iter()
                        .filter_map(|row| row.get(column).and_then(|cell| cell.to_label())),
                )
            }
            Err(err) => {
                tracing::warn!(error = %err, "branch list unavailable");
                warnings.push(fetch_warning(None, &err));
                filter::branch_options(Vec::<String>::new())
            }
        }
    }

    /// One render pass. Warnings recorded while fetching are cached with the results,
    /// so a cached render reports them again.
    pub fn render(&mut self, selection: &FilterSelection) -> DashboardView {
        let mut warnings = Vec::new();
        let branch_options = self.branch_options(&mut warnings);
        let predicate = filter::compile(selection);
        tracing::info!(
            session_id = %self.session.session_id(),
            session_started_at = %self.session.started_at(),
            predicate = %predicate.cache_key(),
            "rendering dashboard"
        );

        let overall_sql = self.queries.build(BundleKind::Overall, &predicate);
        let by_branch_sql = self.queries.build(BundleKind::ByBranch, &predicate);
        let detail_sql = self.queries.build_detail(&predicate);

        let source: &dyn DataSource = &*self.source;
        let cache = self.session.cache_mut();
        let overall = cache.get_or_fetch(BundleKind::Overall, &predicate, || {
            fetch_bundle(source, &overall_sql)
        });
        let by_branch = cache.get_or_fetch(BundleKind::ByBranch, &predicate, || {
            fetch_bundle(source, &by_branch_sql)
        });
        let detail = cache.get_or_fetch_detail(&predicate, || fetch_detail(source, &detail_sql));
        let stats = cache.stats();
        tracing::debug!(
            hits = stats.hits,
            misses = stats.misses,
            entries = stats.entries,
            "result cache state"
        );

        warnings.extend(overall.warnings().iter().cloned());
        warnings.extend(by_branch.warnings().iter().cloned());
        warnings.extend(detail.warnings.iter().cloned());

        let percentages: BTreeMap<Category, f64> = Category::ALL
            .into_iter()
            .map(|category| (category, normalize::percentage(&overall, category)))
            .collect();
        let gauges: Vec<GaugeSpec> = GAUGE_ORDER
            .into_iter()
            .map(|category| GaugeSpec::new(category, percentages[&category]))
            .collect();
        let bar_charts: Vec<BarChartSpec> = BAR_CHART_ORDER
            .into_iter()
            .map(|category| bar_chart(&by_branch, category, &mut warnings))
            .collect();

        DashboardView {
            session_id: self.session.session_id().to_string(),
            last_refreshed: self.session.last_refreshed_display(),
            branch_options,
            selected_branches: selection.branches().to_vec(),
            percentages,
            gauges,
            bar_charts,
            detail: detail.table.clone(),
            warnings,
            notice: self.notice.take(),
        }
    }

    pub fn render_to(
        &mut self,
        selection: &FilterSelection,
        presenter: &mut dyn Presenter,
    ) -> AppResult<()> {
        let view = self.render(selection);
        presenter.present(&view)
    }
}

/// Runs each category query in turn. A failing query leaves that category empty and
/// does not stop the others.
fn fetch_bundle(source: &dyn DataSource, queries: &QueryBundle) -> ResultBundle {
    let mut bundle = ResultBundle::new();
    for (category, sql) in queries {
        match source.fetch(sql) {
            Ok(table) => {
                if table.is_empty() {
                    bundle.push_warning(DashboardWarning {
                        kind: WarningKind::EmptyResult,
                        category: Some(*category),
                        message: format!("No data for query {}", category.as_str()),
                    });
                }
                bundle.insert(*category, table);
            }
            Err(err) => {
                tracing::warn!(category = category.as_str(), error = %err, "category query failed");
                bundle.push_warning(fetch_warning(Some(*category), &err));
                bundle.insert(*category, Table::empty());
            }
        }
    }
    bundle
}

fn fetch_detail(source: &dyn DataSource, sql: &str) -> DetailResult {
    match source.fetch(sql) {
        Ok(table) => DetailResult::new(table),
        Err(err) => {
            tracing::warn!(error = %err, "detail query failed");
            DetailResult {
                table: Table::empty(),
                warnings: vec![fetch_warning(None, &err)],
            }
        }
    }
}

fn bar_chart(
    bundle: &ResultBundle,
    category: Category,
    warnings: &mut Vec<DashboardWarning>,
) -> BarChartSpec {
    let Some(table) = bundle.get(category).filter(|table| !table.columns.is_empty()) else {
        return BarChartSpec::new(category, None, Vec::new());
    };

    match normalize::branch_metrics(table, category) {
        Ok(rows) => {
            let color_column = table
                .find_column(category.status_column())
                .map(|index| table.columns[index].clone());
            BarChartSpec::new(category, color_column, rows)
        }
        Err(err) => {
            tracing::warn!(
                category = category.as_str(),
                error = %err,
                "per-branch table left unbucketed"
            );
            warnings.push(DashboardWarning {
                kind: WarningKind::ColumnNotFound,
                category: Some(category),
                message: err.to_string(),
            });
            BarChartSpec::fallback(category, table.clone())
        }
    }
}

fn fetch_warning(category: Option<Category>, err: &AppError) -> DashboardWarning {
    let kind = match err {
        AppError::Connectivity(_) => WarningKind::Connectivity,
        _ => WarningKind::QueryFailed,
    };
    DashboardWarning {
        kind,
        category,
        message: err.to_string(),
    }
}
