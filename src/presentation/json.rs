use super::{DashboardView, Presenter};
use crate::errors::AppResult;
use std::io::Write;

/// Writes each view as one JSON document.
pub struct JsonPresenter<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn present(&mut self, view: &DashboardView) -> AppResult<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, view)?;
        } else {
            serde_json::to_writer(&mut self.writer, view)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::JsonPresenter;
    use crate::models::{Category, Table};
    use crate::presentation::{DashboardView, GaugeSpec, Presenter};
    use std::collections::BTreeMap;

    #[test]
    fn writes_view_as_json_line() {
        let view = DashboardView {
            session_id: "s-1".to_string(),
            last_refreshed: "01-01-2025 08:00:00".to_string(),
            branch_options: vec!["All".to_string()],
            selected_branches: vec!["All".to_string()],
            percentages: BTreeMap::from([(Category::Accu, 60.0)]),
            gauges: vec![GaugeSpec::new(Category::Accu, 60.0)],
            bar_charts: Vec::new(),
            detail: Table::empty(),
            warnings: Vec::new(),
            notice: None,
        };

        let mut presenter = JsonPresenter::new(Vec::new(), false);
        presenter.present(&view).expect("present");
        let output = String::from_utf8(presenter.into_inner()).expect("utf8");

        assert!(output.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(output.trim()).expect("json");
        assert_eq!(parsed["sessionId"], "s-1");
        assert_eq!(parsed["percentages"]["accu"], 60.0);
        assert_eq!(parsed["gauges"][0]["band"], "orange");
    }
}
