use super::{
    PanelContent, RefreshJob, RefreshKind, RefreshOutcome, TitledTable, Widget, WidgetCore,
    FAILED_TO_LOAD,
};
use crate::feed::ReportSet;

/// Storm-report CSV rendered as Tornado, Wind and Hail tables.
///
/// The decoded text is cached raw and parsed at populate time.
pub struct CsvTable {
    core: WidgetCore,
    url: String,
    raw: Option<String>,
}

impl CsvTable {
    pub fn new(id: impl Into<String>, heading: impl Into<String>, url: &str) -> Self {
        Self {
            core: WidgetCore::new(id, heading),
            url: url.to_string(),
            raw: None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl Widget for CsvTable {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn begin_refresh(&mut self) -> Option<RefreshJob> {
        self.core.start_job(&self.url, RefreshKind::Report)
    }

    fn apply_outcome(&mut self, outcome: RefreshOutcome) -> bool {
        match outcome {
            RefreshOutcome::Report(Ok(text)) => {
                tracing::info!(widget = %self.core.id, bytes = text.len(), "Report CSV refreshed");
                self.raw = Some(text);
                true
            }
            RefreshOutcome::Report(Err(e)) => {
                tracing::warn!(widget = %self.core.id, url = %self.url, error = %e, "Report CSV refresh failed");
                self.raw = None;
                false
            }
            other => {
                tracing::warn!(widget = %self.core.id, outcome = ?other, "Unexpected refresh outcome for table widget");
                self.raw = None;
                false
            }
        }
    }

    fn populate(&mut self) {
        self.core.panel.content = match self.raw.as_deref().and_then(ReportSet::parse) {
            Some(set) => PanelContent::Tables(
                set.iter()
                    .map(|(category, table)| TitledTable {
                        title: category.title().to_string(),
                        table: table.clone(),
                    })
                    .collect(),
            ),
            None => PanelContent::Message(FAILED_TO_LOAD.to_string()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::testing::StubSource;
    use base64::Engine;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://www.spc.noaa.gov/climo/reports/today.csv";

    const CSV: &str = "\
Time,F_Scale,Location,County,State,Lat,Lon,Comments
1705,UNK,3 N Dodge City,Ford,KS,37.80,-100.02,Brief tornado (DDC)
Time,Speed,Location,County,State,Lat,Lon,Comments
Time,Size,Location,County,State,Lat,Lon,Comments
1550,175,Hays,Ellis,KS,38.88,-99.33,Golf ball hail (GLD)
";

    async fn shown_with(body: &str) -> CsvTable {
        let source = StubSource::default().with(URL, body);
        let mut widget = CsvTable::new("spc-csv", "SPC Storm Reports Table", URL);
        let job = widget.show().unwrap();
        let completed = job.run(&source).await;
        widget.finish_refresh(completed.outcome);
        widget
    }

    #[tokio::test]
    async fn test_base64_payload_decoded_and_tabulated() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(CSV);
        let widget = shown_with(&encoded).await;

        assert_eq!(widget.raw(), Some(CSV));
        let PanelContent::Tables(tables) = &widget.panel().content else {
            panic!("expected tables, got {:?}", widget.panel().content);
        };
        let titles: Vec<&str> = tables.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Tornado", "Wind", "Hail"]);
        assert_eq!(tables[0].table.rows.len(), 1);
        assert!(tables[1].table.rows.is_empty());
        assert_eq!(tables[2].table.rows[0][2], "Hays");
    }

    #[tokio::test]
    async fn test_plain_payload_used_verbatim() {
        let widget = shown_with(CSV).await;
        assert_eq!(widget.raw(), Some(CSV));
        assert!(matches!(widget.panel().content, PanelContent::Tables(_)));
    }

    #[tokio::test]
    async fn test_empty_payload_renders_failure() {
        let widget = shown_with("").await;
        assert!(widget.is_initialized());
        assert_eq!(
            widget.panel().content,
            PanelContent::Message(FAILED_TO_LOAD.to_string())
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_renders_failure() {
        let source = StubSource::default();
        let mut widget = CsvTable::new("spc-csv", "SPC Storm Reports Table", URL);
        let job = widget.show().unwrap();
        widget.finish_refresh(job.run(&source).await.outcome);

        assert!(!widget.is_initialized());
        assert_eq!(widget.raw(), None);
        assert_eq!(
            widget.panel().content,
            PanelContent::Message(FAILED_TO_LOAD.to_string())
        );
    }
}
