use chrono::Local;

use super::{Clock, PanelContent, RefreshJob, RefreshOutcome, Widget, WidgetCore, FAILED_TO_LOAD};
use crate::util::resolve_url_template;

/// A single storm-report image.
///
/// Refresh is local: it resolves the URL template once and marks the widget
/// initialized. Every later show renders that same URL.
pub struct StaticImage {
    core: WidgetCore,
    template: String,
    date_offset_hours: i64,
    clock: Clock,
    url: Option<String>,
}

impl StaticImage {
    pub fn new(
        id: impl Into<String>,
        heading: impl Into<String>,
        template: &str,
        date_offset_hours: i64,
    ) -> Self {
        Self {
            core: WidgetCore::new(id, heading),
            template: template.to_string(),
            date_offset_hours,
            clock: Local::now,
            url: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl Widget for StaticImage {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn begin_refresh(&mut self) -> Option<RefreshJob> {
        self.url = Some(resolve_url_template(
            &self.template,
            &(self.clock)(),
            self.date_offset_hours,
        ));
        self.core.initialized = true;
        None
    }

    fn apply_outcome(&mut self, outcome: RefreshOutcome) -> bool {
        tracing::warn!(widget = %self.core.id, ?outcome, "Unexpected refresh outcome for image widget");
        self.url.is_some()
    }

    fn populate(&mut self) {
        self.core.panel.content = match &self.url {
            Some(url) => PanelContent::Image { url: url.clone() },
            None => PanelContent::Message(FAILED_TO_LOAD.to_string()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 7, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_show_initializes_synchronously() {
        let mut widget = StaticImage::new(
            "spc-reports",
            "SPC Storm Reports",
            "https://www.spc.noaa.gov/climo/reports/today.gif",
            6,
        );
        assert!(!widget.is_initialized());

        let job = widget.show();
        assert!(job.is_none());
        assert!(widget.is_initialized());
        assert_eq!(
            widget.panel().content,
            PanelContent::Image {
                url: "https://www.spc.noaa.gov/climo/reports/today.gif".to_string()
            }
        );
    }

    #[test]
    fn test_template_resolved_at_refresh() {
        let mut widget = StaticImage::new(
            "img",
            "Image",
            "https://www.spc.noaa.gov/climo/reports/{date}_rpts.gif",
            6,
        )
        .with_clock(fixed_now);

        widget.show();
        assert_eq!(
            widget.url(),
            Some("https://www.spc.noaa.gov/climo/reports/240607_rpts.gif")
        );
    }

    #[test]
    fn test_reshow_after_hide_reuses_url() {
        let mut widget =
            StaticImage::new("img", "Image", "https://example.com/{date}.gif", 0).with_clock(fixed_now);
        widget.show();
        widget.hide();
        assert_eq!(widget.panel().content, PanelContent::Empty);

        widget.show();
        assert_eq!(
            widget.panel().content,
            PanelContent::Image {
                url: "https://example.com/240607.gif".to_string()
            }
        );
    }
}
