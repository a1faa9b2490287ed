use chrono::Local;

use super::{Clock, PanelContent, RefreshJob, RefreshOutcome, Widget, WidgetCore};
use crate::util::resolve_url_template;

/// Embedded interactive report map.
///
/// Nothing is cached. The frame URL is resolved again on every show, so a
/// dashboard left open past midnight picks up the new report day.
pub struct InteractiveMap {
    core: WidgetCore,
    template: String,
    date_offset_hours: i64,
    clock: Clock,
}

impl InteractiveMap {
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
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

impl Widget for InteractiveMap {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn begin_refresh(&mut self) -> Option<RefreshJob> {
        self.core.initialized = true;
        None
    }

    fn apply_outcome(&mut self, outcome: RefreshOutcome) -> bool {
        tracing::warn!(widget = %self.core.id, ?outcome, "Unexpected refresh outcome for map widget");
        true
    }

    fn populate(&mut self) {
        let url = resolve_url_template(&self.template, &(self.clock)(), self.date_offset_hours);
        self.core.panel.content = PanelContent::Frame { url };
    }
}
