//! The widget registry and its toggle state machine.
//!
//! A [`Dashboard`] owns every widget, the [`ToggleController`] bound to it and
//! the [`GroupController`]s over them, plus the [`ToggleStore`] they persist
//! to. It is built once by [`DashboardBuilder`] and then owned by the UI loop;
//! all toggle changes go through its methods so that group and member state
//! stay consistent.

mod group;
mod toggle;

use crate::config::{Config, GroupSpec};
use crate::feed::TextSource;
use crate::storage::ToggleStore;
use crate::widget::{widgets_from_config, CompletedRefresh, RefreshJob, Widget};

pub use group::{GroupCascade, GroupController};
pub use toggle::ToggleController;

/// A boolean UI control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub checked: bool,
    /// Disabled controls ignore input.
    pub enabled: bool,
}

/// One widget and the toggle bound to it.
pub struct WidgetSlot {
    pub widget: Box<dyn Widget>,
    pub toggle: ToggleController,
}

// ============================================================================
// Dashboard
// ============================================================================

pub struct Dashboard {
    slots: Vec<WidgetSlot>,
    groups: Vec<GroupController>,
    store: ToggleStore,
}

impl Dashboard {
    pub fn slots(&self) -> &[WidgetSlot] {
        &self.slots
    }

    pub fn groups(&self) -> &[GroupController] {
        &self.groups
    }

    pub fn store(&self) -> &ToggleStore {
        &self.store
    }

    pub fn widget(&self, slot: usize) -> Option<&dyn Widget> {
        self.slots.get(slot).map(|s| s.widget.as_ref())
    }

    pub fn slot_index(&self, widget_id: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.widget.id() == widget_id)
    }

    pub fn group_index(&self, group_id: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.id() == group_id)
    }

    /// Set one widget's checkbox.
    ///
    /// Turning a widget off also unchecks every group containing it.
    pub async fn set_widget(&mut self, slot: usize, checked: bool) -> Option<RefreshJob> {
        let Some(WidgetSlot { widget, toggle }) = self.slots.get_mut(slot) else {
            tracing::warn!(slot, "No widget in slot");
            return None;
        };
        if toggle.is_checked() == checked {
            return None;
        }

        let job = toggle
            .set_checked(checked, widget.as_mut(), &self.store)
            .await;

        if !checked {
            self.signal_member_off(slot, None).await;
        }
        job
    }

    pub async fn toggle_widget(&mut self, slot: usize) -> Option<RefreshJob> {
        let checked = self.slots.get(slot)?.toggle.is_checked();
        self.set_widget(slot, !checked).await
    }

    /// Set a group's checkbox and cascade to its members.
    ///
    /// Members forced off signal the other groups they belong to.
    pub async fn set_group(&mut self, group: usize, on: bool) -> Vec<RefreshJob> {
        let Some(controller) = self.groups.get_mut(group) else {
            tracing::warn!(group, "No such group");
            return Vec::new();
        };
        if !controller.is_enabled() {
            tracing::debug!(group = %controller.id(), "Ignoring change to disabled group");
            return Vec::new();
        }

        let cascade = controller
            .apply_group_state(on, &mut self.slots, &self.store)
            .await;

        for slot in cascade.turned_off {
            self.signal_member_off(slot, Some(group)).await;
        }
        cascade.jobs
    }

    pub async fn toggle_group(&mut self, group: usize) -> Vec<RefreshJob> {
        let Some(checked) = self.groups.get(group).map(GroupController::is_checked) else {
            return Vec::new();
        };
        self.set_group(group, !checked).await
    }

    async fn signal_member_off(&mut self, slot: usize, origin: Option<usize>) {
        for (index, group) in self.groups.iter_mut().enumerate() {
            if Some(index) != origin && group.contains(slot) {
                group.apply_member_off_signal(&self.store).await;
            }
        }
    }

    /// Force a re-fetch of one widget.
    ///
    /// Local widgets re-resolve synchronously and re-render if visible.
    pub fn refresh_widget(&mut self, slot: usize) -> Option<RefreshJob> {
        let widget = self.slots.get_mut(slot)?.widget.as_mut();
        let job = widget.begin_refresh();
        if job.is_none() && !widget.is_refreshing() && widget.panel().visible {
            widget.populate();
        }
        job
    }

    /// Apply a finished refresh. Returns false for an unknown widget id.
    pub fn complete_refresh(&mut self, completed: CompletedRefresh) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|s| s.widget.id() == completed.widget_id)
        {
            Some(slot) => {
                slot.widget.finish_refresh(completed.outcome);
                true
            }
            None => {
                tracing::warn!(widget = %completed.widget_id, "Refresh completed for unknown widget");
                false
            }
        }
    }

    /// Clear the in-flight flag of a widget whose refresh task died.
    pub fn abandon_refresh(&mut self, widget_id: &str) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.widget.id() == widget_id) {
            slot.widget.abort_refresh();
        }
    }

    /// Run jobs in order on the current task and apply their results.
    pub async fn run_to_completion(&mut self, jobs: Vec<RefreshJob>, source: &dyn TextSource) {
        for job in jobs {
            let completed = job.run(source).await;
            self.complete_refresh(completed);
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles a [`Dashboard`] with every widget fully constructed up front.
#[derive(Default)]
pub struct DashboardBuilder {
    widgets: Vec<Box<dyn Widget>>,
    groups: Vec<GroupSpec>,
}

impl DashboardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four SPC widgets and the configured groups.
    pub fn from_config(config: &Config) -> Self {
        Self {
            widgets: widgets_from_config(config),
            groups: config.groups.clone(),
        }
    }

    pub fn widget(mut self, widget: impl Widget + 'static) -> Self {
        self.widgets.push(Box::new(widget));
        self
    }

    pub fn group(mut self, spec: GroupSpec) -> Self {
        self.groups.push(spec);
        self
    }

    /// Attach toggles, then groups, restoring persisted state.
    ///
    /// Returns the refresh jobs for widgets that start out shown. Duplicate
    /// widget or group ids are dropped, as are group members naming unknown
    /// widgets.
    pub async fn build(self, store: ToggleStore) -> (Dashboard, Vec<RefreshJob>) {
        let mut slots: Vec<WidgetSlot> = Vec::with_capacity(self.widgets.len());
        let mut jobs = Vec::new();

        for mut widget in self.widgets {
            if slots.iter().any(|s| s.widget.id() == widget.id()) {
                tracing::warn!(widget = %widget.id(), "Duplicate widget id, skipping");
                continue;
            }
            let (toggle, job) = ToggleController::attach(widget.as_mut(), &store).await;
            jobs.extend(job);
            slots.push(WidgetSlot { widget, toggle });
        }

        let mut groups: Vec<GroupController> = Vec::with_capacity(self.groups.len());
        for spec in &self.groups {
            if groups.iter().any(|g| g.id() == spec.id) {
                tracing::warn!(group = %spec.id, "Duplicate group id, skipping");
                continue;
            }

            let mut members: Vec<usize> = Vec::with_capacity(spec.members.len());
            for member_id in &spec.members {
                match slots.iter().position(|s| s.widget.id() == member_id) {
                    Some(index) if !members.contains(&index) => members.push(index),
                    Some(_) => {}
                    None => {
                        tracing::warn!(group = %spec.id, member = %member_id, "Unknown group member, ignoring")
                    }
                }
            }

            groups.push(GroupController::attach(spec, members, &slots, &store).await);
        }

        tracing::info!(
            widgets = slots.len(),
            groups = groups.len(),
            pending_refreshes = jobs.len(),
            "Dashboard ready"
        );

        (
            Dashboard {
                slots,
                groups,
                store,
            },
            jobs,
        )
    }
}
