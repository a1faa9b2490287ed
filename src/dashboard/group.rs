use super::{Control, WidgetSlot};
use crate::config::GroupSpec;
use crate::storage::{ToggleState, ToggleStore};
use crate::widget::RefreshJob;

/// Side effects of a top-down group change.
#[derive(Debug, Default)]
pub struct GroupCascade {
    /// Refresh jobs from members that were shown
    pub jobs: Vec<RefreshJob>,
    /// Slot indices of members this cascade turned off
    pub turned_off: Vec<usize>,
}

/// Binds one checkbox to a set of member widget toggles.
///
/// Coupling is asymmetric. Checking the group checks every member, and any
/// member turning off unchecks the group, but members turning on never
/// re-check it. Both directions are explicit calls made by the dashboard, and
/// neither calls back into the other, so every cascade ends after one pass
/// over the members.
#[derive(Debug, Clone)]
pub struct GroupController {
    id: String,
    name: String,
    label: String,
    members: Vec<usize>,
    control: Control,
}

impl GroupController {
    /// Build the controller for `spec` over already-attached member slots.
    ///
    /// The control starts checked only when the group was persisted `On` and
    /// every member is currently on. Nothing is written at startup. A group
    /// without members is disabled and never touches the store.
    pub async fn attach(
        spec: &GroupSpec,
        members: Vec<usize>,
        slots: &[WidgetSlot],
        store: &ToggleStore,
    ) -> Self {
        let label = format!("{} ({})", spec.name, members.len());

        let control = if members.is_empty() {
            tracing::debug!(group = %spec.id, "Group has no members, disabling");
            Control {
                checked: false,
                enabled: false,
            }
        } else {
            let persisted = store.get(&spec.id).await;
            let all_on = members
                .iter()
                .all(|&m| slots.get(m).is_some_and(|slot| slot.toggle.is_checked()));
            Control {
                checked: persisted.is_on() && all_on,
                enabled: true,
            }
        };

        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            label,
            members,
            control,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label with the member count fixed at construction.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.members.contains(&slot)
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn is_checked(&self) -> bool {
        self.control.checked
    }

    pub fn is_enabled(&self) -> bool {
        self.control.enabled
    }

    /// Top-down: persist the group's state, then force every differing
    /// member to match and drive its transition.
    pub async fn apply_group_state(
        &mut self,
        on: bool,
        slots: &mut [WidgetSlot],
        store: &ToggleStore,
    ) -> GroupCascade {
        let mut cascade = GroupCascade::default();
        if !self.control.enabled {
            return cascade;
        }
        let mut changed = 0usize;

        self.control.checked = on;
        store.set(&self.id, ToggleState::from_checked(on)).await;

        for &member in &self.members {
            let Some(slot) = slots.get_mut(member) else {
                continue;
            };
            if slot.toggle.is_checked() == on {
                continue;
            }

            let WidgetSlot { widget, toggle } = slot;
            if let Some(job) = toggle.set_checked(on, widget.as_mut(), store).await {
                cascade.jobs.push(job);
            }
            changed += 1;
            if !on {
                cascade.turned_off.push(member);
            }
        }

        tracing::debug!(
            group = %self.id,
            on,
            changed,
            "Applied group state"
        );
        cascade
    }

    /// Bottom-up: a member turned off, so the group shows and stores `Off`.
    ///
    /// Never touches other members.
    pub async fn apply_member_off_signal(&mut self, store: &ToggleStore) {
        if !self.control.enabled {
            return;
        }
        self.control.checked = false;
        store.set(&self.id, ToggleState::Off).await;
        tracing::debug!(group = %self.id, "Member turned off, group unchecked");
    }
}
