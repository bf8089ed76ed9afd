use crate::models::{GroupKey, VolunteerGroup};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingDelete {
    pub group: GroupKey,
    pub record_id: String,
    pub unit: String,
    pub hours: f64,
    pub in_flight: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub groups: Vec<VolunteerGroup>,
    pub expanded: BTreeSet<GroupKey>,
    pub status: LoadStatus,
    pub pending_delete: Option<PendingDelete>,
    pub notice: Option<String>,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            expanded: BTreeSet::new(),
            status: LoadStatus::Idle,
            pending_delete: None,
            notice: None,
        }
    }
}

impl DashboardView {
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn begin_load(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        self.status = LoadStatus::Loading;
        true
    }

    pub fn finish_load(&mut self, groups: Vec<VolunteerGroup>) {
        self.groups = groups;
        self.expanded.clear();
        self.status = LoadStatus::Loaded;
        self.notice = None;
    }

    pub fn fail_load(&mut self, message: String) {
        self.groups.clear();
        self.expanded.clear();
        self.status = LoadStatus::Failed(message);
    }

    pub fn is_expanded(&self, key: &GroupKey) -> bool {
        self.expanded.contains(key)
    }

    pub fn toggle_expand(&mut self, key: &GroupKey) {
        if !self.expanded.remove(key) {
            self.expanded.insert(key.clone());
        }
    }

    pub fn expand(&mut self, key: &GroupKey) {
        if self.groups.iter().any(|group| &group.key() == key) {
            self.expanded.insert(key.clone());
        }
    }

    pub fn group(&self, key: &GroupKey) -> Option<&VolunteerGroup> {
        self.groups.iter().find(|group| &group.key() == key)
    }

    pub fn request_delete(&mut self, key: &GroupKey, record_id: &str) -> bool {
        if self.pending_delete.as_ref().is_some_and(|pending| pending.in_flight) {
            return false;
        }
        let Some(record) = self
            .group(key)
            .and_then(|group| group.records.iter().find(|record| record.id == record_id))
        else {
            return false;
        };
        self.pending_delete = Some(PendingDelete {
            group: key.clone(),
            record_id: record.id.clone(),
            unit: record.unit.clone(),
            hours: record.hours,
            in_flight: false,
        });
        true
    }

    /// Marks the pending delete as confirmed and hands it out, once.
    pub fn confirm_delete(&mut self) -> Option<PendingDelete> {
        let pending = self.pending_delete.as_mut()?;
        if pending.in_flight {
            return None;
        }
        pending.in_flight = true;
        Some(pending.clone())
    }

    pub fn cancel_delete(&mut self) {
        if self
            .pending_delete
            .as_ref()
            .is_some_and(|pending| !pending.in_flight)
        {
            self.pending_delete = None;
        }
    }

    pub fn finish_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceRecord;

    fn group(name: &str, chapter: &str, ids: &[&str]) -> VolunteerGroup {
        let records: Vec<ServiceRecord> = ids
            .iter()
            .map(|id| ServiceRecord {
                id: id.to_string(),
                volunteer_name: name.to_string(),
                chapter_id: chapter.to_string(),
                registrar: "知林法師".into(),
                hours: 2.0,
                unit: "茶席".into(),
                remarks: None,
                created_at: None,
            })
            .collect();
        VolunteerGroup {
            representative_id: ids.last().unwrap().to_string(),
            name: name.into(),
            chapter: chapter.into(),
            total_hours: 2.0 * records.len() as f64,
            records,
        }
    }

    fn loaded() -> DashboardView {
        let mut view = DashboardView::default();
        assert!(view.begin_load());
        view.finish_load(vec![group("王小明", "宜一", &["101", "102"])]);
        view
    }

    #[test]
    fn groups_start_collapsed_and_toggle() {
        let mut view = loaded();
        let key = GroupKey::new("王小明", "宜一");
        assert!(!view.is_expanded(&key));
        view.toggle_expand(&key);
        assert!(view.is_expanded(&key));
        view.toggle_expand(&key);
        assert!(!view.is_expanded(&key));
    }

    #[test]
    fn second_load_is_refused_while_one_runs() {
        let mut view = DashboardView::default();
        assert!(view.begin_load());
        assert!(!view.begin_load());
        view.fail_load("boom".into());
        assert_eq!(view.status, LoadStatus::Failed("boom".into()));
        assert!(view.groups.is_empty());
        assert!(view.begin_load());
    }

    #[test]
    fn delete_waits_for_confirmation() {
        let mut view = loaded();
        let key = GroupKey::new("王小明", "宜一");

        assert!(view.confirm_delete().is_none());
        assert!(view.request_delete(&key, "102"));
        view.cancel_delete();
        assert!(view.pending_delete.is_none());

        assert!(view.request_delete(&key, "102"));
        let pending = view.confirm_delete().expect("confirmed");
        assert_eq!(pending.record_id, "102");
        assert!(view.confirm_delete().is_none(), "confirmation is handed out once");
        view.cancel_delete();
        assert!(view.pending_delete.is_some(), "in-flight delete cannot be cancelled");
    }

    #[test]
    fn delete_of_unknown_record_is_ignored() {
        let mut view = loaded();
        assert!(!view.request_delete(&GroupKey::new("王小明", "蘭二"), "101"));
        assert!(!view.request_delete(&GroupKey::new("王小明", "宜一"), "999"));
        assert!(view.pending_delete.is_none());
    }
}
