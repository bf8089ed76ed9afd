use crate::models::{GroupKey, ServiceRecord, VolunteerGroup};
use chrono::{DateTime, Utc};
use icu_collator::{Collator, CollatorOptions};
use icu_locid::Locale;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::warn;

/// Groups flat records by `(volunteer, chapter)`, sums their hours and
/// orders the groups by name using the collation rules of `locale`.
///
/// Records keep their input order inside a group. The representative id is
/// that of the newest record; on equal timestamps the later record wins.
pub fn aggregate(records: &[ServiceRecord], locale: &Locale) -> Vec<VolunteerGroup> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<VolunteerGroup> = Vec::new();
    // newest created_at per group slot
    let mut newest: Vec<Option<DateTime<Utc>>> = Vec::new();

    for record in records {
        let key = GroupKey::new(record.volunteer_name.clone(), record.chapter_id.clone());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(VolunteerGroup {
                representative_id: record.id.clone(),
                name: record.volunteer_name.clone(),
                chapter: record.chapter_id.clone(),
                records: Vec::new(),
                total_hours: 0.0,
            });
            newest.push(None);
            groups.len() - 1
        });

        let group = &mut groups[slot];
        if group.records.is_empty() || record.created_at >= newest[slot] {
            group.representative_id = record.id.clone();
            newest[slot] = newest[slot].max(record.created_at);
        }
        group.total_hours += record.hours;
        group.records.push(record.clone());
    }

    let compare = name_comparator(locale);
    // stable: equal names keep first-seen order, chapter breaks remaining ties
    groups.sort_by(|a, b| compare(&a.name, &b.name).then_with(|| a.chapter.cmp(&b.chapter)));
    groups
}

fn name_comparator(locale: &Locale) -> Box<dyn Fn(&str, &str) -> Ordering> {
    match Collator::try_new(&locale.into(), CollatorOptions::new()) {
        Ok(collator) => Box::new(move |a: &str, b: &str| collator.compare(a, b)),
        Err(err) => {
            warn!(%locale, "collator unavailable, falling back to code point order: {err}");
            Box::new(|a: &str, b: &str| a.cmp(b))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::TimeZone;

    fn record(id: &str, name: &str, chapter: &str, hours: f64, day: u32) -> ServiceRecord {
        ServiceRecord {
            id: id.to_string(),
            volunteer_name: name.to_string(),
            chapter_id: chapter.to_string(),
            registrar: "知林法師".to_string(),
            hours,
            unit: "服務台".to_string(),
            remarks: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).single(),
        }
    }

    fn zh_tw() -> Locale {
        "zh-TW".parse().unwrap()
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(aggregate(&[], &zh_tw()).is_empty());
    }

    #[test]
    fn totals_equal_member_sums_and_every_record_appears_once() {
        let records = vec![
            record("1", "王小明", "宜一", 20.0, 1),
            record("2", "李美華", "宜一", 120.0, 2),
            record("3", "王小明", "宜一", 25.5, 3),
            record("4", "張建國", "蘭二", 88.0, 4),
            record("5", "王小明", "宜一", 0.25, 5),
        ];
        let groups = aggregate(&records, &zh_tw());

        assert_eq!(groups.len(), 3);
        for group in &groups {
            let sum: f64 = group.records.iter().map(|r| r.hours).sum();
            assert_eq!(group.total_hours, sum);
        }
        let wang = groups.iter().find(|g| g.name == "王小明").unwrap();
        assert_eq!(wang.total_hours, 45.75);

        let mut ids: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.records.iter().map(|r| r.id.as_str()))
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn same_name_in_different_chapters_stays_apart() {
        let records = vec![
            record("1", "林宜君", "宜三", 32.0, 1),
            record("2", "林宜君", "宜一", 4.0, 2),
        ];
        let groups = aggregate(&records, &zh_tw());
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.records.len() == 1));
    }

    #[test]
    fn representative_is_newest_record_with_last_seen_ties() {
        let records = vec![
            record("old", "陳致中", "宜四", 1.0, 1),
            record("new", "陳致中", "宜四", 1.0, 9),
            record("mid", "陳致中", "宜四", 1.0, 5),
        ];
        assert_eq!(aggregate(&records, &zh_tw())[0].representative_id, "new");

        let tied = vec![
            record("first", "陳致中", "宜四", 1.0, 3),
            record("second", "陳致中", "宜四", 1.0, 3),
        ];
        assert_eq!(aggregate(&tied, &zh_tw())[0].representative_id, "second");
    }

    #[test]
    fn unknown_timestamps_never_outrank_known_ones() {
        let mut undated = record("undated", "黃詩涵", "宜五", 1.0, 1);
        undated.created_at = None;
        let records = vec![record("dated", "黃詩涵", "宜五", 1.0, 2), undated];
        assert_eq!(aggregate(&records, &zh_tw())[0].representative_id, "dated");
    }

    #[test]
    fn names_sort_by_locale_collation_not_code_points() {
        let records = vec![
            record("1", "bob", "X", 1.0, 1),
            record("2", "Alice", "X", 1.0, 2),
            record("3", "alice", "Y", 1.0, 3),
            record("4", "Carol", "X", 1.0, 4),
        ];
        let groups = aggregate(&records, &"en".parse().unwrap());
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        // code point order would put every capitalised name first
        assert_eq!(names, vec!["alice", "Alice", "bob", "Carol"]);
    }

    #[test]
    fn default_locale_orders_chinese_names_by_stroke_count() {
        let records = vec![
            record("1", "李美華", "宜一", 1.0, 1),
            record("2", "王小明", "宜一", 1.0, 2),
            record("3", "張建國", "蘭二", 1.0, 3),
            record("4", "林宜君", "宜三", 1.0, 4),
        ];
        let locale = Config::from_lookup(|_| None).unwrap().locale;
        let groups = aggregate(&records, &locale);
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        // code point order would put 李 (U+674E) before 王 (U+738B)
        assert_eq!(names, vec!["王小明", "李美華", "林宜君", "張建國"]);
    }
}
