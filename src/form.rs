use crate::errors::FormError;
use crate::models::{NewRecordBatch, NewRecordRow};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowDraft {
    pub volunteer_name: String,
    pub chapter: String,
    pub unit: String,
    pub hours: String,
    pub remarks: String,
}

/// State of the "add record" modal. Always holds at least one row.
#[derive(Debug, Clone, Serialize)]
pub struct RecordEntryForm {
    pub open: bool,
    pub creator: String,
    pub rows: Vec<RowDraft>,
    pub submitting: bool,
    pub error: Option<String>,
}

impl Default for RecordEntryForm {
    fn default() -> Self {
        Self {
            open: false,
            creator: String::new(),
            rows: vec![RowDraft::default()],
            submitting: false,
            error: None,
        }
    }
}

impl RecordEntryForm {
    pub fn open(&mut self) {
        if self.submitting {
            return;
        }
        *self = Self {
            open: true,
            ..Self::default()
        };
    }

    pub fn close(&mut self) {
        if !self.submitting {
            *self = Self::default();
        }
    }

    pub fn add_row(&mut self) {
        self.rows.push(RowDraft::default());
    }

    pub fn is_removable(index: usize) -> bool {
        index > 0
    }

    pub fn remove_row(&mut self, index: usize) -> bool {
        if !Self::is_removable(index) || index >= self.rows.len() {
            return false;
        }
        self.rows.remove(index);
        true
    }

    pub fn apply_fields<'a>(&mut self, fields: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (name, value) in fields {
            if name == "creator" {
                self.creator = value.to_string();
                continue;
            }
            let Some((field, index)) = name.rsplit_once('_') else {
                continue;
            };
            let Ok(index) = index.parse::<usize>() else {
                continue;
            };
            let Some(row) = self.rows.get_mut(index) else {
                continue;
            };
            let target = match field {
                "volunteer_name" => &mut row.volunteer_name,
                "chapter" => &mut row.chapter,
                "unit" => &mut row.unit,
                "hours" => &mut row.hours,
                "remarks" => &mut row.remarks,
                _ => continue,
            };
            *target = value.to_string();
        }
    }

    pub fn begin_submit(&mut self, year: i32) -> Result<NewRecordBatch, FormError> {
        if self.submitting {
            return Err(FormError::AlreadySubmitting);
        }
        match build_batch(&self.creator, &self.rows, year) {
            Ok(batch) => {
                self.submitting = true;
                self.error = None;
                Ok(batch)
            }
            Err(err) => {
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    pub fn submit_succeeded(&mut self) {
        *self = Self::default();
    }

    pub fn submit_failed(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(message);
    }
}

pub fn build_batch(creator: &str, rows: &[RowDraft], year: i32) -> Result<NewRecordBatch, FormError> {
    let creator = creator.trim();
    if creator.is_empty() {
        return Err(FormError::MissingCreator);
    }

    let rows = rows
        .iter()
        .enumerate()
        .map(|(row, draft)| {
            let volunteer_name = required(row, "volunteer_name", &draft.volunteer_name)?;
            let chapter = required(row, "chapter", &draft.chapter)?;
            let hours = draft
                .hours
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|hours| hours.is_finite())
                .ok_or_else(|| FormError::InvalidHours {
                    row,
                    value: draft.hours.clone(),
                })?;
            Ok(NewRecordRow {
                volunteer_name,
                chapter,
                unit: draft.unit.trim().to_string(),
                hours,
                remarks: draft.remarks.trim().to_string(),
            })
        })
        .collect::<Result<Vec<_>, FormError>>()?;

    Ok(NewRecordBatch {
        creator: creator.to_string(),
        year,
        rows,
    })
}

fn required(row: usize, field: &'static str, value: &str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() {
        Err(FormError::MissingField { row, field })
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RecordEntryForm {
        let mut form = RecordEntryForm::default();
        form.open();
        form.add_row();
        form.apply_fields([
            ("creator", "知林法師"),
            ("volunteer_name_0", "A"),
            ("chapter_0", "X"),
            ("unit_0", "茶席"),
            ("hours_0", "5"),
            ("volunteer_name_1", "B"),
            ("chapter_1", "X"),
            ("hours_1", " 3 "),
            ("remarks_1", "晚班"),
        ]);
        form
    }

    #[test]
    fn open_starts_with_one_empty_row() {
        let mut form = filled();
        form.open();
        assert!(form.open);
        assert_eq!(form.rows, vec![RowDraft::default()]);
        assert!(form.creator.is_empty());
    }

    #[test]
    fn first_row_cannot_be_removed() {
        let mut form = RecordEntryForm::default();
        assert!(!form.remove_row(0));
        form.add_row();
        form.add_row();
        assert!(!form.remove_row(7));
        assert!(form.remove_row(1));
        assert_eq!(form.rows.len(), 2);
        assert!(!RecordEntryForm::is_removable(0));
        assert!(RecordEntryForm::is_removable(1));
    }

    #[test]
    fn fields_land_in_their_rows() {
        let form = filled();
        assert_eq!(form.creator, "知林法師");
        assert_eq!(form.rows[0].volunteer_name, "A");
        assert_eq!(form.rows[1].remarks, "晚班");
    }

    #[test]
    fn submit_tags_rows_with_year_and_locks_form() {
        let mut form = filled();
        let batch = form.begin_submit(2026).unwrap();
        assert_eq!(batch.year, 2026);
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.rows[1].hours, 3.0);
        assert!(form.submitting);
        assert_eq!(form.begin_submit(2026), Err(FormError::AlreadySubmitting));

        form.submit_failed("伺服器錯誤 (500)".into());
        assert!(!form.submitting);
        assert!(form.open);
        assert_eq!(form.rows.len(), 2);

        form.begin_submit(2026).unwrap();
        form.submit_succeeded();
        assert!(!form.open);
        assert_eq!(form.rows.len(), 1);
    }

    #[test]
    fn non_numeric_hours_fail_validation() {
        let mut form = filled();
        form.apply_fields([("hours_1", "three")]);
        let err = form.begin_submit(2026).unwrap_err();
        assert_eq!(
            err,
            FormError::InvalidHours {
                row: 1,
                value: "three".into()
            }
        );
        assert!(!form.submitting);
        assert!(form.error.is_some());
    }

    #[test]
    fn missing_names_fail_validation() {
        let mut form = filled();
        form.apply_fields([("volunteer_name_0", "  ")]);
        assert_eq!(
            form.begin_submit(2026),
            Err(FormError::MissingField {
                row: 0,
                field: "volunteer_name"
            })
        );
    }
}
