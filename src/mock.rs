//! In-memory stand-in for the hours API, seeded with a small demo roster.

use crate::api::HoursApi;
use crate::errors::{ApiError, AuthFailure};
use crate::models::{NewRecordBatch, ServiceRecord};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct MockDb {
    records: Vec<ServiceRecord>,
    next_id: u64,
}

pub struct MockHoursApi {
    password: String,
    delay: Duration,
    db: Mutex<MockDb>,
    token_seq: AtomicU64,
    generation: AtomicU64,
    calls: AtomicUsize,
}

impl MockHoursApi {
    pub fn new(password: impl Into<String>, delay: Duration) -> Self {
        Self {
            password: password.into(),
            delay,
            db: Mutex::new(MockDb {
                next_id: 1000,
                ..MockDb::default()
            }),
            token_seq: AtomicU64::new(1),
            generation: AtomicU64::new(1),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_demo_roster(self) -> Self {
        {
            let mut db = self.lock();
            db.records = demo_roster();
        }
        self
    }

    /// Number of API operations served so far, login included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every issued token invalid, as an upstream expiry would.
    pub fn expire_sessions(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<ServiceRecord> {
        self.lock().records.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockDb> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn authorize(&self, token: &str) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // tokens are `mock:<generation>:<chapter>:<seq>`, so they stay valid
        // across restarts until the generation moves on
        let generation = self.generation.load(Ordering::SeqCst).to_string();
        let valid = token
            .strip_prefix("mock:")
            .and_then(|rest| rest.split_once(':'))
            .is_some_and(|(issued, _)| issued == generation);
        if valid {
            Ok(())
        } else {
            Err(ApiError::Auth(AuthFailure::SessionExpired))
        }
    }
}

#[async_trait]
impl HoursApi for MockHoursApi {
    async fn login(&self, chapter_id: &str, password: &str) -> Result<String, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if chapter_id.trim().is_empty() || password != self.password {
            return Err(ApiError::Auth(AuthFailure::InvalidCredentials));
        }
        let seq = self.token_seq.fetch_add(1, Ordering::SeqCst);
        let generation = self.generation.load(Ordering::SeqCst);
        Ok(format!("mock:{generation}:{}:{seq}", chapter_id.trim()))
    }

    async fn list_records(&self, token: &str, limit: u32) -> Result<Vec<ServiceRecord>, ApiError> {
        self.authorize(token)?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut records = self.lock().records.clone();
        // newest first, like the upstream listing
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn create_records(&self, token: &str, batch: &NewRecordBatch) -> Result<(), ApiError> {
        self.authorize(token)?;
        let now = Utc::now();
        let mut db = self.lock();
        for row in &batch.rows {
            db.next_id += 1;
            let record = ServiceRecord {
                id: db.next_id.to_string(),
                volunteer_name: row.volunteer_name.clone(),
                chapter_id: row.chapter.clone(),
                registrar: batch.creator.clone(),
                hours: row.hours,
                unit: row.unit.clone(),
                remarks: Some(row.remarks.clone()).filter(|remarks| !remarks.is_empty()),
                created_at: Some(now),
            };
            db.records.push(record);
        }
        debug!(rows = batch.rows.len(), "mock records created");
        Ok(())
    }

    async fn delete_record(
        &self,
        token: &str,
        record_id: &str,
        volunteer_name: &str,
    ) -> Result<(), ApiError> {
        self.authorize(token)?;
        let mut db = self.lock();
        let before = db.records.len();
        db.records
            .retain(|record| !(record.id == record_id && record.volunteer_name == volunteer_name));
        if db.records.len() == before {
            return Err(ApiError::Server {
                status: 404,
                message: format!("record {record_id} not found"),
            });
        }
        Ok(())
    }
}

fn demo_roster() -> Vec<ServiceRecord> {
    let seeded = [
        ("101", "王小明", "宜一", "知林法師", 20.0, "服務台 101"),
        ("102", "王小明", "宜一", "知林法師", 25.0, "流通處"),
        ("201", "李美華", "宜一", "明恆法師", 120.0, "書車義工"),
        ("301", "張建國", "蘭二", "知林法師", 88.0, "園藝組"),
        ("401", "林宜君", "宜三", "知林法師", 32.0, "茶席"),
        ("501", "陳致中", "宜四", "知林法師", 210.0, "金剛巡寮"),
        ("601", "黃詩涵", "宜五", "知修法師", 56.0, "典座"),
    ];
    let base: DateTime<Utc> = Utc
        .with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);

    seeded
        .iter()
        .enumerate()
        .map(|(index, (id, name, chapter, registrar, hours, unit))| ServiceRecord {
            id: id.to_string(),
            volunteer_name: name.to_string(),
            chapter_id: chapter.to_string(),
            registrar: registrar.to_string(),
            hours: *hours,
            unit: unit.to_string(),
            remarks: None,
            created_at: Some(base + ChronoDuration::days(index as i64)),
        })
        .collect()
}
