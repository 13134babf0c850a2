//! Persistent-record adapter: a process-local store for extracted listings
//! plus CSV export formatting.
//!
//! Deliberately thin. The engine hands records over the moment a run
//! completes and keeps no copy; everything about durability beyond process
//! lifetime is out of scope (exactly-once across restarts is an explicit
//! non-goal).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::core::types::JobListing;

/// One stored listing: the extracted record plus store-assigned identity and
/// extraction timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredJob {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub posted_date: String,
    pub description: String,
    pub salary: String,
    pub emails: Vec<String>,
    pub scraped_at: DateTime<Utc>,
}

impl StoredJob {
    pub fn from_listing(listing: JobListing) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: listing.title,
            company: listing.company,
            location: listing.location,
            url: listing.url,
            posted_date: listing.posted_date,
            description: listing.description,
            salary: listing.salary,
            emails: listing.emails,
            scraped_at: Utc::now(),
        }
    }
}

/// In-memory record store shared across handlers.
#[derive(Clone, Default)]
pub struct RecordStore {
    inner: Arc<RwLock<Vec<StoredJob>>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_many(&self, jobs: Vec<StoredJob>) {
        self.inner.write().expect("record store lock").extend(jobs);
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("record store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Window of stored records, newest-first insertion order preserved.
    pub fn page(&self, limit: usize, offset: usize) -> Vec<StoredJob> {
        self.inner
            .read()
            .expect("record store lock")
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<StoredJob> {
        self.inner.read().expect("record store lock").clone()
    }

    /// Remove everything; returns the number of records deleted.
    pub fn clear(&self) -> usize {
        let mut guard = self.inner.write().expect("record store lock");
        let n = guard.len();
        guard.clear();
        n
    }
}

// ── CSV export ───────────────────────────────────────────────────────────────

const CSV_HEADER: &str =
    "title,company,location,url,posted_date,description,salary,emails,scraped_at";

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render stored records as a CSV document, RFC-4180 quoting, emails joined
/// with `", "`.
pub fn to_csv(jobs: &[StoredJob]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for job in jobs {
        let row = [
            csv_escape(&job.title),
            csv_escape(&job.company),
            csv_escape(&job.location),
            csv_escape(&job.url),
            csv_escape(&job.posted_date),
            csv_escape(&job.description),
            csv_escape(&job.salary),
            csv_escape(&job.emails.join(", ")),
            csv_escape(&job.scraped_at.to_rfc3339()),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}
