//! Idempotency key helpers.
//!
//! Goal: make manual retries safe (no accidental duplicate reports or profile
//! writes) while keeping key generation consistent between the live flows and
//! the offline queue.

use uuid::Uuid;

const REPORT_PREFIX: &str = "profile-companion-report-";
const INTERESTS_PREFIX: &str = "profile-companion-interests-";

pub fn new_report_key() -> String {
    format!("{REPORT_PREFIX}{}", Uuid::new_v4().simple())
}

pub fn new_interests_key() -> String {
    format!("{INTERESTS_PREFIX}{}", Uuid::new_v4().simple())
}
