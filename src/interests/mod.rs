//! Profile interests.
//!
//! The user picks up to five interest labels. On explicit save the selection
//! is merge-written into the remote profile record and, only after the remote
//! write succeeds, overwritten wholesale in the local preference store.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::flow::selection::SelectionSet;
use crate::flow::{SubmissionRequest, Submitter};
use crate::idempotency;
use crate::services::{MergePolicy, PreferenceStore, RecordStore, RemoteError};

pub mod catalog;
pub(crate) mod cli;

/// Cap on selected interests, mirroring the profile editor.
pub const MAX_INTERESTS: usize = 5;

/// Preference-store key holding the last saved selection.
pub const PREF_KEY_INTERESTS: &str = "interests";

const PROFILE_COLLECTION: &str = "users";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestsPayload {
    pub interests: Vec<String>,
}

/// Load the last saved selection from the preference store.
///
/// A missing or unreadable blob starts the user from an empty selection
/// rather than failing the flow.
pub fn load_saved_selection(prefs: &dyn PreferenceStore) -> SelectionSet {
    let Some(raw) = prefs.get(PREF_KEY_INTERESTS) else {
        return SelectionSet::new(MAX_INTERESTS);
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(items) => SelectionSet::with_items(items, MAX_INTERESTS),
        Err(err) => {
            warn!(error = %err, "stored interests were unreadable; starting empty");
            SelectionSet::new(MAX_INTERESTS)
        }
    }
}

/// Overwrite the stored selection wholesale (last write wins).
pub fn persist_selection(
    prefs: &dyn PreferenceStore,
    selection: &SelectionSet,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(selection.items())?;
    prefs.set(PREF_KEY_INTERESTS, &raw)
}

/// Build the save request for the current selection.
pub fn build_save_request(user_id: &str, selection: &SelectionSet) -> SubmissionRequest {
    let payload = InterestsPayload {
        interests: selection.items().to_vec(),
    };
    SubmissionRequest::new(
        user_id,
        user_id,
        serde_json::to_value(&payload).unwrap_or(Value::Null),
        idempotency::new_interests_key(),
    )
}

/// Merge-writes the selected interests into the user's profile record.
pub struct ProfileRecordSubmitter {
    store: Arc<dyn RecordStore>,
}

impl ProfileRecordSubmitter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        ProfileRecordSubmitter { store }
    }
}

#[async_trait]
impl Submitter for ProfileRecordSubmitter {
    async fn submit(&self, request: &SubmissionRequest) -> Result<(), RemoteError> {
        let payload: InterestsPayload = serde_json::from_value(request.payload.clone())
            .map_err(|err| RemoteError::Payload(err.to_string()))?;

        let mut fields = Map::new();
        fields.insert("interests".to_string(), Value::from(payload.interests));
        fields.insert(
            "interests_updated_at".to_string(),
            Value::String(request.created_at.to_rfc3339()),
        );

        self.store
            .upsert(
                PROFILE_COLLECTION,
                &request.subject_id,
                fields,
                MergePolicy::Merge,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryPrefs {
        values: Mutex<HashMap<String, String>>,
    }

    impl PreferenceStore for MemoryPrefs {
        fn get(&self, key: &str) -> Option<String> {
            self.values.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[test]
    fn selection_round_trips_through_the_preference_store() {
        let prefs = MemoryPrefs::default();
        let mut selection = SelectionSet::new(MAX_INTERESTS);
        selection.toggle("Hiking");
        selection.toggle("Coffee");

        persist_selection(&prefs, &selection).expect("persist failed");
        let loaded = load_saved_selection(&prefs);
        assert_eq!(loaded.items(), ["Hiking", "Coffee"]);
    }

    #[test]
    fn an_unreadable_blob_starts_the_user_from_empty() {
        let prefs = MemoryPrefs::default();
        prefs.set(PREF_KEY_INTERESTS, "not json").unwrap();

        let loaded = load_saved_selection(&prefs);
        assert!(loaded.is_empty());
        assert_eq!(loaded.limit(), MAX_INTERESTS);
    }

    #[test]
    fn persisting_overwrites_the_previous_selection_wholesale() {
        let prefs = MemoryPrefs::default();
        let mut first = SelectionSet::new(MAX_INTERESTS);
        first.toggle("Hiking");
        first.toggle("Coffee");
        persist_selection(&prefs, &first).unwrap();

        let mut second = SelectionSet::new(MAX_INTERESTS);
        second.toggle("Yoga");
        persist_selection(&prefs, &second).unwrap();

        assert_eq!(load_saved_selection(&prefs).items(), ["Yoga"]);
    }

    struct RecordingStore {
        #[allow(clippy::type_complexity)]
        seen: Mutex<Vec<(String, String, Map<String, Value>, MergePolicy)>>,
    }

    #[async_trait]
    impl RecordStore for RecordingStore {
        async fn upsert(
            &self,
            collection: &str,
            document_id: &str,
            fields: Map<String, Value>,
            merge: MergePolicy,
        ) -> Result<(), RemoteError> {
            self.seen.lock().unwrap().push((
                collection.to_string(),
                document_id.to_string(),
                fields,
                merge,
            ));
            Ok(())
        }
    }

    #[tokio::test]
    async fn save_merge_writes_the_profile_record() {
        let store = Arc::new(RecordingStore {
            seen: Mutex::new(Vec::new()),
        });
        let submitter = ProfileRecordSubmitter::new(store.clone());

        let mut selection = SelectionSet::new(MAX_INTERESTS);
        selection.toggle("Hiking");
        let request = build_save_request("user-7", &selection);
        submitter.submit(&request).await.expect("submit failed");

        let seen = store.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (collection, document_id, fields, merge) = &seen[0];
        assert_eq!(collection, "users");
        assert_eq!(document_id, "user-7");
        assert_eq!(*merge, MergePolicy::Merge);
        assert_eq!(fields["interests"], Value::from(vec!["Hiking"]));
        assert!(fields.contains_key("interests_updated_at"));
    }

    #[test]
    fn save_request_uses_the_user_as_subject_and_actor() {
        let selection = SelectionSet::new(MAX_INTERESTS);
        let request = build_save_request("user-7", &selection);
        assert_eq!(request.subject_id, "user-7");
        assert_eq!(request.actor_id, "user-7");
        assert!(request.idempotency_key.starts_with("profile-companion-interests-"));
    }
}
