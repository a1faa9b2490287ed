use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::schema::Database;

/// Preference key holding the serialized toggle record.
pub const TOGGLES_KEY: &str = "stormwatch.toggles";

/// Persisted state of one widget or group toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleState {
    On,
    Off,
}

impl ToggleState {
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            Self::On
        } else {
            Self::Off
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

type ToggleRecord = BTreeMap<String, ToggleState>;

enum RecordRead {
    Valid(ToggleRecord),
    /// Stored value exists but does not deserialize
    Corrupt,
    /// The database itself could not be read
    Unavailable,
}

/// Durable id → `On`/`Off` mapping for widget and group toggles.
///
/// The whole mapping is one JSON object under [`TOGGLES_KEY`]. Nothing here
/// returns an error: unknown ids, corrupt records and database failures all
/// read as `Off`, and failed writes are logged and dropped. A corrupt record
/// is reported once, then silently treated as empty until the next
/// successful write replaces it.
pub struct ToggleStore {
    db: Database,
    corruption_reported: AtomicBool,
}

impl ToggleStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            corruption_reported: AtomicBool::new(false),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Persisted state for `id`, `Off` when absent or unreadable.
    pub async fn get(&self, id: &str) -> ToggleState {
        match self.read_record().await {
            RecordRead::Valid(record) => record.get(id).copied().unwrap_or(ToggleState::Off),
            RecordRead::Corrupt | RecordRead::Unavailable => ToggleState::Off,
        }
    }

    /// Merge `id → value` into the stored record, keeping every other key.
    ///
    /// Read-then-write without a transaction; callers run on a single task.
    pub async fn set(&self, id: &str, value: ToggleState) {
        let mut record = match self.read_record().await {
            RecordRead::Valid(record) => record,
            RecordRead::Corrupt => ToggleRecord::new(),
            RecordRead::Unavailable => {
                tracing::warn!(id, ?value, "Skipping toggle write, stored record unreadable");
                return;
            }
        };
        record.insert(id.to_string(), value);

        let serialized = match serde_json::to_string(&record) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(id, error = %e, "Failed to serialize toggle record");
                return;
            }
        };

        match self.db.set_preference(TOGGLES_KEY, &serialized).await {
            Ok(()) => {
                self.corruption_reported.store(false, Ordering::Relaxed);
                tracing::debug!(id, ?value, "Persisted toggle state");
            }
            Err(e) => tracing::warn!(id, error = %e, "Failed to persist toggle state"),
        }
    }

    async fn read_record(&self) -> RecordRead {
        let raw = match self.db.get_preference(TOGGLES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return RecordRead::Valid(ToggleRecord::new()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read toggle record");
                return RecordRead::Unavailable;
            }
        };

        match serde_json::from_str::<ToggleRecord>(&raw) {
            Ok(record) => RecordRead::Valid(record),
            Err(e) => {
                if !self.corruption_reported.swap(true, Ordering::Relaxed) {
                    tracing::warn!(
                        key = TOGGLES_KEY,
                        error = %e,
                        "Stored toggle record is corrupt, treating every toggle as Off"
                    );
                }
                RecordRead::Corrupt
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn test_store() -> ToggleStore {
        ToggleStore::new(Database::open(":memory:").await.unwrap())
    }

    async fn raw_record(store: &ToggleStore) -> Option<String> {
        store.database().get_preference(TOGGLES_KEY).await.unwrap()
    }

    #[tokio::test]
    async fn test_unknown_id_is_off() {
        let store = test_store().await;
        assert_eq!(store.get("spc-rss").await, ToggleState::Off);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = test_store().await;
        store.set("spc-rss", ToggleState::On).await;
        assert_eq!(store.get("spc-rss").await, ToggleState::On);

        store.set("spc-rss", ToggleState::Off).await;
        assert_eq!(store.get("spc-rss").await, ToggleState::Off);
    }

    #[tokio::test]
    async fn test_set_preserves_other_keys() {
        let store = test_store().await;
        store.set("spc-rss", ToggleState::On).await;
        store.set("spc-csv", ToggleState::Off).await;
        store.set("spc-all", ToggleState::On).await;

        assert_eq!(
            raw_record(&store).await.as_deref(),
            Some(r#"{"spc-all":"On","spc-csv":"Off","spc-rss":"On"}"#)
        );
    }

    #[tokio::test]
    async fn test_corrupt_record_reads_off() {
        let store = test_store().await;
        store.set("spc-rss", ToggleState::On).await;
        store
            .database()
            .set_preference(TOGGLES_KEY, "not valid json {{")
            .await
            .unwrap();

        assert_eq!(store.get("spc-rss").await, ToggleState::Off);
        assert_eq!(store.get("spc-csv").await, ToggleState::Off);
    }

    #[tokio::test]
    async fn test_invalid_value_counts_as_corrupt() {
        let store = test_store().await;
        store
            .database()
            .set_preference(TOGGLES_KEY, r#"{"spc-rss":"Maybe"}"#)
            .await
            .unwrap();

        assert_eq!(store.get("spc-rss").await, ToggleState::Off);
    }

    #[tokio::test]
    async fn test_corruption_not_repaired_until_next_set() {
        let store = test_store().await;
        store
            .database()
            .set_preference(TOGGLES_KEY, "[1, 2, 3]")
            .await
            .unwrap();

        let _ = store.get("spc-rss").await;
        assert_eq!(raw_record(&store).await.as_deref(), Some("[1, 2, 3]"));

        store.set("spc-csv", ToggleState::On).await;
        assert_eq!(
            raw_record(&store).await.as_deref(),
            Some(r#"{"spc-csv":"On"}"#)
        );
        assert_eq!(store.get("spc-csv").await, ToggleState::On);
    }

    #[tokio::test]
    async fn test_corruption_reported_once_per_episode() {
        let store = test_store().await;
        store
            .database()
            .set_preference(TOGGLES_KEY, "garbage")
            .await
            .unwrap();

        let _ = store.get("a").await;
        assert!(store.corruption_reported.load(Ordering::Relaxed));
        let _ = store.get("b").await;
        assert!(store.corruption_reported.load(Ordering::Relaxed));

        store.set("a", ToggleState::On).await;
        assert!(!store.corruption_reported.load(Ordering::Relaxed));
    }

    #[test]
    fn test_toggle_state_serializes_as_on_off() {
        assert_eq!(serde_json::to_string(&ToggleState::On).unwrap(), "\"On\"");
        assert_eq!(serde_json::to_string(&ToggleState::Off).unwrap(), "\"Off\"");
        assert_eq!(ToggleState::from_checked(true), ToggleState::On);
        assert!(!ToggleState::from_checked(false).is_on());
    }
}
