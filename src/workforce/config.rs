//! Configuration for the workforce toolkit.
//!
//! Provides [`WorkforceConfig`] for the handful of knobs the binary and
//! embedding applications care about. Users construct it manually, no
//! config-file parsing dependencies are required.

use std::path::PathBuf;

/// Paths and window sizes used when wiring up a manager.
///
/// # Example
///
/// ```rust
/// use std::path::PathBuf;
/// use workforce::WorkforceConfig;
///
/// let config = WorkforceConfig {
///     history_dir: PathBuf::from("/var/data/workforce"),
///     ..WorkforceConfig::default()
/// };
/// assert_eq!(config.collection_name, "chat_history");
/// ```
#[derive(Debug, Clone)]
pub struct WorkforceConfig {
    /// Directory holding the persisted history collection.
    pub history_dir: PathBuf,
    /// Name of the history collection (used in both file names).
    pub collection_name: String,
    /// Directory rendered documents are written into.
    pub document_dir: PathBuf,
    /// Recent conversations injected into specialist prompts.
    pub context_window: usize,
    /// Past routing decisions shown to the classifier.
    pub decision_window: usize,
}

impl Default for WorkforceConfig {
    fn default() -> Self {
        Self {
            history_dir: PathBuf::from("vector_db"),
            collection_name: "chat_history".to_string(),
            document_dir: PathBuf::from("documents"),
            context_window: 50,
            decision_window: 20,
        }
    }
}
