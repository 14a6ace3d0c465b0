//! Optional raw-response log for offline prompt debugging.
//!
//! Purely a side effect: failures are logged and swallowed so auditing can
//! never influence the pipeline.

use std::path::PathBuf;

use tracing::warn;

pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Append one raw response under `{dir}/{session_id}/{agent_id}_{millis}.txt`.
    pub fn record(&self, session_id: &str, agent_id: &str, content: &str) {
        let dir = self.dir.join(session_id);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(error = %e, "failed to create audit directory");
            return;
        }
        let millis = chrono::Utc::now().timestamp_millis();
        let path = dir.join(format!("{agent_id}_{millis}.txt"));
        if let Err(e) = std::fs::write(&path, content) {
            warn!(error = %e, path = %path.display(), "failed to write audit file");
        }
    }
}
