//! JSON report files

use serde::Serialize;
use std::path::{Path, PathBuf};
use texdit_common::Result;
use tracing::info;

/// Pretty-print `report` to `dir/file_name`, creating `dir` if needed
pub fn write_json<T: Serialize>(dir: &Path, file_name: &str, report: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
    info!("Detailed results saved to: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            &dir.path().join("reports"),
            "run.json",
            &serde_json::json!({"ok": true}),
        )
        .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["ok"], true);
    }
}
