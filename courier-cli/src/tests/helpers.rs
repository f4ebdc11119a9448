//! Test helpers writing seed documents into a temporary workspace.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

pub(super) const SEGMENT_NETWORK: &str = r#"{
  "nodes": [
    {"id": 1, "lat": 14.5547, "lon": 121.0244},
    {"id": 2, "lat": 14.5600, "lon": 121.0200}
  ],
  "edges": [{"from": 1, "to": 2, "length_m": 800.0, "two_way": true}]
}"#;

pub(super) const ALICE_AND_BOB: &str = r#"[
  {"name": "Alice", "lat": 14.5547, "lon": 121.0244, "imei": "356938035643809", "current_load": 1},
  {"name": "Bob", "lat": 14.5550, "lon": 121.0300, "imei": "356938035643810", "current_load": 2}
]"#;

pub(super) const ONE_JOB: &str = r#"[{"lat": 14.5555, "lon": 121.0240, "address": "Ayala Ave"}]"#;

pub(super) const NO_GO_ZONE: &str = r#"[{
  "id": 1,
  "name": "No-Go Zone Makati",
  "polygon": [[14.555, 121.023], [14.556, 121.023], [14.556, 121.025], [14.555, 121.025]]
}]"#;

/// Temporary directory holding the documents a command reads.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.path(name);
        write_utf8(&path, contents.as_bytes());
        path
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace").field("root", &self.root).finish()
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path, contents).expect("write fixture file");
}
