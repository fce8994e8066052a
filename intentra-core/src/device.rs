//! Stable, anonymized device identity
//!
//! The raw identifier never leaves the machine; scans carry its SHA-256.
//! Sources in order: OS machine id, hostname, then a random UUID persisted in
//! the data directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::hash::sha256_hex;

const MACHINE_ID_PATHS: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

const DEVICE_ID_FILE: &str = "device_id";

/// Device id for this machine.
pub fn device_id(data_dir: &Path) -> String {
    let machine_id_paths: Vec<PathBuf> = MACHINE_ID_PATHS.iter().map(PathBuf::from).collect();
    resolve(&machine_id_paths, hostname(), data_dir)
}

fn hostname() -> Option<String> {
    let name = gethostname::gethostname().to_string_lossy().trim().to_string();
    (!name.is_empty() && name != "localhost").then_some(name)
}

fn resolve(machine_id_paths: &[PathBuf], hostname: Option<String>, data_dir: &Path) -> String {
    let raw = machine_id_paths
        .iter()
        .find_map(|path| read_trimmed(path))
        .or(hostname)
        .unwrap_or_else(|| persisted_uuid(data_dir));
    sha256_hex(&raw)
}

fn read_trimmed(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let value = content.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Random id kept in the data directory. Regenerated per call if it cannot
/// be persisted.
fn persisted_uuid(data_dir: &Path) -> String {
    let path = data_dir.join(DEVICE_ID_FILE);
    if let Some(id) = read_trimmed(&path) {
        return id;
    }

    let id = uuid::Uuid::new_v4().to_string();
    let written = fs::create_dir_all(data_dir).and_then(|()| fs::write(&path, &id));
    if let Err(e) = written {
        tracing::debug!(path = %path.display(), error = %e, "Could not persist device id");
    }
    id
}
