//! System inspection capability used by the checks.
//!
//! [`SystemProbe`] is supplied at construction time so checks can run
//! against a test double. [`HostProbe`] reads what Linux exposes under
//! `/proc` and `/sys`; on other platforms it reports the probe as
//! unsupported and the dependent checks come back inconclusive.

use crate::error::{GuardError, GuardResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Read size used when streaming a file through the digest.
pub const DIGEST_CHUNK_SIZE: usize = 8 * 1024;

/// Vendor strings that identify common hypervisors and sandboxes.
const VM_MARKERS: &[&str] = &[
    "vmware",
    "virtualbox",
    "kvm",
    "qemu",
    "xen",
    "hyper-v",
    "parallels",
    "bochs",
    "innotek",
];

/// Read-only view of the host the checks inspect.
#[async_trait]
pub trait SystemProbe: Send + Sync {
    /// Names of the modules loaded into this process.
    async fn list_modules(&self) -> GuardResult<Vec<String>>;

    /// Names of the running processes.
    async fn list_processes(&self) -> GuardResult<Vec<String>>;

    /// Hex SHA-256 of the running binary.
    async fn hash_self(&self) -> GuardResult<String>;

    /// Virtualization or sandbox indicators; empty when none were found.
    async fn vm_signals(&self) -> GuardResult<Vec<String>>;
}

/// Streams `path` through SHA-256 and returns the lowercase hex digest.
///
/// # Errors
///
/// Returns [`GuardError::Io`] if the file cannot be opened or read.
pub async fn digest_file(path: impl AsRef<Path>) -> GuardResult<String> {
    let mut file = tokio::fs::File::open(path.as_ref()).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; DIGEST_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Probe backed by the local operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

#[async_trait]
impl SystemProbe for HostProbe {
    async fn list_modules(&self) -> GuardResult<Vec<String>> {
        if !cfg!(target_os = "linux") {
            return Err(unsupported("module listing"));
        }
        let maps = tokio::fs::read_to_string("/proc/self/maps").await?;
        Ok(parse_mapped_modules(&maps))
    }

    async fn list_processes(&self) -> GuardResult<Vec<String>> {
        if !cfg!(target_os = "linux") {
            return Err(unsupported("process listing"));
        }
        let mut names = BTreeSet::new();
        let mut entries = tokio::fs::read_dir("/proc").await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_pid = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.bytes().all(|b| b.is_ascii_digit()));
            if !is_pid {
                continue;
            }
            // Processes can exit between listing and reading.
            if let Ok(comm) = tokio::fs::read_to_string(entry.path().join("comm")).await {
                let comm = comm.trim();
                if !comm.is_empty() {
                    names.insert(comm.to_string());
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    async fn hash_self(&self) -> GuardResult<String> {
        let exe = std::env::current_exe()?;
        digest_file(exe).await
    }

    async fn vm_signals(&self) -> GuardResult<Vec<String>> {
        if !cfg!(target_os = "linux") {
            return Err(unsupported("virtualization probing"));
        }
        let mut signals = Vec::new();
        for field in ["sys_vendor", "product_name", "board_vendor"] {
            let path = format!("/sys/class/dmi/id/{field}");
            if let Ok(value) = tokio::fs::read_to_string(&path).await {
                if let Some(marker) = vm_marker(&value) {
                    signals.push(format!("{field}: {marker}"));
                }
            }
        }
        if let Ok(cpuinfo) = tokio::fs::read_to_string("/proc/cpuinfo").await {
            if cpu_flags_report_hypervisor(&cpuinfo) {
                signals.push("cpu flag: hypervisor".to_string());
            }
        }
        Ok(signals)
    }
}

fn unsupported(what: &str) -> GuardError {
    GuardError::Probe(format!("{what} is not supported on this platform"))
}

/// Distinct file names of the objects mapped into a process, from the
/// contents of `/proc/<pid>/maps`.
#[must_use]
pub fn parse_mapped_modules(maps: &str) -> Vec<String> {
    let mut modules = BTreeSet::new();
    for line in maps.lines() {
        let Some(path) = line.split_whitespace().nth(5) else {
            continue;
        };
        if !path.starts_with('/') {
            continue;
        }
        if let Some(name) = Path::new(path).file_name().and_then(|n| n.to_str()) {
            modules.insert(name.to_string());
        }
    }
    modules.into_iter().collect()
}

/// The hypervisor marker contained in a DMI string, if any.
#[must_use]
pub fn vm_marker(value: &str) -> Option<&'static str> {
    let value = value.to_ascii_lowercase();
    VM_MARKERS.iter().copied().find(|m| value.contains(m))
}

fn cpu_flags_report_hypervisor(cpuinfo: &str) -> bool {
    cpuinfo
        .lines()
        .filter(|l| l.starts_with("flags"))
        .any(|l| l.split_whitespace().any(|f| f == "hypervisor"))
}
