//! One-time installation of the bundled database into app-private storage.
//!
//! The payload is staged next to the destination and renamed into place, so a
//! failed run never leaves a truncated file at the destination that a later
//! launch would accept as installed.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

const COPY_CHUNK_SIZE: usize = 1024;
const STAGING_SUFFIX: &str = "provisioning";

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The destination file or its directory could not be created.
    #[error("could not create database file {}: {source}", path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The payload could not be fully written, flushed or moved into place.
    #[error("could not write database file {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// The payload was written to a previously absent destination.
    Installed { bytes: u64 },
    /// A file was already present and has been left untouched.
    AlreadyPresent,
}

/// Serializes provisioning per destination so the existence check and the
/// install cannot interleave between threads.
#[derive(Default)]
pub struct DatabaseProvisioner {
    in_flight: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl DatabaseProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provision(
        &self,
        destination: &Path,
        payload: &[u8],
    ) -> Result<Provisioned, ProvisionError> {
        let guard = self.destination_lock(destination);
        let outcome = {
            let _held = guard.lock().unwrap_or_else(PoisonError::into_inner);
            provision_locked(destination, payload)
        };
        drop(guard);
        self.release(destination);
        outcome
    }

    fn destination_lock(&self, destination: &Path) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight
            .entry(destination.to_path_buf())
            .or_default()
            .clone()
    }

    /// Drops the lock entry once no caller holds or waits on it.
    fn release(&self, destination: &Path) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight
            .get(destination)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            in_flight.remove(destination);
        }
    }
}

fn provision_locked(destination: &Path, payload: &[u8]) -> Result<Provisioned, ProvisionError> {
    if destination.is_file() {
        log::debug!(
            "Database {} already present, skipping copy.",
            destination.display()
        );
        return Ok(Provisioned::AlreadyPresent);
    }

    let bytes = install(destination, payload)?;
    log::info!(
        "Installed database {} ({bytes} bytes).",
        destination.display()
    );
    Ok(Provisioned::Installed { bytes })
}

fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(ToOwned::to_owned)
        .unwrap_or_default();
    name.push(".");
    name.push(STAGING_SUFFIX);
    destination.with_file_name(name)
}

fn install(destination: &Path, payload: &[u8]) -> Result<u64, ProvisionError> {
    let staging = staging_path(destination);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&staging)
        .map_err(|source| ProvisionError::CreateFailed {
            path: staging.clone(),
            source,
        })?;

    let write_failed = |source| ProvisionError::WriteFailed {
        path: destination.to_path_buf(),
        source,
    };

    let bytes = write_and_sync(file, payload).map_err(write_failed)?;
    std::fs::rename(&staging, destination).map_err(write_failed)?;
    Ok(bytes)
}

fn write_and_sync(mut file: File, payload: &[u8]) -> io::Result<u64> {
    let bytes = copy_payload(&mut file, payload)?;
    file.flush()?;
    file.sync_all()?;
    Ok(bytes)
}

/// Copies `payload` into `writer` in fixed-size chunks.
pub fn copy_payload<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<u64> {
    let mut written = 0u64;
    for chunk in payload.chunks(COPY_CHUNK_SIZE) {
        writer.write_all(chunk)?;
        written += chunk.len() as u64;
    }
    Ok(written)
}
