//! Isolated engine instances.
//!
//! The engine treats its profile directory as exclusive session state and its
//! accept socket as its IPC endpoint, so every invocation gets its own pair. Both are
//! derived from one port number: the profile lives at
//! `<temp_root>/SOffice_Process<port>`.
//!
//! Selection samples random ports from the configured range and accepts the first one
//! that is neither reserved by a live [`EngineInstance`] in this process nor backed by
//! an existing profile directory on disk. The on-disk check covers other processes
//! sharing the same temp root; it is advisory, not a lock.

use rand::Rng;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use super::config::ConverterConfig;
use super::error::ConverterError;
use crate::metrics;

/// Name prefix of per-invocation profile directories.
pub const PROFILE_DIR_PREFIX: &str = "SOffice_Process";

/// Working context of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocationContext {
    /// Port of the private accept socket.
    pub port: u16,
    /// Private user-profile directory.
    pub profile_dir: PathBuf,
}

impl EngineInvocationContext {
    /// `file://` URL of the profile directory, for `-env:UserInstallation`.
    pub fn user_installation_url(&self) -> String {
        reqwest::Url::from_file_path(&self.profile_dir)
            .map(String::from)
            .unwrap_or_else(|_| format!("file://{}", self.profile_dir.display()))
    }

    /// Accept-socket specification bound to localhost on the allocated port.
    pub fn accept_socket(&self) -> String {
        format!("socket,host=localhost,port={};urp;", self.port)
    }
}

#[derive(Debug)]
struct AllocatorState {
    temp_root: PathBuf,
    ports: RangeInclusive<u16>,
    max_attempts: u32,
    reserved: Mutex<HashSet<u16>>,
}

impl AllocatorState {
    fn reserved(&self) -> MutexGuard<'_, HashSet<u16>> {
        self.reserved.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn profile_dir(&self, port: u16) -> PathBuf {
        self.temp_root.join(format!("{}{}", PROFILE_DIR_PREFIX, port))
    }

    fn unreserve(&self, port: u16) {
        if self.reserved().remove(&port) {
            metrics::ENGINE_INSTANCES_ACTIVE.dec();
        }
    }
}

/// Hands out isolated [`EngineInstance`]s.
///
/// Cloning is cheap; clones share the reservation set.
#[derive(Debug, Clone)]
pub struct InstanceAllocator {
    state: Arc<AllocatorState>,
}

impl InstanceAllocator {
    /// Creates an allocator over `ports`, placing profiles under `temp_root`.
    pub fn new(temp_root: impl Into<PathBuf>, ports: RangeInclusive<u16>, max_attempts: u32) -> Self {
        let temp_root = temp_root.into();
        let temp_root = std::path::absolute(&temp_root).unwrap_or(temp_root);
        Self {
            state: Arc::new(AllocatorState {
                temp_root,
                ports,
                max_attempts,
                reserved: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Creates an allocator from converter configuration.
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(
            config.temp_root.clone(),
            config.port_range(),
            config.max_allocation_attempts,
        )
    }

    /// Root under which profile directories are placed.
    pub fn temp_root(&self) -> &Path {
        &self.state.temp_root
    }

    /// Profile directory that belongs to `port`.
    pub fn profile_dir_for(&self, port: u16) -> PathBuf {
        self.state.profile_dir(port)
    }

    /// Number of instances currently handed out by this allocator.
    pub fn active_count(&self) -> usize {
        self.state.reserved().len()
    }

    /// Picks a free port/profile pair.
    ///
    /// The profile directory is not created here; the engine creates it on start.
    pub fn allocate(&self) -> Result<EngineInstance, ConverterError> {
        let mut rng = rand::rng();
        let mut reserved = self.state.reserved();

        for _ in 0..self.state.max_attempts {
            let port = rng.random_range(self.state.ports.clone());
            if reserved.contains(&port) {
                continue;
            }

            let profile_dir = self.state.profile_dir(port);
            // An unreadable entry counts as taken.
            if !matches!(profile_dir.try_exists(), Ok(false)) {
                continue;
            }

            reserved.insert(port);
            metrics::ENGINE_INSTANCES_ACTIVE.inc();
            debug!(port, profile_dir = %profile_dir.display(), "Allocated engine instance");

            return Ok(EngineInstance {
                context: EngineInvocationContext { port, profile_dir },
                state: Arc::clone(&self.state),
                released: false,
            });
        }

        Err(ConverterError::NoFreeInstance {
            attempts: self.state.max_attempts,
        })
    }
}

/// An allocated engine identity.
///
/// Call [`EngineInstance::release`] once the engine has exited. Dropping an
/// unreleased instance still removes its profile directory, synchronously.
#[derive(Debug)]
pub struct EngineInstance {
    context: EngineInvocationContext,
    state: Arc<AllocatorState>,
    released: bool,
}

impl EngineInstance {
    /// The invocation context for the command line.
    pub fn context(&self) -> &EngineInvocationContext {
        &self.context
    }

    pub fn port(&self) -> u16 {
        self.context.port
    }

    pub fn profile_dir(&self) -> &Path {
        &self.context.profile_dir
    }

    /// Deletes the profile directory and frees the port for later allocations.
    pub async fn release(mut self) {
        match tokio::fs::remove_dir_all(&self.context.profile_dir).await {
            Ok(()) => debug!(port = self.context.port, "Removed engine profile directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove engine profile directory {}: {}",
                self.context.profile_dir.display(),
                e
            ),
        }
        self.state.unreserve(self.context.port);
        self.released = true;
    }
}

impl Drop for EngineInstance {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.context.profile_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Failed to remove engine profile directory {}: {}",
                    self.context.profile_dir.display(),
                    e
                );
            }
        }
        self.state.unreserve(self.context.port);
    }
}
