//! Grid/block launches over a rayon pool.
//!
//! A launch runs `grid * block` logical workers. Worker `tid` visits indices
//! `tid, tid + workers, tid + 2 * workers, ...` of its input, the same
//! grid-stride loop a device kernel uses. The launch shape only changes how
//! work is split; every kernel in this crate produces identical results for
//! any valid shape.

use std::env;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::processor::column::Column;
use crate::processor::{BinwiseError, Result};

/// Grid/block dimensions for a kernel launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub grid: u32,
    pub block: u32,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self { grid: 64, block: 64 }
    }
}

impl LaunchConfig {
    pub fn new(grid: u32, block: u32) -> Result<Self> {
        let config = Self { grid, block };
        config.validate()?;
        Ok(config)
    }

    /// Enough blocks of `block_size` workers to give each of `n` elements its
    /// own worker.
    pub fn linear(n: usize, block_size: u32) -> Result<Self> {
        let block = block_size.max(1);
        let grid = n.div_ceil(block as usize).clamp(1, u32::MAX as usize) as u32;
        Self::new(grid, block)
    }

    pub fn workers(&self) -> usize {
        self.grid as usize * self.block as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid == 0 || self.block == 0 {
            return Err(BinwiseError::InvalidLaunch {
                grid: self.grid,
                block: self.block,
            });
        }
        Ok(())
    }
}

/// Runs `kernel(tid, workers)` once per logical worker on the current pool and
/// returns when every worker has finished.
pub(crate) fn launch<F>(config: &LaunchConfig, kernel_name: &'static str, kernel: F) -> Result<()>
where
    F: Fn(usize, usize) + Send + Sync,
{
    config.validate()?;
    let workers = config.workers();
    debug!(
        kernel = kernel_name,
        grid = config.grid,
        block = config.block,
        workers,
        "launching kernel"
    );
    (0..workers)
        .into_par_iter()
        .for_each(|tid| kernel(tid, workers));
    Ok(())
}

/// Grid-stride indices visited by worker `tid`.
#[inline]
pub(crate) fn grid_stride(tid: usize, workers: usize, len: usize) -> impl Iterator<Item = usize> {
    (tid..len).step_by(workers)
}

/// Execution resources: thread pool size and default launch shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Worker threads; `None` lets rayon pick one per core.
    pub threads: Option<usize>,
    pub launch: LaunchConfig,
}

impl DeviceConfig {
    /// Defaults overridden by `BINWISE_THREADS`, `BINWISE_GRID` and
    /// `BINWISE_BLOCK`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(v) = env::var("BINWISE_THREADS") {
            config.threads = Some(v.trim().parse()?);
        }
        if let Ok(v) = env::var("BINWISE_GRID") {
            config.launch.grid = v.trim().parse()?;
        }
        if let Ok(v) = env::var("BINWISE_BLOCK") {
            config.launch.block = v.trim().parse()?;
        }
        config.launch.validate()?;
        Ok(config)
    }
}

/// A dedicated pool that kernels run on, plus accounting for staged columns.
#[derive(Debug)]
pub struct Device {
    pool: ThreadPool,
    launch: LaunchConfig,
    resident: AtomicUsize,
}

impl Device {
    pub fn new(config: DeviceConfig) -> Result<Self> {
        config.launch.validate()?;
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("binwise-worker-{i}"));
        if let Some(n) = config.threads {
            builder = builder.num_threads(n);
        }
        let pool = builder.build()?;
        debug!(
            threads = pool.current_num_threads(),
            grid = config.launch.grid,
            block = config.launch.block,
            "device ready"
        );
        Ok(Self {
            pool,
            launch: config.launch,
            resident: AtomicUsize::new(0),
        })
    }

    pub fn launch_config(&self) -> LaunchConfig {
        self.launch
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Bytes of columns currently staged on this device
    pub fn resident_bytes(&self) -> usize {
        self.resident.load(Ordering::Acquire)
    }

    /// Stages `column` for kernel use. The bytes stay accounted until the
    /// returned guard is dropped.
    pub fn stage<'d, 'c>(&'d self, column: &'c Column) -> StagedColumn<'d, 'c> {
        let bytes = column.byte_len();
        let resident = self.resident.fetch_add(bytes, Ordering::AcqRel) + bytes;
        trace!(bytes, resident, dtype = %column.dtype(), "staged column");
        StagedColumn {
            device: self,
            column,
            bytes,
        }
    }

    /// Runs `kernel` inside this device's pool with its default launch shape.
    pub fn run<R, F>(&self, kernel: F) -> R
    where
        R: Send,
        F: FnOnce(&LaunchConfig) -> R + Send,
    {
        let launch = self.launch;
        self.pool.install(move || kernel(&launch))
    }
}

/// Guard over a column staged on a [`Device`]; releases its bytes on drop.
#[derive(Debug)]
pub struct StagedColumn<'d, 'c> {
    device: &'d Device,
    column: &'c Column,
    bytes: usize,
}

impl StagedColumn<'_, '_> {
    pub fn column(&self) -> &Column {
        self.column
    }
}

impl Deref for StagedColumn<'_, '_> {
    type Target = Column;

    fn deref(&self) -> &Column {
        self.column
    }
}

impl Drop for StagedColumn<'_, '_> {
    fn drop(&mut self) {
        let before = self.device.resident.fetch_sub(self.bytes, Ordering::AcqRel);
        trace!(bytes = self.bytes, resident = before - self.bytes, "released column");
    }
}
