//! Pool state snapshots and the trait pools implement to be observed

use crate::errors::PoolReadError;

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Point-in-time view of a resource pool
///
/// # Examples
///
/// ```
/// use esox_pool_exporter::PoolSnapshot;
///
/// let snapshot = PoolSnapshot::from_counts(2, 3, 1, 1, 0);
/// assert_eq!(snapshot.size, 2);
/// assert_eq!(snapshot.spare_resource_capacity, 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolSnapshot {
    /// Configured minimum pool size
    pub min: usize,

    /// Configured maximum pool size
    pub max: usize,

    /// Resources currently allocated (idle + borrowed)
    pub size: usize,

    /// Idle resources that can be handed out
    pub available: usize,

    /// Resources currently held by callers
    pub borrowed: usize,

    /// Callers waiting for a resource
    pub pending: usize,

    /// Resources that could still be created before reaching `max`
    pub spare_resource_capacity: usize,
}

impl PoolSnapshot {
    /// Build a snapshot from the counts most pools track directly
    ///
    /// `size` is `available + borrowed` and the spare capacity is whatever is
    /// left up to `max`.
    pub fn from_counts(min: usize, max: usize, available: usize, borrowed: usize, pending: usize) -> Self {
        let size = available + borrowed;
        Self {
            min,
            max,
            size,
            available,
            borrowed,
            pending,
            spare_resource_capacity: max.saturating_sub(size),
        }
    }

    /// Value of a single field
    pub fn get(&self, field: PoolField) -> usize {
        match field {
            PoolField::Min => self.min,
            PoolField::Max => self.max,
            PoolField::Size => self.size,
            PoolField::SpareResourceCapacity => self.spare_resource_capacity,
            PoolField::Available => self.available,
            PoolField::Borrowed => self.borrowed,
            PoolField::Pending => self.pending,
        }
    }
}

/// The seven values published for every pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolField {
    Min,
    Max,
    Size,
    SpareResourceCapacity,
    Available,
    Borrowed,
    Pending,
}

impl PoolField {
    /// All fields, in publishing order
    pub const ALL: [PoolField; 7] = [
        PoolField::Min,
        PoolField::Max,
        PoolField::Size,
        PoolField::SpareResourceCapacity,
        PoolField::Available,
        PoolField::Borrowed,
        PoolField::Pending,
    ];

    /// Position of the field in [`PoolField::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Metric name used for this field in per-field mode, without prefix
    pub fn default_name(self) -> &'static str {
        match self {
            PoolField::Min => "min_total",
            PoolField::Max => "max_total",
            PoolField::Size => "size_total",
            PoolField::SpareResourceCapacity => "spare_resource_capacity_total",
            PoolField::Available => "available_total",
            PoolField::Borrowed => "borrowed_total",
            PoolField::Pending => "pending_total",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            PoolField::Min => "min size of the pool",
            PoolField::Max => "max size of the pool",
            PoolField::Size => "number of resources that are currently acquired",
            PoolField::SpareResourceCapacity => {
                "number of resources the pool could create before hitting any limits"
            }
            PoolField::Available => "number of unused resources in the pool",
            PoolField::Borrowed => "number of resources that are currently acquired by userland code",
            PoolField::Pending => "number of callers waiting to acquire a resource",
        }
    }

    /// Value of the `type` label in labelled mode
    pub fn type_label(self) -> &'static str {
        match self {
            PoolField::Min => "min",
            PoolField::Max => "max",
            PoolField::Size => "acquired",
            PoolField::SpareResourceCapacity => "spare_capacity",
            PoolField::Available => "available",
            PoolField::Borrowed => "borrowed",
            PoolField::Pending => "pending",
        }
    }
}

impl fmt::Display for PoolField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_label())
    }
}

/// A pool whose state can be sampled
///
/// Reads are expected to be in-memory and non-blocking. An error is handed
/// back to whoever triggered the sample.
pub trait ObservablePool {
    fn snapshot(&self) -> Result<PoolSnapshot, PoolReadError>;
}

/// A fixed snapshot observes as a pool that never changes
impl ObservablePool for PoolSnapshot {
    fn snapshot(&self) -> Result<PoolSnapshot, PoolReadError> {
        Ok(*self)
    }
}

impl<P: ObservablePool + ?Sized> ObservablePool for Arc<P> {
    fn snapshot(&self) -> Result<PoolSnapshot, PoolReadError> {
        (**self).snapshot()
    }
}

/// Shared pool state the owner of a pool pushes updates into
///
/// # Examples
///
/// ```
/// use esox_pool_exporter::{ObservablePool, PoolSnapshot, PoolStateCell};
///
/// let state = PoolStateCell::new(PoolSnapshot::from_counts(1, 5, 1, 0, 0));
/// state.update(|s| {
///     s.available -= 1;
///     s.borrowed += 1;
/// });
///
/// assert_eq!(state.snapshot().unwrap().borrowed, 1);
/// ```
#[derive(Debug, Default)]
pub struct PoolStateCell {
    state: RwLock<PoolSnapshot>,
}

impl PoolStateCell {
    pub fn new(initial: PoolSnapshot) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    /// Replace the whole state
    pub fn set(&self, snapshot: PoolSnapshot) {
        *self.state.write() = snapshot;
    }

    /// Modify the state in place
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut PoolSnapshot),
    {
        let mut state = self.state.write();
        f(&mut *state);
    }

    pub fn get(&self) -> PoolSnapshot {
        *self.state.read()
    }
}

impl ObservablePool for PoolStateCell {
    fn snapshot(&self) -> Result<PoolSnapshot, PoolReadError> {
        Ok(self.get())
    }
}

/// Pool backed by a closure, for adapting pools from other crates
pub struct FnPool<F> {
    read: F,
}

impl<F> ObservablePool for FnPool<F>
where
    F: Fn() -> Result<PoolSnapshot, PoolReadError>,
{
    fn snapshot(&self) -> Result<PoolSnapshot, PoolReadError> {
        (self.read)()
    }
}

impl<F> fmt::Debug for FnPool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPool").finish_non_exhaustive()
    }
}

/// Wrap a closure as an [`ObservablePool`]
///
/// # Examples
///
/// ```
/// use esox_pool_exporter::{pool_fn, ObservablePool, PoolSnapshot};
///
/// let pool = pool_fn(|| Ok(PoolSnapshot::from_counts(0, 10, 4, 2, 0)));
/// assert_eq!(pool.snapshot().unwrap().size, 6);
/// ```
pub fn pool_fn<F>(read: F) -> FnPool<F>
where
    F: Fn() -> Result<PoolSnapshot, PoolReadError>,
{
    FnPool { read }
}
