//! Scoped privilege elevation.
//!
//! A [`PrivilegeElevator`] raises and lowers the privileges of the running
//! process. [`ElevationGuard`] pairs the two calls: privileges are raised on
//! construction and lowered when the guard is released or dropped, on every
//! exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use logging::trace_escalate;

use crate::PlatformError;

/// Raises and lowers process privileges.
pub trait PrivilegeElevator: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Raises privileges.
    fn acquire(&self) -> Result<(), PlatformError>;

    /// Restores the privileges held before [`acquire`](Self::acquire).
    fn release(&self) -> Result<(), PlatformError>;
}

impl<E: PrivilegeElevator + ?Sized> PrivilegeElevator for Arc<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn acquire(&self) -> Result<(), PlatformError> {
        (**self).acquire()
    }

    fn release(&self) -> Result<(), PlatformError> {
        (**self).release()
    }
}

/// Holds elevated privileges until released or dropped.
#[must_use = "privileges are lowered as soon as the guard is dropped"]
pub struct ElevationGuard<'a, E: PrivilegeElevator + ?Sized> {
    elevator: &'a E,
    active: bool,
}

impl<'a, E: PrivilegeElevator + ?Sized> ElevationGuard<'a, E> {
    /// Raises privileges through `elevator`.
    pub fn acquire(elevator: &'a E) -> Result<Self, PlatformError> {
        elevator.acquire()?;
        trace_escalate!("privileges raised via {}", elevator.name());
        Ok(Self {
            elevator,
            active: true,
        })
    }

    /// Lowers privileges, reporting any failure.
    pub fn release(mut self) -> Result<(), PlatformError> {
        self.active = false;
        trace_escalate!("privileges lowered via {}", self.elevator.name());
        self.elevator.release()
    }
}

impl<E: PrivilegeElevator + ?Sized> Drop for ElevationGuard<'_, E> {
    fn drop(&mut self) {
        if self.active {
            self.active = false;
            if let Err(error) = self.elevator.release() {
                tracing::error!("failed to lower privileges: {error}");
            }
        }
    }
}

/// Elevator modelled as a shared flag.
///
/// Pairs with providers that consult the same flag to bypass their access
/// checks, such as the in-memory descriptor table.
#[derive(Clone, Debug, Default)]
pub struct FlagElevator {
    flag: Arc<AtomicBool>,
}

impl FlagElevator {
    /// Creates an elevator toggling `flag`.
    pub fn new(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// Whether privileges are currently raised.
    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl PrivilegeElevator for FlagElevator {
    fn name(&self) -> &'static str {
        "flag"
    }

    fn acquire(&self) -> Result<(), PlatformError> {
        self.flag.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) -> Result<(), PlatformError> {
        self.flag.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Elevator for platforms without a supported mechanism.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnsupportedElevator;

impl PrivilegeElevator for UnsupportedElevator {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn acquire(&self) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn release(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}

#[cfg(unix)]
pub use self::unix::EffectiveUidElevator;

#[cfg(unix)]
mod unix {
    use std::sync::{Mutex, PoisonError};

    use nix::unistd::{Uid, seteuid};

    use crate::{PlatformError, PrivilegeElevator};

    /// Raises the effective uid to root.
    ///
    /// A process whose effective uid is already root elevates trivially. A
    /// process whose real uid is root (a set-uid or dropped-privilege setup)
    /// switches its effective uid to 0 and back. Anything else fails with
    /// [`PlatformError::NotPermitted`].
    #[derive(Debug, Default)]
    pub struct EffectiveUidElevator {
        saved: Mutex<Vec<Option<Uid>>>,
    }

    impl EffectiveUidElevator {
        /// Creates an elevator.
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl PrivilegeElevator for EffectiveUidElevator {
        fn name(&self) -> &'static str {
            "effective-uid"
        }

        fn acquire(&self) -> Result<(), PlatformError> {
            let mut saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
            let effective = Uid::effective();
            if effective.is_root() {
                saved.push(None);
                return Ok(());
            }

            let real = Uid::current();
            if !real.is_root() {
                return Err(PlatformError::NotPermitted {
                    real_uid: real.as_raw(),
                });
            }

            seteuid(Uid::from_raw(0)).map_err(|errno| PlatformError::os("raise effective uid", errno))?;
            saved.push(Some(effective));
            Ok(())
        }

        fn release(&self) -> Result<(), PlatformError> {
            let mut saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
            match saved.pop() {
                Some(Some(previous)) => seteuid(previous)
                    .map_err(|errno| PlatformError::os("restore effective uid", errno)),
                Some(None) | None => Ok(()),
            }
        }
    }
}
