//! Scoped release of partially acquired resources.

/// Holds an acquired resource and releases it on drop unless committed.
///
/// Guards for successive acquisition steps are bound in acquisition order,
/// so an early return drops (and releases) them in reverse order.
pub(crate) struct Rollback<T, F>
where
    F: FnOnce(T),
{
    armed: Option<(T, F)>,
}

impl<T, F> Rollback<T, F>
where
    F: FnOnce(T),
{
    pub(crate) fn new(value: T, release: F) -> Self {
        Self {
            armed: Some((value, release)),
        }
    }

    pub(crate) fn get(&self) -> &T {
        match &self.armed {
            Some((value, _)) => value,
            None => unreachable!("rollback guard is only disarmed by commit"),
        }
    }

    /// Keep the resource; nothing is released.
    pub(crate) fn commit(mut self) -> T {
        match self.armed.take() {
            Some((value, _)) => value,
            None => unreachable!("rollback guard is only disarmed by commit"),
        }
    }
}

impl<T, F> Drop for Rollback<T, F>
where
    F: FnOnce(T),
{
    fn drop(&mut self) {
        if let Some((value, release)) = self.armed.take() {
            release(value);
        }
    }
}
