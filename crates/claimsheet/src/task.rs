//! One-shot background work

use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};

/// A named worker thread that produces one result.
///
/// There is no cancellation or timeout: the task runs until it returns or
/// panics.
#[derive(Debug)]
pub struct BackgroundTask<T> {
    name: String,
    handle: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Start `work` on a new thread
    pub fn spawn<F>(name: impl Into<String>, work: F) -> Result<Self>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let name = name.into();
        let handle = thread::Builder::new().name(name.clone()).spawn(work)?;
        log::debug!("started background task '{}'", name);
        Ok(Self { name, handle })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the work has returned or panicked
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the result. A panic comes back as [`Error::TaskPanicked`].
    pub fn join(self) -> Result<T> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                log::warn!("background task '{}' panicked", self.name);
                Err(Error::TaskPanicked(self.name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_is_returned() {
        let task = BackgroundTask::spawn("sum", || Ok((1..=10).sum::<u32>())).unwrap();
        assert_eq!(task.name(), "sum");
        assert_eq!(task.join().unwrap(), 55);
    }

    #[test]
    fn test_error_is_returned() {
        let task = BackgroundTask::<()>::spawn("fail", || {
            Err(Error::UnsupportedFormat("csv".into()))
        })
        .unwrap();
        assert!(matches!(task.join(), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_panic_is_reported() {
        let task = BackgroundTask::<()>::spawn("boom", || panic!("boom")).unwrap();
        assert!(matches!(task.join(), Err(Error::TaskPanicked(name)) if name == "boom"));
    }
}
