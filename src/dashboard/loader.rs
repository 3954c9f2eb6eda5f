//! Fetches dashboard data so that only the latest request per session wins.

use std::{collections::HashMap, future::Future, sync::Mutex};

use tokio::sync::watch;

use crate::{Error, dashboard::DashboardData, date_range::DateInterval};

/// Somewhere dashboard data can be fetched from, e.g. the payments backend.
pub trait DashboardSource: Send + Sync {
    /// Fetch the dashboard data for `interval` on behalf of the user holding
    /// `token`.
    fn fetch(
        &self,
        token: &str,
        interval: &DateInterval,
    ) -> impl Future<Output = Result<DashboardData, Error>> + Send;
}

/// Loads dashboard data, cancelling a session's in-flight load when the same
/// session starts a new one.
///
/// Each session has a generation counter. Starting a load bumps the counter
/// and an in-flight load gives up as soon as it sees a newer generation.
pub struct DashboardLoader<S> {
    source: S,
    generations: Mutex<HashMap<String, watch::Sender<u64>>>,
}

impl<S: DashboardSource> DashboardLoader<S> {
    /// Create a loader that fetches from `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// Load the dashboard data for `interval`.
    ///
    /// Returns `Ok(None)` if another load for `session` started before this
    /// one finished.
    ///
    /// # Errors
    ///
    /// Returns any error from the source, or [Error::SessionLockError] if the
    /// session table is poisoned.
    pub async fn load(
        &self,
        session: &str,
        interval: &DateInterval,
    ) -> Result<Option<DashboardData>, Error> {
        let (generation, mut superseded) = self.begin(session)?;
        let guard = LoadGuard {
            loader: self,
            session,
            generation,
            finished: false,
        };

        let result = tokio::select! {
            biased;
            _ = wait_until_superseded(&mut superseded, generation) => None,
            result = self.source.fetch(session, interval) => Some(result),
        };

        guard.finish()?;

        match result {
            Some(result) => result.map(Some),
            None => {
                tracing::warn!("Dashboard load {generation} was superseded by a newer request.");
                Ok(None)
            }
        }
    }

}

impl<S> DashboardLoader<S> {
    fn begin(&self, session: &str) -> Result<(u64, watch::Receiver<u64>), Error> {
        let mut generations = self
            .generations
            .lock()
            .map_err(|_| Error::SessionLockError)?;

        match generations.get(session) {
            Some(sender) => {
                sender.send_modify(|generation| *generation += 1);
                let generation = *sender.borrow();
                Ok((generation, sender.subscribe()))
            }
            None => {
                let (sender, receiver) = watch::channel(0);
                generations.insert(session.to_owned(), sender);
                Ok((0, receiver))
            }
        }
    }

    /// Forget `session` if `generation` is still its latest load.
    fn finish(&self, session: &str, generation: u64) -> Result<(), Error> {
        let mut generations = self
            .generations
            .lock()
            .map_err(|_| Error::SessionLockError)?;

        let is_latest = generations
            .get(session)
            .is_some_and(|sender| *sender.borrow() == generation);

        if is_latest {
            generations.remove(session);
        }

        Ok(())
    }

    #[cfg(test)]
    fn active_sessions(&self) -> usize {
        self.generations.lock().map(|map| map.len()).unwrap_or(0)
    }
}

/// Forgets a load's session when the load ends, including when the load's
/// future is dropped part way through.
struct LoadGuard<'a, S> {
    loader: &'a DashboardLoader<S>,
    session: &'a str,
    generation: u64,
    finished: bool,
}

impl<S> LoadGuard<'_, S> {
    fn finish(mut self) -> Result<(), Error> {
        self.finished = true;
        self.loader.finish(self.session, self.generation)
    }
}

impl<S> Drop for LoadGuard<'_, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        tracing::debug!("Dashboard load {} was dropped before finishing.", self.generation);

        if let Err(error) = self.loader.finish(self.session, self.generation) {
            tracing::error!("Could not forget dashboard load {}: {error}", self.generation);
        }
    }
}

async fn wait_until_superseded(receiver: &mut watch::Receiver<u64>, generation: u64) {
    if receiver
        .wait_for(|current| *current != generation)
        .await
        .is_err()
    {
        // The session was forgotten, so nothing can supersede this load.
        std::future::pending::<()>().await;
    }
}
