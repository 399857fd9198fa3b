use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::engine::EngineCmd;
use crate::error::CatalogError;

use super::catalog::Catalog;
use super::index::Library;
use super::model::Album;

enum PollCmd {
    Refresh,
    Stop,
}

/// Handle to the background thread that keeps the library fresh.
pub struct CatalogPoller {
    tx: Sender<PollCmd>,
    join: Option<JoinHandle<()>>,
}

impl CatalogPoller {
    /// Ask for an immediate re-scan instead of waiting for the interval.
    pub fn refresh(&self) {
        let _ = self.tx.send(PollCmd::Refresh);
    }

    pub fn stop(mut self) {
        let _ = self.tx.send(PollCmd::Stop);
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

/// Fetch once right away, then every `interval` and whenever
/// [`CatalogPoller::refresh`] is called. Each result is forwarded to the
/// engine; a newer result simply replaces an older one.
pub fn spawn_poller<C>(
    mut catalog: C,
    interval: Duration,
    limit: usize,
    engine: Sender<EngineCmd>,
) -> CatalogPoller
where
    C: Catalog + 'static,
{
    let (tx, rx) = mpsc::channel::<PollCmd>();
    let join = thread::spawn(move || poll_loop(&mut catalog, interval, limit, &engine, &rx));
    CatalogPoller {
        tx,
        join: Some(join),
    }
}

fn poll_loop(
    catalog: &mut dyn Catalog,
    interval: Duration,
    limit: usize,
    engine: &Sender<EngineCmd>,
    rx: &Receiver<PollCmd>,
) {
    loop {
        let cmd = match fetch(catalog, limit) {
            Ok(library) => EngineCmd::LibraryUpdated(library),
            Err(e) => {
                warn!(error = %e, "catalog fetch failed; retrying on next poll");
                EngineCmd::LibraryUnavailable(e.to_string())
            }
        };
        if engine.send(cmd).is_err() {
            debug!("engine gone, stopping catalog poller");
            return;
        }

        match rx.recv_timeout(interval) {
            Ok(PollCmd::Refresh) | Err(RecvTimeoutError::Timeout) => continue,
            Ok(PollCmd::Stop) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

pub(super) fn fetch(catalog: &mut dyn Catalog, limit: usize) -> Result<Library, CatalogError> {
    catalog.scan()?;
    let tracks = catalog.list(limit)?;
    let albums = catalog.albums()?.into_iter().map(Album::from).collect();
    Ok(Library::new(tracks, albums))
}
