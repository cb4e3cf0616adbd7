//! Continuous organization of newly created files.
//!
//! A [`WatchLoop`] subscribes to the base directory (non-recursive) and
//! hands every file created in it, or moved into it, to
//! [`FileOrganizer::organize_file`]. Filesystem events and stop requests
//! share one channel, so handling is strictly sequential: a stop request
//! is only seen once every event queued before it has been fully handled.

use crate::file_organizer::{FileOrganizer, is_organizable};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Lifecycle of a [`WatchLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Created, not subscribed yet.
    Idle,
    /// Subscribed and handling events.
    Watching,
    /// Stop requested, tearing the subscription down.
    Stopping,
    /// Terminal.
    Stopped,
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch loop can only be started once (state: {0:?})")]
    NotIdle(WatchState),
    #[error("cannot watch {}: {source}", path.display())]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("lost the subscription on {}: directory is gone", .0.display())]
    SubscriptionLost(PathBuf),
}

/// Moves performed during one watch session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchReport {
    pub moved: usize,
    pub failed: usize,
}

enum WatchSignal {
    Fs(notify::Result<Event>),
    Stop,
}

/// Cloneable control handle for a running [`WatchLoop`].
#[derive(Clone)]
pub struct WatchHandle {
    signals: Sender<WatchSignal>,
    state: Arc<Mutex<WatchState>>,
}

impl WatchHandle {
    /// Asks the loop to stop after the events already queued.
    pub fn stop(&self) {
        // A closed channel means the loop already returned.
        let _ = self.signals.send(WatchSignal::Stop);
    }

    pub fn state(&self) -> WatchState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Feeds creation events of one directory into a [`FileOrganizer`].
pub struct WatchLoop {
    organizer: FileOrganizer,
    signals: Sender<WatchSignal>,
    receiver: Receiver<WatchSignal>,
    state: Arc<Mutex<WatchState>>,
}

impl WatchLoop {
    pub fn new(organizer: FileOrganizer) -> Self {
        let (signals, receiver) = mpsc::channel();
        Self {
            organizer,
            signals,
            receiver,
            state: Arc::new(Mutex::new(WatchState::Idle)),
        }
    }

    pub fn handle(&self) -> WatchHandle {
        WatchHandle {
            signals: self.signals.clone(),
            state: Arc::clone(&self.state),
        }
    }

    pub fn state(&self) -> WatchState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: WatchState) {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    /// Subscribes and handles events until [`WatchHandle::stop`] is called.
    ///
    /// Blocks the calling thread, which performs every move. Per-file move
    /// failures are logged and counted; only a failed or lost subscription
    /// ends the loop with an error.
    pub fn run(&mut self) -> Result<WatchReport, WatchError> {
        let state = self.state();
        if state != WatchState::Idle {
            return Err(WatchError::NotIdle(state));
        }

        let base = self.organizer.base_path().to_path_buf();
        let mut watcher = match self.subscribe(&base) {
            Ok(watcher) => watcher,
            Err(e) => {
                error!("{}", e);
                self.set_state(WatchState::Stopped);
                return Err(e);
            }
        };
        self.set_state(WatchState::Watching);
        info!("Watching directory: {}", base.display());

        let mut report = WatchReport::default();
        let mut result = Ok(());

        while let Ok(signal) = self.receiver.recv() {
            match signal {
                WatchSignal::Stop => break,
                WatchSignal::Fs(Ok(event)) => {
                    if matches!(event.kind, EventKind::Remove(_)) && !base.is_dir() {
                        result = Err(WatchError::SubscriptionLost(base.clone()));
                        break;
                    }
                    self.handle_event(&event, &mut report);
                }
                WatchSignal::Fs(Err(e)) => {
                    if !base.is_dir() {
                        result = Err(WatchError::SubscriptionLost(base.clone()));
                        break;
                    }
                    warn!("Watcher error: {}", e);
                }
            }
        }

        self.set_state(WatchState::Stopping);
        if let Err(e) = watcher.unwatch(&base) {
            debug!("Unwatch failed: {}", e);
        }
        drop(watcher);
        self.set_state(WatchState::Stopped);

        match result {
            Ok(()) => {
                info!(
                    moved = report.moved,
                    failed = report.failed,
                    "Stopped watching directory"
                );
                Ok(report)
            }
            Err(e) => {
                error!("{}", e);
                Err(e)
            }
        }
    }

    fn subscribe(&self, base: &Path) -> Result<RecommendedWatcher, WatchError> {
        let subscribe_err = |source| WatchError::Subscribe {
            path: base.to_path_buf(),
            source,
        };

        let signals = self.signals.clone();
        let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
            let _ = signals.send(WatchSignal::Fs(event));
        })
        .map_err(subscribe_err)?;

        watcher
            .watch(base, RecursiveMode::NonRecursive)
            .map_err(subscribe_err)?;
        Ok(watcher)
    }

    fn handle_event(&self, event: &Event, report: &mut WatchReport) {
        if !is_arrival(&event.kind) {
            return;
        }

        for path in &event.paths {
            if path.parent() != Some(self.organizer.base_path()) {
                continue;
            }
            // Folders (category folders included), dangling links and
            // entries that vanished already.
            if !is_organizable(path) {
                debug!("Not a file, left alone: {}", path.display());
                continue;
            }
            if !self.organizer.filters().should_include(path) {
                debug!("Skipped by filter rules: {}", path.display());
                continue;
            }

            if self.organizer.organize_file(path).is_success() {
                report.moved += 1;
            } else {
                report.failed += 1;
            }
        }
    }
}

/// A new entry appeared in the watched directory.
///
/// Files renamed into it count too. Moving a file out only reports its old
/// path (`RenameMode::From`), so organized files are never seen again.
fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any))
    )
}
