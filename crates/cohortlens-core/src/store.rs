//! Process-lifetime roster cache with a single-flight load.
//!
//! [`RosterStore`] owns the [`CorpusLoader`] and the loaded [`Roster`].
//! The first caller drives the load; everyone else, concurrent or later,
//! shares its result. The roster is never invalidated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, OnceCell};

use crate::corpus::CorpusLoader;
use crate::roster::Roster;

/// Cheaply cloneable handle to a shared roster cache.
#[derive(Clone)]
pub struct RosterStore {
    inner: Arc<Inner>,
}

struct Inner {
    loader: CorpusLoader,
    roster: OnceCell<Arc<Roster>>,
    /// Handed out by [`RosterStore::snapshot`] until the load settles.
    empty: Arc<Roster>,
    background_started: AtomicBool,
    loaded: watch::Sender<bool>,
}

impl RosterStore {
    pub fn new(loader: CorpusLoader) -> Self {
        let empty = Arc::new(Roster::new(loader.manifest().calendar()));
        let (loaded, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                loader,
                roster: OnceCell::new(),
                empty,
                background_started: AtomicBool::new(false),
                loaded,
            }),
        }
    }

    /// Load the corpus, or wait for the load already in flight.
    pub async fn load(&self) -> Arc<Roster> {
        self.inner
            .roster
            .get_or_init(|| async {
                let roster = Arc::new(self.inner.loader.load().await);
                self.inner.loaded.send_replace(true);
                roster
            })
            .await
            .clone()
    }

    /// Non-blocking read.
    ///
    /// Returns the loaded roster, or an empty one while the load has not
    /// finished. The first call before completion starts the load in the
    /// background on the current tokio runtime; callers re-read once
    /// [`subscribe`](Self::subscribe) reports the roster as loaded.
    pub fn snapshot(&self) -> Arc<Roster> {
        if let Some(roster) = self.inner.roster.get() {
            return roster.clone();
        }

        if !self.inner.background_started.swap(true, Ordering::AcqRel) {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let store = self.clone();
                    handle.spawn(async move {
                        store.load().await;
                    });
                }
                Err(_) => {
                    tracing::warn!("no tokio runtime, roster load not started");
                    self.inner
                        .background_started
                        .store(false, Ordering::Release);
                }
            }
        }

        self.inner.empty.clone()
    }

    /// Receiver that flips to `true` once the roster is loaded.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.loaded.subscribe()
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.roster.initialized()
    }
}
