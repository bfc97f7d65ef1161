//! Application object tying catalog, selection, cycler and scheduler together.
//!
//! The cycler sits behind a mutex and every tick runs under it on a
//! blocking thread, so a manual "announce now" and a scheduled tick can
//! never advance the cursor at the same time.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::cycler::{format_preview, AnnouncementCycler, TickOutcome};
use crate::error::{AnnouncerError, Result};
use crate::history::{format_recent, HistoryStore};
use crate::notifier::Notifier;
use crate::scheduler::Scheduler;
use crate::selector::{self, Selection};
use crate::speech::{Speaker, VoiceSettings};

fn lock(cycler: &Mutex<AnnouncementCycler>) -> MutexGuard<'_, AnnouncementCycler> {
    cycler.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ScavAnnouncer {
    config: Config,
    catalog: Catalog,
    cycler: Arc<Mutex<AnnouncementCycler>>,
    notifier: Arc<Notifier>,
    scheduler: Scheduler,
    rng: StdRng,
}

impl ScavAnnouncer {
    pub fn new(
        config: Config,
        catalog: Catalog,
        speaker: Arc<dyn Speaker>,
        history: HistoryStore,
        seed: Option<u64>,
    ) -> Self {
        let voice = VoiceSettings::from(&config.tts);
        let rng = match seed.or(config.selection.seed) {
            Some(seed) => {
                info!("Random selection seeded with {seed}");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_os_rng(),
        };
        let notifier = Arc::new(Notifier::new(config.feedback.notifications));

        Self {
            cycler: Arc::new(Mutex::new(AnnouncementCycler::new(speaker, voice, history))),
            config,
            catalog,
            notifier,
            scheduler: Scheduler::new(),
            rng,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn replace_selection(&self, selection: Selection) -> usize {
        let len = selection.len();
        lock(&self.cycler).replace_selection(selection);
        len
    }

    pub fn select_by_pages(&self, pages: &BTreeSet<u32>) -> usize {
        let n = self.replace_selection(selector::select_by_pages(&self.catalog, pages));
        info!("Selected {n} items from pages {pages:?}");
        n
    }

    pub fn select_by_ordinal_range(&self, start: u32, end: u32) -> Result<usize> {
        let selection = selector::select_by_ordinal_range(&self.catalog, start, end)?;
        let n = self.replace_selection(selection);
        info!("Selected {n} items from numbers {start} to {end}");
        Ok(n)
    }

    pub fn select_random(&mut self, count: usize) -> usize {
        let selection = selector::select_random(&self.catalog, count, &mut self.rng);
        let n = self.replace_selection(selection);
        info!("Randomly selected {n} items");
        n
    }

    pub fn selection_len(&self) -> usize {
        lock(&self.cycler).selection().len()
    }

    pub fn preview(&self) -> String {
        let cycler = lock(&self.cycler);
        let shown = cycler.peek_preview(self.config.preview.max_items);
        format_preview(shown, cycler.selection().len(), self.config.preview.max_item_chars)
    }

    pub fn recent_history(&self, limit: Option<usize>) -> String {
        let cycler = lock(&self.cycler);
        let n = limit.unwrap_or(self.config.history.recent_limit);
        format_recent(cycler.history().recent(n), self.config.preview.max_item_chars)
    }

    /// Announce the next item right away.
    pub async fn announce_now(&self) -> Result<TickOutcome> {
        run_tick(self.cycler.clone(), self.notifier.clone()).await
    }

    /// Announce immediately, then every `schedule.interval_hours`.
    pub async fn start(&mut self) -> Result<()> {
        if self.selection_len() == 0 {
            warn!("start: no items selected");
            return Err(AnnouncerError::NoSelection);
        }

        let cycler = self.cycler.clone();
        let notifier = self.notifier.clone();
        self.scheduler
            .start(self.config.schedule.interval(), move || {
                let cycler = cycler.clone();
                let notifier = notifier.clone();
                async move {
                    // Failures are already logged; the next tick retries.
                    let _ = run_tick(cycler, notifier).await;
                }
            })
            .await;
        Ok(())
    }

    pub async fn stop(&mut self) -> u32 {
        self.scheduler.stop().await
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn next_run(&self) -> Option<DateTime<Local>> {
        self.scheduler.next_run()
    }
}

async fn run_tick(
    cycler: Arc<Mutex<AnnouncementCycler>>,
    notifier: Arc<Notifier>,
) -> Result<TickOutcome> {
    let outcome = tokio::task::spawn_blocking(move || lock(&cycler).tick())
        .await
        .map_err(|e| {
            error!("Announcement task failed: {e}");
            AnnouncerError::TaskFailed(e.to_string())
        })??;
    notifier.announced(&outcome.item);
    Ok(outcome)
}
