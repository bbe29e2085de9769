use std::time::Duration;

use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::time::{sleep, Instant};

use super::cadence::{remaining_sleep, DisplayCadence};
use super::error::SchedulerError;
use crate::panel::{DisplayError, Panel};
use crate::render::TrajectoryRenderer;
use crate::source::PositionSource;
use crate::tracker::SampleStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    FetchFailed,
    FetchSucceeded,
    Rendering,
    Displaying,
    Sleeping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    FetchFailed,
    Sampled { displayed: bool },
    DisplayFailed,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub sampling_interval: Duration,
    pub display_refresh_divisor: u64,
    /// Zero disables the limit.
    pub max_display_failures: u32,
}

/// Drives fetch, store, render and display on a fixed sampling cadence.
pub struct AcquisitionScheduler<S, P> {
    source: S,
    panel: P,
    renderer: TrajectoryRenderer,
    store: SampleStore,
    cadence: DisplayCadence,
    sampling_interval: Duration,
    max_display_failures: u32,
    display_failures: u32,
    fetch_failures: u32,
    last_display_error: Option<DisplayError>,
    state: CycleState,
}

impl<S, P> AcquisitionScheduler<S, P>
where
    S: PositionSource,
    P: Panel,
{
    pub fn new(
        source: S,
        panel: P,
        renderer: TrajectoryRenderer,
        store: SampleStore,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            source,
            panel,
            renderer,
            store,
            cadence: DisplayCadence::new(settings.display_refresh_divisor),
            sampling_interval: settings.sampling_interval,
            max_display_failures: settings.max_display_failures,
            display_failures: 0,
            fetch_failures: 0,
            last_display_error: None,
            state: CycleState::Idle,
        }
    }

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    pub fn into_panel(self) -> P {
        self.panel
    }

    /// Runs cycles until `stop` fires (or its sender is dropped). The stop
    /// signal is only observed between cycles, never mid-fetch or
    /// mid-refresh.
    ///
    /// A failed fetch starts the next cycle at once, without sleeping, so a
    /// source that fails instantly (e.g. DNS while offline) is retried as
    /// fast as it fails. Only the first failure of a run of failures is
    /// logged at `warn`.
    pub async fn run(&mut self, mut stop: oneshot::Receiver<()>) -> Result<(), SchedulerError> {
        log::info!(
            "Sampling every {:?}, refreshing panel every {} sample(s), marker every {} sample(s)",
            self.sampling_interval,
            self.cadence.divisor(),
            self.renderer.intervals_per_marker()
        );

        loop {
            if stop_requested(&mut stop) {
                break;
            }

            let started = Instant::now();
            let outcome = self.run_cycle().await;

            if self.max_display_failures > 0 && self.display_failures >= self.max_display_failures {
                let failures = self.display_failures;
                if let Some(source) = self.last_display_error.take() {
                    return Err(SchedulerError::Display { failures, source });
                }
            }

            if outcome == CycleOutcome::FetchFailed {
                self.transition(CycleState::Idle);
                continue;
            }

            let pause = remaining_sleep(self.sampling_interval, started.elapsed());
            self.transition(CycleState::Sleeping);
            let stopped = tokio::select! {
                _ = sleep(pause) => false,
                _ = &mut stop => true,
            };
            self.transition(CycleState::Idle);
            if stopped {
                break;
            }
        }

        log::info!(
            "Acquisition stopped ({} samples stored, {} fetched)",
            self.store.len(),
            self.cadence.successes()
        );
        Ok(())
    }

    /// One pass of fetch, store and, on display cycles, render and refresh.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.transition(CycleState::Fetching);
        let fix = match self.source.fetch().await {
            Ok(fix) => fix,
            Err(e) => {
                self.fetch_failures += 1;
                if self.fetch_failures == 1 {
                    log::warn!("Position fetch failed, retrying: {}", e);
                } else {
                    log::debug!("Position fetch failed ({} in a row): {}", self.fetch_failures, e);
                }
                self.transition(CycleState::FetchFailed);
                return CycleOutcome::FetchFailed;
            }
        };
        self.transition(CycleState::FetchSucceeded);
        if self.fetch_failures > 0 {
            log::info!("Position fetch recovered after {} failure(s)", self.fetch_failures);
            self.fetch_failures = 0;
        }

        let sample = fix.into_sample(self.store.next_sequence());
        self.store.append(sample);
        log::info!(
            "Sample #{}: lat {:.4}, lon {:.4} ({} stored)",
            sample.sequence,
            sample.latitude,
            sample.longitude,
            self.store.len()
        );

        if !self.cadence.record_success() {
            return CycleOutcome::Sampled { displayed: false };
        }

        self.transition(CycleState::Rendering);
        let frame = self.renderer.render(&self.store.snapshot());

        self.transition(CycleState::Displaying);
        match self.panel.refresh(&frame) {
            Ok(()) => {
                self.display_failures = 0;
                self.last_display_error = None;
                CycleOutcome::Sampled { displayed: true }
            }
            Err(e) => {
                self.display_failures += 1;
                log::error!(
                    "Panel refresh failed ({} in a row): {}",
                    self.display_failures,
                    e
                );
                if let Err(e) = self.panel.sleep() {
                    log::error!("Failed to put panel to sleep: {}", e);
                }
                self.last_display_error = Some(e);
                CycleOutcome::DisplayFailed
            }
        }
    }

    fn transition(&mut self, next: CycleState) {
        log::debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn stop_requested(stop: &mut oneshot::Receiver<()>) -> bool {
    match stop.try_recv() {
        Ok(()) | Err(TryRecvError::Closed) => true,
        Err(TryRecvError::Empty) => false,
    }
}
