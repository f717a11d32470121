/// Refresh loop driving the dashboard
///
/// One cycle: list containers, resolve every service, build a frame and draw
/// it. The loop then sleeps for whatever is left of the interval; a cycle
/// that overruns the interval is followed immediately by the next one, with
/// no catch-up. Cancellation is observed between cycles only, so a cycle in
/// flight always completes and is drawn.
///
/// The footer of a frame cannot include the time spent drawing that same
/// frame, so it shows the full time (drawing included) of the previous cycle.

use anyhow::Result;
use chrono::Local;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{CollectorConfig, ContainerRuntime, Registry, StatusCollector};
use crate::screens::dashboard::{CycleTiming, Dashboard, DashboardFrame};
use crate::utils::{format_millis, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

/// Delay before the next cycle; zero when the cycle overran the interval
pub fn next_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

pub struct App<R: ContainerRuntime> {
    runtime: R,
    registry: Registry,
    collector: StatusCollector,
    dashboard: Dashboard,
    interval: Duration,
    state: SchedulerState,
    cycles: u64,
    last_frame: Option<DashboardFrame>,
    last_timing: Option<CycleTiming>,
    cycle_time: Option<Duration>,
    runtime_reachable: bool,
}

impl<R: ContainerRuntime> App<R> {
    pub fn new(runtime: R, registry: Registry, settings: &Settings) -> Self {
        let collector = StatusCollector::new(CollectorConfig::for_interval(
            settings.interval,
            settings.list_timeout,
            settings.inspect_timeout,
        ));

        Self {
            runtime,
            registry,
            collector,
            dashboard: Dashboard::new(&settings.title),
            interval: settings.interval,
            state: SchedulerState::Running,
            cycles: 0,
            last_frame: None,
            last_timing: None,
            cycle_time: None,
            runtime_reachable: true,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of completed (drawn) cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn last_frame(&self) -> Option<&DashboardFrame> {
        self.last_frame.as_ref()
    }

    /// Timing shown in the footer of the last drawn frame
    pub fn last_timing(&self) -> Option<CycleTiming> {
        self.last_timing
    }

    /// Full duration of the last completed cycle, drawing included
    pub fn cycle_time(&self) -> Option<Duration> {
        self.cycle_time
    }

    /// Run on the real terminal until `cancel` fires
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        // Setup terminal
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        if let Err(err) = terminal.clear() {
            warn!(error = %err, "failed to clear terminal");
        }

        let result = self.run_loop(&mut terminal, &cancel).await;

        // Restore terminal
        execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;

        result
    }

    pub async fn run_loop<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            services = self.registry.len(),
            "monitor started"
        );

        while self.state == SchedulerState::Running {
            if cancel.is_cancelled() {
                self.state = SchedulerState::Stopped;
                break;
            }

            let elapsed = self.run_cycle(terminal).await?;

            let delay = next_delay(self.interval, elapsed);
            if delay.is_zero() {
                debug!(cycle = self.cycles, "cycle overran the interval, starting next immediately");
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => self.state = SchedulerState::Stopped,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(cycles = self.cycles, "monitor stopped");
        Ok(())
    }

    /// Poll, build and draw one frame; returns the full cycle duration
    async fn run_cycle<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<Duration> {
        let started = Instant::now();
        let report = self.collector.poll(&self.runtime, &self.registry).await;
        self.note_reachability(report.runtime_error.as_deref());

        let frame = DashboardFrame::build(&self.registry, &report, Local::now());
        // First frame has no previous cycle, so it shows the work done so far
        let timing = CycleTiming {
            elapsed: self.cycle_time.unwrap_or_else(|| started.elapsed()),
            interval: self.interval,
        };

        terminal.draw(|f| self.dashboard.render(f, &frame, &timing))?;
        let elapsed = started.elapsed();

        self.cycles += 1;
        debug!(
            cycle = self.cycles,
            elapsed = %format_millis(elapsed),
            healthy = frame.counts.healthy,
            starting = frame.counts.starting,
            stopped = frame.counts.stopped,
            "cycle rendered"
        );
        self.last_frame = Some(frame);
        self.last_timing = Some(timing);
        self.cycle_time = Some(elapsed);

        Ok(elapsed)
    }

    // Log only on transitions so an unreachable daemon does not flood the log
    fn note_reachability(&mut self, runtime_error: Option<&str>) {
        match (self.runtime_reachable, runtime_error) {
            (true, Some(err)) => {
                warn!(error = err, "container runtime unreachable, showing all services as stopped");
                self.runtime_reachable = false;
            }
            (false, None) => {
                info!("container runtime reachable again");
                self.runtime_reachable = true;
            }
            _ => {}
        }
    }
}
