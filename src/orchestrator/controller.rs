//! Refresh lifecycle controller.
//!
//! Owns periodic and on-demand dashboard reloads and emits events for the TUI.

use crate::dashboard::DashboardQueryFacade;
use crate::model::DashboardView;
use anyhow::Result;
use time::OffsetDateTime;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Refresh,
    Quit,
}

/// Events emitted back to UI layers.
#[derive(Debug, Clone)]
pub(crate) enum DashboardEvent {
    Refreshing,
    Refreshed {
        // Box to keep the event small; a ready view carries both recency lists.
        view: Box<DashboardView>,
        at: OffsetDateTime,
    },
}

fn start_refresh(
    facade: &DashboardQueryFacade,
    event_tx: &UnboundedSender<DashboardEvent>,
) -> JoinHandle<DashboardView> {
    let facade = facade.clone();
    let _ = event_tx.send(DashboardEvent::Refreshing);
    tokio::spawn(async move { facade.assemble().await })
}

/// Reload the dashboard every `refresh_every` and on [`UiCommand::Refresh`].
///
/// Refreshes never overlap: a request that arrives while one is running is
/// queued and started once the running one completes.
pub(crate) async fn run_controller(
    facade: DashboardQueryFacade,
    refresh_every: Duration,
    event_tx: UnboundedSender<DashboardEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(refresh_every.max(Duration::from_millis(100)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight: Option<JoinHandle<DashboardView>> = None;
    let mut refresh_pending = false;

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Refresh) => {
                        if in_flight.is_some() {
                            refresh_pending = true;
                        } else {
                            in_flight = Some(start_refresh(&facade, &event_tx));
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        if let Some(h) = in_flight.take() {
                            h.abort();
                        }
                        break Ok(());
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(h) = in_flight.as_mut() {
                    return Some(h.await);
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    in_flight = None;
                    let view = match join_res {
                        Ok(view) => view,
                        Err(e) => {
                            tracing::error!(error = %e, "refresh task failed");
                            DashboardView::Degraded {
                                error: format!("Error loading dashboard: refresh task failed: {e}"),
                            }
                        }
                    };
                    let _ = event_tx.send(DashboardEvent::Refreshed {
                        view: Box::new(view),
                        at: OffsetDateTime::now_utc(),
                    });
                    if refresh_pending {
                        refresh_pending = false;
                        in_flight = Some(start_refresh(&facade, &event_tx));
                    }
                }
            }
            _ = ticker.tick() => {
                if in_flight.is_none() {
                    tracing::trace!("periodic refresh");
                    in_flight = Some(start_refresh(&facade, &event_tx));
                }
            }
        }
    };

    res
}
