//! HTTP status endpoint client and the poller that reconciles with it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashSet, time::Duration};

use crate::{
    entities::Phase,
    errors::SyncError,
    session::{
        SessionContext,
        notifier::{Notice, Severity},
    },
};

/// Player totals reported by the status endpoint.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GameStats {
    pub game_id: Option<String>,
    pub total_players: u32,
    pub active_players: u32,
    pub ai_players: u32,
    pub human_players: u32,
}

/// Body of `GET /api/game/auto/status`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusReport {
    #[serde(rename = "isAutoGameRunning")]
    pub auto_game_running: bool,
    pub can_start_game: bool,
    pub game_stats: GameStats,
    pub current_phase: Option<Phase>,
    pub is_game_over: bool,
    /// Name of the overall winner once the game is over.
    pub final_winner: Option<String>,
}

/// Client for the auto-play status endpoint.
#[derive(Clone, Debug)]
pub struct StatusClient {
    status_url: String,
    client: reqwest::Client,
}

impl StatusClient {
    /// Create a client for the given endpoint URL.
    pub fn new(status_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            status_url: status_url.into(),
            client,
        })
    }

    pub fn status_url(&self) -> &str {
        &self.status_url
    }

    /// Fetch the current server status
    pub async fn fetch(&self) -> Result<StatusReport> {
        let response = self
            .client
            .get(&self.status_url)
            .send()
            .await
            .context("Failed to send status request")?;

        if !response.status().is_success() {
            anyhow::bail!("Status request failed: {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse status response")
    }
}

/// Decides when to poll and folds reports into the session.
///
/// Each request is tagged with the generation it was started in. Cancelling
/// bumps the generation, so a report that lands after a close or reset is
/// dropped instead of touching fresh state.
#[derive(Debug, Default)]
pub struct StatusPoller {
    in_flight: bool,
    generation: u64,
    announced_winners: HashSet<String>,
}

impl StatusPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next poll slot. Returns the generation to tag the request
    /// with, or `None` while a request is still outstanding.
    pub fn begin(&mut self) -> Option<u64> {
        if self.in_flight {
            return None;
        }
        self.in_flight = true;
        Some(self.generation)
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Apply a status report.
    pub fn reconcile(&mut self, generation: u64, report: StatusReport, ctx: &mut SessionContext) {
        if !self.settle(generation) {
            return;
        }

        if ctx.projector.set_auto_game_running(report.auto_game_running) {
            let state = if report.auto_game_running {
                "running"
            } else {
                "stopped"
            };
            ctx.log
                .push(Severity::Info, format!("Auto game status synced: {state}"));
        }

        let total = report.game_stats.total_players as usize;
        if total > 0 && ctx.projector.set_reported_player_count(total) {
            log::debug!("Player count synced from status: {total}");
        }

        if let Some(winner) = report.final_winner
            && !self.announced_winners.contains(&winner)
        {
            let message = format!("Game over! Winner: {winner}");
            ctx.log.push(Severity::Success, message.clone());
            ctx.notifier.notify(Notice::new(Severity::Success, message));
            self.announced_winners.insert(winner);
        }
    }

    /// Record a failed poll. Failures never reach the user.
    pub fn poll_failed(&mut self, generation: u64, error: &SyncError) {
        if self.settle(generation) {
            log::warn!("{error}");
        }
    }

    /// Drop whatever request is outstanding.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.in_flight = false;
    }

    /// Cancel the outstanding request and forget announced winners.
    pub fn reset(&mut self) {
        self.cancel();
        self.announced_winners.clear();
    }

    fn settle(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            log::debug!(
                "Discarding status result from poll generation {generation} (current {})",
                self.generation
            );
            return false;
        }
        self.in_flight = false;
        true
    }
}
