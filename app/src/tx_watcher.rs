//! Background purchase watcher
//!
//! Ticks the purchase session so confirmed purchases expire on time, and
//! turns session transitions into notifications for whoever is listening
//! (the `mint` command, or the log when serving).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use cat8004::{Notice, PurchasePhase, PurchaseSession};
use minter_api::AppState;
use minter_core::{Network, TxHash};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// How often the session is ticked and inspected.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Waiting on a purchase gives up after this long.
pub const TIMEOUT: Duration = Duration::from_secs(40 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The wallet broadcast the transaction
    Broadcast,
    Confirmed,
    /// Rejected in the wallet
    Cancelled,
    Failed,
}

impl NotificationKind {
    /// No further notifications follow for this purchase
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Broadcast)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TxNotification {
    pub id: String,
    pub kind: NotificationKind,
    pub description: String,
    pub tx_hash: Option<TxHash>,
    pub explorer_url: Option<String>,
    pub timestamp: u64,
}

impl TxNotification {
    fn new(
        kind: NotificationKind,
        description: String,
        tx_hash: Option<&TxHash>,
        network: Network,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            description,
            explorer_url: tx_hash.map(|h| format!("{}/tx/{}", network.explorer_url(), h)),
            tx_hash: tx_hash.cloned(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }
}

/// Diffs successive session snapshots, per purchase attempt
#[derive(Debug, Default)]
pub struct SessionWatcher {
    last_attempt: u64,
    last_phase: Option<PurchasePhase>,
    last_notice: Option<Notice>,
}

impl SessionWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications for everything that changed since the last call
    pub fn observe(&mut self, session: &PurchaseSession, network: Network) -> Vec<TxNotification> {
        let mut out = Vec::new();

        // A new attempt starts from a clean slate, even if it already ended
        if session.attempt != self.last_attempt {
            self.last_attempt = session.attempt;
            self.last_phase = None;
            self.last_notice = None;
        }

        if self.last_phase.as_ref() != Some(&session.phase) {
            if let PurchasePhase::Confirming { units, tx_hash } = &session.phase {
                out.push(TxNotification::new(
                    NotificationKind::Broadcast,
                    format!("Minting {} units", units),
                    Some(tx_hash),
                    network,
                ));
            }
            self.last_phase = Some(session.phase.clone());
        }

        if session.notice != self.last_notice {
            if let Some(notice) = &session.notice {
                out.push(match notice {
                    Notice::Success { units, tx_hash } => TxNotification::new(
                        NotificationKind::Confirmed,
                        format!("Minted {} units", units),
                        Some(tx_hash),
                        network,
                    ),
                    Notice::Cancelled => TxNotification::new(
                        NotificationKind::Cancelled,
                        "Transaction cancelled in wallet".to_string(),
                        None,
                        network,
                    ),
                    Notice::Failed { reason, tx_hash } => TxNotification::new(
                        NotificationKind::Failed,
                        reason.clone(),
                        tx_hash.as_ref(),
                        network,
                    ),
                });
            }
            self.last_notice = session.notice.clone();
        }

        out
    }
}

/// Spawn the tick-and-notify loop. Runs until the process exits.
pub fn spawn_watcher(
    state: AppState,
    notifications: broadcast::Sender<TxNotification>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut watcher = SessionWatcher::new();
        loop {
            let config = state.config().await;
            let window = Duration::from_secs(config.sale.params.confirmed_display_secs);

            let events = {
                let mut session = state.session().lock().await;
                // Inspect before ticking so a Failed phase is seen before it clears
                let events = watcher.observe(&session, config.network);
                if session.tick(std::time::Instant::now(), window) {
                    tracing::debug!("Purchase session returned to {}", session.phase.as_str());
                }
                events
            };

            for event in events {
                match event.kind {
                    NotificationKind::Failed => {
                        tracing::warn!("Purchase failed: {}", event.description)
                    }
                    _ => tracing::info!("{}", event.description),
                }
                // No receivers is fine while serving
                let _ = notifications.send(event);
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
}

/// Wait for the current purchase to reach a terminal notification
pub async fn wait_for_outcome(
    receiver: &mut broadcast::Receiver<TxNotification>,
    on_event: impl Fn(&TxNotification),
) -> Option<TxNotification> {
    let wait = async {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    on_event(&event);
                    if event.kind.is_terminal() {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Watcher lagged by {} notifications", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    };

    tokio::time::timeout(TIMEOUT, wait).await.ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cat8004::Confirmation;
    use minter_core::{SaleParams, TxError};

    fn hash() -> TxHash {
        TxHash::new(format!("0x{}", "ab".repeat(32)))
    }

    #[test]
    fn test_broadcast_then_failure() {
        let sale = SaleParams::default();
        let mut session = PurchaseSession::new(&sale);
        let mut watcher = SessionWatcher::new();
        assert!(watcher.observe(&session, Network::Base).is_empty());

        session.mark_submitted(1000).unwrap();
        assert!(watcher.observe(&session, Network::Base).is_empty());

        session.record_submission(Ok(hash())).unwrap();
        let events = watcher.observe(&session, Network::Base);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, NotificationKind::Broadcast);
        assert_eq!(
            events[0].explorer_url.as_deref(),
            Some(format!("https://basescan.org/tx/{}", hash()).as_str())
        );

        session
            .record_confirmation(
                Confirmation::Failed {
                    tx_hash: hash(),
                    reason: "Transaction reverted".to_string(),
                },
                sale.default_total_units,
                std::time::Instant::now(),
            )
            .unwrap();
        let events = watcher.observe(&session, Network::Base);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, NotificationKind::Failed);
        assert!(events[0].kind.is_terminal());

        // Nothing new on an unchanged session
        assert!(watcher.observe(&session, Network::Base).is_empty());
    }

    #[test]
    fn test_repeated_cancellations_each_notify() {
        let sale = SaleParams::default();
        let mut session = PurchaseSession::new(&sale);
        let mut watcher = SessionWatcher::new();

        for _ in 0..2 {
            session.mark_submitted(10).unwrap();
            watcher.observe(&session, Network::Base);
            session.record_submission(Err(TxError::Rejected)).unwrap();
            let events = watcher.observe(&session, Network::Base);
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].kind, NotificationKind::Cancelled);
            assert_eq!(events[0].tx_hash, None);
        }
    }

    #[test]
    fn test_attempts_finished_between_polls_still_notify() {
        let sale = SaleParams::default();
        let mut session = PurchaseSession::new(&sale);
        let mut watcher = SessionWatcher::new();
        assert!(watcher.observe(&session, Network::Base).is_empty());

        // Whole attempts complete without the watcher seeing Submitted
        for _ in 0..2 {
            session.mark_submitted(10).unwrap();
            session.record_submission(Err(TxError::Rejected)).unwrap();
            let events = watcher.observe(&session, Network::Base);
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].kind, NotificationKind::Cancelled);
        }

        for _ in 0..2 {
            session.tick(std::time::Instant::now(), std::time::Duration::ZERO);
            session.mark_submitted(10).unwrap();
            session
                .record_submission(Err(TxError::SubmissionFailed {
                    message: "insufficient funds".to_string(),
                }))
                .unwrap();
            let events = watcher.observe(&session, Network::Base);
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].kind, NotificationKind::Failed);
        }
        assert!(watcher.observe(&session, Network::Base).is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_outcome_skips_broadcast() {
        let (sender, mut receiver) = broadcast::channel(8);
        let broadcast_event = TxNotification::new(
            NotificationKind::Broadcast,
            "b".to_string(),
            Some(&hash()),
            Network::Base,
        );
        let cancelled = TxNotification::new(
            NotificationKind::Cancelled,
            "c".to_string(),
            None,
            Network::Base,
        );
        sender.send(broadcast_event).unwrap();
        sender.send(cancelled).unwrap();

        let seen = std::sync::Mutex::new(Vec::new());
        let outcome =
            wait_for_outcome(&mut receiver, |e| seen.lock().unwrap().push(e.kind)).await;
        assert_eq!(outcome.map(|e| e.kind), Some(NotificationKind::Cancelled));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
