//! Initialization progress events.
//!
//! Long-running work (index load, Tier-1 preload, pool setup) reports
//! progress as [`LoadProgress`] events on a `tokio::sync::broadcast` channel.
//! Sending never blocks: subscribers that fall behind miss events
//! (`RecvError::Lagged`) and a sender without subscribers drops them.
//!
//! ```ignore
//! let progress = ProgressSender::new();
//! let mut rx = progress.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = rx.recv().await {
//!         println!("{}", event);
//!     }
//! });
//! server.initialize_with_progress(progress).await?;
//! ```

use std::fmt;

use tokio::sync::broadcast;

/// Default channel capacity.
pub const DEFAULT_PROGRESS_CAPACITY: usize = 64;

/// Phase of server initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStage {
    LoadingIndex,
    LoadingTier1,
    ConfiguringPool,
    Ready,
    Failed,
}

impl LoadStage {
    /// Whether no further events follow this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LoadingIndex => "loading index",
            Self::LoadingTier1 => "loading tier 1",
            Self::ConfiguringPool => "configuring pool",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A single progress update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProgress {
    pub stage: LoadStage,
    /// Units completed within the stage (charts for Tier 1).
    pub current: usize,
    pub total: usize,
    /// Human-readable label.
    pub message: String,
}

impl LoadProgress {
    pub fn new(stage: LoadStage, current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            stage,
            current,
            total,
            message: message.into(),
        }
    }

    /// Completion ratio in `[0, 1]`; stages without units report 0 until terminal.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return if self.stage.is_terminal() { 1.0 } else { 0.0 };
        }
        (self.current as f64 / self.total as f64).min(1.0)
    }
}

impl fmt::Display for LoadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total > 0 {
            write!(f, "[{}] {}/{} {}", self.stage, self.current, self.total, self.message)
        } else {
            write!(f, "[{}] {}", self.stage, self.message)
        }
    }
}

/// Sending half of the progress channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: broadcast::Sender<LoadProgress>,
}

impl ProgressSender {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PROGRESS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LoadProgress> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish an event. Never blocks; dropped when nobody is listening.
    pub fn send(&self, event: LoadProgress) {
        let _ = self.tx.send(event);
    }

    pub fn stage(&self, stage: LoadStage, message: impl Into<String>) {
        self.send(LoadProgress::new(stage, 0, 0, message));
    }
}

impl Default for ProgressSender {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_subscribers_is_silent() {
        let progress = ProgressSender::new();
        assert_eq!(progress.subscriber_count(), 0);
        progress.stage(LoadStage::LoadingIndex, "index");
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let progress = ProgressSender::new();
        let mut rx = progress.subscribe();

        progress.stage(LoadStage::LoadingIndex, "index");
        progress.send(LoadProgress::new(LoadStage::LoadingTier1, 5, 10, "batch"));
        progress.stage(LoadStage::Ready, "done");

        assert_eq!(rx.recv().await.unwrap().stage, LoadStage::LoadingIndex);
        let tier1 = rx.recv().await.unwrap();
        assert_eq!((tier1.current, tier1.total), (5, 10));
        assert!(rx.recv().await.unwrap().stage.is_terminal());
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags_instead_of_blocking() {
        let progress = ProgressSender::with_capacity(2);
        let mut rx = progress.subscribe();

        for i in 0..5 {
            progress.send(LoadProgress::new(LoadStage::LoadingTier1, i, 5, "batch"));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert_eq!(rx.recv().await.unwrap().current, 3);
    }

    #[test]
    fn test_fraction() {
        assert_eq!(LoadProgress::new(LoadStage::LoadingTier1, 5, 10, "").fraction(), 0.5);
        assert_eq!(LoadProgress::new(LoadStage::LoadingIndex, 0, 0, "").fraction(), 0.0);
        assert_eq!(LoadProgress::new(LoadStage::Ready, 0, 0, "").fraction(), 1.0);
    }

    #[test]
    fn test_display() {
        let event = LoadProgress::new(LoadStage::LoadingTier1, 2, 4, "overview");
        assert_eq!(event.to_string(), "[loading tier 1] 2/4 overview");
        assert_eq!(
            LoadProgress::new(LoadStage::Ready, 0, 0, "ok").to_string(),
            "[ready] ok"
        );
    }
}
