//! Transient feedback banner and the timers that drive it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A user-visible result message with a fixed lifetime.
///
/// The banner is a value, not a widget: the task driving the UI decides how
/// to render it and clears it when the flow delivers `BannerCleared`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackBanner {
    pub message: String,
    pub visible_until: Instant,
}

impl FeedbackBanner {
    pub fn new(message: impl Into<String>, duration: Duration) -> Self {
        FeedbackBanner {
            message: message.into(),
            visible_until: Instant::now() + duration,
        }
    }
}

/// Pending banner/dismiss timers owned by a flow instance.
///
/// Replacing a timer aborts the previous one, and dropping the registry
/// aborts whatever is left, so no timer can fire into a disposed flow.
#[derive(Debug, Default)]
pub(crate) struct FlowTimers {
    banner: Option<JoinHandle<()>>,
    dismiss: Option<JoinHandle<()>>,
}

impl FlowTimers {
    pub(crate) fn set_banner(&mut self, handle: JoinHandle<()>) {
        if let Some(previous) = self.banner.replace(handle) {
            previous.abort();
        }
    }

    pub(crate) fn set_dismiss(&mut self, handle: JoinHandle<()>) {
        if let Some(previous) = self.dismiss.replace(handle) {
            previous.abort();
        }
    }

    pub(crate) fn cancel_all(&mut self) {
        if let Some(handle) = self.banner.take() {
            handle.abort();
        }
        if let Some(handle) = self.dismiss.take() {
            handle.abort();
        }
    }
}

impl Drop for FlowTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn banner_carries_its_expiry() {
        let banner = FeedbackBanner::new("Saved", Duration::from_secs(2));
        assert_eq!(banner.visible_until, Instant::now() + Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_a_timer_aborts_the_previous_one() {
        let (tx, mut rx) = mpsc::unbounded_channel::<&'static str>();
        let mut timers = FlowTimers::default();

        let first_tx = tx.clone();
        timers.set_banner(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = first_tx.send("first");
        }));
        let second_tx = tx.clone();
        timers.set_banner(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = second_tx.send("second");
        }));
        drop(tx);

        advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;

        assert_eq!(rx.recv().await, Some("second"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_stops_pending_timers() {
        let (tx, mut rx) = mpsc::unbounded_channel::<&'static str>();
        let mut timers = FlowTimers::default();

        let banner_tx = tx.clone();
        timers.set_banner(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = banner_tx.send("banner");
        }));
        let dismiss_tx = tx.clone();
        timers.set_dismiss(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = dismiss_tx.send("dismiss");
        }));
        drop(tx);

        timers.cancel_all();
        advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;

        assert_eq!(rx.recv().await, None);
    }
}
