//! Fire-and-forget gamification points.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use aula_client::{BackendClient, PointsAward};

/// Awards points after a successful generation. The call runs on its own
/// task; a failure is logged and never surfaced as an error, a success pushes
/// a toast notice on the channel.
pub struct PointsNotifier {
    client: Arc<dyn BackendClient>,
    notice_tx: mpsc::UnboundedSender<String>,
}

impl PointsNotifier {
    pub fn new(client: Arc<dyn BackendClient>, notice_tx: mpsc::UnboundedSender<String>) -> Self {
        Self { client, notice_tx }
    }

    pub fn notify(&self, email: &str, points: u32, reason: &str) -> JoinHandle<()> {
        let client = self.client.clone();
        let notice_tx = self.notice_tx.clone();
        let reason = reason.to_string();
        let request = PointsAward {
            email: email.to_string(),
            points,
            reason: reason.clone(),
        };

        tokio::spawn(async move {
            match client.award_points(request).await {
                Ok(()) => {
                    let _ = notice_tx.send(format!("+{points} points! {reason}"));
                }
                Err(err) => {
                    log::warn!("points award failed: {err:?}");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBackendClient;

    #[tokio::test]
    async fn test_success_pushes_a_toast() {
        let client = Arc::new(MockBackendClient::allowing());
        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
        let notifier = PointsNotifier::new(client.clone(), notice_tx);

        notifier
            .notify("ana@colegio.edu", 10, "lesson plan generated")
            .await
            .unwrap();

        let toast = notice_rx.recv().await.unwrap();
        assert!(toast.contains("+10 points"));
        assert_eq!(client.points_calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let client = Arc::new(MockBackendClient::unreachable());
        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
        let notifier = PointsNotifier::new(client, notice_tx);

        notifier
            .notify("ana@colegio.edu", 10, "lesson plan generated")
            .await
            .unwrap();

        // No toast, no error; the generation result is unaffected.
        assert!(notice_rx.try_recv().is_err());
    }
}
