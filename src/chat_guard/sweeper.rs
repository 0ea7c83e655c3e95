use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::ChatGuard;

/// Periodically evicts idle chat-guard state until `shutdown` flips to true
/// or its sender is dropped.
pub fn spawn_sweeper(guard: Arc<ChatGuard>, every: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(every);
        interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval_timer.tick() => {
                    let removed = guard.sweep(Instant::now()).await;
                    if removed > 0 {
                        debug!(removed, "Chat guard swept");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Chat guard sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::{sequential_ids, ResourceActor};
    use crate::app_system::ChatGuardSettings;
    use crate::clients::UserClient;
    use crate::domain::User;

    #[tokio::test]
    async fn stops_on_shutdown_signal() {
        let (actor, inner) = ResourceActor::<User>::new(4, sequential_ids("user"));
        tokio::spawn(actor.run());
        let guard = Arc::new(ChatGuard::new(&ChatGuardSettings::default(), UserClient::new(inner)).unwrap());
        let (tx, rx) = watch::channel(false);
        let handle = spawn_sweeper(guard, Duration::from_millis(10), rx);
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }
}
