//! Event synchronization engine
//!
//! One task owns the [`AttendanceReconciler`] and multiplexes everything
//! that mutates it: caller commands, store snapshots, the authentication
//! signal, and remote acknowledgments. Each message is handled to
//! completion before the next, so reconciler handler bodies never
//! interleave and need no locking.
//!
//! Remote mutations are spawned as separate tasks and resolve back into
//! the loop as acknowledgment messages; any number of commands and
//! snapshots may be processed between issuing a mutation and receiving its
//! ack. Failed mutations are not retried: the optimistic state is rolled
//! back and one destructive notification is delivered.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::services::notification::{Notification, NotificationService, NotificationVariant};
use crate::store::{CounterField, EventStore};
use crate::sync::intent::{AttendanceMutation, IntentHandle};
use crate::sync::projector::project;
use crate::sync::reconciler::{
    AckDisposition, AttendanceReconciler, DeleteDisposition, EventView,
};
use crate::utils::errors::{Result, SpartanvilleError};

enum EngineCommand {
    ToggleAttendance {
        event_id: String,
        desired: bool,
        reply: oneshot::Sender<Result<IntentHandle>>,
    },
    DeleteEvent {
        event_id: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Query {
        search: String,
        user_events_only: bool,
        reply: oneshot::Sender<Vec<EventView>>,
    },
    Shutdown,
}

enum AckMessage {
    Toggle { handle: IntentHandle, success: bool },
    Delete { event_id: String, success: bool },
}

/// Handle to the running synchronization engine.
///
/// Cloneable and cheap; all clones address the same engine task.
#[derive(Clone)]
pub struct SyncEngine {
    commands: mpsc::Sender<EngineCommand>,
    view: watch::Receiver<Vec<EventView>>,
}

impl SyncEngine {
    /// Subscribe to the store and start the engine task.
    ///
    /// `current_user` is the read-only authentication signal; while it is
    /// `None` every toggle and delete is rejected locally.
    pub async fn start(
        store: Arc<dyn EventStore>,
        notifications: NotificationService,
        current_user: watch::Receiver<Option<String>>,
    ) -> Result<Self> {
        let subscription = store.subscribe().await?;
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (view_tx, view_rx) = watch::channel(Vec::new());

        tokio::spawn(run_engine(
            store,
            notifications,
            subscription,
            cmd_rx,
            view_tx,
            current_user,
        ));

        info!("Sync engine started");
        Ok(Self {
            commands: cmd_tx,
            view: view_rx,
        })
    }

    /// Toggle the current user's attendance on an event.
    ///
    /// Resolves as soon as the optimistic update is applied; the remote
    /// outcome arrives later through the view and, on failure, a
    /// destructive notification.
    pub async fn toggle_attendance(&self, event_id: &str, desired: bool) -> Result<IntentHandle> {
        let (reply, response) = oneshot::channel();
        self.send(EngineCommand::ToggleAttendance {
            event_id: event_id.to_string(),
            desired,
            reply,
        })
        .await?;
        response
            .await
            .map_err(|_| SpartanvilleError::ServiceUnavailable("sync engine".to_string()))?
    }

    /// Delete an event. Resolves once the event is optimistically removed;
    /// a failed remote delete restores it and notifies.
    pub async fn delete_event(&self, event_id: &str) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(EngineCommand::DeleteEvent {
            event_id: event_id.to_string(),
            reply,
        })
        .await?;
        response
            .await
            .map_err(|_| SpartanvilleError::ServiceUnavailable("sync engine".to_string()))?
    }

    /// Project the reconciled event list through the search filter
    pub async fn query(&self, search: &str, user_events_only: bool) -> Result<Vec<EventView>> {
        let (reply, response) = oneshot::channel();
        self.send(EngineCommand::Query {
            search: search.to_string(),
            user_events_only,
            reply,
        })
        .await?;
        response
            .await
            .map_err(|_| SpartanvilleError::ServiceUnavailable("sync engine".to_string()))
    }

    /// Watch the reconciled, unfiltered event list
    pub fn view(&self) -> watch::Receiver<Vec<EventView>> {
        self.view.clone()
    }

    /// Stop the engine and release the store subscription
    pub async fn shutdown(&self) {
        let _ = self.commands.send(EngineCommand::Shutdown).await;
    }

    async fn send(&self, command: EngineCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SpartanvilleError::ServiceUnavailable("sync engine".to_string()))
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine").finish_non_exhaustive()
    }
}

async fn run_engine(
    store: Arc<dyn EventStore>,
    notifications: NotificationService,
    mut subscription: crate::store::Subscription,
    mut cmd_rx: mpsc::Receiver<EngineCommand>,
    view_tx: watch::Sender<Vec<EventView>>,
    mut user_rx: watch::Receiver<Option<String>>,
) {
    let mut reconciler = AttendanceReconciler::new();
    reconciler.set_current_user(user_rx.borrow().clone());

    let (ack_tx, mut ack_rx) = mpsc::channel::<AckMessage>(32);
    let mut feed_live = true;
    let mut user_live = true;

    loop {
        tokio::select! {
            maybe_cmd = cmd_rx.recv() => {
                match maybe_cmd {
                    Some(EngineCommand::ToggleAttendance { event_id, desired, reply }) => {
                        match reconciler.toggle_attendance(&event_id, desired) {
                            Ok((handle, mutation)) => {
                                spawn_toggle(store.clone(), ack_tx.clone(), handle.clone(), mutation);
                                let _ = reply.send(Ok(handle));
                            }
                            Err(e) => {
                                notify_rejection(&notifications, &e);
                                let _ = reply.send(Err(e));
                            }
                        }
                    }
                    Some(EngineCommand::DeleteEvent { event_id, reply }) => {
                        match reconciler.delete_event(&event_id) {
                            Ok(()) => {
                                spawn_delete(store.clone(), ack_tx.clone(), event_id);
                                let _ = reply.send(Ok(()));
                            }
                            Err(e) => {
                                notify_rejection(&notifications, &e);
                                let _ = reply.send(Err(e));
                            }
                        }
                    }
                    Some(EngineCommand::Query { search, user_events_only, reply }) => {
                        let _ = reply.send(project(&reconciler.view(), &search, user_events_only));
                    }
                    Some(EngineCommand::Shutdown) | None => break,
                }
            }
            Some(ack) = ack_rx.recv() => {
                match ack {
                    AckMessage::Toggle { handle, success } => {
                        match reconciler.on_remote_ack(&handle, success) {
                            AckDisposition::RolledBack => {
                                notifications.notify(Notification {
                                    title: "Attendance update failed".to_string(),
                                    description:
                                        "Your attendance change could not be saved. Please try again."
                                            .to_string(),
                                    variant: NotificationVariant::Destructive,
                                });
                            }
                            AckDisposition::Confirmed | AckDisposition::Stale => {}
                        }
                    }
                    AckMessage::Delete { event_id, success } => {
                        match reconciler.on_delete_ack(&event_id, success) {
                            DeleteDisposition::Restored => {
                                notifications.notify(Notification {
                                    title: "Delete failed".to_string(),
                                    description:
                                        "The event could not be deleted. Please try again."
                                            .to_string(),
                                    variant: NotificationVariant::Destructive,
                                });
                            }
                            DeleteDisposition::Completed | DeleteDisposition::Unknown => {}
                        }
                    }
                }
            }
            changed = user_rx.changed(), if user_live => {
                match changed {
                    Ok(()) => {
                        let user = user_rx.borrow_and_update().clone();
                        debug!(signed_in = user.is_some(), "Authentication signal changed");
                        reconciler.set_current_user(user);
                    }
                    Err(_) => user_live = false,
                }
            }
            maybe_snapshot = subscription.next(), if feed_live => {
                match maybe_snapshot {
                    Some(snapshot) => reconciler.apply_snapshot(snapshot),
                    None => {
                        warn!("Event store snapshot feed ended");
                        feed_live = false;
                    }
                }
            }
        }

        view_tx.send_replace(reconciler.view());
    }

    subscription.release();
    info!("Sync engine stopped");
}

fn spawn_toggle(
    store: Arc<dyn EventStore>,
    ack_tx: mpsc::Sender<AckMessage>,
    handle: IntentHandle,
    mutation: AttendanceMutation,
) {
    tokio::spawn(async move {
        let result = async {
            store
                .increment_field(&mutation.event_id, CounterField::AttendanceCount, mutation.delta)
                .await?;
            store
                .set_member(&mutation.event_id, &mutation.user_id, mutation.desired)
                .await
        }
        .await;

        let success = match result {
            Ok(()) => true,
            Err(e) => {
                error!(event_id = %mutation.event_id, error = %e, "Attendance mutation failed");
                false
            }
        };

        let _ = ack_tx.send(AckMessage::Toggle { handle, success }).await;
    });
}

fn spawn_delete(store: Arc<dyn EventStore>, ack_tx: mpsc::Sender<AckMessage>, event_id: String) {
    tokio::spawn(async move {
        let success = match store.delete(&event_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(event_id = %event_id, error = %e, "Event delete failed");
                false
            }
        };

        let _ = ack_tx.send(AckMessage::Delete { event_id, success }).await;
    });
}

fn notify_rejection(notifications: &NotificationService, error: &SpartanvilleError) {
    if let SpartanvilleError::Unauthorized = error {
        notifications.notify(Notification {
            title: "Sign in required".to_string(),
            description: "You need to be signed in to do that.".to_string(),
            variant: NotificationVariant::Destructive,
        });
    }
}
