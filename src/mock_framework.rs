//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_get`] or [`expect_action`] to assert behavior
//! and answer each request by hand. Hand-written actors are mocked with
//! [`create_mock_channel`] and a plain `match` on the request enum.

use tokio::sync::mpsc;

use crate::actor_framework::{Entity, ResourceClient, ResourceRequest, Response};

/// Creates a mock client and a receiver for asserting requests.
///
/// Nothing answers on its own: every request the client sends must be
/// received and answered by the test, which makes ordering and failure
/// injection deterministic.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Sender/receiver pair for a hand-written actor's request enum.
pub fn create_mock_channel<R>(buffer_size: usize) -> (mpsc::Sender<R>, mpsc::Receiver<R>) {
    mpsc::channel(buffer_size)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, Response<T::Id, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

pub async fn expect_list<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<Response<Vec<T>, T::Error>> {
    match receiver.recv().await {
        Some(ResourceRequest::List { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ShipperClient;
    use crate::domain::{ShipperProfile, ShipperProfileCreate};
    use crate::shipper_actor::{ShipperAction, ShipperError};

    #[tokio::test]
    async fn test_mock_client() {
        let (inner, mut receiver) = create_mock_client::<ShipperProfile>(10);
        let client = ShipperClient::new(inner);

        let create_task = tokio::spawn({
            let client = client.clone();
            async move {
                client
                    .create_shipper(ShipperProfileCreate {
                        user_id: "user_9".into(),
                        name: "Tuấn".into(),
                        max_active_orders: 3,
                        is_working: true,
                    })
                    .await
            }
        });
        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.user_id, "user_9");
        responder.send(Ok("user_9".to_string())).unwrap();
        assert_eq!(create_task.await.unwrap(), Ok("user_9".to_string()));

        let action_task = tokio::spawn(async move { client.set_working("user_9".into(), false).await });
        let (id, action, responder) = expect_action(&mut receiver).await.expect("Expected Action request");
        assert_eq!(id, "user_9");
        assert!(matches!(action, ShipperAction::SetWorking(false)));
        responder
            .send(Err(crate::actor_framework::FrameworkError::NotFound(id)))
            .unwrap();
        assert_eq!(action_task.await.unwrap(), Err(ShipperError::NotFound("user_9".into())));
    }
}
