use tokio::sync::mpsc;

use crate::assignment::AssignmentError;
use crate::domain::AssignmentRecord;
use crate::messages::AssignmentRequest;

#[derive(Clone)]
pub struct AssignmentClient {
    sender: mpsc::Sender<AssignmentRequest>,
}

impl AssignmentClient {
    pub fn new(sender: mpsc::Sender<AssignmentRequest>) -> Self {
        Self { sender }
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(AssignmentRequest::Shutdown).await;
    }
}

client_method!(AssignmentClient => fn assign_order(order_id: String) -> Option<String> as AssignmentRequest::AssignOrder, Error = AssignmentError);
client_method!(AssignmentClient => fn confirm_pickup(order_id: String, shipper_id: String) -> bool as AssignmentRequest::ConfirmPickup, Error = AssignmentError);
client_method!(AssignmentClient => fn reject_assignment(order_id: String, shipper_id: String, reason: String) -> Option<String> as AssignmentRequest::RejectAssignment, Error = AssignmentError);
client_method!(AssignmentClient => fn release(order_id: String) -> () as AssignmentRequest::Release, Error = AssignmentError);
client_method!(AssignmentClient => fn update_shipper_stats(shipper_id: String) -> u32 as AssignmentRequest::UpdateShipperStats, Error = AssignmentError);
client_method!(AssignmentClient => fn history(order_id: String) -> Vec<AssignmentRecord> as AssignmentRequest::History, Error = AssignmentError);

#[cfg(test)]
client_method!(AssignmentClient => fn pending_timers() -> usize as AssignmentRequest::PendingTimers, Error = AssignmentError);
