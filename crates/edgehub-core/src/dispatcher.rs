use crate::bus::MessageBus;
use crate::config::GroupMap;
use crate::correlation::CorrelationTable;
use crate::message::Message;

/// Classifies an inbound message as either a reply to an outstanding synchronous
/// request, or a fresh message to route to a local module group (§4.5).
pub fn dispatch(
    msg: Message,
    correlation: &CorrelationTable,
    bus: &dyn MessageBus,
    group_map: &GroupMap,
) -> Result<(), DispatchError> {
    if !msg.parent_id.is_empty() && correlation.has(&msg.parent_id) {
        let parent_id = msg.parent_id.clone();

        if !correlation.deliver(&parent_id, msg) {
            tracing::warn!(
                message_id = %parent_id,
                "correlation slot vanished before reply could be delivered; dropping"
            );
        }

        return Ok(());
    }

    match group_map.target_group(&msg.group) {
        Some(target) => {
            bus.send_to_group(target, msg);
            Ok(())
        }
        None => Err(DispatchError::UnmappedGroup(msg.group)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("message group '{0}' has no entry in the group map; dropping")]
    UnmappedGroup(String),
}
