use crate::navigation::NotificationSink;
use r2r::QosProfile;
use r2r::std_msgs::msg::String as StringMsg;
use std::sync::Mutex;

use super::RosError;

// Publishes say-messages for the robot's speech node
pub struct TopicNotifier {
    inner: Mutex<r2r::Publisher<StringMsg>>,
    topic: String,
}

impl TopicNotifier {
    // Create a new publisher on the given topic
    pub fn new(node: &mut r2r::Node, topic: &str) -> Result<Self, RosError> {
        let publisher = node
            .create_publisher::<StringMsg>(topic, QosProfile::default())
            .map_err(|e| RosError::PublishError(e.to_string()))?;
        Ok(TopicNotifier {
            inner: Mutex::new(publisher),
            topic: topic.to_string(),
        })
    }
}

impl NotificationSink for TopicNotifier {
    // Speech is queued by the receiving node, so `blocking` has no effect here
    fn say(&self, message: &str, _blocking: bool) {
        let msg = StringMsg {
            data: message.to_string(),
        };
        let publisher = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = publisher.publish(&msg) {
            log::warn!("Could not publish on {}: {}", self.topic, e);
        }
    }
}
