use amqp_wire::types::{
    AmqpClassId, AmqpMethodId, AmqpReplyCode, AmqpReplyText, Boolean, LongStr, ShortStr,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OpenChannel {
    // reserved
    pub out_of_band: ShortStr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OpenChannelOk {
    // reserved
    pub channel_id: LongStr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub active: Boolean,
}

impl Flow {
    pub fn new(active: Boolean) -> Self {
        Self { active }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowOk {
    pub active: Boolean,
}

impl FlowOk {
    pub fn new(active: Boolean) -> Self {
        Self { active }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseChannel {
    pub reply_code: AmqpReplyCode,
    pub reply_text: AmqpReplyText,
    pub class_id: AmqpClassId,
    pub method_id: AmqpMethodId,
}

impl CloseChannel {
    pub fn new(
        reply_code: AmqpReplyCode,
        reply_text: AmqpReplyText,
        class_id: AmqpClassId,
        method_id: AmqpMethodId,
    ) -> Self {
        Self {
            reply_code,
            reply_text,
            class_id,
            method_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CloseChannelOk;
