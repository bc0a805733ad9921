use amqp_wire::types::{
    AmqpClassId, AmqpMethodId, AmqpPeerProperties, AmqpReplyCode, AmqpReplyText, Bit, ByteArray,
    LongStr, LongUint, Octect, ShortStr, ShortUint,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Start {
    pub version_major: Octect,
    pub version_minor: Octect,
    pub server_properties: AmqpPeerProperties,
    /// Space separated SASL mechanisms.
    pub mechanisms: LongStr,
    /// Space separated message locales.
    pub locales: LongStr,
}

impl Start {
    pub fn new(server_properties: AmqpPeerProperties, mechanisms: LongStr, locales: LongStr) -> Self {
        Self {
            version_major: 0,
            version_minor: 9,
            server_properties,
            mechanisms,
            locales,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartOk {
    pub client_properties: AmqpPeerProperties,
    pub mechanism: ShortStr,
    pub response: ByteArray,
    pub locale: ShortStr,
}

impl StartOk {
    pub fn new(
        client_properties: AmqpPeerProperties,
        mechanism: ShortStr,
        response: ByteArray,
        locale: ShortStr,
    ) -> Self {
        Self {
            client_properties,
            mechanism,
            response,
            locale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secure {
    pub challenge: ByteArray,
}

impl Secure {
    pub fn new(challenge: ByteArray) -> Self {
        Self { challenge }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecureOk {
    pub response: ByteArray,
}

impl SecureOk {
    pub fn new(response: ByteArray) -> Self {
        Self { response }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tune {
    pub channel_max: ShortUint,
    pub frame_max: LongUint,
    pub heartbeat: ShortUint,
}

impl Tune {
    pub fn new(channel_max: ShortUint, frame_max: LongUint, heartbeat: ShortUint) -> Self {
        Self {
            channel_max,
            frame_max,
            heartbeat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TuneOk {
    // RabbitMQ doesn't put a limit on channel-max, and treats any number in tune-ok as valid.
    // It does put a limit on frame-max, and checks that the value sent in tune-ok
    // is less than or equal.
    pub channel_max: ShortUint,
    pub frame_max: LongUint,
    pub heartbeat: ShortUint,
}

impl TuneOk {
    pub fn new(channel_max: ShortUint, frame_max: LongUint, heartbeat: ShortUint) -> Self {
        Self {
            channel_max,
            frame_max,
            heartbeat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Open {
    pub virtual_host: ShortStr,
    // reserved
    pub capabilities: ShortStr,
    pub insist: Bit,
}

impl Open {
    pub fn new(virtual_host: ShortStr) -> Self {
        Self {
            virtual_host,
            capabilities: ShortStr::default(),
            insist: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OpenOk {
    // reserved
    pub known_hosts: ShortStr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Close {
    pub reply_code: AmqpReplyCode,
    pub reply_text: AmqpReplyText,
    pub class_id: AmqpClassId,
    pub method_id: AmqpMethodId,
}

impl Close {
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
pub struct CloseOk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blocked {
    pub reason: ShortStr,
}

impl Blocked {
    pub fn new(reason: ShortStr) -> Self {
        Self { reason }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Unblocked;
