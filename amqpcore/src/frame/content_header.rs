use std::fmt;

use amqp_wire::types::{FieldTable, LongLongUint, Octect, ShortStr, ShortUint, TimeStamp};
use serde::{
    de::{self, SeqAccess, Visitor},
    ser::{self, SerializeTuple},
    Deserialize, Serialize,
};

use super::{Frame, CLASS_BASIC};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentHeader {
    pub common: ContentHeaderCommon,
    pub basic_properties: BasicProperties,
}

impl ContentHeader {
    pub fn new(common: ContentHeaderCommon, basic_properties: BasicProperties) -> Self {
        Self {
            common,
            basic_properties,
        }
    }

    pub fn into_frame(self) -> Frame {
        Frame::ContentHeader(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHeaderCommon {
    pub class: ShortUint,
    pub weight: ShortUint,
    pub body_size: LongLongUint,
}

impl ContentHeaderCommon {
    /// Header of basic class content, weight is always zero.
    pub fn basic(body_size: LongLongUint) -> Self {
        Self {
            class: CLASS_BASIC,
            weight: 0,
            body_size,
        }
    }
}

// property flags, starting from the high bit
mod flag {
    pub const CONTENT_TYPE: u16 = 1 << 15;
    pub const CONTENT_ENCODING: u16 = 1 << 14;
    pub const HEADERS: u16 = 1 << 13;
    pub const DELIVERY_MODE: u16 = 1 << 12;
    pub const PRIORITY: u16 = 1 << 11;
    pub const CORRELATION_ID: u16 = 1 << 10;
    pub const REPLY_TO: u16 = 1 << 9;
    pub const EXPIRATION: u16 = 1 << 8;
    pub const MESSAGE_ID: u16 = 1 << 7;
    pub const TIMESTAMP: u16 = 1 << 6;
    pub const TYPE: u16 = 1 << 5;
    pub const USER_ID: u16 = 1 << 4;
    pub const APP_ID: u16 = 1 << 3;
    pub const CLUSTER_ID: u16 = 1 << 2;
}

/// Properties of basic class content.
///
/// Only properties which are set are encoded, a presence flag per property
/// precedes them on the wire.
/// Short string properties longer than 255 bytes fail to encode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicProperties {
    content_type: Option<String>,
    content_encoding: Option<String>,
    headers: Option<FieldTable>,
    delivery_mode: Option<Octect>,
    priority: Option<Octect>,
    correlation_id: Option<String>,
    reply_to: Option<String>,
    expiration: Option<String>,
    message_id: Option<String>,
    timestamp: Option<TimeStamp>,
    message_type: Option<String>,
    user_id: Option<String>,
    app_id: Option<String>,
    cluster_id: Option<String>,
}

macro_rules! impl_str_property {
    ($($field:ident, $setter:ident);+) => {
        $(
            pub fn $field(&self) -> Option<&str> {
                self.$field.as_deref()
            }

            pub fn $setter(&mut self, value: &str) -> &mut Self {
                self.$field = Some(value.to_owned());
                self
            }
        )+
    };
}

impl BasicProperties {
    impl_str_property!(
        content_type, with_content_type;
        content_encoding, with_content_encoding;
        correlation_id, with_correlation_id;
        reply_to, with_reply_to;
        expiration, with_expiration;
        message_id, with_message_id;
        message_type, with_message_type;
        user_id, with_user_id;
        app_id, with_app_id;
        cluster_id, with_cluster_id
    );

    pub fn headers(&self) -> Option<&FieldTable> {
        self.headers.as_ref()
    }

    pub fn with_headers(&mut self, headers: FieldTable) -> &mut Self {
        self.headers = Some(headers);
        self
    }

    /// 1: non-persistent, 2: persistent.
    pub fn delivery_mode(&self) -> Option<Octect> {
        self.delivery_mode
    }

    pub fn with_delivery_mode(&mut self, delivery_mode: Octect) -> &mut Self {
        self.delivery_mode = Some(delivery_mode);
        self
    }

    pub fn with_persistence(&mut self, persistent: bool) -> &mut Self {
        self.with_delivery_mode(if persistent {
            super::DELIVERY_MODE_PERSISTENT
        } else {
            super::DELIVERY_MODE_TRANSIENT
        })
    }

    pub fn priority(&self) -> Option<Octect> {
        self.priority
    }

    pub fn with_priority(&mut self, priority: Octect) -> &mut Self {
        self.priority = Some(priority);
        self
    }

    pub fn timestamp(&self) -> Option<TimeStamp> {
        self.timestamp
    }

    pub fn with_timestamp(&mut self, timestamp: TimeStamp) -> &mut Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn finish(&mut self) -> Self {
        self.clone()
    }

    fn property_flags(&self) -> u16 {
        [
            (self.content_type.is_some(), flag::CONTENT_TYPE),
            (self.content_encoding.is_some(), flag::CONTENT_ENCODING),
            (self.headers.is_some(), flag::HEADERS),
            (self.delivery_mode.is_some(), flag::DELIVERY_MODE),
            (self.priority.is_some(), flag::PRIORITY),
            (self.correlation_id.is_some(), flag::CORRELATION_ID),
            (self.reply_to.is_some(), flag::REPLY_TO),
            (self.expiration.is_some(), flag::EXPIRATION),
            (self.message_id.is_some(), flag::MESSAGE_ID),
            (self.timestamp.is_some(), flag::TIMESTAMP),
            (self.message_type.is_some(), flag::TYPE),
            (self.user_id.is_some(), flag::USER_ID),
            (self.app_id.is_some(), flag::APP_ID),
            (self.cluster_id.is_some(), flag::CLUSTER_ID),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .fold(0, |flags, (_, bit)| flags | bit)
    }
}

fn short_str<E: ser::Error>(value: &str) -> Result<ShortStr, E> {
    ShortStr::try_from(value)
        .map_err(|_| E::custom(format!("property value exceeds 255 bytes: {:.32}...", value)))
}

impl Serialize for BasicProperties {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut tuple = serializer.serialize_tuple(15)?;
        tuple.serialize_element(&self.property_flags())?;

        macro_rules! element {
            (str $field:ident) => {
                if let Some(v) = &self.$field {
                    tuple.serialize_element(&short_str::<S::Error>(v)?)?;
                }
            };
            ($field:ident) => {
                if let Some(v) = &self.$field {
                    tuple.serialize_element(v)?;
                }
            };
        }
        element!(str content_type);
        element!(str content_encoding);
        element!(headers);
        element!(delivery_mode);
        element!(priority);
        element!(str correlation_id);
        element!(str reply_to);
        element!(str expiration);
        element!(str message_id);
        element!(timestamp);
        element!(str message_type);
        element!(str user_id);
        element!(str app_id);
        element!(str cluster_id);

        tuple.end()
    }
}

impl<'de> Deserialize<'de> for BasicProperties {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct BasicPropertiesVisitor;

        impl<'de> Visitor<'de> for BasicPropertiesVisitor {
            type Value = BasicProperties;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("basic properties")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut index = 0;
                macro_rules! next {
                    () => {{
                        index += 1;
                        seq.next_element()?
                            .ok_or_else(|| de::Error::invalid_length(index, &self))?
                    }};
                }
                let flags: u16 = next!();
                let mut properties = BasicProperties::default();

                macro_rules! element {
                    (str $field:ident, $flag:expr) => {
                        if flags & $flag != 0 {
                            let v: ShortStr = next!();
                            properties.$field = Some(v.into());
                        }
                    };
                    ($field:ident, $flag:expr) => {
                        if flags & $flag != 0 {
                            properties.$field = Some(next!());
                        }
                    };
                }
                element!(str content_type, flag::CONTENT_TYPE);
                element!(str content_encoding, flag::CONTENT_ENCODING);
                element!(headers, flag::HEADERS);
                element!(delivery_mode, flag::DELIVERY_MODE);
                element!(priority, flag::PRIORITY);
                element!(str correlation_id, flag::CORRELATION_ID);
                element!(str reply_to, flag::REPLY_TO);
                element!(str expiration, flag::EXPIRATION);
                element!(str message_id, flag::MESSAGE_ID);
                element!(timestamp, flag::TIMESTAMP);
                element!(str message_type, flag::TYPE);
                element!(str user_id, flag::USER_ID);
                element!(str app_id, flag::APP_ID);
                element!(str cluster_id, flag::CLUSTER_ID);

                Ok(properties)
            }
        }

        deserializer.deserialize_tuple(15, BasicPropertiesVisitor)
    }
}
