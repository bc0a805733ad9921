//! AMQP 0-9-1 frame codec.
//!
//! A frame is `type: u8, channel: u16, size: u32, payload, 0xCE`. Method frame
//! payloads start with the [`MethodHeader`] (class id, method id) followed by
//! the method arguments, which are encoded by `amqp_wire`.
//!
//! Decoding is resumable: [`Frame::decode`] returns `Ok(None)` until a whole
//! frame is buffered and never consumes a partial one.
use amqp_wire::{
    from_bytes, to_buffer,
    types::{AmqpChannelId, LongUint, Octect, ShortUint},
};
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

////////////////////////////////////////////////////////////////////////
// macros should appear before module declaration
#[macro_use]
mod helpers {
    // common interfaces of each method type
    macro_rules! impl_method_frame {
        ($name:ident, $class_id:literal, $method_id:literal) => {
            impl $name {
                pub fn header() -> &'static MethodHeader {
                    static __METHOD_HEADER: MethodHeader = MethodHeader::new($class_id, $method_id);
                    &__METHOD_HEADER
                }

                pub fn into_frame(self) -> Frame {
                    Frame::$name(Self::header(), self)
                }
            }
        };
    }

    macro_rules! impl_frame {
        ($($class_id:literal => $($method_id:literal : $method:ident),+);+) => {
            fn decode_method_frame(header: MethodHeader, content: &[u8]) -> Result<Frame, Error> {
                match (header.class_id(), header.method_id()) {
                    $($(($class_id, $method_id) => Ok(from_bytes::<$method>(content)?.into_frame()),)+)+
                    (class_id, method_id) => Err(Error::UnknownMethod(class_id, method_id)),
                }
            }

            $($(impl_method_frame!{$method, $class_id, $method_id})+)+

            /// Frame payload, excluding the frame header and the frame end octet.
            #[derive(Debug, Clone, PartialEq)]
            pub enum Frame {
                // method frame payload = method header + method arguments
                $($($method(&'static MethodHeader, $method),)+)+

                HeartBeat(HeartBeat),
                ContentHeader(ContentHeader),
                ContentBody(ContentBody),
            }

            impl Frame {
                /// Method header of a method frame, `None` for other frame types.
                pub fn method_header(&self) -> Option<&'static MethodHeader> {
                    match self {
                        $($(Frame::$method(header, _) => Some(*header),)+)+
                        _ => None,
                    }
                }

                fn encode_method(&self, buf: &mut BytesMut) -> Result<(), Error> {
                    match self {
                        $($(Frame::$method(header, method) => {
                            to_buffer(*header, buf)?;
                            to_buffer(method, buf)?;
                        })+)+
                        _ => {}
                    }
                    Ok(())
                }
            }
        };
    }
}

///////////////////////////////////////////////////////////
mod constants;
mod content_body;
mod content_header;
mod error;
mod heartbeat;
mod method;
mod protocol_header;

pub use constants::*;
pub use content_body::*;
pub use content_header::*;
pub use error::*;
pub use heartbeat::*;
pub use method::*;
pub use protocol_header::*;

/////////////////////////////////////////////////////////////////
impl_frame! {
    // == Connection ==
    10 =>   10: Start,
            11: StartOk,
            20: Secure,
            21: SecureOk,
            30: Tune,
            31: TuneOk,
            40: Open,
            41: OpenOk,
            50: Close,
            51: CloseOk,
            60: Blocked,
            61: Unblocked;
    // == Channel ==
    20 =>   10: OpenChannel,
            11: OpenChannelOk,
            20: Flow,
            21: FlowOk,
            40: CloseChannel,
            41: CloseChannelOk;
    // == Exchange ==
    40 =>   10: Declare,
            11: DeclareOk,
            20: Delete,
            21: DeleteOk;
    // == Queue ==
    50 =>   10: DeclareQueue,
            11: DeclareQueueOk,
            20: BindQueue,
            21: BindQueueOk,
            30: PurgeQueue,
            31: PurgeQueueOk,
            40: DeleteQueue,
            41: DeleteQueueOk,
            50: UnbindQueue,
            51: UnbindQueueOk;
    // == Basic ==
    60 =>   10: Qos,
            11: QosOk,
            20: Consume,
            21: ConsumeOk,
            30: Cancel,
            31: CancelOk,
            40: Publish,
            50: Return,
            60: Deliver,
            80: Ack,
            90: Reject,
            110: Recover,
            111: RecoverOk,
            120: Nack
}

//////////////////////////////////////////////////////////////////////
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct FrameHeader {
    pub frame_type: Octect, // 1: method, 2: content-header, 3: content-body, 8: heartbeat
    pub channel: ShortUint,
    pub payload_size: LongUint,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::HeartBeat(_) => f.write_str("HeartBeat"),
            Frame::ContentHeader(header) => write!(
                f,
                "ContentHeader(class = {}, body_size = {})",
                header.common.class, header.common.body_size
            ),
            Frame::ContentBody(body) => write!(f, "ContentBody({} bytes)", body.len()),
            method => write!(f, "{:?}", method),
        }
    }
}

impl Frame {
    pub fn frame_type(&self) -> Octect {
        match self {
            Frame::HeartBeat(_) => FRAME_HEARTBEAT,
            Frame::ContentHeader(_) => FRAME_CONTENT_HEADER,
            Frame::ContentBody(_) => FRAME_CONTENT_BODY,
            _ => FRAME_METHOD,
        }
    }

    /// Append the whole frame, header and frame end included, to `buf`.
    ///
    /// Return the number of bytes written. On error nothing is written.
    pub fn encode(&self, channel: AmqpChannelId, buf: &mut BytesMut) -> Result<usize, Error> {
        let start = buf.len();
        // payload size is patched once the payload is encoded
        buf.put_u8(self.frame_type());
        buf.put_u16(channel);
        buf.put_u32(0);

        let encoded = match self {
            Frame::HeartBeat(_) => Ok(()),
            Frame::ContentHeader(header) => to_buffer(header, buf).map(|_| ()).map_err(Error::from),
            Frame::ContentBody(body) => {
                buf.put_slice(body.as_ref());
                Ok(())
            }
            _ => self.encode_method(buf),
        };
        let payload_size = encoded.and_then(|_| {
            LongUint::try_from(buf.len() - start - FRAME_HEADER_SIZE)
                .map_err(|_| Error::FrameTooLarge {
                    size: buf.len() - start + 1,
                    max: LongUint::MAX,
                })
        });
        let payload_size = match payload_size {
            Ok(size) => size,
            Err(err) => {
                buf.truncate(start);
                return Err(err);
            }
        };
        buf[start + 3..start + FRAME_HEADER_SIZE].copy_from_slice(&payload_size.to_be_bytes());
        buf.put_u8(FRAME_END);

        Ok(buf.len() - start)
    }

    /// Decode one frame from the start of `buf` without frame size limit.
    ///
    /// Return `(number of bytes consumed, channel id, frame)`, or `None` if
    /// `buf` does not hold a whole frame yet.
    pub fn decode(buf: &[u8]) -> Result<Option<(usize, AmqpChannelId, Frame)>, Error> {
        Self::decode_with_limit(buf, 0)
    }

    /// Same as [`decode`](Self::decode), rejecting frames larger than
    /// `frame_max` bytes. Zero means no limit.
    pub fn decode_with_limit(
        buf: &[u8],
        frame_max: LongUint,
    ) -> Result<Option<(usize, AmqpChannelId, Frame)>, Error> {
        // check frame header, 7 octects
        let header = match buf.get(0..FRAME_HEADER_SIZE) {
            Some(header) => header,
            None => return Ok(None),
        };
        let FrameHeader {
            frame_type,
            channel,
            payload_size,
        } = from_bytes(header)?;

        match frame_type {
            FRAME_METHOD | FRAME_CONTENT_HEADER | FRAME_CONTENT_BODY | FRAME_HEARTBEAT => {}
            other => return Err(Error::UnknownFrameType(other)),
        }

        // payload_size + 8 octects
        let total_size = payload_size as usize + FRAME_HEADER_SIZE + 1;
        if frame_max > 0 && total_size > frame_max as usize {
            return Err(Error::FrameTooLarge {
                size: total_size,
                max: frame_max,
            });
        }
        if total_size > buf.len() {
            return Ok(None);
        }
        if buf[total_size - 1] != FRAME_END {
            return Err(Error::Corrupted);
        }

        let payload = &buf[FRAME_HEADER_SIZE..total_size - 1];
        let frame = match frame_type {
            FRAME_METHOD => {
                if payload.len() < METHOD_HEADER_SIZE {
                    return Err(Error::Corrupted);
                }
                let header: MethodHeader = from_bytes(&payload[..METHOD_HEADER_SIZE])?;
                decode_method_frame(header, &payload[METHOD_HEADER_SIZE..])?
            }
            FRAME_CONTENT_HEADER => Frame::ContentHeader(from_bytes(payload)?),
            FRAME_CONTENT_BODY => Frame::ContentBody(ContentBody::new(payload.to_vec())),
            _ => {
                if !payload.is_empty() {
                    return Err(Error::Corrupted);
                }
                Frame::HeartBeat(HeartBeat)
            }
        };

        Ok(Some((total_size, channel, frame)))
    }
}

/////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use super::*;
    use amqp_wire::types::{FieldTable, FieldValue};

    fn encode(channel: AmqpChannelId, frame: &Frame) -> BytesMut {
        let mut buf = BytesMut::new();
        frame.encode(channel, &mut buf).unwrap();
        buf
    }

    fn round_trip(channel: AmqpChannelId, frame: Frame) {
        let buf = encode(channel, &frame);
        let (consumed, decoded_channel, decoded) = Frame::decode(&buf).unwrap().unwrap();
        assert_eq!(buf.len(), consumed);
        assert_eq!(channel, decoded_channel);
        assert_eq!(frame, decoded);
    }

    #[test]
    fn test_heartbeat_bytes() {
        let buf = encode(0, &Frame::HeartBeat(HeartBeat));
        assert_eq!(&[8, 0, 0, 0, 0, 0, 0, 0xCE][..], &buf[..]);
    }

    #[test]
    fn test_method_frame_bytes() {
        let buf = encode(0, &TuneOk::new(2047, 131072, 60).into_frame());
        assert_eq!(
            &[
                1, 0, 0, 0, 0, 0, 12, // header, payload size 12
                0, 10, 0, 31, // connection.tune-ok
                0x07, 0xFF, 0x00, 0x02, 0x00, 0x00, 0x00, 0x3C, // arguments
                0xCE
            ][..],
            &buf[..]
        );
    }

    #[test]
    fn test_bits_are_packed() {
        let mut declare = DeclareQueue::new("q1".try_into().unwrap(), FieldTable::new());
        declare.set_durable(true);
        declare.set_auto_delete(true);
        let buf = encode(1, &declare.into_frame());
        // header(7) + method header(4) + ticket(2) + "q1"(3), then the packed bits
        assert_eq!(0b0000_1010, buf[16]);
    }

    #[test]
    fn test_round_trip_methods() {
        let mut server_properties = FieldTable::new();
        server_properties.insert("product".try_into().unwrap(), FieldValue::S("RabbitMQ".try_into().unwrap()));
        let frames = vec![
            Start::new(server_properties, "PLAIN AMQPLAIN".try_into().unwrap(), "en_US".try_into().unwrap()).into_frame(),
            StartOk::new(FieldTable::new(), "PLAIN".try_into().unwrap(), b"\0guest\0guest".to_vec().into(), "en_US".try_into().unwrap()).into_frame(),
            Secure::new(b"challenge".to_vec().into()).into_frame(),
            SecureOk::new(b"response".to_vec().into()).into_frame(),
            Tune::new(2047, 131072, 60).into_frame(),
            Open::new("/".try_into().unwrap()).into_frame(),
            OpenOk::default().into_frame(),
            Close::new(320, "CONNECTION_FORCED".try_into().unwrap(), 0, 0).into_frame(),
            CloseOk.into_frame(),
            Blocked::new("low on memory".try_into().unwrap()).into_frame(),
            Unblocked.into_frame(),
            OpenChannel::default().into_frame(),
            OpenChannelOk::default().into_frame(),
            Flow::new(false).into_frame(),
            FlowOk::new(false).into_frame(),
            CloseChannel::new(404, "NOT_FOUND - no queue 'q1'".try_into().unwrap(), 50, 10).into_frame(),
            CloseChannelOk.into_frame(),
            Declare::new("x1".try_into().unwrap(), "topic".try_into().unwrap(), FieldTable::new()).into_frame(),
            DeclareOk.into_frame(),
            Delete::new("x1".try_into().unwrap()).into_frame(),
            DeleteOk.into_frame(),
            DeclareQueueOk::new("q1".try_into().unwrap(), 3, 1).into_frame(),
            BindQueue::new("q1".try_into().unwrap(), "amq.topic".try_into().unwrap(), "echo.ping".try_into().unwrap(), FieldTable::new()).into_frame(),
            BindQueueOk.into_frame(),
            UnbindQueue::new("q1".try_into().unwrap(), "amq.topic".try_into().unwrap(), "echo.ping".try_into().unwrap(), FieldTable::new()).into_frame(),
            UnbindQueueOk.into_frame(),
            PurgeQueue::new("q1".try_into().unwrap()).into_frame(),
            PurgeQueueOk::new(7).into_frame(),
            DeleteQueue::new("q1".try_into().unwrap()).into_frame(),
            DeleteQueueOk::new(0).into_frame(),
            Qos::new(0, 10, false).into_frame(),
            QosOk.into_frame(),
            Consume::new("q1".try_into().unwrap(), "ctag".try_into().unwrap(), FieldTable::new()).into_frame(),
            ConsumeOk::new("ctag".try_into().unwrap()).into_frame(),
            Cancel::new("ctag".try_into().unwrap(), false).into_frame(),
            CancelOk::new("ctag".try_into().unwrap()).into_frame(),
            Publish::new("amq.topic".try_into().unwrap(), "echo.ping".try_into().unwrap()).into_frame(),
            Return::new(312, "NO_ROUTE".try_into().unwrap(), "amq.topic".try_into().unwrap(), "nowhere".try_into().unwrap()).into_frame(),
            Deliver::new("ctag".try_into().unwrap(), 1, true, "amq.topic".try_into().unwrap(), "echo.ping".try_into().unwrap()).into_frame(),
            Ack::new(1, true).into_frame(),
            Reject::new(2, false).into_frame(),
            Recover::new(true).into_frame(),
            RecoverOk.into_frame(),
            Nack::new(3, true, true).into_frame(),
        ];
        for frame in frames {
            round_trip(1, frame);
        }
    }

    #[test]
    fn test_round_trip_content() {
        let mut properties = BasicProperties::default();
        properties
            .with_content_type("text/plain")
            .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
            .with_priority(3)
            .with_timestamp(1_700_000_000)
            .with_cluster_id("c1");
        round_trip(
            3,
            ContentHeader::new(ContentHeaderCommon::basic(5), properties).into_frame(),
        );
        round_trip(3, ContentBody::new(b"hello".to_vec()).into_frame());
    }

    #[test]
    fn test_decode_needs_more_data() {
        let buf = encode(1, &Flow::new(true).into_frame());
        for len in 0..buf.len() {
            assert!(Frame::decode(&buf[..len]).unwrap().is_none());
        }
    }

    #[test]
    fn test_decode_consumes_one_frame() {
        let mut buf = encode(1, &Frame::HeartBeat(HeartBeat));
        let first = buf.len();
        buf.extend_from_slice(&encode(2, &CloseChannelOk.into_frame()));
        let (consumed, channel, frame) = Frame::decode(&buf).unwrap().unwrap();
        assert_eq!(first, consumed);
        assert_eq!(1, channel);
        assert_eq!(Frame::HeartBeat(HeartBeat), frame);
    }

    #[test]
    fn test_bad_frame_end() {
        let mut buf = encode(0, &Frame::HeartBeat(HeartBeat));
        let last = buf.len() - 1;
        buf[last] = 0;
        assert_eq!(Err(Error::Corrupted), Frame::decode(&buf));
    }

    #[test]
    fn test_unknown_frame_type() {
        let buf = [4u8, 0, 0, 0, 0, 0, 0, 0xCE];
        assert_eq!(Err(Error::UnknownFrameType(4)), Frame::decode(&buf));
    }

    #[test]
    fn test_unknown_method() {
        let buf = [1u8, 0, 1, 0, 0, 0, 4, 0, 85, 0, 10, 0xCE];
        assert_eq!(Err(Error::UnknownMethod(85, 10)), Frame::decode(&buf));
    }

    #[test]
    fn test_trailing_argument_bytes() {
        // channel.flow-ok with one extra byte
        let buf = [1u8, 0, 1, 0, 0, 0, 6, 0, 20, 0, 21, 1, 9, 0xCE];
        assert!(matches!(Frame::decode(&buf), Err(Error::SerdeError(_))));
    }

    #[test]
    fn test_frame_too_large() {
        let buf = encode(1, &ContentBody::new(vec![0u8; 100]).into_frame());
        assert_eq!(
            Err(Error::FrameTooLarge { size: 108, max: 64 }),
            Frame::decode_with_limit(&buf[..FRAME_HEADER_SIZE], 64)
        );
        assert!(Frame::decode_with_limit(&buf, 108).unwrap().is_some());
    }
}
