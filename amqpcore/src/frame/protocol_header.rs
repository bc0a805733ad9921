use amqp_wire::types::Octect;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
struct ProtocolName(Octect, Octect, Octect, Octect);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
struct ProtocolVersion {
    major: Octect,
    minor: Octect,
    revision: Octect,
}

/// The 8 bytes a client sends before any frame: `AMQP 0 0 9 1`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolHeader {
    name: ProtocolName,
    id: Octect,
    version: ProtocolVersion,
}

impl ProtocolHeader {
    pub const SIZE: usize = 8;

    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let ProtocolName(a, m, q, p) = self.name;
        [
            a,
            m,
            q,
            p,
            self.id,
            self.version.major,
            self.version.minor,
            self.version.revision,
        ]
    }
}

impl Default for ProtocolHeader {
    fn default() -> Self {
        Self {
            name: ProtocolName(b'A', b'M', b'Q', b'P'),
            id: 0,
            version: ProtocolVersion {
                major: 0,
                minor: 9,
                revision: 1,
            },
        }
    }
}
