use super::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartBeat;

impl HeartBeat {
    pub fn into_frame(self) -> Frame {
        Frame::HeartBeat(self)
    }
}
