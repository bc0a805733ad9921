use super::Frame;
use bytes::Bytes;

/// Opaque payload of a content body frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentBody {
    inner: Bytes,
}

impl ContentBody {
    pub fn new(inner: impl Into<Bytes>) -> Self {
        Self {
            inner: inner.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn into_inner(self) -> Bytes {
        self.inner
    }

    pub fn into_frame(self) -> Frame {
        Frame::ContentBody(self)
    }
}

impl AsRef<[u8]> for ContentBody {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}
