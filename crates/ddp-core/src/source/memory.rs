use std::collections::VecDeque;

use super::{CapturedFrame, FrameSource, SourceError};

/// Frames held in memory, replayed in insertion order.
///
/// # Examples
/// ```
/// use ddp_core::{CapturedFrame, FrameSource, MemorySource};
/// use pcap_parser::Linktype;
///
/// let mut source = MemorySource::from(vec![CapturedFrame {
///     ts: Some(1.0),
///     linktype: Linktype::RAW,
///     data: vec![0x45],
/// }]);
/// assert!(source.next_frame()?.is_some());
/// assert!(source.next_frame()?.is_none());
/// # Ok::<(), ddp_core::SourceError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<CapturedFrame>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: CapturedFrame) {
        self.frames.push_back(frame);
    }
}

impl From<Vec<CapturedFrame>> for MemorySource {
    fn from(frames: Vec<CapturedFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, SourceError> {
        Ok(self.frames.pop_front())
    }
}
