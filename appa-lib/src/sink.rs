//! Output side of a session.

use crate::measurement::Measurement;
use crate::model::ChannelRole;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelSample {
    pub channel: ChannelRole,
    pub measurement: Measurement,
}

/// Events in the order a session emits them: every frame is
/// `FrameBegin`, one or two `Sample`s, `FrameEnd`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SinkEvent {
    FrameBegin,
    Sample(ChannelSample),
    FrameEnd,
}

pub trait SessionSink {
    fn send(&mut self, event: SinkEvent);
}

impl SessionSink for Vec<SinkEvent> {
    fn send(&mut self, event: SinkEvent) {
        self.push(event);
    }
}
