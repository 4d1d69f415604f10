//! Transmit request path.

use hal::can::{CanFdController, RxCallback};
use hal::error::HalError;

use crate::channel::SharedChannel;
use crate::config::NodeId;
use crate::frame::FrameTemplate;

/// Outcome of one transmit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxOutcome {
    /// The controller accepted the frame into its transmit buffer.
    Sent,
    /// The controller rejected the submission. Not retried.
    SendFailed(HalError),
}

/// Builds the outbound frame and submits it to a fixed transmit buffer.
pub struct TransmitPath<'a, C: CanFdController, R> {
    channel: &'a SharedChannel<C, R>,
    identity: NodeId,
    buffer_index: u8,
    template: FrameTemplate,
}

impl<'a, C: CanFdController, R: RxCallback> TransmitPath<'a, C, R> {
    pub fn new(
        channel: &'a SharedChannel<C, R>,
        identity: NodeId,
        buffer_index: u8,
        template: FrameTemplate,
    ) -> Self {
        Self {
            channel,
            identity,
            buffer_index,
            template,
        }
    }

    pub fn identity(&self) -> NodeId {
        self.identity
    }

    /// Performs one transmit attempt.
    ///
    /// Requires the channel to be installed; an uninitialized channel is
    /// reported as [`HalError::NotInitialized`] rather than escalated.
    pub fn transmit(&self) -> TxOutcome {
        let frame = match self.template.builder().identity(self.identity).build() {
            Ok(frame) => frame,
            Err(err) => return TxOutcome::SendFailed(err),
        };

        let result = self
            .channel
            .with(|channel| channel.transmit(&frame, self.buffer_index))
            .unwrap_or(Err(HalError::NotInitialized));

        match result {
            Ok(()) => TxOutcome::Sent,
            Err(err) => {
                log::debug!("transmit of id {} rejected: {}", self.identity, err);
                TxOutcome::SendFailed(err)
            }
        }
    }
}
