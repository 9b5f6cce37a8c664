//! Framed codec for the customer line protocol.
//!
//! Uses LinesCodec for framing + `FromStr`/`Display` for the typed messages.
//! Works over any AsyncRead/AsyncWrite (TCP streams, in-memory duplex pipes).

use std::io;
use std::marker::PhantomData;
use std::str::FromStr;

use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use super::protocol::{ProtocolError, Request, Response};

/// Longest line either side will buffer before giving up on the peer.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Shop side: reads requests, writes responses.
pub type ShopCodec = LineCodec<Request, Response>;

/// Customer side: reads responses, writes requests.
pub type CustomerCodec = LineCodec<Response, Request>;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("line exceeds {max} bytes")]
    LineTooLong { max: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<LinesCodecError> for CodecError {
    fn from(e: LinesCodecError) -> Self {
        match e {
            LinesCodecError::MaxLineLengthExceeded => Self::LineTooLong {
                max: MAX_LINE_LENGTH,
            },
            LinesCodecError::Io(e) => Self::Io(e),
        }
    }
}

/// Codec that frames messages by newline and parses each line.
///
/// A line that does not parse yields `Ok(Some(Err(_)))` rather than a codec
/// error, so one bad request does not tear down the stream.
pub struct LineCodec<In, Out> {
    inner: LinesCodec,
    _phantom: PhantomData<fn() -> (In, Out)>,
}

impl<In, Out> Default for LineCodec<In, Out> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In, Out> LineCodec<In, Out> {
    pub fn new() -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
            _phantom: PhantomData,
        }
    }
}

impl<In: FromStr<Err = ProtocolError>, Out> Decoder for LineCodec<In, Out> {
    type Item = Result<In, ProtocolError>;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.inner.decode(src)?.map(|line| line.parse()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.inner.decode_eof(src)?.map(|line| line.parse()))
    }
}

impl<In, Out: std::fmt::Display> Encoder<Out> for LineCodec<In, Out> {
    type Error = CodecError;

    fn encode(&mut self, item: Out, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.to_string();
        tracing::trace!(%line, "Encoding line");
        self.inner.encode(line, dst)?;
        Ok(())
    }
}
