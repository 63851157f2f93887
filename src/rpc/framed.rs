//! Length-delimited JSON framing shared by the control RPC server and the
//! agent's reconnecting client, built on `tokio_util::codec`.

use bytes::{Bytes, BytesMut};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::TransportError;

use super::protocol::Envelope;

pub struct EnvelopeStream {
    inner: Framed<TcpStream, LengthDelimitedCodec>,
}

impl EnvelopeStream {
    pub fn new(socket: TcpStream) -> Self {
        Self {
            inner: Framed::new(socket, LengthDelimitedCodec::new()),
        }
    }

    pub async fn send(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(envelope).map_err(TransportError::Codec)?;
        self.inner
            .send(Bytes::from(payload))
            .await
            .map_err(TransportError::Io)
    }

    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    pub async fn recv(&mut self) -> Result<Option<Envelope>, TransportError> {
        match self.inner.next().await {
            None => Ok(None),
            Some(Err(err)) => Err(TransportError::Io(err)),
            Some(Ok(bytes)) => {
                let envelope = serde_json::from_slice(&bytes).map_err(TransportError::Codec)?;
                Ok(Some(envelope))
            }
        }
    }

    /// Splits into an independently-lockable sink and source, so a writer
    /// (reporting state) and a reader (receiving pushed status) can run
    /// concurrently over the same connection.
    pub fn into_split(self) -> (EnvelopeSink, EnvelopeSource) {
        let (sink, stream) = self.inner.split();
        (EnvelopeSink { inner: sink }, EnvelopeSource { inner: stream })
    }
}

pub struct EnvelopeSink {
    inner: SplitSink<Framed<TcpStream, LengthDelimitedCodec>, Bytes>,
}

impl EnvelopeSink {
    pub async fn send(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(envelope).map_err(TransportError::Codec)?;
        self.inner.send(Bytes::from(payload)).await.map_err(TransportError::Io)
    }
}

pub struct EnvelopeSource {
    inner: SplitStream<Framed<TcpStream, LengthDelimitedCodec>>,
}

impl EnvelopeSource {
    pub async fn recv(&mut self) -> Result<Option<Envelope>, TransportError> {
        match self.inner.next().await {
            None => Ok(None),
            Some(Err(err)) => Err(TransportError::Io(err)),
            Some(Ok(bytes)) => recv_from_bytes(bytes),
        }
    }
}

fn recv_from_bytes(bytes: BytesMut) -> Result<Option<Envelope>, TransportError> {
    let envelope = serde_json::from_slice(&bytes).map_err(TransportError::Codec)?;
    Ok(Some(envelope))
}
