use crate::CodecError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::{Read, Write};
use std::sync::Arc;

/// The in-memory value exchanged between resources and codecs.
pub type Payload = serde_json::Value;

/// Encodes values into the sink it was created with.
pub trait Encoder {
    fn encode(&mut self, value: &Payload) -> Result<(), CodecError>;
}

/// Decodes one value from the source it was created with.
pub trait Decoder {
    fn decode(&mut self) -> Result<Payload, CodecError>;
}

/// A bidirectional transcoder for one wire format.
pub trait Codec: Send + Sync {
    /// The (main) mime type of this codec, used as the response `Content-Type`.
    fn mime_type(&self) -> &str;

    /// Instantiates the encoding half of this codec over `sink`.
    fn encoder<'w>(&self, sink: &'w mut dyn Write) -> Box<dyn Encoder + 'w>;

    /// Instantiates the decoding half of this codec over `source`.
    fn decoder<'r>(&self, source: &'r mut dyn Read) -> Box<dyn Decoder + 'r>;
}

/// Buffer level helpers available on every codec.
pub trait CodecExt: Codec {
    fn encode_bytes(&self, value: &Payload) -> Result<Bytes, CodecError> {
        let mut writer = BytesMut::new().writer();
        self.encoder(&mut writer).encode(value)?;
        Ok(writer.into_inner().freeze())
    }

    fn decode_bytes(&self, bytes: Bytes) -> Result<Payload, CodecError> {
        let mut reader = bytes.reader();
        self.decoder(&mut reader).decode()
    }
}

impl<C: Codec + ?Sized> CodecExt for C {}

/// Creates a codec for a concrete header value.
///
/// The full header value is passed in, so a factory may either hand out a
/// singleton or build a codec that keeps per request parameters (a multipart
/// boundary for example).
pub trait CodecFactory: Send + Sync {
    fn create(&self, mime: &str) -> Arc<dyn Codec>;
}

impl<F> CodecFactory for F
where
    F: Fn(&str) -> Arc<dyn Codec> + Send + Sync,
{
    fn create(&self, mime: &str) -> Arc<dyn Codec> {
        (self)(mime)
    }
}

/// A factory that always returns the same instance of a stateless codec.
pub fn shared<C: Codec + 'static>(codec: C) -> impl CodecFactory {
    let codec: Arc<dyn Codec> = Arc::new(codec);
    move |_: &str| Arc::clone(&codec)
}
