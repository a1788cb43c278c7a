use crate::{Codec, CodecError, Decoder, Encoder, Payload};
use std::io::{Read, Write};

pub const FORM_MIME_TYPE: &str = "application/x-www-form-urlencoded";

/// `application/x-www-form-urlencoded` codec.
///
/// Only flat objects survive the trip: decoding always yields an object of
/// strings, and encoding fails for nested values.
#[derive(Debug, Default, Clone, Copy)]
pub struct Form;

struct FormEncoder<'w> {
    sink: &'w mut dyn Write,
}

struct FormDecoder<'r> {
    source: &'r mut dyn Read,
}

impl Codec for Form {
    fn mime_type(&self) -> &str {
        FORM_MIME_TYPE
    }

    fn encoder<'w>(&self, sink: &'w mut dyn Write) -> Box<dyn Encoder + 'w> {
        Box::new(FormEncoder { sink })
    }

    fn decoder<'r>(&self, source: &'r mut dyn Read) -> Box<dyn Decoder + 'r> {
        Box::new(FormDecoder { source })
    }
}

impl Encoder for FormEncoder<'_> {
    fn encode(&mut self, value: &Payload) -> Result<(), CodecError> {
        let encoded = serde_urlencoded::to_string(value)?;
        self.sink.write_all(encoded.as_bytes())?;
        Ok(())
    }
}

impl Decoder for FormDecoder<'_> {
    fn decode(&mut self) -> Result<Payload, CodecError> {
        Ok(serde_urlencoded::from_reader(&mut *self.source)?)
    }
}
