use crate::{Codec, CodecError, Decoder, Encoder, Payload};
use std::io::{Read, Write};

pub const JSON_MIME_TYPE: &str = "application/json";

/// JSON codec, stateless so it can be shared between requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct Json;

struct JsonEncoder<'w> {
    sink: &'w mut dyn Write,
}

struct JsonDecoder<'r> {
    source: &'r mut dyn Read,
}

impl Codec for Json {
    fn mime_type(&self) -> &str {
        JSON_MIME_TYPE
    }

    fn encoder<'w>(&self, sink: &'w mut dyn Write) -> Box<dyn Encoder + 'w> {
        Box::new(JsonEncoder { sink })
    }

    fn decoder<'r>(&self, source: &'r mut dyn Read) -> Box<dyn Decoder + 'r> {
        Box::new(JsonDecoder { source })
    }
}

impl Encoder for JsonEncoder<'_> {
    fn encode(&mut self, value: &Payload) -> Result<(), CodecError> {
        serde_json::to_writer(&mut *self.sink, value)?;
        Ok(())
    }
}

impl Decoder for JsonDecoder<'_> {
    fn decode(&mut self) -> Result<Payload, CodecError> {
        Ok(serde_json::from_reader(&mut *self.source)?)
    }
}
