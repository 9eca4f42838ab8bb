use serde_json::Value;

use crate::parser::{is_done, Frame, FrameDecoder, NdjsonParser};
use crate::{Error, Result};

/// Decodes `/api/generate` stream lines into text fragments.
///
/// The `done` object ends the stream and its `response` is not yielded.
pub struct GenerateFrames;

impl FrameDecoder for GenerateFrames {
    type Item = String;

    fn decode(line: Value) -> Result<Frame<String>> {
        if is_done(&line) {
            return Ok(Frame::End);
        }
        match line {
            Value::Object(mut object) => match object.remove("response") {
                Some(Value::String(token)) => Ok(Frame::Item(token)),
                _ => Err(Error::MalformedResponse(
                    "generate stream line has no \"response\" text".to_string(),
                )),
            },
            other => Err(Error::MalformedResponse(format!(
                "generate stream line is not an object: {}",
                other
            ))),
        }
    }
}

pub type GenerateStreamParser<S> = NdjsonParser<S, GenerateFrames>;
