use serde_json::Value;

use crate::parser::{Frame, FrameDecoder, NdjsonParser};
use crate::types::chat::ChatResponse;
use crate::{Error, Result};

/// Decodes `/api/chat` stream lines into whole response objects.
///
/// The `done` object is yielded as the last element.
pub struct ChatFrames;

impl FrameDecoder for ChatFrames {
    type Item = ChatResponse;

    fn decode(line: Value) -> Result<Frame<ChatResponse>> {
        match line {
            Value::Object(object) => {
                let response = ChatResponse::from(object);
                if response.is_done() {
                    Ok(Frame::Last(response))
                } else {
                    Ok(Frame::Item(response))
                }
            }
            other => Err(Error::MalformedResponse(format!(
                "chat stream line is not an object: {}",
                other
            ))),
        }
    }
}

pub type ChatStreamParser<S> = NdjsonParser<S, ChatFrames>;
