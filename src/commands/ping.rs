use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns PONG if no argument is provided, otherwise return a copy of the argument.
///
/// The copy is sent as a simple string, unless it cannot be one (it is not UTF-8 or it spans
/// several lines), in which case it is sent as a bulk string.
///
/// Ref: <https://redis.io/docs/latest/commands/ping>
#[derive(Debug, PartialEq)]
pub struct Ping {
    pub payload: Option<Bytes>,
}

impl Executable for Ping {
    fn exec(self, _store: Store) -> Result<Frame, Error> {
        let payload = match self.payload {
            Some(payload) => payload,
            None => return Ok(Frame::Simple("PONG".to_string())),
        };

        let res = match std::str::from_utf8(&payload) {
            Ok(s) if !s.contains(['\r', '\n']) => Frame::Simple(s.to_string()),
            _ => Frame::Bulk(payload),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Ping {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let payload = match parser.next_bytes() {
            Ok(payload) => Some(payload),
            Err(CommandParserError::EndOfStream) => None,
            Err(e) => return Err(e),
        };
        parser.finish()?;

        Ok(Self { payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn without_payload() {
        let frame = Frame::Array(vec![Frame::Bulk(Bytes::from("PING"))]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(cmd, Command::Ping(Ping { payload: None }));

        let res = cmd.exec(Store::new()).unwrap();

        assert_eq!(res, Frame::Simple("PONG".to_string()));
    }

    #[test]
    fn with_payload() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("ping")),
            Frame::Bulk(Bytes::from("hello world")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Ping(Ping {
                payload: Some(Bytes::from("hello world"))
            })
        );

        let res = cmd.exec(Store::new()).unwrap();

        assert_eq!(res, Frame::Simple("hello world".to_string()));
    }

    #[test]
    fn with_multiline_payload() {
        let cmd = Ping {
            payload: Some(Bytes::from("hello\r\nworld")),
        };

        let res = cmd.exec(Store::new()).unwrap();

        assert_eq!(res, Frame::Bulk(Bytes::from("hello\r\nworld")));
    }
}
