use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{self, Store};
use crate::Error;

/// Get the value of `key`. If the key does not exist, or holds a list, the special value `nil` is
/// returned.
///
/// Ref: <https://redis.io/docs/latest/commands/get/>
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: Bytes,
}

impl Executable for Get {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let res = match store.get(&self.key) {
            Ok(Some(value)) => Frame::Bulk(value),
            // A list is not a string value, so there is nothing to get.
            Ok(None) | Err(store::Error::WrongType) => Frame::Null,
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Get {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { key })
    }
}
