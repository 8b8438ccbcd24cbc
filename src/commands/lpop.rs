use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{self, Store};
use crate::Error;

/// Removes and returns the first element of the list stored at `key`. When the key does not
/// exist, or holds a string, `nil` is returned. A list is deleted once its last element is popped.
///
/// Ref: <https://redis.io/docs/latest/commands/lpop/>
#[derive(Debug, PartialEq)]
pub struct Lpop {
    pub key: Bytes,
}

impl Executable for Lpop {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let res = match store.lpop(&self.key) {
            Ok(Some(value)) => Frame::Bulk(value),
            Ok(None) | Err(store::Error::WrongType) => Frame::Null,
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Lpop {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { key })
    }
}
