use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{self, Store};
use crate::Error;

/// Insert all the specified values at the head of the list stored at `key`. If `key` does not
/// exist, it is created as an empty list before performing the push. Values are inserted one
/// after the other, so `LPUSH mylist a b c` results in a list containing `c` as first element,
/// `b` as second element and `a` as third element. Nothing is pushed to a key holding a string
/// and `0` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: Bytes,
    pub values: Vec<Bytes>,
}

impl Executable for Lpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let res = match store.lpush(self.key, self.values) {
            Ok(len) => Frame::Integer(len as i64),
            Err(store::Error::WrongType) => Frame::Integer(0),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;

        let mut values = vec![parser.next_bytes()?];
        while !parser.is_empty() {
            values.push(parser.next_bytes()?);
        }

        Ok(Self { key, values })
    }
}
