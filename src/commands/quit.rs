use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Ask the server to close the connection. The connection is closed as soon as all pending
/// replies have been written to the client.
///
/// Ref: <https://redis.io/docs/latest/commands/quit/>
#[derive(Debug, PartialEq)]
pub struct Quit;

impl Executable for Quit {
    fn exec(self, _store: Store) -> Result<Frame, Error> {
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Quit {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parser.finish()?;
        Ok(Self)
    }
}
