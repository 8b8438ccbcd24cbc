pub mod executable;
pub mod get;
pub mod lpop;
pub mod lpush;
pub mod ping;
pub mod quit;
pub mod set;

use bytes::Bytes;
use std::str::FromStr;
use std::vec;
use strum_macros::{EnumString, IntoStaticStr};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

use get::Get;
use lpop::Lpop;
use lpush::Lpush;
use ping::Ping;
use quit::Quit;
use set::Set;

#[derive(Debug, PartialEq)]
pub enum Command {
    Get(Get),
    Lpop(Lpop),
    Lpush(Lpush),
    Set(Set),

    Ping(Ping),
    Quit(Quit),
}

impl Command {
    /// Whether the connection must be closed once the reply to this command is sent.
    pub fn is_quit(&self) -> bool {
        matches!(self, Command::Quit(_))
    }
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Get(cmd) => cmd.exec(store),
            Command::Lpop(cmd) => cmd.exec(store),
            Command::Lpush(cmd) => cmd.exec(store),
            Command::Ping(cmd) => cmd.exec(store),
            Command::Quit(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
        }
    }
}

/// Names of the supported commands, matched regardless of ASCII case. The lowercase form is the
/// one used in error replies.
#[derive(Debug, Clone, Copy, PartialEq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum CommandName {
    Get,
    Lpop,
    Lpush,
    Ping,
    Quit,
    Set,
}

impl TryFrom<Frame> for Command {
    type Error = CommandParserError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the Redis server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) if !array.is_empty() => array,
            _ => return Err(CommandParserError::InvalidCommand),
        };

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;
        let name = CommandName::from_str(&command_name).map_err(|_| {
            CommandParserError::UnknownCommand {
                command: single_line(&command_name.to_ascii_uppercase()),
            }
        })?;

        let command = match name {
            CommandName::Get => Get::try_from(&mut *parser).map(Command::Get),
            CommandName::Lpop => Lpop::try_from(&mut *parser).map(Command::Lpop),
            CommandName::Lpush => Lpush::try_from(&mut *parser).map(Command::Lpush),
            CommandName::Ping => Ping::try_from(&mut *parser).map(Command::Ping),
            CommandName::Quit => Quit::try_from(&mut *parser).map(Command::Quit),
            CommandName::Set => Set::try_from(&mut *parser).map(Command::Set),
        };

        command.map_err(|err| match err {
            CommandParserError::EndOfStream | CommandParserError::TrailingArguments => {
                let command: &'static str = name.into();
                CommandParserError::WrongArity {
                    command: command.to_string(),
                }
            }
            err => err,
        })
    }
}

/// Error replies are line-delimited, so any control character coming from the client is
/// replaced before being echoed back.
fn single_line(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

pub struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self
            .parts
            .next()
            .ok_or(CommandParserError::InvalidCommand)?;

        // Names are arbitrary bytes. Anything that is not UTF-8 cannot name a known command and is
        // only ever echoed back, so a lossy conversion is enough.
        match command_name {
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            _ => Err(CommandParserError::InvalidCommand),
        }
    }

    /// Returns the next argument as raw bytes. Keys and values are binary safe, both `Simple` and
    /// `Bulk` frames are accepted. While errors are stored as strings, they are considered
    /// separate types.
    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn is_empty(&self) -> bool {
        self.parts.len() == 0
    }

    /// Ensures every argument has been consumed.
    fn finish(&mut self) -> Result<(), CommandParserError> {
        match self.parts.next() {
            None => Ok(()),
            Some(_) => Err(CommandParserError::TrailingArguments),
        }
    }
}

/// Errors found while turning a request frame into a [`Command`]. They are reported back to the
/// client as error replies and the connection stays open.
#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("ERR invalid command")]
    InvalidCommand,
    #[error("ERR unknown command `{command}`")]
    UnknownCommand { command: String },
    #[error("ERR wrong number of arguments for '{command}' command")]
    WrongArity { command: String },
    #[error("ERR protocol error; invalid argument, expected {expected}, got {actual:?}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("ERR protocol error; the command has fewer arguments than expected")]
    EndOfStream,
    #[error("ERR protocol error; the command has more arguments than expected")]
    TrailingArguments,
}

impl From<CommandParserError> for Frame {
    fn from(err: CommandParserError) -> Self {
        Frame::Error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(parts: &[&str]) -> Frame {
        Frame::Array(
            parts
                .iter()
                .map(|part| Frame::Bulk(Bytes::from(part.to_string())))
                .collect(),
        )
    }

    #[test]
    fn parse_get_command_with_simple_string() {
        let get_frame = Frame::Array(vec![
            Frame::Simple(String::from("GET")),
            Frame::Simple(String::from("foo")),
        ]);

        let get_command = Command::try_from(get_frame).unwrap();

        assert_eq!(
            get_command,
            Command::Get(Get {
                key: Bytes::from("foo")
            })
        );
    }

    #[test]
    fn parse_command_name_is_case_insensitive() {
        for name in ["lpop", "LPOP", "LpOp"] {
            let cmd = Command::try_from(request(&[name, "list"])).unwrap();

            assert_eq!(
                cmd,
                Command::Lpop(Lpop {
                    key: Bytes::from("list")
                })
            );
        }
    }

    #[test]
    fn parse_set_command_with_mixed_frames() {
        let set_frame = Frame::Array(vec![
            Frame::Simple(String::from("SET")),
            Frame::Bulk(Bytes::from("foo")),
            Frame::Simple(String::from("baz")),
        ]);

        let set_command = Command::try_from(set_frame).unwrap();

        assert_eq!(
            set_command,
            Command::Set(Set {
                key: Bytes::from("foo"),
                value: Bytes::from("baz")
            })
        );
    }

    #[test]
    fn unknown_command() {
        let err = Command::try_from(request(&["flushall", "now"])).unwrap_err();

        assert_eq!(
            err,
            CommandParserError::UnknownCommand {
                command: "FLUSHALL".to_string()
            }
        );
        assert_eq!(
            Frame::from(err),
            Frame::Error("ERR unknown command `FLUSHALL`".to_string())
        );
    }

    #[test]
    fn unknown_command_name_never_spans_lines() {
        let err = Command::try_from(request(&["foo\r\nbar"])).unwrap_err();

        assert_eq!(
            err,
            CommandParserError::UnknownCommand {
                command: "FOO  BAR".to_string()
            }
        );
    }

    #[test]
    fn unknown_binary_command() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from_static(b"x\xffy")),
            Frame::Bulk(Bytes::from("key")),
        ]);

        let err = Command::try_from(frame).unwrap_err();

        assert_eq!(
            err,
            CommandParserError::UnknownCommand {
                command: "X\u{FFFD}Y".to_string()
            }
        );
        assert_eq!(
            Frame::from(err),
            Frame::Error("ERR unknown command `X\u{FFFD}Y`".to_string())
        );
    }

    #[test]
    fn binary_key() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("GET")),
            Frame::Bulk(Bytes::from_static(b"\xff\xfe")),
        ]);

        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Get(Get {
                key: Bytes::from_static(b"\xff\xfe")
            })
        );
    }

    #[test]
    fn invalid_command() {
        let frames = [
            Frame::Array(vec![]),
            Frame::Simple("PING".to_string()),
            Frame::Bulk(Bytes::from("PING")),
            Frame::Integer(1),
            Frame::Null,
            Frame::Array(vec![Frame::Integer(1)]),
        ];

        for frame in frames {
            let err = Command::try_from(frame).unwrap_err();

            assert_eq!(err, CommandParserError::InvalidCommand);
            assert_eq!(
                Frame::from(err),
                Frame::Error("ERR invalid command".to_string())
            );
        }
    }

    #[test]
    fn invalid_argument_frame() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("GET")),
            Frame::Integer(42),
        ]);

        let err = Command::try_from(frame).unwrap_err();

        assert_eq!(
            err,
            CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: Frame::Integer(42)
            }
        );
    }

    #[test]
    fn wrong_arity() {
        let cases: &[(&[&str], &str)] = &[
            (&["SET"][..], "set"),
            (&["SET", "key"][..], "set"),
            (&["SET", "key", "value", "extra"][..], "set"),
            (&["GET"][..], "get"),
            (&["GET", "key", "extra"][..], "get"),
            (&["LPUSH"][..], "lpush"),
            (&["LPUSH", "list"][..], "lpush"),
            (&["LPOP"][..], "lpop"),
            (&["LPOP", "list", "extra"][..], "lpop"),
            (&["PING", "a", "b"][..], "ping"),
            (&["QUIT", "now"][..], "quit"),
        ];

        for (parts, name) in cases {
            let err = Command::try_from(request(parts)).unwrap_err();

            assert_eq!(
                Frame::from(err),
                Frame::Error(format!(
                    "ERR wrong number of arguments for '{}' command",
                    name
                ))
            );
        }
    }

    #[test]
    fn quit_is_quit() {
        let quit = Command::try_from(request(&["quit"])).unwrap();
        let ping = Command::try_from(request(&["ping"])).unwrap();

        assert!(quit.is_quit());
        assert!(!ping.is_quit());
    }
}
