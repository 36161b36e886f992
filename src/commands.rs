//! Line commands that drive the application from a terminal.
//!
//! Each input line maps to one reducer [`Event`] or to a view-only command. Pointer coordinates
//! are container pixels, as a touch or mouse event would report them.

use thiserror::Error;

use crate::app::{CopyTarget, Event};
use crate::crop::{Handle, Point, Size};

pub const USAGE: &str = "\
Commands:
  drag <handle> <x> <y>      start dragging (handle: move, top, bottom, left, right,
                             top-left, top-right, bottom-left, bottom-right)
  to <x> <y>                 move the pointer of the current drag
  release                    end the drag
  pinch <x1> <y1> <x2> <y2>  two-finger pinch (first call starts the gesture)
  unpinch                    end the pinch
  resize <width> <height>    set the displayed container size
  capture                    extract text from the crop region
  copy [id]                  copy the latest result, or a history record
  delete <id>                remove a history record
  clear                      remove all history records
  history                    list history records
  dismiss                    hide the notice
  close                      hide the latest result
  retry                      retry the camera after an error
  hide | show                simulate the app losing or regaining visibility
  key [API_KEY]              set the API key (no value clears it)
  help                       show this help
  quit                       exit";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command `{0}`")]
    Unknown(String),
    #[error("Unknown handle `{0}`")]
    UnknownHandle(String),
    #[error("`{command}` expects {expected}")]
    Arguments {
        command: &'static str,
        expected: &'static str,
    },
    #[error("Invalid number `{0}`")]
    Number(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch(Event),
    Capture,
    History,
    Help,
    Quit,
}

fn numbers<const N: usize>(
    command: &'static str,
    expected: &'static str,
    args: &[&str],
) -> Result<[f64; N], CommandError> {
    if args.len() != N {
        return Err(CommandError::Arguments { command, expected });
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CommandError::Number(arg.to_string()))?;
    }
    Ok(out)
}

fn no_args(command: &'static str, args: &[&str], value: Command) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(value)
    } else {
        Err(CommandError::Arguments {
            command,
            expected: "no arguments",
        })
    }
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let args: Vec<&str> = rest.split_whitespace().collect();

    let event = match name.to_ascii_lowercase().as_str() {
        "drag" => {
            let Some((handle, coords)) = args.split_first() else {
                return Err(CommandError::Arguments {
                    command: "drag",
                    expected: "<handle> <x> <y>",
                });
            };
            let handle = Handle::from_str(handle)
                .ok_or_else(|| CommandError::UnknownHandle(handle.to_string()))?;
            let [x, y] = numbers("drag", "<handle> <x> <y>", coords)?;
            Event::BeginDrag {
                handle,
                pointer: Point::new(x, y),
            }
        }
        "to" => {
            let [x, y] = numbers("to", "<x> <y>", &args)?;
            Event::UpdateDrag(Point::new(x, y))
        }
        "release" => return no_args("release", &args, Command::Dispatch(Event::EndDrag)),
        "pinch" => {
            let [x1, y1, x2, y2] = numbers("pinch", "<x1> <y1> <x2> <y2>", &args)?;
            Event::PinchMoved(Point::new(x1, y1), Point::new(x2, y2))
        }
        "unpinch" => return no_args("unpinch", &args, Command::Dispatch(Event::PinchEnded)),
        "resize" => {
            let [width, height] = numbers("resize", "<width> <height>", &args)?;
            Event::ContainerResized(Size::new(width, height))
        }
        "capture" => return no_args("capture", &args, Command::Capture),
        "copy" => match args.as_slice() {
            [] => Event::CopyText(CopyTarget::Latest),
            [id] => Event::CopyText(CopyTarget::Record(id.to_string())),
            _ => {
                return Err(CommandError::Arguments {
                    command: "copy",
                    expected: "at most one record id",
                })
            }
        },
        "delete" => match args.as_slice() {
            [id] => Event::DeleteRecord(id.to_string()),
            _ => {
                return Err(CommandError::Arguments {
                    command: "delete",
                    expected: "<id>",
                })
            }
        },
        "clear" => return no_args("clear", &args, Command::Dispatch(Event::ClearHistory)),
        "history" => return no_args("history", &args, Command::History),
        "dismiss" => return no_args("dismiss", &args, Command::Dispatch(Event::DismissNotice)),
        "close" => return no_args("close", &args, Command::Dispatch(Event::CloseResult)),
        "retry" => return no_args("retry", &args, Command::Dispatch(Event::RetryCamera)),
        "hide" => {
            return no_args(
                "hide",
                &args,
                Command::Dispatch(Event::VisibilityChanged(false)),
            )
        }
        "show" => {
            return no_args(
                "show",
                &args,
                Command::Dispatch(Event::VisibilityChanged(true)),
            )
        }
        "key" => Event::SetCredential(rest.to_string()),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Command::Dispatch(event))
}
