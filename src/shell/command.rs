//! Shell command parsing.

use std::str::FromStr;

use crate::error::{AppError, Result};

/// What `show` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowArg {
    /// The first n records as JSON
    Records(usize),
    /// Only the number of records
    Length,
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `query [key=value]*`
    Query(Vec<String>),
    /// `show [n|length]`
    Show(ShowArg),
    /// `schedule [day]*`, day names exactly as typed
    Schedule(Vec<String>),
    /// `export`
    Export,
    /// `draw [building] [room|floor]`
    Draw {
        building: Option<String>,
        target: Option<String>,
    },
    /// `course <prefix> <number> <year> <semester>`
    Course {
        prefix: String,
        number: String,
        year: String,
        semester: String,
    },
    /// `save`
    Save,
    /// `help`
    Help,
    /// `exit` or `quit`
    Exit,
}

impl Command {
    /// Parse one input line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(None);
        };
        let args: Vec<String> = tokens.map(str::to_string).collect();

        let command = match name.to_lowercase().as_str() {
            "query" => Command::Query(args),
            "show" => Command::Show(parse_show(&args)?),
            "schedule" => Command::Schedule(args),
            "export" => no_args(name, &args, Command::Export)?,
            "draw" => {
                if args.len() > 2 {
                    return Err(AppError::malformed("usage: draw [building] [room|floor]"));
                }
                let mut args = args.into_iter();
                Command::Draw {
                    building: args.next(),
                    target: args.next(),
                }
            }
            "course" => match <[String; 4]>::try_from(args) {
                Ok([prefix, number, year, semester]) => Command::Course {
                    prefix: prefix.to_uppercase(),
                    number,
                    year,
                    semester: semester.to_uppercase(),
                },
                Err(_) => {
                    return Err(AppError::malformed(
                        "usage: course <prefix> <number> <year> <semester>",
                    ));
                }
            },
            "save" => no_args(name, &args, Command::Save)?,
            "help" => Command::Help,
            "exit" | "quit" => Command::Exit,
            other => {
                return Err(AppError::malformed(format!(
                    "unknown command '{other}', try 'help'"
                )));
            }
        };

        Ok(Some(command))
    }
}

impl FromStr for Command {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Command::parse(s)?.ok_or_else(|| AppError::malformed("empty command"))
    }
}

fn no_args(name: &str, args: &[String], command: Command) -> Result<Command> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(AppError::malformed(format!("'{name}' takes no arguments")))
    }
}

fn parse_show(args: &[String]) -> Result<ShowArg> {
    match args {
        [] => Ok(ShowArg::Records(1)),
        [arg] if arg.eq_ignore_ascii_case("length") => Ok(ShowArg::Length),
        [arg] => arg.parse().map(ShowArg::Records).map_err(|_| {
            AppError::malformed(format!("show expects a count or 'length', got '{arg}'"))
        }),
        _ => Err(AppError::malformed("usage: show [n|length]")),
    }
}

/// Text printed by `help`.
pub const HELP: &str = "\
Commands:
  query [key=value]*           fetch sections; keys: session building room meetingDays
  show [n|length]              print the first n records (default 1) or the count
  schedule [day]*              weekly agenda of the current records, e.g. schedule Monday
  course <prefix> <num> <year> <semester>
                               fetch the sections of one course, e.g. course cs 1337 23 f
  export                       write the current records as JSON
  draw [building] [room|floor] write a KML drawing of a building floor
  save                         write the response cache to disk
  help                         show this message
  exit | quit                  leave the shell";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_query_keeps_tokens() {
        let command: Command = "query session=23F room=1.102".parse().unwrap();
        assert_eq!(
            command,
            Command::Query(vec!["session=23F".into(), "room=1.102".into()])
        );
    }

    #[test]
    fn test_parse_show() {
        assert_eq!("show".parse::<Command>().unwrap(), Command::Show(ShowArg::Records(1)));
        assert_eq!("show 5".parse::<Command>().unwrap(), Command::Show(ShowArg::Records(5)));
        assert_eq!("show length".parse::<Command>().unwrap(), Command::Show(ShowArg::Length));
        assert!("show lots".parse::<Command>().is_err());
    }

    #[test]
    fn test_parse_schedule_days() {
        assert_eq!(
            "schedule Thursday Monday".parse::<Command>().unwrap(),
            Command::Schedule(vec!["Thursday".into(), "Monday".into()])
        );
        assert_eq!(
            "schedule mon Funday".parse::<Command>().unwrap(),
            Command::Schedule(vec!["mon".into(), "Funday".into()])
        );
        assert_eq!("schedule".parse::<Command>().unwrap(), Command::Schedule(vec![]));
    }

    #[test]
    fn test_parse_course() {
        assert_eq!(
            "course cs 1337 23 f".parse::<Command>().unwrap(),
            Command::Course {
                prefix: "CS".into(),
                number: "1337".into(),
                year: "23".into(),
                semester: "F".into(),
            }
        );
        assert!("course cs 1337".parse::<Command>().is_err());
    }

    #[test]
    fn test_parse_draw() {
        assert_eq!(
            "draw JO 1.102".parse::<Command>().unwrap(),
            Command::Draw {
                building: Some("JO".into()),
                target: Some("1.102".into()),
            }
        );
        assert_eq!(
            "draw".parse::<Command>().unwrap(),
            Command::Draw {
                building: None,
                target: None
            }
        );
        assert!("draw a b c".parse::<Command>().is_err());
    }

    #[test]
    fn test_exit_aliases_and_unknown() {
        assert_eq!("QUIT".parse::<Command>().unwrap(), Command::Exit);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Exit);
        assert!("export now".parse::<Command>().is_err());
        assert!("frobnicate".parse::<Command>().is_err());
    }
}
