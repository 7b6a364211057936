mod app;
mod calendar;
mod config;
mod form;
mod help;
mod jumpto;
mod range;
mod server;
mod session;
mod storage;
mod styler;
mod theme;
mod trip;
mod validate;
use crate::app::DatePicker;
use crate::config::{Config, LOG_ENV};
use crate::form::{
    ActivityForm, Advance, ConfirmForm, FormError, GuestInput, LinkForm, NewTripForm,
    UpdateTripForm,
};
use crate::range::DateRange;
use crate::server::LocalServer;
use crate::session::Session;
use crate::storage::TripStorage;
use crate::trip::NewTrip;
use anyhow::{bail, Context};
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use time::{
    format_description::BorrowedFormatItem, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

static YMD_FMT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

#[derive(Clone, Debug, Eq, PartialEq)]
struct Arguments {
    data_dir: Option<PathBuf>,
    command: Command,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    New {
        destination: String,
        invite: Vec<String>,
        from: Option<Date>,
    },
    Show,
    Edit {
        destination: Option<String>,
    },
    Activity {
        title: String,
        date: Date,
        hour: String,
    },
    Link {
        title: String,
        url: String,
    },
    Confirm {
        participant: Uuid,
        name: String,
        email: String,
    },
    ConfirmTrip,
    Pick {
        date: Option<Date>,
    },
    Forget,
    Help,
    Version,
}

impl Arguments {
    fn from_parser(mut parser: Parser) -> Result<Arguments, lexopt::Error> {
        let mut data_dir = None;
        let mut subcommand: Option<String> = None;
        let mut values = Vec::new();
        let mut invite = Vec::new();
        let mut from = None;
        let mut destination = None;
        let mut name = None;
        let mut email = None;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => {
                    return Ok(Arguments {
                        data_dir,
                        command: Command::Help,
                    })
                }
                Arg::Short('V') | Arg::Long("version") => {
                    return Ok(Arguments {
                        data_dir,
                        command: Command::Version,
                    })
                }
                Arg::Long("data-dir") => data_dir = Some(PathBuf::from(parser.value()?)),
                Arg::Long("invite") if subcommand.as_deref() == Some("new") => {
                    invite.push(parser.value()?.string()?);
                }
                Arg::Long("from") if subcommand.as_deref() == Some("new") => {
                    from = Some(parse_date(parser.value()?)?);
                }
                Arg::Long("destination") if subcommand.as_deref() == Some("edit") => {
                    destination = Some(parser.value()?.string()?);
                }
                Arg::Long("name") if subcommand.as_deref() == Some("confirm") => {
                    name = Some(parser.value()?.string()?);
                }
                Arg::Long("email") if subcommand.as_deref() == Some("confirm") => {
                    email = Some(parser.value()?.string()?);
                }
                Arg::Value(value) if subcommand.is_none() => subcommand = Some(value.string()?),
                Arg::Value(value) => values.push(value),
                _ => return Err(arg.unexpected()),
            }
        }
        let mut values = values.into_iter();
        let command = match subcommand.as_deref() {
            None | Some("show") => Command::Show,
            Some("new") => Command::New {
                destination: required(&mut values, "<DESTINATION>")?.string()?,
                invite,
                from,
            },
            Some("edit") => Command::Edit { destination },
            Some("activity") => Command::Activity {
                title: required(&mut values, "<TITLE>")?.string()?,
                date: parse_date(required(&mut values, "<DATE>")?)?,
                hour: required(&mut values, "<HOUR>")?.string()?,
            },
            Some("link") => Command::Link {
                title: required(&mut values, "<TITLE>")?.string()?,
                url: required(&mut values, "<URL>")?.string()?,
            },
            Some("confirm") => Command::Confirm {
                participant: required(&mut values, "<PARTICIPANT-ID>")?.parse()?,
                name: name.ok_or(lexopt::Error::MissingValue {
                    option: Some(String::from("name")),
                })?,
                email: email.ok_or(lexopt::Error::MissingValue {
                    option: Some(String::from("email")),
                })?,
            },
            Some("confirm-trip") => Command::ConfirmTrip,
            Some("pick") => Command::Pick {
                date: values.next().map(parse_date).transpose()?,
            },
            Some("forget") => Command::Forget,
            Some(other) => return Err(format!("unknown command {other:?}").into()),
        };
        if let Some(extra) = values.next() {
            return Err(lexopt::Error::UnexpectedArgument(extra));
        }
        Ok(Arguments { data_dir, command })
    }

    fn run(self) -> anyhow::Result<()> {
        let command = match self.command {
            Command::Help => {
                print_help();
                return Ok(());
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            command => command,
        };
        let config = Config::resolve(self.data_dir)?;
        init_logging(&config.log_path())?;
        debug!(data_dir = %config.data_dir().display(), ?command, "Starting");
        let server = LocalServer::open(config.trips_path())?;
        let mut session = Session::new(server, TripStorage::new(config.current_trip_path()));
        let now = OffsetDateTime::now_local().context("failed to determine local time")?;
        let now = PrimitiveDateTime::new(now.date(), now.time());
        let today = now.date();
        match command {
            Command::New {
                destination,
                invite,
                from,
            } => {
                let mut form = NewTripForm::new();
                form.set_destination(destination.as_str());
                for email in &invite {
                    form.add_email(email)?;
                }
                let mut start = from.unwrap_or(today);
                let stdin = io::stdin();
                let trip = loop {
                    loop {
                        let picker = DatePicker::new("Trip dates", today)
                            .start_date(start)
                            .selection(form.dates());
                        let Some(dates) = pick_dates(picker)? else {
                            bail!("trip creation cancelled");
                        };
                        form.set_dates(dates);
                        match form.advance() {
                            Ok(Advance::Next(step)) => {
                                debug!(?step, ?dates, "Trip details accepted");
                                break;
                            }
                            Ok(Advance::Submit(_)) => bail!("trip form skipped the guest step"),
                            Err(FormError::Incomplete) if dates.endpoints().is_none() => {
                                println!("Pick both the first and the last day of the trip.");
                                if let Some(s) = dates.starts_at() {
                                    start = s.date();
                                }
                            }
                            Err(e) => return Err(e.into()),
                        }
                    }
                    match guest_step(&mut form, &mut stdin.lock(), &mut io::stdout())? {
                        GuestStep::Submit(trip) => break trip,
                        GuestStep::Back => {
                            let mut line = String::new();
                            print!("Destination (blank to keep): ");
                            io::stdout().flush()?;
                            stdin.lock().read_line(&mut line)?;
                            if !line.trim().is_empty() {
                                form.set_destination(line.trim());
                            }
                        }
                    }
                };
                let guests = form.guests_summary();
                let trip_id = session.create_trip(trip)?;
                if let Some(trip) = session.current_trip()? {
                    println!("Created trip {}", trip.when());
                } else {
                    println!("Created trip {trip_id}");
                }
                if !guests.is_empty() {
                    println!("{guests}: {}", form.emails().join(", "));
                }
            }
            Command::Show => match session.overview(now)? {
                Some(overview) => print!("{overview}"),
                None => println!("No current trip.  Create one with `tripcal new <DESTINATION>`."),
            },
            Command::Edit { destination } => {
                let Some(trip) = session.current_trip()? else {
                    bail!("no current trip; create one with `tripcal new`");
                };
                let current = DateRange::between(trip.starts_at.into(), trip.ends_at.into());
                let picker = DatePicker::new(format!("Dates for {}", trip.destination), today)
                    .start_date(trip.starts_at)
                    .selection(current);
                let Some(dates) = pick_dates(picker)? else {
                    bail!("edit cancelled");
                };
                let form = UpdateTripForm {
                    destination: destination.unwrap_or(trip.destination),
                    dates,
                };
                let trip = session.update_trip(form.validate()?)?;
                println!("Updated trip: {}", trip.when());
            }
            Command::Activity { title, date, hour } => {
                let form = ActivityForm {
                    title,
                    date: Some(date),
                    hour,
                };
                session.add_activity(form.validate()?)?;
                println!("Activity registered.");
            }
            Command::Link { title, url } => {
                let form = LinkForm { title, url };
                session.add_link(form.validate()?)?;
                println!("Link registered.");
            }
            Command::Confirm {
                participant,
                name,
                email,
            } => {
                let form = ConfirmForm { name, email };
                session.confirm(participant, form.validate()?)?;
                println!("Attendance confirmed.");
            }
            Command::ConfirmTrip => {
                let trip = session.confirm_trip()?;
                println!("{} is confirmed.", trip.when());
            }
            Command::Pick { date } => {
                let picker = DatePicker::new("Dates", today).start_date(date.unwrap_or(today));
                match pick_dates(picker)? {
                    Some(range) => print_selection(&range),
                    None => println!("Cancelled."),
                }
            }
            Command::Forget => {
                session.forget()?;
                println!("Current trip forgotten.");
            }
            Command::Help | Command::Version => (),
        }
        Ok(())
    }
}

fn required<I: Iterator<Item = OsString>>(
    values: &mut I,
    name: &str,
) -> Result<OsString, lexopt::Error> {
    values
        .next()
        .ok_or_else(|| format!("missing {name} argument").into())
}

fn parse_date(value: OsString) -> Result<Date, lexopt::Error> {
    let value = value.string()?;
    match Date::parse(&value, &YMD_FMT) {
        Ok(d) => Ok(d),
        Err(e) => Err(lexopt::Error::ParsingFailed {
            value,
            error: Box::new(e),
        }),
    }
}

/// Result of the guest step of `tripcal new`
#[derive(Clone, Debug, Eq, PartialEq)]
enum GuestStep {
    Submit(NewTrip),
    Back,
}

/// Read guest emails one per line until a blank line or end of input.
/// `-EMAIL` removes a guest and `<` goes back to the destination & dates.
fn guest_step<R: BufRead, W: Write>(
    form: &mut NewTripForm,
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<GuestStep> {
    writeln!(
        output,
        "Enter guest emails, one per line (-EMAIL removes, < changes destination/dates, blank line finishes)."
    )?;
    loop {
        write!(output, "guest> ")?;
        output.flush()?;
        let mut line = String::new();
        let input = if input.read_line(&mut line)? == 0 {
            GuestInput::Done
        } else {
            GuestInput::parse(&line)
        };
        match input {
            GuestInput::Done => match form.advance()? {
                Advance::Submit(trip) => return Ok(GuestStep::Submit(trip)),
                Advance::Next(step) => bail!("trip form stopped at {step:?}"),
            },
            GuestInput::Invite(email) => match form.add_email(&email) {
                Ok(()) => writeln!(output, "{}", form.guests_summary())?,
                Err(e) => writeln!(output, "{e}")?,
            },
            GuestInput::Uninvite(email) => {
                if form.remove_email(&email) {
                    writeln!(output, "Removed {email}")?;
                } else {
                    writeln!(output, "{email} has not been invited")?;
                }
            }
            GuestInput::Back => {
                form.back();
                return Ok(GuestStep::Back);
            }
        }
    }
}

fn print_selection(range: &DateRange) {
    let Some(start) = range.starts_at() else {
        println!("No dates selected.");
        return;
    };
    println!("{}", range.display_text());
    println!("Starts: {start}");
    if let Some(end) = range.ends_at() {
        println!("Ends:   {end}");
    }
    for (point, highlight) in range.marked_dates() {
        let edge = match (highlight.starting_day, highlight.ending_day) {
            (true, true) => "start & end",
            (true, false) => "start",
            (false, true) => "end",
            (false, false) => "",
        };
        println!("  {point}  {:>12}  {edge}", point.timestamp());
    }
}

fn print_help() {
    println!("Usage: tripcal [--data-dir DIR] [COMMAND]");
    println!();
    println!("Plan trips from the terminal, picking their dates on a calendar");
    println!();
    println!("Commands:");
    println!("  new <DESTINATION> [--invite EMAIL]... [--from YYYY-MM-DD]");
    println!("                    Create a trip and pick its dates");
    println!("  show              Show the current trip (default)");
    println!("  edit [--destination DEST]");
    println!("                    Change the current trip's destination & dates");
    println!("  activity <TITLE> <YYYY-MM-DD> <HOUR>");
    println!("                    Register an activity on the current trip");
    println!("  link <TITLE> <URL>");
    println!("                    Register an important link on the current trip");
    println!("  confirm <PARTICIPANT-ID> --name NAME --email EMAIL");
    println!("                    Confirm a guest's attendance");
    println!("  confirm-trip      Confirm the current trip");
    println!("  pick [YYYY-MM-DD] Pick a date range and print it");
    println!("  forget            Stop remembering the current trip");
    println!();
    println!("Options:");
    println!("  --data-dir DIR    Store trips in DIR [env: {}]", config::DATA_DIR_ENV);
    println!("  -h, --help        Display this help message and exit");
    println!("  -V, --version     Show the program version and exit");
    println!();
    println!("Set {LOG_ENV} (e.g., {LOG_ENV}=debug) to log to tripcal.log in the data directory.");
}

fn init_logging(log_path: &Path) -> anyhow::Result<()> {
    if std::env::var_os(LOG_ENV).is_none() {
        return Ok(());
    }
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .with_context(|| format!("invalid {LOG_ENV} filter"))?;
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn pick_dates(picker: DatePicker) -> anyhow::Result<Option<DateRange>> {
    with_terminal(|mut terminal| {
        terminal.hide_cursor().context("failed to hide cursor")?;
        picker.run(&mut terminal).context("calendar failed")
    })
}

fn main() -> anyhow::Result<()> {
    Arguments::from_parser(Parser::from_env())?.run()
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn parse(args: &[&str]) -> Result<Arguments, lexopt::Error> {
        Arguments::from_parser(Parser::from_args(args.iter().copied()))
    }

    fn command(args: &[&str]) -> Command {
        parse(args).unwrap().command
    }

    #[test]
    fn test_default_is_show() {
        assert_eq!(
            parse(&[]).unwrap(),
            Arguments {
                data_dir: None,
                command: Command::Show
            }
        );
        assert_eq!(command(&["show"]), Command::Show);
    }

    #[test]
    fn test_data_dir_anywhere() {
        let args = parse(&["show", "--data-dir", "/tmp/trips"]).unwrap();
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/trips")));
        let args = parse(&["--data-dir=/tmp/trips", "forget"]).unwrap();
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/trips")));
        assert_eq!(args.command, Command::Forget);
    }

    #[test]
    fn test_confirm_trip() {
        assert_eq!(command(&["confirm-trip"]), Command::ConfirmTrip);
        assert!(parse(&["confirm-trip", "extra"]).is_err());
    }

    #[test]
    fn test_new() {
        assert_eq!(
            command(&[
                "new",
                "Lisbon",
                "--invite",
                "ana@example.com",
                "--invite=bo@example.com",
                "--from",
                "2025-03-01",
            ]),
            Command::New {
                destination: "Lisbon".into(),
                invite: vec!["ana@example.com".into(), "bo@example.com".into()],
                from: Some(date!(2025 - 03 - 01)),
            }
        );
    }

    #[test]
    fn test_new_missing_destination() {
        assert!(parse(&["new"]).is_err());
    }

    #[test]
    fn test_option_for_other_command() {
        assert!(parse(&["show", "--invite", "ana@example.com"]).is_err());
        assert!(parse(&["--invite", "ana@example.com", "new", "Lisbon"]).is_err());
    }

    #[test]
    fn test_activity() {
        assert_eq!(
            command(&["activity", "Tram 28", "2025-03-06", "9"]),
            Command::Activity {
                title: "Tram 28".into(),
                date: date!(2025 - 03 - 06),
                hour: "9".into(),
            }
        );
        assert!(parse(&["activity", "Tram 28", "06/03/2025", "9"]).is_err());
        assert!(parse(&["activity", "Tram 28", "2025-03-06"]).is_err());
    }

    #[test]
    fn test_link() {
        assert_eq!(
            command(&["link", "Hotel", "https://hotel.example.com"]),
            Command::Link {
                title: "Hotel".into(),
                url: "https://hotel.example.com".into(),
            }
        );
        assert!(parse(&["link", "Hotel", "https://a.example", "extra"]).is_err());
    }

    #[test]
    fn test_confirm() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(
            command(&["confirm", id, "--name", "Ana", "--email", "ana@example.com"]),
            Command::Confirm {
                participant: Uuid::parse_str(id).unwrap(),
                name: "Ana".into(),
                email: "ana@example.com".into(),
            }
        );
        assert!(parse(&["confirm", id, "--name", "Ana"]).is_err());
        assert!(parse(&["confirm", "not-a-uuid", "--name", "Ana", "--email", "a@b.co"]).is_err());
    }

    #[test]
    fn test_pick() {
        assert_eq!(command(&["pick"]), Command::Pick { date: None });
        assert_eq!(
            command(&["pick", "2025-12-30"]),
            Command::Pick {
                date: Some(date!(2025 - 12 - 30))
            }
        );
    }

    #[test]
    fn test_edit() {
        assert_eq!(
            command(&["edit", "--destination", "Porto"]),
            Command::Edit {
                destination: Some("Porto".into())
            }
        );
        assert_eq!(command(&["edit"]), Command::Edit { destination: None });
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(command(&["new", "-h"]), Command::Help);
        assert_eq!(command(&["--version"]), Command::Version);
    }

    fn details_done(destination: &str) -> NewTripForm {
        let mut form = NewTripForm::new();
        form.set_destination(destination);
        form.set_dates(DateRange::between(
            date!(2025 - 03 - 05).into(),
            date!(2025 - 03 - 07).into(),
        ));
        form.advance().unwrap();
        form
    }

    #[test]
    fn test_guest_step_submit() {
        let mut form = details_done("Lisbon");
        let mut input = io::Cursor::new("ana@example.com\nnope\nbo@example.org\n-ana@example.com\n\n");
        let mut output = Vec::new();
        let outcome = guest_step(&mut form, &mut input, &mut output).unwrap();
        assert_eq!(
            outcome,
            GuestStep::Submit(NewTrip {
                destination: "Lisbon".into(),
                starts_at: date!(2025 - 03 - 05),
                ends_at: date!(2025 - 03 - 07),
                emails_to_invite: vec!["bo@example.org".into()],
            })
        );
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("invalid email address \"nope\""));
        assert!(output.contains("Removed ana@example.com"));
    }

    #[test]
    fn test_guest_step_end_of_input() {
        let mut form = details_done("Lisbon");
        let outcome = guest_step(&mut form, &mut io::Cursor::new(""), &mut io::sink()).unwrap();
        assert!(matches!(outcome, GuestStep::Submit(trip) if trip.emails_to_invite.is_empty()));
    }

    #[test]
    fn test_guest_step_back() {
        let mut form = details_done("Lisbon");
        let mut input = io::Cursor::new("ana@example.com\n<\n");
        let outcome = guest_step(&mut form, &mut input, &mut io::sink()).unwrap();
        assert_eq!(outcome, GuestStep::Back);
        assert!(form.set_destination("Porto"));
        assert_eq!(form.emails(), ["ana@example.com"]);
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse(&["launch"]).is_err());
    }
}
