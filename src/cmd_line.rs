//! Command line options that are used across applications.

use std::path::{Path, PathBuf};

use clap::{crate_authors, crate_version, App, Arg, ArgMatches};

use crate::{errors::StationRefErr, query::HttpQueryClient, time::TimeWindow};

/// Struct to package up command line arguments.
#[derive(Clone, Debug)]
pub struct CommonCmdLineArgs {
    // Host (and port) of the station reference service
    hostname: String,
    // Limits for every lookup
    window: TimeWindow,
    // Where export files go
    output_dir: PathBuf,
    // Log debug messages
    verbose: bool,
}

impl<'a, 'b> CommonCmdLineArgs {
    const DEFAULT_OUTPUT_DIR: &'static str = ".";

    /// Create a new set of args.
    pub fn new_app(app_name: &'static str, about: &'static str) -> App<'a, 'b> {
        App::new(app_name)
            .author(crate_authors!())
            .about(about)
            .version(crate_version!())
            .arg(
                Arg::with_name("hostname")
                    .long("hostname")
                    .takes_value(true)
                    .default_value(HttpQueryClient::DEFAULT_HOST)
                    .help("Host and port of the station reference service.")
                    .long_help(concat!(
                        "Host and port of the station reference service, e.g. localhost:8080.",
                        " 'http://' is added if no scheme is given."
                    )),
            )
            .arg(
                Arg::with_name("start-time")
                    .long("start-time")
                    .takes_value(true)
                    .help("Earliest time of interest.")
                    .long_help(concat!(
                        "Earliest time of interest, as epoch seconds (1514764800) or ISO 8601",
                        " (2018-01-01 or 2018-01-01T00:00:00)."
                    )),
            )
            .arg(
                Arg::with_name("end-time")
                    .long("end-time")
                    .takes_value(true)
                    .help("Latest time of interest.")
                    .long_help(concat!(
                        "Latest time of interest, as epoch seconds (1514764800) or ISO 8601",
                        " (2018-01-01 or 2018-01-01T00:00:00)."
                    )),
            )
            .arg(
                Arg::with_name("output-directory")
                    .short("o")
                    .long("output-directory")
                    .takes_value(true)
                    .default_value(Self::DEFAULT_OUTPUT_DIR)
                    .help("Where to write exported files.")
                    .long_help("Where to write exported files. It is created if it is missing."),
            )
            .arg(
                Arg::with_name("verbose")
                    .short("v")
                    .long("verbose")
                    .help("Log what is going on.")
                    .long_help("Log debug messages. RUST_LOG overrides this."),
            )
            .after_help(concat!(
                "If no start or end time is given, all versions are requested. The start time ",
                "must not be after the end time, or in the future."
            ))
    }

    /// Process an `App` to get the parsed values out of it and the matches object so an application
    /// can continue with further argument parsing.
    pub fn matches(app: App<'a, 'b>) -> Result<(Self, ArgMatches<'a>), StationRefErr> {
        let matches = app.get_matches();
        let cmd_line_opts = CommonCmdLineArgs::from_matches(&matches);

        let usage = matches.usage().to_owned();
        let print_usage_message = |msg: &str| -> ! {
            println!("\n{}\n\n{}\n", msg, usage);
            println!("Try the -h or --help option for more instructions.");
            ::std::process::exit(1);
        };

        match cmd_line_opts {
            Ok(opts) => Ok((opts, matches)),
            Err(err @ StationRefErr::InvalidTime(_)) => print_usage_message(&err.to_string()),
            Err(err) => Err(err),
        }
    }

    /// Pull the common values out of already parsed matches.
    pub fn from_matches(matches: &ArgMatches<'_>) -> Result<Self, StationRefErr> {
        let hostname = matches
            .value_of("hostname")
            .unwrap_or(HttpQueryClient::DEFAULT_HOST)
            .to_owned();

        let window = TimeWindow::from_args(matches.value_of("start-time"), matches.value_of("end-time"))?;

        let output_dir = PathBuf::from(
            matches
                .value_of("output-directory")
                .unwrap_or(Self::DEFAULT_OUTPUT_DIR),
        );

        Ok(CommonCmdLineArgs {
            hostname,
            window,
            output_dir,
            verbose: matches.is_present("verbose"),
        })
    }

    /// Get the host name of the service
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Get the time window for lookups.
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Get the output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Should debug messages be logged?
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
