//! Station reference client.
//!
//! Looks up reference information from the station reference service and prints it as a table,
//! or exports everything known about one channel as CSS 3.0 flat files.

use std::{error::Error, str::FromStr};

use clap::{Arg, ArgMatches};
use stationref::{
    CommonCmdLineArgs, CssExporter, HttpQueryClient, ParentKey, QueryRequest, ResourceKind,
    ResourceQuery, StationRefErr, TablePrinter, TimeWindow,
};
use strum_macros::{Display, EnumString};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn main() {
    if let Err(ref e) = run() {
        println!("error: {}", e);

        let mut err: &dyn Error = e;
        while let Some(cause) = err.source() {
            println!("caused by: {}", cause);
            err = cause;
        }

        ::std::process::exit(1);
    }
}

/// What to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
enum Mode {
    Networks,
    Stations,
    Sites,
    Channels,
    Digitizers,
    Calibrations,
    Sensors,
    Responses,
    CssExport,
}

const MODES: &[&str] = &[
    "networks",
    "stations",
    "sites",
    "channels",
    "digitizers",
    "calibrations",
    "sensors",
    "responses",
    "css_export",
];

impl Mode {
    // Modes from digitizers on are about a single channel.
    fn needs_channel(self) -> bool {
        match self {
            Mode::Networks | Mode::Stations | Mode::Sites | Mode::Channels => false,
            _ => true,
        }
    }

    fn kind(self) -> Option<ResourceKind> {
        match self {
            Mode::Networks => Some(ResourceKind::Networks),
            Mode::Stations => Some(ResourceKind::Stations),
            Mode::Sites => Some(ResourceKind::Sites),
            Mode::Channels => Some(ResourceKind::Channels),
            Mode::Digitizers => Some(ResourceKind::Digitizers),
            Mode::Calibrations => Some(ResourceKind::Calibrations),
            Mode::Sensors => Some(ResourceKind::Sensors),
            Mode::Responses => Some(ResourceKind::Responses),
            Mode::CssExport => None,
        }
    }
}

fn run() -> Result<(), StationRefErr> {
    let app = CommonCmdLineArgs::new_app(
        "stationref",
        "Query station reference data, or export a channel as CSS 3.0 flat files.",
    )
    .arg(
        Arg::with_name("mode")
            .index(1)
            .required(true)
            .possible_values(MODES)
            .help("What to look up, or css_export.")
            .long_help(concat!(
                "What to look up, or css_export to write the reference information of a channel ",
                "as CSS 3.0 flat files. Modes digitizers through css_export need --channel-id."
            )),
    )
    .arg(
        Arg::with_name("network")
            .long("network")
            .takes_value(true)
            .help("Only stations of this network (stations mode)."),
    )
    .arg(
        Arg::with_name("station")
            .long("station")
            .takes_value(true)
            .help("Only sites of this station (sites mode)."),
    )
    .arg(
        Arg::with_name("site")
            .long("site")
            .takes_value(true)
            .help("Only channels of this site (channels mode)."),
    )
    .arg(
        Arg::with_name("channel-id")
            .long("channel-id")
            .takes_value(true)
            .help("UUID of the channel for digitizers through css_export."),
    );

    let (common_args, matches) = CommonCmdLineArgs::matches(app)?;

    init_logging(common_args.verbose());

    let mode = Mode::from_str(
        matches
            .value_of("mode")
            .ok_or(StationRefErr::LogicError("mode is required by clap"))?,
    )?;

    let channel_id = if mode.needs_channel() {
        Some(channel_id(&matches, mode))
    } else {
        None
    };

    let client = HttpQueryClient::new(common_args.hostname())?;

    match (mode.kind(), channel_id) {
        (Some(kind), _) => {
            let request = build_request(kind, &matches, channel_id, common_args.window());
            print_records(&client, &request)
        }
        (None, Some(channel_id)) => {
            let mut exporter = CssExporter::new(&client, common_args.output_dir())
                .with_window(common_args.window());
            let summary = exporter.export(channel_id)?;

            for (table, path, rows) in &summary.tables {
                println!("{:>12} {:>6} rows  {}", table.to_string(), rows, path.display());
            }
            println!(
                "{:>12} {:>6} files {}",
                "responses",
                summary.responses.len(),
                summary.output_dir.join(stationref::RESPONSE_DIR).display()
            );
            Ok(())
        }
        (None, None) => Err(StationRefErr::LogicError("export without a channel id")),
    }
}

// Install the fmt subscriber. RUST_LOG wins over --verbose.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// The parsed channel id, or a usage message and exit.
fn channel_id(matches: &ArgMatches, mode: Mode) -> Uuid {
    let print_usage_message = |msg: &str| -> ! {
        println!("\n{}\n\n{}\n", msg, matches.usage());
        println!("Try the -h or --help option for more instructions.");
        ::std::process::exit(1);
    };

    match matches.value_of("channel-id").map(Uuid::parse_str) {
        Some(Ok(id)) => id,
        Some(Err(err)) => print_usage_message(&format!("invalid channel id: {}", err)),
        None => print_usage_message(&format!("mode {} requires a --channel-id", mode)),
    }
}

fn build_request(
    kind: ResourceKind,
    matches: &ArgMatches,
    channel_id: Option<Uuid>,
    window: TimeWindow,
) -> QueryRequest {
    let scope = match kind {
        ResourceKind::Stations => matches
            .value_of("network")
            .map(|v| (ParentKey::NetworkName, v.to_owned())),
        ResourceKind::Sites => matches
            .value_of("station")
            .map(|v| (ParentKey::StationName, v.to_owned())),
        ResourceKind::Channels => matches
            .value_of("site")
            .map(|v| (ParentKey::SiteName, v.to_owned())),
        _ => channel_id.map(|id| (ParentKey::ChannelId, id.to_string())),
    };

    match scope {
        Some((key, value)) => QueryRequest::scoped(kind, key, value, window),
        None => QueryRequest::all(kind, window),
    }
}

fn print_records<Q: ResourceQuery>(client: &Q, request: &QueryRequest) -> Result<(), StationRefErr> {
    let records = client.query(request)?;
    debug!(kind = %request.kind, count = records.len(), "query finished");

    if records.is_empty() {
        println!("No {} found for {}.", request.kind, request.target());
        return Ok(());
    }

    TablePrinter::from_records(&records)
        .with_title(format!("{} ({})", request.kind, request.target()))
        .with_footer(format!("{} records", records.len()))
        .print()
}
