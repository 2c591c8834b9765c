//! Export the station reference of one channel as CSS 3.0 flat files.
//!
//! The export runs through a fixed sequence of stages:
//!
//! resolve → reconcile → synthesize keys → encode network → encode sitechan → encode site →
//! encode affiliation → encode sensor → encode instrument → done
//!
//! Keys are handed out while building the SITECHAN rows and then the SENSOR rows, so the channel
//! keys can be passed to the sensor and instrument tables explicitly. Nothing is written until
//! the whole reference chain has been resolved. A failure while writing leaves the tables
//! already written in place.

use std::{
    fmt::{self, Display},
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    errors::StationRefErr,
    flatfile::{
        affiliation_records, instrument_records, layout, network_records, sensor_records,
        site_records, sitechan_records, write_response_payloads, write_table_in, FlatRecord,
        InstrumentSources, Members, Table,
    },
    keys::{ChannelKeys, InstrumentKeys, KeySynthesizer},
    query::ResourceQuery,
    resolve::{ExportBundle, Resolver},
    time::{load_date, TimeWindow},
};

pub use self::reconcile::Reconciled;

mod reconcile;

/// Name of the directory, inside the output directory, holding the response files.
pub const RESPONSE_DIR: &str = "responses";

/// Where an export is, or where it stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportStage {
    /// Nothing done yet.
    Idle,
    /// Walking the reference chain.
    Resolve,
    /// Computing validity intervals.
    Reconcile,
    /// Building the rows that carry synthesized keys.
    SynthesizeKeys,
    /// Writing a table.
    Encode(Table),
    /// Every table was written.
    Done,
    /// The export stopped with an error.
    Failed,
}

impl Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExportStage::Idle => write!(f, "idle"),
            ExportStage::Resolve => write!(f, "resolve"),
            ExportStage::Reconcile => write!(f, "reconcile"),
            ExportStage::SynthesizeKeys => write!(f, "synthesize keys"),
            ExportStage::Encode(table) => write!(f, "encode {}", table),
            ExportStage::Done => write!(f, "done"),
            ExportStage::Failed => write!(f, "failed"),
        }
    }
}

/// The order tables are written in.
pub const TABLE_ORDER: [Table; 6] = [
    Table::Network,
    Table::Sitechan,
    Table::Site,
    Table::Affiliation,
    Table::Sensor,
    Table::Instrument,
];

/// What an export produced.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSummary {
    /// The directory the files were written to.
    pub output_dir: PathBuf,
    /// Each table file written with its number of rows, in write order.
    pub tables: Vec<(Table, PathBuf, usize)>,
    /// Response files written.
    pub responses: Vec<PathBuf>,
}

impl ExportSummary {
    /// Rows written to a table.
    pub fn rows(&self, table: Table) -> Option<usize> {
        self.tables
            .iter()
            .find(|(t, _, _)| *t == table)
            .map(|(_, _, rows)| *rows)
    }
}

/// Exports the reference information of a channel.
#[derive(Debug)]
pub struct CssExporter<'q, Q: ?Sized> {
    client: &'q Q,
    window: TimeWindow,
    output_dir: PathBuf,
    lddate: String,
    stage: ExportStage,
}

impl<'q, Q> CssExporter<'q, Q>
where
    Q: ResourceQuery + ?Sized,
{
    /// An exporter writing into `output_dir`, with no time limits and the current local time as
    /// load date.
    pub fn new<P: Into<PathBuf>>(client: &'q Q, output_dir: P) -> Self {
        CssExporter {
            client,
            window: TimeWindow::unbounded(),
            output_dir: output_dir.into(),
            lddate: load_date(Local::now().naive_local()),
            stage: ExportStage::Idle,
        }
    }

    /// Limit every lookup to a time window.
    pub fn with_window(self, window: TimeWindow) -> Self {
        CssExporter { window, ..self }
    }

    /// Use a fixed load date instead of the current time.
    pub fn with_load_date<S: Into<String>>(self, lddate: S) -> Self {
        CssExporter {
            lddate: lddate.into(),
            ..self
        }
    }

    /// The current stage, or the stage that failed.
    pub fn stage(&self) -> ExportStage {
        self.stage
    }

    /// Run the export for a channel.
    ///
    /// On failure the stage is left at [`ExportStage::Failed`] and the error is returned.
    pub fn export(&mut self, channel_id: Uuid) -> Result<ExportSummary, StationRefErr> {
        match self.run(channel_id) {
            Ok(summary) => {
                self.enter(ExportStage::Done);
                Ok(summary)
            }
            Err(err) => {
                error!(channel = %channel_id, stage = %self.stage, "export failed: {}", err);
                self.stage = ExportStage::Failed;
                Err(err)
            }
        }
    }

    fn run(&mut self, channel_id: Uuid) -> Result<ExportSummary, StationRefErr> {
        self.enter(ExportStage::Resolve);
        let bundle = Resolver::new(self.client, self.window).resolve(channel_id)?;

        self.enter(ExportStage::Reconcile);
        let reconciled = Reconciled::new(&bundle);

        self.enter(ExportStage::SynthesizeKeys);
        let keyed = KeyedRows::new(&reconciled, &self.lddate);

        fs::create_dir_all(&self.output_dir)?;
        let response_dir = self.output_dir.join(RESPONSE_DIR);

        let mut summary = ExportSummary {
            output_dir: self.output_dir.clone(),
            tables: Vec::with_capacity(TABLE_ORDER.len()),
            responses: vec![],
        };

        for &table in TABLE_ORDER.iter() {
            self.enter(ExportStage::Encode(table));

            let records = match table {
                Table::Network => {
                    let networks: Vec<_> = bundle.networks.iter().collect();
                    network_records(&networks)
                }
                Table::Sitechan => keyed.sitechan.clone(),
                Table::Site => site_records(
                    &reconciled.stations,
                    &reconciled.sites,
                    |site| reconciled.station_of(site),
                    &self.lddate,
                ),
                Table::Affiliation => affiliation_records(
                    &reconciled.network_memberships,
                    &reconciled.station_memberships,
                    Members {
                        networks: &bundle.networks,
                        stations: &bundle.stations,
                        sites: &bundle.sites,
                    },
                    &self.lddate,
                ),
                Table::Sensor => keyed.sensor.clone(),
                Table::Instrument => {
                    let (records, responses) =
                        instruments(&bundle, &keyed.instrument_keys, &response_dir, &self.lddate)?;
                    summary.responses = responses;
                    records
                }
                Table::Wfdisc => return Err(StationRefErr::LogicError("wfdisc is not exported")),
            };

            let path = write_table_in(&self.output_dir, layout(table), &records)?;
            summary.tables.push((table, path, records.len()));
        }

        info!(
            channel = %channel_id,
            chanids = keyed.channel_keys.len(),
            inids = keyed.instrument_keys.distinct().count(),
            "export complete"
        );
        Ok(summary)
    }

    fn enter(&mut self, stage: ExportStage) {
        info!(stage = %stage, "export stage");
        self.stage = stage;
    }
}

// Rows that carry synthesized keys, built before anything is written.
struct KeyedRows {
    sitechan: Vec<FlatRecord>,
    sensor: Vec<FlatRecord>,
    channel_keys: ChannelKeys,
    instrument_keys: InstrumentKeys,
}

impl KeyedRows {
    fn new(reconciled: &Reconciled<'_>, lddate: &str) -> Self {
        let mut synth = KeySynthesizer::new();

        let (sitechan, channel_keys) = sitechan_records(
            reconciled.channel_station(),
            &reconciled.channels,
            &mut synth,
            lddate,
        );

        let calibrations = reconciled
            .bundle
            .side
            .as_ref()
            .map(|side| side.calibrations.as_slice())
            .unwrap_or_default();
        let (sensor, instrument_keys) = sensor_records(
            &reconciled.site_names(),
            &reconciled.sensors,
            calibrations,
            &channel_keys,
            &mut synth,
            lddate,
        );

        KeyedRows {
            sitechan,
            sensor,
            channel_keys,
            instrument_keys,
        }
    }
}

// INSTRUMENT rows and their response files. No side data means no rows and no files.
fn instruments(
    bundle: &ExportBundle,
    keys: &InstrumentKeys,
    response_dir: &Path,
    lddate: &str,
) -> Result<(Vec<FlatRecord>, Vec<PathBuf>), StationRefErr> {
    let side = match bundle.side {
        Some(ref side) => side,
        None => return Ok((vec![], vec![])),
    };

    let sources = InstrumentSources {
        channels: &bundle.channels,
        sensors: &side.sensors,
        calibrations: &side.calibrations,
        responses: &side.responses,
    };

    let records = instrument_records(keys, sources, response_dir, lddate);
    let written = write_response_payloads(keys, &side.responses, response_dir)?;
    Ok((records, written))
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
