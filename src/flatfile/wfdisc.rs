//! WFDISC, the waveform index table.
//!
//! This table is not part of the station export. It describes where the samples of waveform
//! segments are stored, one row per segment.

use std::{fs, path::Path, str::FromStr};

use chrono::{DateTime, Utc};

use super::{write_table, Field, FlatRecord, Table, TableLayout, NA_ENDTIME, NA_INT, NA_TIME};
use crate::{
    errors::StationRefErr,
    time::{epoch_seconds, jdate},
};

pub(crate) const LAYOUT: TableLayout = TableLayout {
    table: Table::Wfdisc,
    fields: &[
        Field::text("sta", 6),
        Field::text("chan", 8),
        Field::right("time", 17, NA_TIME),
        Field::right("wfid", 8, NA_INT),
        Field::right("chanid", 8, NA_INT),
        Field::right("jdate", 8, NA_INT),
        Field::right("endtime", 17, NA_ENDTIME),
        Field::right("nsamp", 8, NA_INT),
        Field::right("samprate", 11, "-1.0"),
        Field::right("calib", 16, "-1.0"),
        Field::right("calper", 16, "-1.0"),
        Field::text("instype", 6),
        Field::text("segtype", 1),
        Field::text("datatype", 2),
        Field::text("clip", 1),
        Field::text("dir", 64),
        Field::text("dfile", 32),
        Field::right("foff", 10, "0"),
        Field::right("commid", 8, NA_INT),
        Field::text("lddate", 17),
    ],
};

/// A contiguous run of samples of one channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveformSegment {
    /// Time of the first sample.
    pub start: DateTime<Utc>,
    /// Time of the last sample.
    pub end: DateTime<Utc>,
    /// Number of samples.
    pub sample_count: i64,
    /// Samples per second.
    pub sample_rate: f64,
}

/// What the rows of one channel have in common.
#[derive(Clone, Copy, Debug)]
pub struct WfdiscChannel<'a> {
    /// Station name.
    pub sta: &'a str,
    /// Channel name.
    pub chan: &'a str,
    /// Calibration factor.
    pub calib: f64,
    /// Calibration period.
    pub calper: f64,
    /// Instrument model.
    pub instype: &'a str,
    /// Segment type code.
    pub segtype: &'a str,
    /// Directory holding the sample files.
    pub dir: &'a str,
    /// Sample files are named `<dfile_base><n>.w`.
    pub dfile_base: &'a str,
}

/// One WFDISC row.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub struct WfdiscRecord {
    pub sta: String,
    pub chan: String,
    pub time: f64,
    pub wfid: i64,
    pub chanid: i64,
    pub jdate: i64,
    pub endtime: f64,
    pub nsamp: i64,
    pub samprate: f64,
    pub calib: f64,
    pub calper: f64,
    pub instype: String,
    pub segtype: String,
    pub datatype: String,
    pub clip: String,
    pub dir: String,
    pub dfile: String,
    pub foff: i64,
    pub commid: i64,
    pub lddate: String,
}

impl WfdiscRecord {
    /// Values as they are laid out in the table.
    pub fn to_flat(&self) -> FlatRecord {
        FlatRecord::from(vec![
            self.sta.clone(),
            self.chan.clone(),
            format!("{:.5}", self.time),
            self.wfid.to_string(),
            self.chanid.to_string(),
            self.jdate.to_string(),
            format!("{:.5}", self.endtime),
            self.nsamp.to_string(),
            format!("{:.7}", self.samprate),
            format!("{:.6}", self.calib),
            format!("{:.6}", self.calper),
            self.instype.clone(),
            self.segtype.clone(),
            self.datatype.clone(),
            self.clip.clone(),
            self.dir.clone(),
            self.dfile.clone(),
            self.foff.to_string(),
            self.commid.to_string(),
            self.lddate.clone(),
        ])
    }

    /// Rebuild a row from the values of a parsed line.
    pub fn from_flat(record: &FlatRecord) -> Result<Self, StationRefErr> {
        let v = &record.values;
        if v.len() != LAYOUT.fields.len() {
            return Err(StationRefErr::Encoding {
                table: Table::Wfdisc,
                field: "*",
                cause: format!("expected {} values, got {}", LAYOUT.fields.len(), v.len()),
            });
        }

        Ok(WfdiscRecord {
            sta: v[0].clone(),
            chan: v[1].clone(),
            time: number(v, 2)?,
            wfid: number(v, 3)?,
            chanid: number(v, 4)?,
            jdate: number(v, 5)?,
            endtime: number(v, 6)?,
            nsamp: number(v, 7)?,
            samprate: number(v, 8)?,
            calib: number(v, 9)?,
            calper: number(v, 10)?,
            instype: v[11].clone(),
            segtype: v[12].clone(),
            datatype: v[13].clone(),
            clip: v[14].clone(),
            dir: v[15].clone(),
            dfile: v[16].clone(),
            foff: number(v, 17)?,
            commid: number(v, 18)?,
            lddate: v[19].clone(),
        })
    }
}

fn number<T>(values: &[String], index: usize) -> Result<T, StationRefErr>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    values[index]
        .parse()
        .map_err(|err: T::Err| StationRefErr::Encoding {
            table: Table::Wfdisc,
            field: LAYOUT.fields[index].name,
            cause: format!("'{}': {}", values[index], err),
        })
}

/// One row per segment. `wfid` and `chanid` count from 1, samples are 4 byte integers.
pub fn wfdisc_records(
    channel: &WfdiscChannel<'_>,
    segments: &[WaveformSegment],
    lddate: &str,
) -> Vec<WfdiscRecord> {
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let n = i as i64 + 1;
            WfdiscRecord {
                sta: channel.sta.to_owned(),
                chan: channel.chan.to_owned(),
                time: epoch_seconds(segment.start),
                wfid: n,
                chanid: n,
                jdate: jdate(segment.start).parse().unwrap_or(-1),
                endtime: epoch_seconds(segment.end),
                nsamp: segment.sample_count,
                samprate: segment.sample_rate,
                calib: channel.calib,
                calper: channel.calper,
                instype: channel.instype.to_owned(),
                segtype: channel.segtype.to_owned(),
                datatype: "s4".to_owned(),
                clip: "c".to_owned(),
                dir: channel.dir.to_owned(),
                dfile: format!("{}{}.w", channel.dfile_base, n),
                foff: segment.sample_count * 4,
                commid: -1,
                lddate: lddate.to_owned(),
            }
        })
        .collect()
}

/// Write rows to a WFDISC file, replacing it if it exists.
pub fn write_wfdisc(path: &Path, records: &[WfdiscRecord]) -> Result<(), StationRefErr> {
    let flat: Vec<FlatRecord> = records.iter().map(WfdiscRecord::to_flat).collect();
    write_table(path, &LAYOUT, &flat)
}

/// Read a WFDISC file by column offsets. Blank lines are skipped.
pub fn read_wfdisc(path: &Path) -> Result<Vec<WfdiscRecord>, StationRefErr> {
    let text = fs::read_to_string(path)?;

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| LAYOUT.parse_record(line).and_then(|r| WfdiscRecord::from_flat(&r)))
        .collect()
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
