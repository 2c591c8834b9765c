use std::{fs, path::Path};

use serde_json::json;
use stationref::{
    flatfile::{layout, FlatRecord},
    CssExporter, ExportStage, Hop, ResourceKind, StationRefErr, StubQueryClient, Table,
    TABLE_ORDER,
};
use tempdir::TempDir;
use uuid::Uuid;

const CHANNEL: &str = "10000000-0000-0000-0000-000000000001";
const SITE: &str = "20000000-0000-0000-0000-000000000001";
const STATION: &str = "30000000-0000-0000-0000-000000000001";
const NETWORK: &str = "40000000-0000-0000-0000-000000000001";

const LDDATE: &str = "18-01-01 00:00:00";

// One channel with two versions, one site, one station, one network, no instrument data.
fn reference_chain() -> StubQueryClient {
    let stub = StubQueryClient::new();
    stub.respond_for(
        ResourceKind::Channels,
        CHANNEL,
        json!([
            {"entityId": CHANNEL, "name": "BHZ", "depth": 0.0, "verticalAngle": 0.0,
             "horizontalAngle": 90.0, "nominalSampleRate": 40.0,
             "actualTime": "2012-06-15T00:00:00Z"},
            {"entityId": CHANNEL, "name": "BHZ", "depth": 0.0, "verticalAngle": 0.0,
             "horizontalAngle": 90.0, "nominalSampleRate": 40.0,
             "actualTime": "2010-01-01T00:00:00Z"}
        ]),
    )
    .respond_for(
        ResourceKind::Sites,
        CHANNEL,
        json!([
            {"entityId": SITE, "name": "MK01", "latitude": -999.99, "longitude": 82.29,
             "elevation": 0.62, "actualChangeTime": "2009-01-01T00:00:00Z"}
        ]),
    )
    .respond_for(
        ResourceKind::StationMemberships,
        SITE,
        json!([
            {"stationId": STATION, "siteId": SITE, "status": "ACTIVE",
             "actualChangeTime": "2009-01-01T00:00:00Z"}
        ]),
    )
    .respond_for(
        ResourceKind::Stations,
        STATION,
        json!({"entityId": STATION, "name": "MKAR", "description": "Makanchi array",
               "stationType": "SeismicArray", "actualChangeTime": "2009-01-01T00:00:00Z"}),
    )
    .respond_for(
        ResourceKind::NetworkMemberships,
        STATION,
        json!([
            {"networkId": NETWORK, "stationId": STATION, "status": "ACTIVE",
             "actualChangeTime": "2009-01-01T00:00:00Z"}
        ]),
    )
    .respond_for(
        ResourceKind::Networks,
        NETWORK,
        json!([
            {"entityId": NETWORK, "name": "IMS_AUX", "description": "Auxiliary network",
             "region": "GLOBAL", "source": {"originatingOrganization": "IDC"},
             "actualChangeTime": "2009-01-01T00:00:00Z",
             "systemChangeTime": "2017-12-31T23:59:59Z"}
        ]),
    );
    stub
}

fn add_instrument_data(stub: &StubQueryClient) {
    stub.respond_for(
        ResourceKind::Calibrations,
        CHANNEL,
        json!([
            {"calibrationFactor": 0.5, "calibrationPeriod": 1.0, "timeShift": 0.0,
             "actualTime": "2010-01-01T00:00:00Z"}
        ]),
    )
    .respond_for(
        ResourceKind::Sensors,
        CHANNEL,
        json!([
            {"instrumentManufacturer": "Geotech", "instrumentModel": "GS-13",
             "serialNumber": "1", "actualTime": "2010-03-01T00:00:00Z"}
        ]),
    )
    .respond_for(
        ResourceKind::Responses,
        CHANNEL,
        json!([
            {"responseType": "paz", "responseData": "UkVTUC1EQVRB",
             "actualTime": "2010-01-01T00:00:00Z"}
        ]),
    );
}

fn channel_id() -> Uuid {
    Uuid::parse_str(CHANNEL).unwrap()
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(ToOwned::to_owned)
        .collect()
}

fn read_records(dir: &Path, table: Table) -> Vec<FlatRecord> {
    let layout = layout(table);
    read_lines(&dir.join(table.file_name()))
        .iter()
        .map(|line| layout.parse_record(line).unwrap())
        .collect()
}

#[test]
fn test_export_without_instrument_data() {
    let tmp = TempDir::new("stationref-export").unwrap();
    let out = tmp.path().join("out");
    let stub = reference_chain();

    let mut exporter = CssExporter::new(&stub, &out).with_load_date(LDDATE);
    let summary = exporter.export(channel_id()).unwrap();
    assert_eq!(exporter.stage(), ExportStage::Done);

    let written: Vec<Table> = summary.tables.iter().map(|(t, _, _)| *t).collect();
    assert_eq!(written, TABLE_ORDER.to_vec());

    for table in &[Table::Network, Table::Site, Table::Sitechan, Table::Affiliation] {
        let path = out.join(table.file_name());
        assert!(fs::metadata(&path).unwrap().len() > 0, "{} is empty", table);
    }
    for table in &[Table::Sensor, Table::Instrument] {
        let path = out.join(table.file_name());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0, "{} not empty", table);
    }
    assert!(summary.responses.is_empty());

    // Versions were returned out of order; rows follow effective time.
    let sitechan = read_lines(&out.join("p3.sitechan"));
    assert_eq!(sitechan.len(), 2);
    assert_eq!(summary.rows(Table::Sitechan), Some(2));
    assert_eq!(&sitechan[0][0..6], "MK01  ");
    assert_eq!(&sitechan[0][16..24], "2010001 ");
    assert_eq!(&sitechan[0][34..42], "2012167 ");
    assert_eq!(&sitechan[1][16..24], "2012167 ");
    assert_eq!(&sitechan[1][34..42], "-1      ");
    assert_eq!(&sitechan[0][25..33], "400     ");
    assert_eq!(&sitechan[1][25..33], "400     ");
    assert!(sitechan.iter().all(|line| line.ends_with(LDDATE)));

    let network = read_records(&out, Table::Network);
    assert_eq!(network.len(), 1);
    assert_eq!(
        network[0].values,
        vec![
            "IMS_AUX",
            "Auxiliary network",
            "ww",
            "IDC",
            "-1",
            "17-12-31 23:59:59"
        ]
    );

    let affiliation = read_records(&out, Table::Affiliation);
    assert_eq!(affiliation.len(), 2);
    assert_eq!(affiliation[0].values[..2], ["IMS_AUX", "MKAR"]);
    assert_eq!(affiliation[1].values[..2], ["MKAR", "MK01"]);
    assert_eq!(affiliation[1].values[3], "9999999999.999");
}

#[test]
fn test_missing_latitude_is_kept_in_site() {
    let tmp = TempDir::new("stationref-export").unwrap();
    let out = tmp.path().join("out");
    let stub = reference_chain();

    CssExporter::new(&stub, &out)
        .with_load_date(LDDATE)
        .export(channel_id())
        .unwrap();

    let site = read_lines(&out.join("p3.site"));
    assert_eq!(site.len(), 2);

    // Station row first, without any coordinates.
    assert_eq!(&site[0][0..6], "MKAR  ");
    assert_eq!(&site[0][25..34], "-999.99  ");

    // Then the site row, with the service's missing value passed through.
    assert_eq!(&site[1][0..6], "MK01  ");
    assert_eq!(&site[1][25..34], "-999.99  ");
    assert_eq!(&site[1][35..44], "82.29    ");

    let records = read_records(&out, Table::Site);
    assert_eq!(records[0].values[7], "ar");
    assert_eq!(records[0].values[8], "MKAR");
    assert_eq!(records[1].values[6], "Makanchi array");
    assert_eq!(records[1].values[7], "ss");
    assert_eq!(records[1].values[8], "MKAR");
}

#[test]
fn test_export_with_instrument_data() {
    let tmp = TempDir::new("stationref-export").unwrap();
    let out = tmp.path().join("out");
    let stub = reference_chain();
    add_instrument_data(&stub);

    let summary = CssExporter::new(&stub, &out)
        .with_load_date(LDDATE)
        .export(channel_id())
        .unwrap();

    let sensor = read_records(&out, Table::Sensor);
    assert_eq!(sensor.len(), 1);
    let values = &sensor[0].values;
    assert_eq!(values[0], "MK01");
    assert_eq!(values[1], "BHZ");
    assert_eq!(values[2], "1267401600.000");
    assert_eq!(values[3], "9999999999.999");
    assert_eq!(values[4], "601");
    assert_eq!(values[5], "400");
    assert_eq!(values[6], "2010060");
    assert_eq!(values[8], "1.0");
    assert_eq!(values[10], "y");

    let instrument = read_records(&out, Table::Instrument);
    assert_eq!(instrument.len(), 1);
    let values = &instrument[0].values;
    assert_eq!(values[0], "601");
    assert_eq!(values[1], "Geotech");
    assert_eq!(values[2], "GS-13");
    assert_eq!(values[3], "b");
    assert_eq!(values[4], "d");
    assert_eq!(values[5], "40.0");
    assert_eq!(values[6], "0.5");
    assert_eq!(values[9], "data601");
    assert_eq!(values[10], "paz");

    let payload = out.join("responses").join("601").join("data601");
    assert_eq!(summary.responses, vec![payload.clone()]);
    assert_eq!(fs::read(&payload).unwrap(), b"RESP-DATA");
}

#[test]
fn test_chain_break_writes_nothing() {
    for &(kind, hop) in &[
        (ResourceKind::Sites, Hop::Site),
        (ResourceKind::StationMemberships, Hop::StationMembership),
        (ResourceKind::Stations, Hop::Station),
        (ResourceKind::NetworkMemberships, Hop::NetworkMembership),
        (ResourceKind::Networks, Hop::Network),
    ] {
        let tmp = TempDir::new("stationref-export").unwrap();
        let out = tmp.path().join("out");
        let stub = reference_chain();
        let key = match kind {
            ResourceKind::Sites => CHANNEL,
            ResourceKind::StationMemberships => SITE,
            ResourceKind::Stations | ResourceKind::NetworkMemberships => STATION,
            _ => NETWORK,
        };
        stub.respond_for(kind, key, json!([]));

        let mut exporter = CssExporter::new(&stub, &out);
        match exporter.export(channel_id()) {
            Err(StationRefErr::ChainBreak { hop: broken }) => assert_eq!(broken, hop),
            other => panic!("unexpected result for {}: {:?}", kind, other),
        }
        assert_eq!(exporter.stage(), ExportStage::Failed);
        assert!(!out.exists(), "output written after {} broke", hop);
    }
}

#[test]
fn test_transport_failure_writes_nothing() {
    let tmp = TempDir::new("stationref-export").unwrap();
    let out = tmp.path().join("out");
    let stub = reference_chain();
    stub.fail(ResourceKind::NetworkMemberships, "connection refused");

    match CssExporter::new(&stub, &out).export(channel_id()) {
        Err(StationRefErr::Transport { kind, target, cause }) => {
            assert_eq!(kind, ResourceKind::NetworkMemberships);
            assert_eq!(target, format!("station-id={}", STATION));
            assert_eq!(cause, "connection refused");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!out.exists());
    assert_eq!(stub.count(ResourceKind::Networks), 0);
}

#[test]
fn test_partial_instrument_data_writes_nothing() {
    let tmp = TempDir::new("stationref-export").unwrap();
    let out = tmp.path().join("out");
    let stub = reference_chain();
    add_instrument_data(&stub);
    stub.respond_for(ResourceKind::Responses, CHANNEL, json!([]));

    match CssExporter::new(&stub, &out).export(channel_id()) {
        Err(StationRefErr::PartialSideData {
            calibrations,
            sensors,
            responses,
        }) => assert_eq!((calibrations, sensors, responses), (1, 1, 0)),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!out.exists());
}

const OTHER_SITE: &str = "20000000-0000-0000-0000-000000000002";

// A second site of the same station, installed while MK01 is still active.
fn add_second_site(stub: &StubQueryClient, with_membership: bool) {
    stub.respond_for(
        ResourceKind::Sites,
        CHANNEL,
        json!([
            {"entityId": SITE, "name": "MK01", "latitude": 46.79, "longitude": 82.29,
             "elevation": 0.62, "actualChangeTime": "2009-01-01T00:00:00Z"},
            {"entityId": OTHER_SITE, "name": "MK02", "latitude": 46.80, "longitude": 82.30,
             "elevation": 0.61, "actualChangeTime": "2009-06-01T00:00:00Z"}
        ]),
    );

    let memberships = if with_membership {
        json!([
            {"stationId": STATION, "siteId": OTHER_SITE, "status": "ACTIVE",
             "actualChangeTime": "2009-06-01T00:00:00Z"}
        ])
    } else {
        json!([])
    };
    stub.respond_for(ResourceKind::StationMemberships, OTHER_SITE, memberships);
}

#[test]
fn test_concurrent_sites_do_not_close_each_other() {
    let tmp = TempDir::new("stationref-export").unwrap();
    let out = tmp.path().join("out");
    let stub = reference_chain();
    add_second_site(&stub, true);

    CssExporter::new(&stub, &out)
        .with_load_date(LDDATE)
        .export(channel_id())
        .unwrap();

    let site = read_records(&out, Table::Site);
    assert_eq!(site.len(), 3);

    assert_eq!(site[1].values[0], "MK01");
    assert_eq!(site[1].values[1], "2009001");
    assert_eq!(site[1].values[2], "-1");
    assert_eq!(site[1].values[8], "MKAR");

    assert_eq!(site[2].values[0], "MK02");
    assert_eq!(site[2].values[1], "2009152");
    assert_eq!(site[2].values[2], "-1");
    assert_eq!(site[2].values[8], "MKAR");
}

#[test]
fn test_site_without_station_breaks_the_chain() {
    let tmp = TempDir::new("stationref-export").unwrap();
    let out = tmp.path().join("out");
    let stub = reference_chain();
    add_second_site(&stub, false);

    match CssExporter::new(&stub, &out).export(channel_id()) {
        Err(StationRefErr::ChainBreak { hop }) => assert_eq!(hop, Hop::StationMembership),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!out.exists());
}
