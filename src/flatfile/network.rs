use super::{Field, FlatRecord, Table, TableLayout, NA_INT};
use crate::{resources::Network, time::load_date};

pub(crate) const LAYOUT: TableLayout = TableLayout {
    table: Table::Network,
    fields: &[
        Field::text("net", 8),
        Field::text("netname", 80),
        Field::text("nettype", 4),
        Field::text("auth", 15),
        Field::left("commid", 9, NA_INT),
        Field::text("syschangetime", 17),
    ],
};

/// One NETWORK row per network version.
pub fn network_records(networks: &[&Network]) -> Vec<FlatRecord> {
    networks
        .iter()
        .map(|network| {
            let auth = network
                .source
                .as_ref()
                .and_then(|source| source.originating_organization.clone())
                .unwrap_or_default();
            let changed = network
                .system_change_time
                .map(|t| load_date(t.naive_utc()))
                .unwrap_or_default();

            FlatRecord::from(vec![
                network.name.clone(),
                network.description.clone().unwrap_or_default(),
                network.css_type().to_owned(),
                auth,
                NA_INT.to_owned(),
                changed,
            ])
        })
        .collect()
}
