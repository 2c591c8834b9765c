#![deny(missing_docs)]
//! Query a station reference service and export the reference information of a channel as
//! CSS 3.0 flat files.

//
// Public API
//
pub use crate::cmd_line::CommonCmdLineArgs;
pub use crate::errors::StationRefErr;
pub use crate::export::{CssExporter, ExportStage, ExportSummary, RESPONSE_DIR, TABLE_ORDER};
pub use crate::flatfile::{Table, TableLayout};
pub use crate::keys::KeySynthesizer;
pub use crate::query::{
    fetch, HttpQueryClient, ParentKey, QueryRequest, ResourceQuery, StubQueryClient,
};
pub use crate::resolve::{ExportBundle, Hop, Resolver, SideData};
pub use crate::resources::ResourceKind;
pub use crate::table_printer::TablePrinter;
pub use crate::time::TimeWindow;

pub mod export;
pub mod flatfile;
pub mod interval;
pub mod keys;
pub mod resources;
pub mod time;

//
// Implementation only
//
mod cmd_line;
mod errors;
mod query;
mod resolve;
mod table_printer;
