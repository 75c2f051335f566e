use crate::error::Result;
use crate::market::models::{NiftyTick, OptionContract};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// One exported option-chain row; numeric cells that fail to parse read as `None`
#[derive(Debug, Deserialize)]
struct RawOptionRow {
    #[serde(deserialize_with = "csv::invalid_option")]
    strike: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    last: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    change: Option<f64>,
    #[serde(rename = "OI", default, deserialize_with = "csv::invalid_option")]
    oi: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    ttq: Option<f64>,
    #[serde(rename = "bPrice", default, deserialize_with = "csv::invalid_option")]
    b_price: Option<f64>,
    #[serde(rename = "sPrice", default, deserialize_with = "csv::invalid_option")]
    s_price: Option<f64>,
    #[serde(rename = "bQty", default, deserialize_with = "csv::invalid_option")]
    b_qty: Option<f64>,
    #[serde(rename = "sQty", default, deserialize_with = "csv::invalid_option")]
    s_qty: Option<f64>,
    #[serde(rename = "chngInOI", default, deserialize_with = "csv::invalid_option")]
    chng_in_oi: Option<f64>,
}

impl RawOptionRow {
    fn into_contract(self) -> Option<OptionContract> {
        let strike = self.strike?;
        Some(OptionContract {
            strike,
            ltp: self.last.unwrap_or(0.0),
            iv: None,
            chng: self.change.unwrap_or(0.0),
            chng_in_oi: self.chng_in_oi.unwrap_or(0.0),
            oi: self.oi.unwrap_or(0.0),
            volume: self.ttq.unwrap_or(0.0),
            bid: self.b_price,
            ask: self.s_price,
            bid_qty: self.b_qty,
            ask_qty: self.s_qty,
            prev_ltp: None,
        })
    }
}

fn read_rows<T, R>(reader: R, label: &str) -> Vec<T>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (line, record) in csv_reader.deserialize::<T>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => warn!(file = label, row = line + 1, error = %e, "skipping unparsable csv row"),
        }
    }
    rows
}

/// Parse option rows from any reader; rows without a strike are dropped
pub fn parse_option_rows<R: Read>(reader: R, label: &str) -> Vec<OptionContract> {
    read_rows::<RawOptionRow, _>(reader, label)
        .into_iter()
        .filter_map(|row| {
            let contract = row.into_contract();
            if contract.is_none() {
                warn!(file = label, "skipping csv row without a strike");
            }
            contract
        })
        .collect()
}

pub fn parse_ticks<R: Read>(reader: R, label: &str) -> Vec<NiftyTick> {
    read_rows(reader, label)
}

/// Load one option side. A missing file yields an empty side.
pub fn load_option_side(path: &Path) -> Result<Vec<OptionContract>> {
    match open_if_present(path)? {
        Some(file) => Ok(parse_option_rows(file, &path.display().to_string())),
        None => Ok(Vec::new()),
    }
}

/// Load replayable index ticks. A missing file yields no ticks.
pub fn load_ticks(path: &Path) -> Result<Vec<NiftyTick>> {
    match open_if_present(path)? {
        Some(file) => Ok(parse_ticks(file, &path.display().to_string())),
        None => Ok(Vec::new()),
    }
}

fn open_if_present(path: &Path) -> Result<Option<std::fs::File>> {
    match std::fs::File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "csv file not found, using empty data");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
