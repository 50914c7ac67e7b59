use crate::error::WatchlistError;
use crate::models::IpRange;
use crate::watchlist::parse_prefix;
use csv::{ReaderBuilder, StringRecord, Trim};
use ipnet::{IpNet, Ipv4Subnets, Ipv6Subnets};
use log::{debug, info, warn};
use std::io::Read;
use std::net::IpAddr;
use std::str::FromStr;

/// Options controlling how a watch-list table is read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Column holding one CIDR block per row.
    pub cidr_column: String,
    /// Columns holding a range as first/last address, used when the CIDR column is absent.
    pub start_column: String,
    pub end_column: String,
    /// Keep only rows whose `Country Code` or `Country` column equals this value.
    pub country: Option<String>,
    /// Log and skip rows that cannot be parsed instead of failing the load.
    pub skip_invalid_rows: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            cidr_column: "CIDR".to_string(),
            start_column: "Start IP".to_string(),
            end_column: "End IP".to_string(),
            country: None,
            skip_invalid_rows: false,
        }
    }
}

impl LoadOptions {
    pub fn cidr_column(mut self, column: &str) -> Self {
        self.cidr_column = column.to_string();
        self
    }

    pub fn country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    pub fn skip_invalid_rows(mut self, skip: bool) -> Self {
        self.skip_invalid_rows = skip;
        self
    }
}

const COUNTRY_CODE_COLUMN: &str = "Country Code";
const COUNTRY_COLUMN: &str = "Country";

enum Layout {
    Cidr(usize),
    Span { start: usize, end: usize },
}

struct CountryFilter {
    value: String,
    columns: Vec<usize>,
}

impl CountryFilter {
    fn matches(&self, row: &StringRecord) -> bool {
        self.columns
            .iter()
            .filter_map(|idx| row.get(*idx))
            .any(|v| v.eq_ignore_ascii_case(&self.value))
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

pub(crate) fn read_ranges<R: Read>(
    reader: R,
    options: &LoadOptions,
) -> Result<Vec<IpRange>, WatchlistError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();

    let layout = match column_index(&headers, &options.cidr_column) {
        Some(idx) => Layout::Cidr(idx),
        None => match (
            column_index(&headers, &options.start_column),
            column_index(&headers, &options.end_column),
        ) {
            (Some(start), Some(end)) => {
                info!(
                    "no {} column, summarising {} - {} ranges",
                    options.cidr_column, options.start_column, options.end_column
                );
                Layout::Span { start, end }
            }
            _ => return Err(WatchlistError::MissingColumn(options.cidr_column.clone())),
        },
    };

    let country = match &options.country {
        None => None,
        Some(value) => {
            let columns: Vec<usize> = [COUNTRY_CODE_COLUMN, COUNTRY_COLUMN]
                .iter()
                .filter_map(|name| column_index(&headers, name))
                .collect();
            if columns.is_empty() {
                return Err(WatchlistError::MissingColumn(COUNTRY_CODE_COLUMN.to_string()));
            }
            Some(CountryFilter {
                value: value.clone(),
                columns,
            })
        }
    };

    let mut ranges = vec![];
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let row_num = index + 1;

        if let Some(filter) = &country {
            if !filter.matches(&row) {
                debug!("row {}: skipped by country filter", row_num);
                continue;
            }
        }

        let parsed = match layout {
            Layout::Cidr(idx) => parse_cidr_row(&row, row_num, idx),
            Layout::Span { start, end } => parse_span_row(&row, row_num, start, end),
        };

        match parsed {
            Ok(blocks) => {
                for block in blocks {
                    info!("Loaded IP range: {}", block);
                    ranges.push(block);
                }
            }
            Err(e) if options.skip_invalid_rows => {
                warn!("skipping watch-list row: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    info!("Total IP ranges loaded: {}", ranges.len());
    Ok(ranges)
}

fn parse_cidr_row(
    row: &StringRecord,
    row_num: usize,
    idx: usize,
) -> Result<Vec<IpRange>, WatchlistError> {
    let value = row.get(idx).unwrap_or_default();
    match parse_prefix(value) {
        Some(net) => Ok(vec![net]),
        None => Err(WatchlistError::InvalidCidr {
            row: row_num,
            value: value.to_string(),
        }),
    }
}

fn parse_span_row(
    row: &StringRecord,
    row_num: usize,
    start_idx: usize,
    end_idx: usize,
) -> Result<Vec<IpRange>, WatchlistError> {
    let start_str = row.get(start_idx).unwrap_or_default();
    let end_str = row.get(end_idx).unwrap_or_default();
    let invalid = || WatchlistError::InvalidRange {
        row: row_num,
        start: start_str.to_string(),
        end: end_str.to_string(),
    };

    let (start, end) = match (IpAddr::from_str(start_str), IpAddr::from_str(end_str)) {
        (Ok(s), Ok(e)) => (s, e),
        _ => return Err(invalid()),
    };

    let blocks: Vec<IpNet> = match (start, end) {
        (IpAddr::V4(s), IpAddr::V4(e)) if s <= e => {
            Ipv4Subnets::new(s, e, 0).map(IpNet::V4).collect()
        }
        (IpAddr::V6(s), IpAddr::V6(e)) if s <= e => {
            Ipv6Subnets::new(s, e, 0).map(IpNet::V6).collect()
        }
        _ => return Err(invalid()),
    };
    Ok(blocks)
}
