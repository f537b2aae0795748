// Primitives for reading CSV response files.

use log::debug;

use likert_stats::ResponseRow;

use crate::analysis::config_reader::FileSource;
use crate::analysis::io_common::{csv_field, make_default_id, RowLayout};
use crate::analysis::{AnResult, CsvLineParseSnafu, CsvOpenSnafu, MissingHeaderSnafu};
use snafu::prelude::*;

pub fn read_csv_responses(path: &str, source: &FileSource) -> AnResult<Vec<ResponseRow>> {
    let default_id = make_default_id(path);
    let first_row = source.first_response_row();

    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path.to_string(),
        })?;
    let mut records = rdr.into_records();

    let header = records
        .next()
        .context(MissingHeaderSnafu {
            path: path.to_string(),
        })?
        .context(CsvLineParseSnafu {})?;
    let header_names: Vec<String> = header.iter().map(|cell| cell.to_string()).collect();
    debug!("read_csv_responses: header: {:?}", header_names);
    let layout = RowLayout::from_header(&header_names, source, path)?;

    let mut res: Vec<ResponseRow> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The header is line 1, so the first record is line 2.
        let lineno = idx + 2;
        if lineno < first_row {
            continue;
        }
        let line = line_r.context(CsvLineParseSnafu {})?;
        let cells: Vec<likert_stats::RawValue> = line.iter().map(csv_field).collect();
        debug!("read_csv_responses: lineno: {:?} row: {:?}", lineno, &cells);
        res.push(layout.assemble(default_id(lineno), &cells));
    }
    Ok(res)
}
