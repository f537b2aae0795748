// Primitives for reading Excel response files.

use log::debug;

use calamine::{open_workbook, DataType, Reader, Xlsx};

use likert_stats::{RawValue, ResponseRow};

use crate::analysis::config_reader::FileSource;
use crate::analysis::io_common::{decode_cell, make_default_id, RowLayout};
use crate::analysis::{AnResult, EmptyExcelSnafu, OpeningExcelSnafu};
use snafu::prelude::*;

pub fn read_excel_responses(path: &str, source: &FileSource) -> AnResult<Vec<ResponseRow>> {
    let default_id = make_default_id(path);
    let first_row = source.first_response_row();

    let wrange = get_range(path, source)?;
    let mut rows_iter = wrange.rows();
    let header = rows_iter.next().context(EmptyExcelSnafu {})?;
    debug!("read_excel_responses: header: {:?}", header);
    let header_names: Vec<String> = header
        .iter()
        .map(|cell| match cell {
            DataType::String(s) => s.clone(),
            _ => String::new(),
        })
        .collect();
    let layout = RowLayout::from_header(&header_names, source, path)?;

    let mut res: Vec<ResponseRow> = Vec::new();
    for (idx, row) in rows_iter.enumerate() {
        // The header is row 1, so the first data row is row 2.
        let lineno = idx + 2;
        if lineno < first_row {
            continue;
        }
        let cells: Vec<RawValue> = row.iter().map(decode_cell).collect();
        debug!("read_excel_responses: lineno: {:?} row: {:?}", lineno, &cells);
        res.push(layout.assemble(default_id(lineno), &cells));
    }
    Ok(res)
}

fn get_range(path: &str, source: &FileSource) -> AnResult<calamine::Range<DataType>> {
    let worksheet_name_o = source.excel_worksheet_name.clone();
    debug!(
        "read_excel_responses: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path.to_string(),
    })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu {
                path: path.to_string(),
            })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyExcelSnafu {}.fail(),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_excel_responses: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => {
                whatever!(
                    "read_excel_responses: {} has several worksheets, excelWorksheetName must be provided",
                    path
                )
            }
        }
    }
}
