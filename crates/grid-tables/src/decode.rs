use std::collections::HashMap;

use grid_query::{Query, Sort};

use crate::config::TableConfig;
use crate::error::TableError;

/// Decoded form or query-string parameters. The first value of a repeated key
/// wins.
pub fn parse_params(input: &[u8]) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

/// Build a query from DataTables server-side parameters.
///
/// The client addresses columns only by index into the configured list; every
/// field name in the result comes from `config`.
pub fn decode_request(
    params: &HashMap<String, String>,
    config: &TableConfig,
) -> Result<Query, TableError> {
    let offset = match params.get("start") {
        Some(start) if !start.is_empty() => parse_u64("start", start)?,
        _ => 0,
    };
    let limit = decode_length(params.get("length").map(String::as_str), config.max_rows)?;

    check_columns(params, config)?;
    let sort = decode_order(params, config)?;

    let mut query = Query::new(config.collection.clone());
    query.fields = config.fields();
    query.filters = config.filters.clone();
    query.raw_filter = config.raw_filter.clone();
    query.sort = sort;
    query.limit = limit;
    query.offset = offset;
    query.search = params.get("search[value]").cloned().unwrap_or_default();
    query.search_fields = config.search_fields.clone();
    query.pipeline = config.pipeline.clone();
    Ok(query)
}

/// 0 means unbounded; `-1` is the DataTables "all" value.
fn decode_length(length: Option<&str>, max_rows: u64) -> Result<u64, TableError> {
    let requested = match length {
        None | Some("") | Some("-1") => 0,
        Some(raw) => parse_u64("length", raw)?,
    };
    if max_rows == 0 {
        return Ok(requested);
    }
    match requested {
        0 => Ok(max_rows),
        n if n > max_rows => Err(TableError::InvalidInput(format!(
            "length {n} exceeds the maximum of {max_rows}"
        ))),
        n => Ok(n),
    }
}

/// A column the client names must be the configured column at that index.
fn check_columns(params: &HashMap<String, String>, config: &TableConfig) -> Result<(), TableError> {
    for i in 0.. {
        if !params.contains_key(&format!("columns[{i}][data]")) {
            break;
        }
        let Some(name) = params.get(&format!("columns[{i}][name]")) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        match config.columns.get(i) {
            Some(column) if column.name == *name => {}
            _ => {
                return Err(TableError::InvalidInput(format!(
                    "column {i} is not {name:?}"
                )));
            }
        }
    }
    Ok(())
}

fn decode_order(
    params: &HashMap<String, String>,
    config: &TableConfig,
) -> Result<Vec<Sort>, TableError> {
    let mut sort: Vec<Sort> = Vec::new();
    for i in 0.. {
        let Some(raw) = params.get(&format!("order[{i}][column]")) else {
            break;
        };
        if raw.is_empty() {
            break;
        }
        let index = parse_u64("order column", raw)?;
        let column = usize::try_from(index)
            .ok()
            .and_then(|idx| config.columns.get(idx))
            .ok_or_else(|| {
                TableError::InvalidInput(format!("order column {index} is out of range"))
            })?;

        if params
            .get(&format!("columns[{index}][orderable]"))
            .is_some_and(|v| v == "false")
        {
            continue;
        }

        let entry = match params.get(&format!("order[{i}][dir]")).map(String::as_str) {
            None | Some("") | Some("asc") => Sort::asc(column.name.clone()),
            Some("desc") => Sort::desc(column.name.clone()),
            Some(other) => {
                return Err(TableError::InvalidInput(format!(
                    "order direction must be asc or desc, got {other:?}"
                )));
            }
        };
        if sort.iter().all(|s| s.field != entry.field) {
            sort.push(entry);
        }
    }
    Ok(sort)
}

fn parse_u64(name: &str, raw: &str) -> Result<u64, TableError> {
    raw.trim().parse().map_err(|_| {
        TableError::InvalidInput(format!("{name} is not a non-negative integer: {raw:?}"))
    })
}
