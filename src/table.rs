use crate::dto::{ColumnConfig, ExportMode, RawRecord};
use crate::report::Report;
use csv::{ReaderBuilder, StringRecord, Writer};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("file must contain column(s) {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Input rows plus the header they were read with.
#[derive(Clone, Debug, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
}

struct ColumnIndex {
    address: usize,
    unit: usize,
    group: usize,
    id: Option<usize>,
}

///
/// Reads a CSV table and maps it onto [`RawRecord`]s.
///
/// Every configured column is checked before the first row is read; any that
/// are missing are reported together. Units and group keys are trimmed, the
/// address is kept exactly as written.
///
pub fn read_table<R: io::Read>(reader: R, columns: &ColumnConfig) -> Result<Table, TableError> {
    let mut reader = ReaderBuilder::new().from_reader(reader);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let index = locate(&headers, columns)?;
    let rows = reader
        .records()
        .enumerate()
        .map(|(row, record)| record.map(|rec| to_raw(&rec, &index, row + 1)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Table { headers, rows })
}

fn locate(headers: &[String], columns: &ColumnConfig) -> Result<ColumnIndex, TableError> {
    let position = |name: &str| headers.iter().position(|h| h == name);
    let missing: Vec<String> = columns
        .required()
        .into_iter()
        .filter(|name| position(name).is_none())
        .map(String::from)
        .collect();
    match (
        position(&columns.address),
        position(&columns.unit),
        position(&columns.group),
    ) {
        (Some(address), Some(unit), Some(group)) if missing.is_empty() => Ok(ColumnIndex {
            address,
            unit,
            group,
            id: columns.id.as_deref().and_then(position),
        }),
        _ => Err(TableError::MissingColumns(missing)),
    }
}

fn to_raw(record: &StringRecord, index: &ColumnIndex, row: usize) -> RawRecord {
    let cell = |i: usize| record.get(i).unwrap_or_default();
    RawRecord {
        id: index
            .id
            .map(|i| cell(i).trim().to_string())
            .unwrap_or_else(|| row.to_string()),
        address: cell(index.address).to_string(),
        unit: cell(index.unit).trim().to_string(),
        group: cell(index.group).trim().to_string(),
        fields: record.iter().map(String::from).collect(),
    }
}

///
/// Writes the report's flagged records as CSV.
///
/// `Projected` writes the id, the address as entered, its normalized form,
/// the unit and the group under the configured column names. `AllFields`
/// writes the original row under the original header.
///
pub fn write_export<W: io::Write>(
    writer: W,
    report: &Report,
    headers: &[String],
    columns: &ColumnConfig,
    mode: ExportMode,
) -> Result<(), TableError> {
    let mut writer = Writer::from_writer(writer);
    match mode {
        ExportMode::Projected => {
            writer.write_record([
                columns.id.as_deref().unwrap_or("id"),
                columns.address.as_str(),
                "normalized_address",
                columns.unit.as_str(),
                columns.group.as_str(),
            ])?;
            for record in &report.flagged {
                writer.write_record([
                    &record.id,
                    &record.address,
                    &record.normalized_address,
                    &record.unit,
                    &record.group,
                ])?;
            }
        }
        ExportMode::AllFields => {
            writer.write_record(headers)?;
            for record in &report.flagged {
                writer.write_record(&record.fields)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn export_bytes(
    report: &Report,
    headers: &[String],
    columns: &ColumnConfig,
    mode: ExportMode,
) -> Result<Vec<u8>, TableError> {
    let mut buffer = Vec::new();
    write_export(&mut buffer, report, headers, columns, mode)?;
    Ok(buffer)
}
