use crate::config::MatchConfig;
use crate::normalize::Normalizer;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DataFile {
    pub bucket: String,
    pub key: String,
}

/// Lambda event: where the address table lives and how to match it.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupRequest {
    pub data: DataFile,
    #[serde(default)]
    pub columns: ColumnConfig,
    #[serde(default)]
    pub config: MatchConfig,
    #[serde(default)]
    pub export: ExportMode,
}

/// Maps CSV headers onto record fields.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnConfig {
    pub address: String,
    pub unit: String,
    pub group: String,
    /// Falls back to the 1-based row number when absent.
    pub id: Option<String>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            address: String::from("address"),
            unit: String::from("apartment"),
            group: String::from("tk"),
            id: None,
        }
    }
}

impl ColumnConfig {
    pub fn required(&self) -> Vec<&str> {
        let mut columns = vec![
            self.group.as_str(),
            self.address.as_str(),
            self.unit.as_str(),
        ];
        if let Some(id) = &self.id {
            columns.push(id.as_str());
        }
        columns
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ExportMode {
    /// id, address, normalized address, unit and group only.
    #[default]
    Projected,
    /// Every column of the input row, in input order.
    AllFields,
}

/// One input row as read at the table boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRecord {
    pub id: String,
    pub address: String,
    pub unit: String,
    pub group: String,
    pub fields: Vec<String>,
}

/// A row with its address normalized once, up front.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: String,
    pub address: String,
    pub normalized_address: String,
    pub unit: String,
    pub group: String,
    #[serde(skip)]
    pub fields: Vec<String>,
}

impl Record {
    pub fn new(raw: RawRecord, normalizer: &Normalizer) -> Self {
        let normalized_address = normalizer.normalize(&raw.address);
        Record {
            id: raw.id,
            address: raw.address,
            normalized_address,
            unit: raw.unit,
            group: raw.group,
            fields: raw.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizerConfig;

    #[test]
    fn request_uses_defaults_for_missing_sections() {
        let request: DedupRequest = serde_json::from_str(
            r#"{ "data": { "bucket": "addresses/input", "key": "cyprus.csv" } }"#,
        )
        .unwrap();
        assert_eq!(request.columns, ColumnConfig::default());
        assert_eq!(request.export, ExportMode::Projected);
        assert_eq!(request.config.threshold, 92.0);
    }

    #[test]
    fn request_reads_camel_case_fields() {
        let request: DedupRequest = serde_json::from_str(
            r#"{
                "data": { "bucket": "b", "key": "k" },
                "columns": { "address": "addr", "unit": "flat", "group": "code", "id": "rid" },
                "config": { "threshold": 85, "numWeight": 2.0 },
                "export": "allFields"
            }"#,
        )
        .unwrap();
        assert_eq!(request.columns.required(), vec!["code", "addr", "flat", "rid"]);
        assert_eq!(request.config.threshold, 85.0);
        assert_eq!(request.config.num_weight, 2.0);
        assert_eq!(request.config.text_weight, 1.0);
        assert_eq!(request.export, ExportMode::AllFields);
    }

    #[test]
    fn record_caches_normalized_address() {
        let normalizer = Normalizer::new(&NormalizerConfig::default());
        let record = Record::new(
            RawRecord {
                id: String::from("7"),
                address: String::from("  9 Alkinoou,  Germasogeia "),
                unit: String::from("1"),
                group: String::from("4040"),
                fields: vec![],
            },
            &normalizer,
        );
        assert_eq!(record.normalized_address, "9 alkinoou germasogeia");
        assert_eq!(record.address, "  9 Alkinoou,  Germasogeia ");
    }
}
