//! Recipient list loading
//!
//! Accepts either an address → amount mapping or the holder snapshot format
//! (`[{ "address": "0x..", "tokenCount": 3 }]`), optionally wrapped in a
//! `{ "recipients": ... }` document. Entries keep document order.

use alloy_primitives::Address;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::amount::{AmountError, DecimalAmount};
use crate::error::{DistributionError, Result};

const WRAPPER_KEY: &str = "recipients";
const HOLDER_ADDRESS_KEY: &str = "address";
const HOLDER_COUNT_KEY: &str = "tokenCount";

/// Where recipients are read from and how holder entries are priced
#[derive(Debug, Clone)]
pub struct RecipientSource {
    pub path: PathBuf,
    /// Tokens paid per unit a holder owns; required for the holder list format
    pub holder_unit_amount: Option<DecimalAmount>,
}

impl RecipientSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), holder_unit_amount: None }
    }
}

/// One recipient with its human-readable amount, not yet validated as a number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientEntry {
    pub address: Address,
    pub amount: String,
}

impl RecipientEntry {
    pub fn new(address: Address, amount: impl Into<String>) -> Self {
        Self { address, amount: amount.into() }
    }
}

/// Non-empty list of unique, non-zero recipient addresses in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientList {
    entries: Vec<RecipientEntry>,
}

impl RecipientList {
    pub fn from_entries(entries: Vec<RecipientEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(DistributionError::Config("Recipient list is empty".to_string()));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.address == Address::ZERO {
                return Err(DistributionError::Config("Invalid zero address in recipient list".to_string()));
            }
            if !seen.insert(entry.address) {
                return Err(DistributionError::Config(format!(
                    "Duplicate recipient address: {}",
                    entry.address
                )));
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RecipientEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecipientEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads and parses the recipient source file
pub async fn load_recipients(source: &RecipientSource) -> Result<RecipientList> {
    let content = tokio::fs::read_to_string(&source.path).await.map_err(|e| {
        DistributionError::Config(format!(
            "Failed to read recipient source {}: {}",
            source.path.display(),
            e
        ))
    })?;

    let list = parse_recipients(&content, source.holder_unit_amount.as_ref())
        .map_err(|e| with_source_path(e, &source.path))?;

    info!("Loaded {} recipients from {}", list.len(), source.path.display());
    Ok(list)
}

fn with_source_path(err: DistributionError, path: &Path) -> DistributionError {
    match err {
        DistributionError::Config(msg) => DistributionError::Config(format!("{}: {}", path.display(), msg)),
        other => other,
    }
}

/// JSON document that keeps every object member, repeated keys included,
/// so a duplicated recipient is rejected instead of silently collapsed.
#[derive(Debug)]
enum Document {
    Object(Vec<(String, Document)>),
    Array(Vec<Value>),
    Scalar(Value),
}

impl Document {
    fn into_value(self) -> Value {
        match self {
            Document::Object(members) => {
                Value::Object(members.into_iter().map(|(k, v)| (k, v.into_value())).collect())
            }
            Document::Array(items) => Value::Array(items),
            Document::Scalar(value) => value,
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Document, A::Error> {
        let mut members = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, Document>()? {
            members.push((key, value));
        }
        Ok(Document::Object(members))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Document, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Document::Array(items))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Document, E> {
        Ok(Document::Scalar(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Document, E> {
        Ok(Document::Scalar(Value::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Document, E> {
        Ok(Document::Scalar(Value::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Document, E> {
        Ok(Document::Scalar(Value::from(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Document, E> {
        Ok(Document::Scalar(Value::String(v.to_string())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Document, E> {
        Ok(Document::Scalar(Value::String(v)))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Document, E> {
        Ok(Document::Scalar(Value::Null))
    }
}

/// Parses recipient JSON; see the module docs for accepted shapes
pub fn parse_recipients(content: &str, holder_unit_amount: Option<&DecimalAmount>) -> Result<RecipientList> {
    let document: Document = serde_json::from_str(content)
        .map_err(|e| DistributionError::Config(format!("Failed to parse recipient JSON: {}", e)))?;

    let body = match document {
        Document::Object(mut members) => {
            match members.iter().rposition(|(key, _)| key == WRAPPER_KEY) {
                Some(idx) => members.swap_remove(idx).1,
                None => Document::Object(members),
            }
        }
        other => other,
    };

    let entries = match body {
        Document::Object(members) => members
            .into_iter()
            .map(|(key, value)| {
                let address = parse_address(&key)?;
                Ok(RecipientEntry::new(address, amount_text(&value.into_value())))
            })
            .collect::<Result<Vec<_>>>()?,
        Document::Array(holders) => {
            let unit = holder_unit_amount.ok_or_else(|| {
                DistributionError::Config(
                    "Holder list input requires holder_unit_amount to be configured".to_string(),
                )
            })?;
            holders
                .iter()
                .enumerate()
                .map(|(index, holder)| holder_entry(index, holder, unit))
                .collect::<Result<Vec<_>>>()?
        }
        _ => {
            return Err(DistributionError::Config(
                "Recipient source must be a JSON object or array".to_string(),
            ))
        }
    };

    RecipientList::from_entries(entries)
}

fn holder_entry(index: usize, holder: &Value, unit: &DecimalAmount) -> Result<RecipientEntry> {
    let fields = holder.as_object().ok_or_else(|| {
        DistributionError::Config(format!("Holder #{} is not a JSON object", index))
    })?;

    let address = fields
        .get(HOLDER_ADDRESS_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| DistributionError::Config(format!("Holder #{} has no \"address\" string", index)))
        .and_then(parse_address)?;

    let count_value = fields.get(HOLDER_COUNT_KEY).ok_or_else(|| {
        DistributionError::Config(format!("Holder #{} has no \"{}\" field", index, HOLDER_COUNT_KEY))
    })?;

    let amount_error = |source: AmountError| DistributionError::Amount { recipient: address.to_string(), source };
    let count: DecimalAmount = amount_text(count_value).parse().map_err(amount_error)?;
    let amount = count.checked_mul(unit).map_err(amount_error)?;

    debug!("Holder {} owns {} units, amount {}", address, count, amount);
    Ok(RecipientEntry::new(address, amount.to_string()))
}

fn parse_address(text: &str) -> Result<Address> {
    text.trim()
        .parse::<Address>()
        .map_err(|e| DistributionError::Config(format!("Invalid recipient address {:?}: {}", text, e)))
}

/// Strings are taken verbatim, anything else by its JSON text so that
/// normalization reports it as a malformed amount.
fn amount_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ALICE: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0";
    const BOB: &str = "0x1111111111111111111111111111111111111111";

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_mapping_keeps_document_order() {
        let json = format!(r#"{{ "{BOB}": "1.0", "{ALICE}": 2.5 }}"#);
        let list = parse_recipients(&json, None).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.entries()[0], RecipientEntry::new(addr(BOB), "1.0"));
        assert_eq!(list.entries()[1], RecipientEntry::new(addr(ALICE), "2.5"));
    }

    #[test]
    fn test_parse_wrapped_mapping_ignores_extra_fields() {
        let json = format!(r#"{{ "snapshot": 91199518, "recipients": {{ "{ALICE}": "5" }} }}"#);
        let list = parse_recipients(&json, None).unwrap();

        assert_eq!(list.entries(), &[RecipientEntry::new(addr(ALICE), "5")]);
    }

    #[test]
    fn test_parse_holder_list() {
        let json = format!(
            r#"[
                {{ "address": "{ALICE}", "tokenCount": 3, "tokenIds": [1, 2, 3] }},
                {{ "address": "{BOB}", "tokenCount": "1" }}
            ]"#
        );
        let unit: DecimalAmount = "5".parse().unwrap();
        let list = parse_recipients(&json, Some(&unit)).unwrap();

        assert_eq!(list.entries()[0].amount, "15");
        assert_eq!(list.entries()[1].amount, "5");
    }

    #[test]
    fn test_holder_list_requires_unit_amount() {
        let json = format!(r#"[{{ "address": "{ALICE}", "tokenCount": 3 }}]"#);
        let err = parse_recipients(&json, None).unwrap_err();
        assert!(matches!(err, DistributionError::Config(_)));
    }

    #[test]
    fn test_holder_with_bad_count_is_amount_error() {
        let json = format!(r#"[{{ "address": "{ALICE}", "tokenCount": "many" }}]"#);
        let unit: DecimalAmount = "5".parse().unwrap();
        let err = parse_recipients(&json, Some(&unit)).unwrap_err();
        assert!(matches!(err, DistributionError::Amount { .. }));
    }

    #[test]
    fn test_non_numeric_amount_is_kept_for_normalization() {
        let json = format!(r#"{{ "{ALICE}": true }}"#);
        let list = parse_recipients(&json, None).unwrap();
        assert_eq!(list.entries()[0].amount, "true");
    }

    #[test]
    fn test_rejects_invalid_documents() {
        let cases = [
            "not json".to_string(),
            "42".to_string(),
            "{}".to_string(),
            r#"{ "0xnotanaddress": "1" }"#.to_string(),
            r#"{ "0x0000000000000000000000000000000000000000": "1" }"#.to_string(),
            format!(r#"{{ "{ALICE}": "1", "{}": "2" }}"#, ALICE.to_lowercase()),
            r#"[]"#.to_string(),
        ];

        for case in cases {
            let err = parse_recipients(&case, None).unwrap_err();
            assert!(matches!(err, DistributionError::Config(_)), "{case} -> {err:?}");
        }
    }

    #[test]
    fn test_repeated_address_key_is_rejected() {
        let json = format!(r#"{{ "{ALICE}": "1", "{BOB}": "3", "{ALICE}": "2" }}"#);
        let err = parse_recipients(&json, None).unwrap_err();
        assert!(matches!(err, DistributionError::Config(_)), "{err:?}");
        assert!(err.to_string().contains("Duplicate recipient address"));

        let wrapped = format!(r#"{{ "recipients": {{ "{BOB}": "1", "{BOB}": "1" }} }}"#);
        assert!(matches!(parse_recipients(&wrapped, None), Err(DistributionError::Config(_))));
    }

    #[test]
    fn test_nested_amount_value_is_kept_as_text() {
        let json = format!(r#"{{ "{ALICE}": {{ "value": "1" }} }}"#);
        let list = parse_recipients(&json, None).unwrap();
        assert_eq!(list.entries()[0].amount, r#"{"value":"1"}"#);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "{ALICE}": "2.5" }}"#).unwrap();

        let list = load_recipients(&RecipientSource::new(file.path())).await.unwrap();
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = load_recipients(&RecipientSource::new("nonexistent-recipients.json")).await;
        assert!(matches!(result, Err(DistributionError::Config(_))));
    }
}
