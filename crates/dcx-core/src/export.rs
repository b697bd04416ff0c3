//! The structured export file: naming, JSON codec, ordering and line formatting.

use std::path::Path;

use serde::Serialize;

use crate::{domain::MessageRecord, Result};

pub const EXPORT_EXTENSION: &str = ".json";
pub const DOCUMENT_EXTENSION: &str = ".pdf";

const MAX_JOINED_NAME_CHARS: usize = 50;
const TRUNCATED_MARKER: &str = "_combined";
const EXPORT_SUFFIX: &str = "_logs";

/// Stable ascending sort by parsed timestamp.
///
/// Every timestamp is parsed before anything is reordered, so one bad record
/// fails the whole call instead of being skipped.
pub fn sort_messages(records: Vec<MessageRecord>) -> Result<Vec<MessageRecord>> {
    let mut keyed = records
        .into_iter()
        .map(|r| Ok((r.parsed_timestamp()?, r)))
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by_key(|(ts, _)| *ts);
    Ok(keyed.into_iter().map(|(_, r)| r).collect())
}

/// Body line of the rendered document for one record.
pub fn format_message(record: &MessageRecord) -> String {
    format!(
        "[{}] {} in #{}: {}",
        record.timestamp, record.author, record.channel_name, record.content
    )
}

/// Keep only alphanumeric characters and underscores.
pub fn sanitize_channel_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// `<sanitized names joined by _, max 50 chars>[_combined]_logs.json`
pub fn export_file_name<S: AsRef<str>>(channel_names: &[S]) -> String {
    let joined = channel_names
        .iter()
        .map(|n| sanitize_channel_name(n.as_ref()))
        .collect::<Vec<_>>()
        .join("_");

    let stem = if joined.chars().count() > MAX_JOINED_NAME_CHARS {
        let mut s = joined
            .chars()
            .take(MAX_JOINED_NAME_CHARS)
            .collect::<String>();
        s.push_str(TRUNCATED_MARKER);
        s
    } else {
        joined
    };

    format!("{stem}{EXPORT_SUFFIX}{EXPORT_EXTENSION}")
}

/// Swap the export extension for the document extension.
///
/// Names without a `.json` suffix get `.pdf` appended so the output never
/// overwrites the input.
pub fn document_file_name(export_name: &str) -> String {
    let stem = match export_name.len().checked_sub(EXPORT_EXTENSION.len()) {
        Some(at)
            if at > 0
                && export_name
                    .get(at..)
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(EXPORT_EXTENSION)) =>
        {
            &export_name[..at]
        }
        _ => export_name,
    };
    format!("{stem}{DOCUMENT_EXTENSION}")
}

/// Pretty JSON (4-space indent), non-ASCII left unescaped.
pub fn to_json(records: &[MessageRecord]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;
    Ok(buf)
}

pub fn from_json(bytes: &[u8]) -> Result<Vec<MessageRecord>> {
    // Tolerate a UTF-8 BOM from hand-edited files.
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    Ok(serde_json::from_slice(bytes)?)
}

pub async fn write_export(path: &Path, records: &[MessageRecord]) -> Result<()> {
    let bytes = to_json(records)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

pub async fn read_export(path: &Path) -> Result<Vec<MessageRecord>> {
    let bytes = tokio::fs::read(path).await?;
    from_json(&bytes)
}
