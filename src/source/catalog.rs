//! Catalog file parsing.
//!
//! The catalog is a comma-separated file whose header names at least `id`,
//! `description` and `url`. Fields may be wrapped in double quotes, with `""`
//! standing for a literal quote. Records span exactly one line.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, instrument};

use super::{SourceError, WorkItem};

/// Reads and parses a catalog file.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be read, or any parse error
/// from [`parse_catalog`].
#[instrument(fields(path = %path.display()))]
pub fn read_catalog(path: &Path) -> Result<Vec<WorkItem>, SourceError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let items = parse_catalog(&raw)?;
    debug!(items = items.len(), "catalog parsed");
    Ok(items)
}

/// Parses catalog text into work items numbered `1..=N` in row order.
///
/// # Errors
///
/// Returns [`SourceError`] for a missing header or column, rows with too few
/// fields or an unterminated quote, non-numeric ids, and repeated ids.
pub fn parse_catalog(raw: &str) -> Result<Vec<WorkItem>, SourceError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = raw
        .lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((header_line, header)) = lines.next() else {
        return Err(SourceError::EmptyCatalog);
    };
    let header = split_record(header).map_err(|reason| SourceError::MalformedRow {
        line: header_line,
        reason,
    })?;
    let column = |name: &'static str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or(SourceError::MissingColumn { column: name })
    };
    let id_col = column("id")?;
    let description_col = column("description")?;
    let url_col = column("url")?;
    let needed = id_col.max(description_col).max(url_col) + 1;

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for (line, record) in lines {
        let fields = split_record(record)
            .map_err(|reason| SourceError::MalformedRow { line, reason })?;
        if fields.len() < needed {
            return Err(SourceError::MalformedRow {
                line,
                reason: format!("expected at least {needed} fields, found {}", fields.len()),
            });
        }

        let raw_id = fields[id_col].trim();
        let id: u64 = raw_id.parse().map_err(|_| SourceError::MalformedRow {
            line,
            reason: format!("id `{raw_id}` is not a non-negative integer"),
        })?;
        if !seen.insert(id) {
            return Err(SourceError::DuplicateId { id, line });
        }

        let url = fields[url_col].trim();
        if url.is_empty() {
            return Err(SourceError::MalformedRow {
                line,
                reason: "url is empty".to_string(),
            });
        }

        let index = items.len() + 1;
        items.push(
            WorkItem::direct(index, id, url).with_metadata("description", fields[description_col].trim()),
        );
    }

    Ok(items)
}

/// Splits one record into fields, honoring double-quoted fields.
fn split_record(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(field);
    Ok(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::source::Locator;

    #[test]
    fn test_parse_catalog_basic_rows() {
        let raw = "id,description,url\n\
                   1,Teemo shrug,https://example.com/teemo.png\n\
                   7,Baron,https://example.com/baron.gif\n";
        let items = parse_catalog(raw).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].index, 1);
        assert_eq!(items[0].id, 1);
        assert_eq!(
            items[0].locator,
            Locator::Direct("https://example.com/teemo.png".to_string())
        );
        assert_eq!(items[0].metadata["description"], "Teemo shrug");
        assert_eq!(items[1].index, 2);
        assert_eq!(items[1].id, 7);
    }

    #[test]
    fn test_parse_catalog_quoted_description_with_commas() {
        let raw = "id,description,url\r\n3,\"Jinx, \"\"the\"\" loose cannon\",https://example.com/j.jpg\r\n";
        let items = parse_catalog(raw).unwrap();
        assert_eq!(items[0].metadata["description"], "Jinx, \"the\" loose cannon");
    }

    #[test]
    fn test_parse_catalog_reordered_and_extra_columns() {
        let raw = "url,notes,ID,Description\nhttps://example.com/a.png,x,4,Ahri\n";
        let items = parse_catalog(raw).unwrap();
        assert_eq!(items[0].id, 4);
        assert_eq!(items[0].metadata["description"], "Ahri");
        assert_eq!(items[0].locator.as_str(), "https://example.com/a.png");
    }

    #[test]
    fn test_parse_catalog_skips_blank_lines_and_bom() {
        let raw = "\u{feff}id,description,url\n\n1,a,https://example.com/1.png\n   \n";
        let items = parse_catalog(raw).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_parse_catalog_empty_input() {
        assert!(matches!(parse_catalog(""), Err(SourceError::EmptyCatalog)));
    }

    #[test]
    fn test_parse_catalog_missing_column() {
        let result = parse_catalog("id,url\n1,https://example.com/1.png\n");
        assert!(matches!(
            result,
            Err(SourceError::MissingColumn {
                column: "description"
            })
        ));
    }

    #[test]
    fn test_parse_catalog_bad_id_reports_line() {
        let result = parse_catalog("id,description,url\nabc,x,https://example.com/1.png\n");
        match result {
            Err(SourceError::MalformedRow { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("abc"), "got: {reason}");
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_catalog_short_row() {
        let result = parse_catalog("id,description,url\n1,only two\n");
        assert!(matches!(
            result,
            Err(SourceError::MalformedRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_catalog_duplicate_id() {
        let raw = "id,description,url\n1,a,https://e.com/a.png\n1,b,https://e.com/b.png\n";
        assert!(matches!(
            parse_catalog(raw),
            Err(SourceError::DuplicateId { id: 1, line: 3 })
        ));
    }

    #[test]
    fn test_parse_catalog_ids_are_numeric() {
        let raw = "id,description,url\n007,a,https://e.com/a.png\n";
        let items = parse_catalog(raw).unwrap();
        assert_eq!(items[0].id, 7);

        let raw = "id,description,url\n7,a,https://e.com/a.png\n007,b,https://e.com/b.png\n";
        assert!(matches!(
            parse_catalog(raw),
            Err(SourceError::DuplicateId { id: 7, line: 3 })
        ));
    }

    #[test]
    fn test_split_record_unterminated_quote() {
        assert!(split_record("1,\"open,https://e.com").is_err());
    }

    #[test]
    fn test_read_catalog_missing_file() {
        let result = read_catalog(Path::new("/definitely/not/here/catalog.csv"));
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }
}
