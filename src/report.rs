use crate::audit::types::ForkRecord;
use crate::error::Result;
use chrono::SecondsFormat;
use itertools::Itertools;
use serde::Serialize;
use std::io::Write;

pub const HEADER: [&str; 6] = [
    "repo",
    "fork_owner",
    "default_branch",
    "last_commit_date",
    "stars",
    "notable_diffs",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub repo: String,
    pub fork_owner: String,
    pub default_branch: String,
    pub last_commit_date: String,
    pub stars: String,
    pub notable_diffs: String,
}

impl From<&ForkRecord> for OutputRow {
    fn from(record: &ForkRecord) -> Self {
        Self {
            repo: record.repo_name.clone(),
            fork_owner: record.owner_login.clone(),
            default_branch: record.default_branch.clone(),
            last_commit_date: record
                .last_push_timestamp
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
            stars: record.stargazer_count.to_string(),
            notable_diffs: record
                .notable_diffs
                .iter()
                .map(|d| format!("{} ({})", d.filename, d.change_count))
                .join("; "),
        }
    }
}

/// Writes the header and one row per record, in the order given.
pub fn write_report<W: Write>(records: &[ForkRecord], out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);

    writer.write_record(HEADER)?;
    for record in records {
        writer.serialize(OutputRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn render(records: &[ForkRecord]) -> String {
        let mut buf = Vec::new();
        write_report(records, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_is_written_without_rows() {
        assert_eq!(
            render(&[]),
            "repo,fork_owner,default_branch,last_commit_date,stars,notable_diffs\n"
        );
    }

    #[test]
    fn row_projects_every_field() {
        let mut record = make_record("alice", Some("2024-01-02T00:00:00Z"), 5);
        record.notable_diffs = vec![make_diff("src/big.rs", 250), make_diff("docs/guide.md", 900)];
        let row = OutputRow::from(&record);

        assert_eq!(row.repo, "Org/Repo");
        assert_eq!(row.fork_owner, "alice");
        assert_eq!(row.default_branch, "main");
        assert_eq!(row.last_commit_date, "2024-01-02T00:00:00Z");
        assert_eq!(row.stars, "5");
        assert_eq!(row.notable_diffs, "src/big.rs (250); docs/guide.md (900)");
    }

    #[test]
    fn absent_values_render_empty() {
        let output = render(&[make_record("bob", None, 0)]);
        let line = output.lines().nth(1).unwrap();
        assert_eq!(line, "Org/Repo,bob,main,,0,");
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let mut record = make_record("carol", None, 1);
        record.notable_diffs = vec![make_diff("a,b.rs", 300)];
        let output = render(&[record]);
        assert!(output.contains("\"a,b.rs (300)\""));
    }

    #[test]
    fn rendering_is_deterministic() {
        let records = vec![
            make_record("x", Some("2024-03-03T10:00:00Z"), 2),
            make_record("y", None, 9),
        ];
        assert_eq!(render(&records), render(&records));
    }
}
