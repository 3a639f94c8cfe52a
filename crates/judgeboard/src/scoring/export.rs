use super::domain::Project;
use super::ranking::rank_teams;

pub const EXPORT_FILE_SUFFIX: &str = "-scores.csv";
pub const EXPORT_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Rendered leaderboard ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to encode leaderboard row: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush leaderboard export: {0}")]
    Flush(String),
    #[error("leaderboard export is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub fn export_project(project: &Project) -> Result<CsvExport, ExportError> {
    Ok(CsvExport {
        file_name: export_file_name(&project.name),
        body: leaderboard_csv(project)?,
    })
}

/// `Team`, one column per criterion, `Total %`, `Rank`; rows in ranked order.
/// Every field is quoted and rows are joined with `\n` (no trailing newline).
pub fn leaderboard_csv(project: &Project) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut header = Vec::with_capacity(project.criteria.len() + 3);
    header.push("Team".to_string());
    header.extend(project.criteria.iter().map(|criterion| criterion.name.clone()));
    header.push("Total %".to_string());
    header.push("Rank".to_string());
    writer.write_record(&header)?;

    let ranking = rank_teams(&project.criteria, &project.teams);
    for entry in ranking.entries() {
        let Some(team) = project.team(&entry.team_id) else {
            continue;
        };

        let mut row = Vec::with_capacity(header.len());
        row.push(team.name.clone());
        row.extend(
            project
                .criteria
                .iter()
                .map(|criterion| format_raw(team.raw_score(&criterion.id).unwrap_or(0.0))),
        );
        row.push(format!("{:.2}", entry.total));
        row.push(entry.rank.to_string());
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.to_string()))?;
    let mut body = String::from_utf8(bytes)?;
    if body.ends_with('\n') {
        body.pop();
    }
    Ok(body)
}

/// Lowercased project name with each whitespace run turned into one hyphen.
pub fn export_file_name(project_name: &str) -> String {
    let mut slug = String::with_capacity(project_name.len() + EXPORT_FILE_SUFFIX.len());
    let mut in_whitespace = false;
    for ch in project_name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.extend(ch.to_lowercase());
            in_whitespace = false;
        }
    }
    slug.push_str(EXPORT_FILE_SUFFIX);
    slug
}

/// Plain number text: `8`, `7.5`, `0`.
fn format_raw(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}
