use anyhow::{Context, Result};
use console::{pad_str, Alignment};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::discovery::DiscoveryReport;
use crate::providers::VideoRecord;
use crate::transcribe::TranscriptionResult;
use crate::utils::{extract_domain, format_number, truncate_chars};

const CAPTION_WIDTH: usize = 40;
const TRANSCRIPT_WIDTH: usize = 60;

/// Render records as CSV.
///
/// The header row is the first record's field names in declaration order.
/// Every value is double-quoted with embedded quotes doubled; rows are joined
/// with `\n` and keep input order.
pub fn to_csv<T: Serialize>(records: &[T]) -> Result<String> {
    if records.is_empty() {
        anyhow::bail!("No data to export");
    }

    let rows: Vec<Value> = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()
        .context("Failed to serialize records")?;

    let headers: Vec<String> = match &rows[0] {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => anyhow::bail!("CSV export needs records with named fields"),
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));

    for row in &rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|header| quote_cell(&cell_text(row.get(header))))
            .collect();
        lines.push(cells.join(","));
    }

    Ok(lines.join("\n"))
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn quote_cell(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Render a discovery report in the requested format
pub fn render_discovery(report: &DiscoveryReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(discovery_table(&report.videos)),
        OutputFormat::Json => serde_json::to_string_pretty(report).context("Failed to serialize report"),
        OutputFormat::Csv => to_csv(&report.videos),
    }
}

/// Render transcription results in the requested format
pub fn render_transcriptions(results: &[TranscriptionResult], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(transcription_table(results)),
        OutputFormat::Json => serde_json::to_string_pretty(results).context("Failed to serialize results"),
        OutputFormat::Csv => to_csv(results),
    }
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|row| console::measure_text_width(&row[i]))
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad_str(cell, *width, Alignment::Left, None).into_owned())
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![format_row(headers.to_vec())];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        out.push(format_row(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

fn discovery_table(videos: &[VideoRecord]) -> String {
    let rows: Vec<Vec<String>> = videos
        .iter()
        .enumerate()
        .map(|(i, video)| {
            let creator = if video.creator_username.is_empty() {
                video.creator.clone()
            } else {
                format!("@{}", video.creator_username)
            };
            vec![
                (i + 1).to_string(),
                video.platform.to_string(),
                creator,
                truncate_chars(&single_line(&video.caption), CAPTION_WIDTH),
                format_number(video.views),
                format_number(video.likes),
                format_number(video.comments),
                video.url.clone(),
            ]
        })
        .collect();

    render_table(
        &["#", "Platform", "Creator", "Caption", "Views", "Likes", "Comments", "URL"],
        &rows,
    )
}

fn transcription_table(results: &[TranscriptionResult]) -> String {
    let rows: Vec<Vec<String>> = results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let detail = if result.is_success() {
                truncate_chars(&single_line(&result.transcript), TRANSCRIPT_WIDTH)
            } else {
                result.error.clone().unwrap_or_default()
            };
            vec![
                (i + 1).to_string(),
                extract_domain(&result.url).unwrap_or_else(|| result.url.clone()),
                result.status.as_str().to_string(),
                detail,
            ]
        })
        .collect();

    render_table(&["#", "Source", "Status", "Transcript / Error"], &rows)
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Write rendered output to a file, creating parent directories
pub fn save_to_file(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::create_dir_all(parent)?;
        }
    }

    fs_err::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Print rendered output to stdout
pub fn print_to_console(content: &str) {
    println!("{}", content);
}

/// Read the videos from a saved discovery export.
///
/// Accepts the JSON report written by `discover --format json` or a bare array
/// of video records.
pub fn load_discovery_export(path: &Path) -> Result<Vec<VideoRecord>> {
    let content = fs_err::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON discovery export", path.display()))?;

    let videos = match value {
        Value::Object(mut map) => map
            .remove("videos")
            .with_context(|| format!("{} has no \"videos\" list", path.display()))?,
        other => other,
    };

    serde_json::from_value(videos)
        .with_context(|| format!("{} does not contain video records", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Platform;
    use serde_json::json;

    fn video(platform: Platform, views: u64, caption: &str) -> VideoRecord {
        VideoRecord {
            url: format!("https://example.com/{}", views),
            caption: caption.to_string(),
            creator_username: "maker".to_string(),
            views,
            ..VideoRecord::empty(platform)
        }
    }

    #[test]
    fn test_csv_quote_doubling() {
        let csv = to_csv(&[json!({"a": "x\"y", "b": 5})]).unwrap();
        assert_eq!(csv, "a,b\n\"x\"\"y\",\"5\"");
    }

    #[test]
    fn test_csv_headers_from_first_record() {
        let rows = [json!({"a": 1, "b": null}), json!({"b": "two", "c": 3})];
        let csv = to_csv(&rows).unwrap();
        assert_eq!(csv, "a,b\n\"1\",\"\"\n\"\",\"two\"");
    }

    #[test]
    fn test_csv_empty_input() {
        let err = to_csv::<Value>(&[]).unwrap_err();
        assert_eq!(err.to_string(), "No data to export");
    }

    #[test]
    fn test_csv_video_records() {
        let csv = to_csv(&[video(Platform::TikTok, 2000, "hello, \"world\"")]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "platform,url,videoId,caption,creator,creatorUsername,likes,comments,shares,saves,views,createdAt,hashtags,thumbnail"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"TikTok\",\"https://example.com/2000\",\"\",\"hello, \"\"world\"\"\""));
        assert!(row.contains("\"2000\""));
    }

    #[test]
    fn test_csv_transcription_results() {
        let results = [
            TranscriptionResult::success("https://a.com/1", "hi".into()),
            TranscriptionResult::failure("https://a.com/2", "No audio".into()),
        ];
        let csv = to_csv(&results).unwrap();
        assert_eq!(
            csv,
            "url,transcript,status,error\n\
             \"https://a.com/1\",\"hi\",\"success\",\"\"\n\
             \"https://a.com/2\",\"\",\"error\",\"No audio\""
        );
    }

    #[test]
    fn test_discovery_table() {
        let report = DiscoveryReport {
            total_found: 2,
            after_metric_filter: 2,
            after_date_filter: 2,
            videos: vec![video(Platform::YouTube, 1_500_000, "a\nlong caption")],
        };
        let table = render_discovery(&report, OutputFormat::Table).unwrap();
        assert!(table.starts_with("#  Platform"));
        assert!(table.contains("1.5M"));
        assert!(table.contains("@maker"));
        assert!(table.contains("a long caption"));
    }

    #[test]
    fn test_load_discovery_export() {
        let dir = tempfile::tempdir().unwrap();
        let report = DiscoveryReport {
            total_found: 1,
            after_metric_filter: 1,
            after_date_filter: 1,
            videos: vec![video(Platform::Instagram, 10, "x")],
        };

        let report_path = dir.path().join("report.json");
        let content = render_discovery(&report, OutputFormat::Json).unwrap();
        save_to_file(&content, &report_path).unwrap();
        assert_eq!(load_discovery_export(&report_path).unwrap(), report.videos);

        let array_path = dir.path().join("videos.json");
        save_to_file(&serde_json::to_string(&report.videos).unwrap(), &array_path).unwrap();
        assert_eq!(load_discovery_export(&array_path).unwrap(), report.videos);

        let bad_path = dir.path().join("bad.json");
        save_to_file("{\"items\": []}", &bad_path).unwrap();
        assert!(load_discovery_export(&bad_path).is_err());
    }
}
