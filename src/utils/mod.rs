use anyhow::Result;
use url::Url;

/// Check that `url` parses as an HTTP(S) URL; the input itself is never rewritten
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url.trim())
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(())
}

/// Split pasted text into URLs, one per line.
///
/// Lines are trimmed; blank lines and `#` comment lines are dropped.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Parse a 1-based selection like `1,3-5` into sorted, de-duplicated 0-based indices
pub fn parse_index_list(selection: &str, len: usize) -> Result<Vec<usize>> {
    let mut indices = Vec::new();

    for part in selection.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (parse_position(a)?, parse_position(b)?),
            None => {
                let n = parse_position(part)?;
                (n, n)
            }
        };

        if start > end {
            anyhow::bail!("Invalid range: {}", part);
        }
        if end > len {
            anyhow::bail!("Selection {} is out of range (1-{})", part, len);
        }

        indices.extend((start..=end).map(|n| n - 1));
    }

    if indices.is_empty() {
        anyhow::bail!("Selection is empty");
    }

    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}

fn parse_position(raw: &str) -> Result<usize> {
    let n: usize = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid selection index: {}", raw.trim()))?;
    if n == 0 {
        anyhow::bail!("Selection indices start at 1");
    }
    Ok(n)
}

/// Compact count for tables: `1.5K`, `2.3M`
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Cut `text` to `max` characters, marking the cut with an ellipsis
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let mut cut: String = text.chars().take(max).collect();
    cut.push('…');
    cut
}

/// Extract domain from URL for display purposes
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://www.tiktok.com/@a/video/1").is_ok());
        assert!(validate_url(" http://example.com ").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not-a-url").is_err());
    }

    #[test]
    fn test_parse_url_list() {
        let text = "https://a.com/1\n\n# saved from discovery\n  https://b.com/2  \r\nhttps://c.com/3";
        assert_eq!(
            parse_url_list(text),
            vec!["https://a.com/1", "https://b.com/2", "https://c.com/3"]
        );
        assert!(parse_url_list("  \n \n").is_empty());
    }

    #[test]
    fn test_parse_url_list_keeps_commas_inside_urls() {
        let text = "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=a,b\nhttps://x.com/p?tags=one,two three\n";
        assert_eq!(
            parse_url_list(text),
            vec![
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=a,b",
                "https://x.com/p?tags=one,two three"
            ]
        );
    }

    #[test]
    fn test_parse_index_list() {
        assert_eq!(parse_index_list("1,3-5", 5).unwrap(), vec![0, 2, 3, 4]);
        assert_eq!(parse_index_list("2, 2 ,1", 3).unwrap(), vec![0, 1]);
        assert!(parse_index_list("0", 3).is_err());
        assert!(parse_index_list("4", 3).is_err());
        assert!(parse_index_list("3-1", 3).is_err());
        assert!(parse_index_list("a", 3).is_err());
        assert!(parse_index_list(" , ", 3).is_err());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1500), "1.5K");
        assert_eq!(format_number(1_000_000), "1.0M");
        assert_eq!(format_number(2_340_000), "2.3M");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo…");
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://www.youtube.com/watch?v=123"), Some("youtube.com".to_string()));
        assert_eq!(extract_domain("https://instagram.com/p/abc"), Some("instagram.com".to_string()));
        assert_eq!(extract_domain("invalid-url"), None);
    }
}
