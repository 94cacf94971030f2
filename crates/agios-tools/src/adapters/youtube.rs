use url::Url;

use crate::error::{Result, ToolError};

const VIDEO_HOSTS: [&str; 4] = ["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"];

/// Parse and check that `raw` points at a YouTube video
pub fn validate_video_url(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| ToolError::InvalidParameter {
        name: "video_url",
        reason: reason.to_string(),
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    let host = url.host_str().unwrap_or_default();
    if !VIDEO_HOSTS.contains(&host) {
        return Err(invalid(&format!("{host} is not a YouTube host")));
    }

    let has_video = match host {
        "youtu.be" => url.path().len() > 1,
        _ => {
            url.query_pairs().any(|(k, v)| k == "v" && !v.is_empty())
                || has_video_segment(url.path(), "/shorts/")
                || has_video_segment(url.path(), "/live/")
        }
    };
    if !has_video {
        return Err(invalid("URL does not identify a video"));
    }
    Ok(url)
}

/// `path` is `prefix` followed by a non-empty video ID
fn has_video_segment(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .and_then(|rest| rest.split('/').next())
        .is_some_and(|id| !id.is_empty())
}

/// First YouTube video URL mentioned in free text
pub fn find_video_url(text: &str) -> Option<&str> {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| matches!(c, '<' | '>' | '(' | ')' | '"' | '\'' | ',')))
        .find(|word| validate_video_url(word).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_video_urls() {
        for raw in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=abc&t=10",
            "https://www.youtube.com/shorts/abc123",
            "https://www.youtube.com/live/abc123/",
        ] {
            assert!(validate_video_url(raw).is_ok(), "{raw}");
        }
    }

    #[test]
    fn test_rejects_other_urls() {
        for raw in [
            "not a url",
            "ftp://youtube.com/watch?v=x",
            "https://vimeo.com/123",
            "https://youtube.com.evil.net/watch?v=x",
            "https://www.youtube.com/feed/trending",
            "https://youtu.be/",
            "https://www.youtube.com/shorts/",
            "https://www.youtube.com/live/",
            "https://www.youtube.com/live//abc",
        ] {
            assert!(
                matches!(validate_video_url(raw), Err(ToolError::InvalidParameter { .. })),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_find_video_url_in_text() {
        assert_eq!(
            find_video_url("summarize (https://youtu.be/xyz) please"),
            Some("https://youtu.be/xyz")
        );
        assert_eq!(find_video_url("no links here"), None);
    }
}
