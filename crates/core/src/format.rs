use crate::{
    history::HistoryEntry,
    types::{GenerationResult, Interval},
};

const HISTORY_TIMESTAMP_PREVIEW: usize = 5;

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

pub fn format_interval(interval: &Interval) -> String {
    format!(
        "[{}–{}] {:.1}s",
        format_timestamp(interval.start),
        format_timestamp(interval.end),
        interval.length()
    )
}

pub fn format_result_readable(result: &GenerationResult) -> String {
    let mut output = String::new();
    output.push_str("# Teaser ready\n\n");
    output.push_str(&format!("**Teaser:** {}\n", result.s3_url));
    output.push_str(&format!("**Duration:** {:.1} seconds\n", result.duration));
    if let Some(thumbnail) = &result.thumbnail_url {
        output.push_str(&format!("**Thumbnail:** {}\n", thumbnail));
    }
    output.push('\n');

    if result.video_s3_url.is_some() || result.audio_s3_url.is_some() {
        output.push_str("## Source files\n\n");
        if let Some(video) = &result.video_s3_url {
            output.push_str(&format!("• Video: {}\n", video));
        }
        if let Some(audio) = &result.audio_s3_url {
            output.push_str(&format!("• Audio: {}\n", audio));
        }
        output.push('\n');
    }

    if !result.timestamps.is_empty() {
        output.push_str("## Selected excerpts\n\n");
        for (i, interval) in result.timestamps.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, format_interval(interval)));
        }
        output.push('\n');
    }

    output
}

pub fn format_history_readable(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No teasers yet. Generated teasers will appear here.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!("# Teaser history ({} generated)\n\n", entries.len()));

    for entry in entries {
        output.push_str(&format!(
            "### {} ({})\n\n",
            entry.method_name(),
            entry.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!(
            "**Duration:** {:.0} seconds | **Source:** {}\n",
            entry.duration,
            entry.source().unwrap_or("N/A")
        ));
        output.push_str(&format!(
            "**Teaser:** {}\n",
            entry.teaser_file_url.as_deref().unwrap_or("Not available")
        ));

        if !entry.timestamps_used.is_empty() {
            let shown: Vec<String> = entry
                .timestamps_used
                .iter()
                .take(HISTORY_TIMESTAMP_PREVIEW)
                .map(|t| format!("{}s - {}s", t.start, t.end))
                .collect();
            output.push_str(&format!("**Timestamps:** {}", shown.join(", ")));
            let hidden = entry
                .timestamps_used
                .len()
                .saturating_sub(HISTORY_TIMESTAMP_PREVIEW);
            if hidden > 0 {
                output.push_str(&format!(" (+{} more)", hidden));
            }
            output.push('\n');
        }
        output.push('\n');
    }

    output
}
