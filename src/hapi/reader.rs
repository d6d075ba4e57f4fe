use super::{HapiError, DELIM, WORKER_MARKER};
use crate::model::report::{WobjRef, WobjReport, WorkerDailyReport};
use crate::model::wobject::{Status, WobjType};

/// Parse the flat text format back into reports. Accepts any text produced
/// by [`super::write_reports`] plus conforming hand edits; everything else
/// fails with a [`HapiError`] naming the offending line.
pub fn read_reports(text: &str) -> Result<Vec<WorkerDailyReport>, HapiError> {
    let lines: Vec<&str> = text.lines().collect();
    split_worker_chunks(&lines)
        .into_iter()
        .map(|chunk| read_worker_chunk(&chunk))
        .collect()
}

/// Contiguous runs of lines, each starting at a worker-header line. The
/// header is recognized by containing the marker, not by position.
fn split_worker_chunks<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut chunks: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in lines {
        if line.contains(WORKER_MARKER) && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn read_worker_chunk(chunk: &[&str]) -> Result<WorkerDailyReport, HapiError> {
    let mut report = WorkerDailyReport::default();
    let mut aggregator: Option<Status> = None;

    for raw in chunk {
        let line = raw.trim();
        if let Some(pos) = line.find(WORKER_MARKER) {
            report.worker_id = line[pos + WORKER_MARKER.len()..].trim().to_string();
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if let Some(status) = section_header(line) {
            aggregator = Some(status);
            continue;
        }
        let status = aggregator.ok_or_else(|| HapiError::UnknownAggregator {
            line: line.to_string(),
        })?;
        report.group_mut(status).push(read_row(line)?);
    }

    Ok(report)
}

fn section_header(line: &str) -> Option<Status> {
    Status::ALL
        .into_iter()
        .find(|status| line == format!(">{}:", status.header_name()))
}

fn read_row(line: &str) -> Result<WobjReport, HapiError> {
    let found = line.matches(DELIM).count();
    if found != 2 {
        return Err(HapiError::DelimiterCount {
            found,
            line: line.to_string(),
        });
    }

    let parts: Vec<&str> = line.split(DELIM).collect();

    let parent_text = parts[0].trim();
    if !parent_text.starts_with('[') || !parent_text.ends_with(']') {
        return Err(HapiError::ParentFormat {
            text: parent_text.to_string(),
        });
    }
    let parent = read_ref(&parent_text[1..parent_text.len() - 1])?;

    let child_text = parts[1].trim();
    let child_body = child_text
        .strip_prefix("->")
        .ok_or_else(|| HapiError::ChildFormat {
            text: child_text.to_string(),
        })?;
    let child = read_ref(child_body)?;

    let actions_text = parts[2].trim_start();
    let actions_body = actions_text
        .strip_prefix("Actions:")
        .ok_or_else(|| HapiError::ActionsFormat {
            text: actions_text.to_string(),
        })?;
    let (left_time, invested_time, comment) = read_actions(actions_body.trim())?;

    Ok(WobjReport {
        parent,
        child,
        comment,
        invested_time,
        left_time,
    })
}

/// `<Type> [<id>] #<title words...>`, or the literal `-1 #-1` placeholder.
fn read_ref(text: &str) -> Result<WobjRef, HapiError> {
    let text = text.trim();
    if text == "-1 #-1" {
        return Ok(WobjRef::placeholder());
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(HapiError::TooFewTokens {
            text: text.to_string(),
        });
    }

    let type_token = tokens[0];
    if WobjType::parse(type_token).is_none() {
        return Err(HapiError::UnknownType {
            token: type_token.to_string(),
            text: text.to_string(),
        });
    }

    let (id, title_first, rest) = if let Some(first) = tokens[1].strip_prefix('#') {
        ("", first, &tokens[2..])
    } else {
        let first = tokens
            .get(2)
            .and_then(|t| t.strip_prefix('#'))
            .ok_or_else(|| HapiError::MissingTitleMarker {
                text: text.to_string(),
            })?;
        (tokens[1], first, &tokens[3..])
    };

    let mut title_tokens = vec![title_first];
    title_tokens.extend_from_slice(rest);
    Ok(WobjRef::new(type_token, id, &title_tokens.join(" ")))
}

/// Comma-separated suffix: optional numeric left time, optional `+`-marked
/// invested time, free-text remainder. Absent segments decode to `None` and
/// the empty comment, never to zero.
fn read_actions(text: &str) -> Result<(Option<i32>, Option<i32>, String), HapiError> {
    if text.is_empty() {
        return Ok((None, None, String::new()));
    }

    let mut parts: Vec<&str> = text.split(',').collect();

    let mut left_time = None;
    let first = parts[0].trim();
    if first.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        let n = first.parse().map_err(|_| HapiError::BadTime {
            field: "left time",
            token: first.to_string(),
            text: text.to_string(),
        })?;
        left_time = Some(n);
        parts.remove(0);
    }

    let mut invested_time = None;
    if let Some(first) = parts.first().map(|p| p.trim()) {
        if let Some(number) = first.strip_prefix('+') {
            let n = number.parse().map_err(|_| HapiError::BadTime {
                field: "invested time",
                token: first.to_string(),
                text: text.to_string(),
            })?;
            invested_time = Some(n);
            parts.remove(0);
        }
    }

    let comment = parts.join(",").trim().to_string();
    Ok((left_time, invested_time, comment))
}
