use super::{DELIM, WORKER_MARKER};
use crate::model::report::{WobjRef, WobjReport, WorkerDailyReport};
use crate::model::wobject::Status;

/// Render reports into the flat text format. Inverse of
/// [`super::read_reports`] up to whitespace.
pub fn write_reports(reports: &[WorkerDailyReport]) -> String {
    let mut out = String::new();
    for report in reports {
        // A report without an owner is nothing a human can act on.
        if report.worker_id.is_empty() {
            continue;
        }
        out.push_str(WORKER_MARKER);
        out.push(' ');
        out.push_str(&report.worker_id);
        out.push('\n');

        for status in Status::ALL {
            out.push_str(&format!(">{}:\n", status.header_name()));
            for row in report.group(status) {
                out.push_str(&write_row(row));
                out.push('\n');
            }
        }
    }
    out
}

fn write_row(row: &WobjReport) -> String {
    format!(
        "[{}] {DELIM} -> {} {DELIM} Actions: {}",
        write_ref(&row.parent),
        write_ref(&row.child),
        write_actions(row),
    )
}

fn write_ref(wref: &WobjRef) -> String {
    if wref.is_placeholder() {
        return "-1 #-1".to_string();
    }
    if wref.id.is_empty() {
        format!("{} #{}", wref.item_type, wref.title)
    } else {
        format!("{} {} #{}", wref.item_type, wref.id, wref.title)
    }
}

/// `None` times are omitted entirely; `0` is a real duration and is kept.
/// Invested time always carries its `+` marker so the reader can tell the
/// two time fields apart.
fn write_actions(row: &WobjReport) -> String {
    let mut segments: Vec<String> = Vec::new();
    if let Some(left) = row.left_time {
        segments.push(left.to_string());
    }
    if let Some(invested) = row.invested_time {
        segments.push(format!("+{invested}"));
    }
    if !row.comment.is_empty() {
        segments.push(row.comment.clone());
    }
    segments.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(left: Option<i32>, invested: Option<i32>, comment: &str) -> WobjReport {
        WobjReport {
            parent: WobjRef::new("UserStory", "2", "Story"),
            child: WobjRef::new("Task", "1", "T1"),
            comment: comment.to_string(),
            invested_time: invested,
            left_time: left,
        }
    }

    #[test]
    fn full_row_layout() {
        let line = write_row(&row(Some(3), Some(2), "wired the codec"));
        assert_eq!(
            line,
            "[UserStory 2 #Story] !!=!! -> Task 1 #T1 !!=!! Actions: 3, +2, wired the codec"
        );
    }

    #[test]
    fn sentinel_times_are_omitted() {
        let line = write_row(&row(None, None, ""));
        assert!(line.ends_with("Actions: "));
        assert!(!line.contains("-1,"));
    }

    #[test]
    fn zero_left_time_is_written() {
        let line = write_row(&row(Some(0), Some(4), ""));
        assert!(line.ends_with("Actions: 0, +4"));
    }

    #[test]
    fn bare_comment_has_no_leading_separator() {
        let line = write_row(&row(None, None, "blocked on review"));
        assert!(line.ends_with("Actions: blocked on review"));
    }

    #[test]
    fn placeholder_refs_use_the_fixed_spelling() {
        let mut r = row(None, None, "");
        r.parent = WobjRef::placeholder();
        let line = write_row(&r);
        assert!(line.starts_with("[-1 #-1] !!=!!"));
    }

    #[test]
    fn workers_without_id_are_skipped() {
        let empty = WorkerDailyReport::default();
        assert_eq!(write_reports(&[empty]), "");
    }
}
