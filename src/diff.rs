use anyhow::{bail, Result};
use std::collections::HashMap;
use thiserror::Error;

use crate::model::report::{WobjRef, WorkerDailyReport};
use crate::model::wobject::{Status, Wobject, WobjType, CREATE_PREFIX, PLACEHOLDER_ID};

/// Every violation found in one pass, reported together so the user can fix
/// the input file once.
#[derive(Debug, Error)]
#[error("input validation errors:\n{}", violations.join("\n"))]
pub struct ValidationErrors {
    pub violations: Vec<String>,
}

/// Rebuild the id-keyed entity set from parsed reports. Rows referencing a
/// parent register themselves as its children; id-less refs get a
/// `CreatePlease:<title>` id, parents included.
pub fn wobjects_from_reports(
    reports: &[WorkerDailyReport],
    sprint: &str,
) -> Result<HashMap<String, Wobject>> {
    let mut wobjects: HashMap<String, Wobject> = HashMap::new();

    for report in reports {
        for status in Status::ALL {
            for row in report.group(status) {
                add_row(&mut wobjects, &report.worker_id, sprint, status, row)?;
            }
        }
    }

    Ok(wobjects)
}

fn add_row(
    wobjects: &mut HashMap<String, Wobject>,
    worker_id: &str,
    sprint: &str,
    status: Status,
    row: &crate::model::report::WobjReport,
) -> Result<()> {
    let parent_key = canonical_id(&row.parent);

    if parent_key != PLACEHOLDER_ID {
        let child_key = canonical_id(&row.child);
        let parent = wobjects
            .entry(parent_key.clone())
            .or_insert(from_ref(&row.parent, parent_key.clone(), worker_id, sprint, status)?);
        parent.children_ids.push(child_key);
    }

    let child_key = canonical_id(&row.child);
    if let Some(existing) = wobjects.get(&child_key) {
        if existing.is_placeholder() {
            return Ok(());
        }
        bail!(
            "reported child wobject ID '{}' already appeared in a report with title '{}'",
            existing.id,
            existing.title
        );
    }

    let mut child = from_ref(&row.child, child_key.clone(), worker_id, sprint, status)?;
    child.description = row.comment.clone();
    child.invested_time = row.invested_time;
    child.left_time = row.left_time;
    child.parent_id = parent_key;
    wobjects.insert(child_key, child);
    Ok(())
}

/// Report refs with no id denote brand-new items.
fn canonical_id(wref: &WobjRef) -> String {
    if wref.id.is_empty() {
        format!("{CREATE_PREFIX}{}", wref.title)
    } else {
        wref.id.clone()
    }
}

fn from_ref(
    wref: &WobjRef,
    id: String,
    worker_id: &str,
    sprint: &str,
    status: Status,
) -> Result<Wobject> {
    let item_type = if wref.is_placeholder() {
        None
    } else {
        match WobjType::parse(&wref.item_type) {
            Some(t) => Some(t),
            None => bail!("unsupported work item type '{}' for '{}'", wref.item_type, wref.title),
        }
    };
    Ok(Wobject {
        id,
        title: wref.title.clone(),
        description: String::new(),
        left_time: None,
        invested_time: None,
        worker_id: worker_id.to_string(),
        children_ids: Vec::new(),
        parent_id: PLACEHOLDER_ID.to_string(),
        priority: None,
        status,
        sprint: sprint.to_string(),
        item_type,
    })
}

/// Strip the stray spaces hand editing leaves behind.
pub fn clean_input(wobjects: &mut HashMap<String, Wobject>) {
    for wobject in wobjects.values_mut() {
        wobject.title = wobject.title.trim_matches(' ').to_string();
        wobject.worker_id = wobject.worker_id.trim_matches(' ').to_string();
        wobject.description = wobject.description.trim_matches(' ').to_string();
    }
}

/// Check the user's edited input against the base snapshot, accumulating
/// every violation before failing.
pub fn validate(
    base: &HashMap<String, Wobject>,
    input: &HashMap<String, Wobject>,
) -> Result<(), ValidationErrors> {
    let mut violations = Vec::new();

    let mut wobjects: Vec<&Wobject> = input.values().collect();
    wobjects.sort_by(|a, b| a.id.cmp(&b.id));

    for wobject in wobjects {
        if wobject.title.contains(['\t', '\r', '\n']) {
            violations.push(format!(
                "wobject title '{}' contains one of invalid characters: [\\t, \\r, \\n]",
                wobject.title
            ));
        }
        if wobject.worker_id.contains(['\t', ' ', '\r', '\n']) {
            violations.push(format!(
                "wobject WorkerID '{}' contains one of invalid characters: [\\t, \\s, \\r, \\n]",
                wobject.worker_id
            ));
        }
        if wobject.id.is_empty() {
            violations.push(format!(
                "wobject Id is empty for '{}'. Expected replacement with CreatePlease:<Title>",
                wobject.title
            ));
            continue;
        }
        if !wobject.is_create() && !base.contains_key(&wobject.id) {
            violations.push(format!(
                "wobject Id '{}' from input does not exist in base file",
                wobject.id
            ));
        }
        if wobject.is_placeholder() {
            if wobject.children_ids.is_empty() {
                violations.push(format!(
                    "child wobject is -1 in input. You forgot to fill it: '{}'",
                    wobject.title
                ));
            }
            continue;
        }
        violations.extend(validate_leaf(wobject));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { violations })
    }
}

fn validate_leaf(wobject: &Wobject) -> Vec<String> {
    let mut violations = Vec::new();
    if !wobject.children_ids.is_empty() {
        return violations;
    }

    let leaf_type = matches!(wobject.item_type, Some(WobjType::Task) | Some(WobjType::Bug));
    if !leaf_type {
        violations.push(format!(
            "[{}][{}] - unsupported leaf type {}. Use one of ['Task', 'Bug']",
            wobject.id,
            wobject.title,
            wobject
                .item_type
                .map(|t| t.as_str())
                .unwrap_or(PLACEHOLDER_ID)
        ));
    }

    if wobject.is_create() {
        if wobject.left_time.is_none() {
            violations.push(format!(
                "[{}][{}] - must provide LeftTime for a new item",
                wobject.id, wobject.title
            ));
        }
        if wobject.invested_time.is_none() {
            violations.push(format!(
                "[{}][{}] - must provide InvestedTime for a new item",
                wobject.id, wobject.title
            ));
        }
    }

    if wobject.left_time == Some(0) && wobject.status != Status::Closed {
        violations.push(format!(
            "[{}][{}] - LeftTime is 0 but Status is {}, expected Closed",
            wobject.id, wobject.title, wobject.status
        ));
    }

    violations
}

/// The changed/new subset of `input`. Only description, times and status
/// count as changes; `changed(base, base)` is empty.
pub fn changed(
    base: &HashMap<String, Wobject>,
    input: &HashMap<String, Wobject>,
) -> Result<Vec<Wobject>> {
    let mut result = Vec::new();

    let mut wobjects: Vec<&Wobject> = input.values().collect();
    wobjects.sort_by(|a, b| a.id.cmp(&b.id));

    for wobject in wobjects {
        if wobject.is_placeholder() {
            continue;
        }
        if wobject.id.is_empty() || wobject.is_create() {
            result.push(wobject.clone());
            continue;
        }
        let Some(base_wobject) = base.get(&wobject.id) else {
            bail!("input wobject ID '{}' does not exist in base snapshot", wobject.id);
        };
        if wobject.description != base_wobject.description
            || wobject.invested_time != base_wobject.invested_time
            || wobject.left_time != base_wobject.left_time
            || wobject.status != base_wobject.status
        {
            result.push(wobject.clone());
        }
    }

    Ok(result)
}
