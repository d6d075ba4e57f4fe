use log::warn;
use std::collections::HashMap;

use crate::model::wobject::{Status, Wobject, WobjType, PLACEHOLDER_ID};
use crate::remote::work_item::{FieldError, WorkItem};

/// Normalize one remote item into a [`Wobject`].
pub fn normalize(wit: &WorkItem) -> Result<Wobject, FieldError> {
    let parent_id = match wit.opt_number_field("System.Parent")? {
        Some(n) => (n.round() as i64).to_string(),
        None => PLACEHOLDER_ID.to_string(),
    };

    let priority = wit
        .opt_number_field("Microsoft.VSTS.Common.Priority")?
        .map(|n| n.round() as i32);

    let iteration_path = wit.str_field("System.IterationPath")?;
    let sprint = iteration_path
        .rsplit('\\')
        .next()
        .unwrap_or(iteration_path)
        .to_string();

    let raw_type: String = wit
        .str_field("System.WorkItemType")?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let item_type = WobjType::parse(&raw_type).ok_or(FieldError::WrongShape {
        id: wit.id,
        field: "System.WorkItemType".to_string(),
        expected: "known work item type",
    })?;

    Ok(Wobject {
        id: wit.id.to_string(),
        title: wit.str_field("System.Title")?.to_string(),
        description: String::new(),
        left_time: None,
        invested_time: None,
        worker_id: extract_worker_id(wit)?,
        children_ids: Vec::new(),
        parent_id,
        priority,
        status: extract_status(wit)?,
        sprint,
        item_type: Some(item_type),
    })
}

/// Convert a whole snapshot and link children from parent ids in one pass.
pub fn normalize_all(wits: &[WorkItem]) -> Result<HashMap<String, Wobject>, FieldError> {
    let mut wobjects = HashMap::new();
    for wit in wits {
        let wobject = normalize(wit)?;
        wobjects.insert(wobject.id.clone(), wobject);
    }
    link_children(&mut wobjects);
    Ok(wobjects)
}

/// Rebuild `children_ids` from `parent_id`. Parents outside the snapshot
/// are left unlinked.
pub fn link_children(wobjects: &mut HashMap<String, Wobject>) {
    let links: Vec<(String, String)> = wobjects
        .values()
        .filter(|wobj| wobj.has_parent())
        .map(|wobj| (wobj.parent_id.clone(), wobj.id.clone()))
        .collect();
    for (parent_id, child_id) in links {
        if let Some(parent) = wobjects.get_mut(&parent_id) {
            if !parent.children_ids.contains(&child_id) {
                parent.children_ids.push(child_id);
            }
        }
    }
}

fn extract_status(wit: &WorkItem) -> Result<Status, FieldError> {
    let state = wit.str_field("System.State")?;
    Ok(match state {
        "New" => Status::New,
        "Active" => Status::Active,
        "Blocked" => Status::Blocked,
        "Closed" | "Resolved" | "Removed" => Status::Closed,
        other => {
            warn!("work item {}: unrecognized state '{other}', using Blocked", wit.id);
            Status::Blocked
        }
    })
}

/// Local part of the assignee's unique name, falling back to the creator.
fn extract_worker_id(wit: &WorkItem) -> Result<String, FieldError> {
    let unique_name = match wit.identity_field("System.AssignedTo")? {
        Some(name) => name,
        None => wit
            .identity_field("System.CreatedBy")?
            .ok_or(FieldError::Missing {
                id: wit.id,
                field: "System.AssignedTo/System.CreatedBy".to_string(),
            })?,
    };
    Ok(unique_name.split('@').next().unwrap_or(unique_name).to_string())
}
