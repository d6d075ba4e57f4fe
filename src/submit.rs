use anyhow::{bail, Context, Result};
use log::info;

use crate::model::wobject::{Status, Wobject, WobjType, CREATE_PREFIX};
use crate::remote::{PatchOp, RemoteService};

/// One field-patch call against the remote service.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRequest {
    Create {
        /// The `CreatePlease:` id the request was built from.
        source_id: String,
        item_type: WobjType,
        ops: Vec<PatchOp>,
    },
    Update {
        id: String,
        ops: Vec<PatchOp>,
    },
}

impl SubmitRequest {
    pub fn id(&self) -> &str {
        match self {
            SubmitRequest::Create { source_id, .. } => source_id,
            SubmitRequest::Update { id, .. } => id,
        }
    }
}

/// Turn the changed set into ordered patch requests: items used as parents
/// first, leaves second, so a created parent exists before its children
/// refer to it.
pub fn build_requests(
    changed: &[Wobject],
    area_path: &str,
    iteration_path: &str,
) -> Result<Vec<SubmitRequest>> {
    if area_path.is_empty() {
        bail!("area_path is empty in configuration");
    }

    let mut requests = Vec::new();
    let passes = [
        |w: &&Wobject| !w.children_ids.is_empty(),
        |w: &&Wobject| w.children_ids.is_empty(),
    ];
    for pass in passes {
        for wobject in changed.iter().filter(pass) {
            if wobject.is_placeholder() {
                continue;
            }
            requests.push(build_request(wobject, area_path, iteration_path)?);
        }
    }
    Ok(requests)
}

fn build_request(
    wobject: &Wobject,
    area_path: &str,
    iteration_path: &str,
) -> Result<SubmitRequest> {
    if !wobject.is_create() && wobject.id.parse::<i64>().is_err() {
        bail!("wobject [{}] [{}] has a non-numeric id", wobject.id, wobject.title);
    }
    if !wobject.parent_id.starts_with(CREATE_PREFIX) && wobject.parent_id.parse::<i64>().is_err() {
        bail!(
            "wobject [{}] [{}] ParentID: '{}' is neither numeric nor a create marker",
            wobject.id,
            wobject.title,
            wobject.parent_id
        );
    }

    let item_type = wobject
        .item_type
        .with_context(|| format!("wobject [{}] has no type", wobject.id))?;

    let mut ops = vec![
        PatchOp::add("/fields/System.AreaPath", area_path),
        PatchOp::add("/fields/System.Title", wobject.title.clone()),
        PatchOp::add("/fields/System.Description", wobject.description.clone()),
    ];
    if let Some(priority) = guess_priority(wobject) {
        ops.push(PatchOp::add(
            "/fields/Microsoft.VSTS.Common.Priority",
            priority.to_string(),
        ));
    }
    ops.push(PatchOp::add("/fields/System.IterationPath", iteration_path));

    if wobject.is_create() {
        if !matches!(item_type, WobjType::UserStory | WobjType::Task | WobjType::Bug) {
            bail!("cannot create remote items of type {item_type}");
        }
        if let (Some(left), Some(invested)) = (wobject.left_time, wobject.invested_time) {
            ops.push(PatchOp::add(
                "/fields/Microsoft.VSTS.Scheduling.RemainingWork",
                left.to_string(),
            ));
            ops.push(PatchOp::add(
                "/fields/Microsoft.VSTS.Scheduling.CompletedWork",
                invested.to_string(),
            ));
            ops.push(PatchOp::add(
                "/fields/Microsoft.VSTS.Scheduling.OriginalEstimate",
                (left + invested).to_string(),
            ));
        }
    } else {
        if let Some(left) = wobject.left_time {
            ops.push(PatchOp::add(
                "/fields/Microsoft.VSTS.Scheduling.RemainingWork",
                left.to_string(),
            ));
        }
        if let Some(invested) = wobject.invested_time {
            ops.push(PatchOp::add(
                "/fields/Microsoft.VSTS.Scheduling.CompletedWork",
                invested.to_string(),
            ));
        }
    }
    ops.push(PatchOp::add("/fields/System.AssignedTo", wobject.worker_id.clone()));

    Ok(if wobject.is_create() {
        SubmitRequest::Create {
            source_id: wobject.id.clone(),
            item_type,
            ops,
        }
    } else {
        SubmitRequest::Update {
            id: wobject.id.clone(),
            ops,
        }
    })
}

/// Explicit priority wins; new items default to 1 when Active and 2
/// otherwise; existing items leave priority untouched.
fn guess_priority(wobject: &Wobject) -> Option<i32> {
    if let Some(priority) = wobject.priority {
        return Some(priority);
    }
    if !wobject.is_create() {
        return None;
    }
    if wobject.status == Status::Active {
        Some(1)
    } else {
        Some(2)
    }
}

/// Fire the requests in order, returning the ids that went through.
pub async fn submit_requests(
    service: &dyn RemoteService,
    requests: &[SubmitRequest],
) -> Result<Vec<String>> {
    let mut submitted = Vec::new();
    for request in requests {
        match request {
            SubmitRequest::Create { source_id, item_type, ops } => {
                info!("submitting create for '{source_id}'");
                service.create_item(*item_type, ops).await?;
            }
            SubmitRequest::Update { id, ops } => {
                info!("submitting update for '{id}'");
                service.update_item(id, ops).await?;
            }
        }
        submitted.push(request.id().to_string());
    }
    Ok(submitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::wobject::PLACEHOLDER_ID;

    fn wobj(id: &str, item_type: WobjType) -> Wobject {
        Wobject {
            id: id.to_string(),
            title: format!("title {id}"),
            description: "desc".to_string(),
            left_time: None,
            invested_time: None,
            worker_id: "horey".to_string(),
            children_ids: Vec::new(),
            parent_id: PLACEHOLDER_ID.to_string(),
            priority: None,
            status: Status::Active,
            sprint: "Sprint 7".to_string(),
            item_type: Some(item_type),
        }
    }

    fn paths(ops: &[PatchOp]) -> Vec<&str> {
        ops.iter().map(|op| op.path.as_str()).collect()
    }

    #[test]
    fn parents_are_submitted_before_leaves() {
        let mut parent = wobj("CreatePlease:NewStory", WobjType::UserStory);
        parent.children_ids = vec!["5".into()];
        let leaf = wobj("5", WobjType::Task);

        let requests = build_requests(&[leaf, parent], "area", "it\\path").unwrap();
        assert_eq!(requests.len(), 2);
        assert!(matches!(&requests[0], SubmitRequest::Create { source_id, .. }
            if source_id == "CreatePlease:NewStory"));
        assert!(matches!(&requests[1], SubmitRequest::Update { id, .. } if id == "5"));
    }

    #[test]
    fn placeholder_entries_are_skipped() {
        let placeholder = Wobject::placeholder();
        let requests = build_requests(&[placeholder], "area", "it").unwrap();
        assert!(requests.is_empty());
    }

    #[test]
    fn create_ops_follow_the_field_order() {
        let mut fresh = wobj("CreatePlease:New task", WobjType::Task);
        fresh.left_time = Some(3);
        fresh.invested_time = Some(2);

        let requests = build_requests(&[fresh], "area", "it\\path").unwrap();
        let SubmitRequest::Create { ops, .. } = &requests[0] else {
            panic!("expected a create request");
        };
        assert_eq!(
            paths(ops),
            vec![
                "/fields/System.AreaPath",
                "/fields/System.Title",
                "/fields/System.Description",
                "/fields/Microsoft.VSTS.Common.Priority",
                "/fields/System.IterationPath",
                "/fields/Microsoft.VSTS.Scheduling.RemainingWork",
                "/fields/Microsoft.VSTS.Scheduling.CompletedWork",
                "/fields/Microsoft.VSTS.Scheduling.OriginalEstimate",
                "/fields/System.AssignedTo",
            ]
        );
        let original = ops
            .iter()
            .find(|op| op.path.ends_with("OriginalEstimate"))
            .unwrap();
        assert_eq!(original.value, "5");
    }

    #[test]
    fn priority_defaulting_table() {
        let mut active_create = wobj("CreatePlease:a", WobjType::Task);
        active_create.left_time = Some(1);
        active_create.invested_time = Some(1);
        let mut new_create = active_create.clone();
        new_create.status = Status::New;
        let mut explicit = active_create.clone();
        explicit.priority = Some(4);
        let existing = wobj("5", WobjType::Task);

        assert_eq!(guess_priority(&active_create), Some(1));
        assert_eq!(guess_priority(&new_create), Some(2));
        assert_eq!(guess_priority(&explicit), Some(4));
        assert_eq!(guess_priority(&existing), None);
    }

    #[test]
    fn update_omits_unset_priority_and_times() {
        let requests = build_requests(&[wobj("5", WobjType::Task)], "area", "it").unwrap();
        let SubmitRequest::Update { ops, .. } = &requests[0] else {
            panic!("expected an update request");
        };
        assert!(!paths(ops).iter().any(|p| p.contains("Priority")));
        assert!(!paths(ops).iter().any(|p| p.contains("Scheduling")));
    }

    #[test]
    fn update_times_are_independent() {
        let mut item = wobj("5", WobjType::Task);
        item.invested_time = Some(2);
        let requests = build_requests(&[item], "area", "it").unwrap();
        let SubmitRequest::Update { ops, .. } = &requests[0] else {
            panic!("expected an update request");
        };
        assert!(paths(ops).iter().any(|p| p.ends_with("CompletedWork")));
        assert!(!paths(ops).iter().any(|p| p.ends_with("RemainingWork")));
        assert!(!paths(ops).iter().any(|p| p.ends_with("OriginalEstimate")));
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        let item = wobj("abc", WobjType::Task);
        assert!(build_requests(&[item], "area", "it").is_err());

        let mut bad_parent = wobj("5", WobjType::Task);
        bad_parent.parent_id = "not-a-number".into();
        let err = build_requests(&[bad_parent], "area", "it").unwrap_err();
        assert!(err.to_string().contains("ParentID"));
    }

    #[test]
    fn unsupported_create_type_is_rejected() {
        let item = wobj("CreatePlease:f", WobjType::Feature);
        let err = build_requests(&[item], "area", "it").unwrap_err();
        assert!(err.to_string().contains("cannot create"));
    }

    #[test]
    fn empty_area_path_is_rejected() {
        let item = wobj("5", WobjType::Task);
        assert!(build_requests(&[item], "", "it").is_err());
    }
}
