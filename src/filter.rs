use anyhow::{bail, Result};
use log::{debug, info};
use std::collections::HashMap;

use crate::model::report::{WobjRef, WobjReport, WorkerDailyReport};
use crate::model::wobject::{Wobject, WobjType, PLACEHOLDER_ID};

/// Select one worker's items for one sprint, plus each item's direct parent
/// for context, plus the single `-1` placeholder root. Returns a fresh map;
/// the input is never mutated.
pub fn filter_relevant(
    wobjects: &HashMap<String, Wobject>,
    worker_id: &str,
    sprint: &str,
) -> HashMap<String, Wobject> {
    debug!("filtering {} work objects", wobjects.len());
    let mut relevant: HashMap<String, Wobject> = HashMap::new();
    relevant.insert(PLACEHOLDER_ID.to_string(), Wobject::placeholder());

    for wobject in wobjects.values() {
        if wobject.worker_id != worker_id || wobject.sprint != sprint {
            continue;
        }
        relevant
            .entry(wobject.id.clone())
            .or_insert_with(|| wobject.clone());

        // Parents come along one level only, for report context.
        if !relevant.contains_key(&wobject.parent_id) {
            if let Some(parent) = wobjects.get(&wobject.parent_id) {
                relevant.insert(parent.id.clone(), parent.clone());
            }
        }
    }

    info!("{} of {} work objects are relevant", relevant.len(), wobjects.len());
    relevant
}

/// Flatten the relevant set into (parent, leaf-child) rows grouped by
/// status. Items with children appear only on the parent side; childless
/// non-Task/Bug items become the parent of a synthetic `-1` child.
pub fn generate_report(
    relevant: &HashMap<String, Wobject>,
    worker_id: &str,
) -> Result<WorkerDailyReport> {
    let mut report = WorkerDailyReport::new(worker_id);

    let mut leaves: Vec<&Wobject> = relevant
        .values()
        .filter(|wobj| !wobj.is_placeholder() && wobj.children_ids.is_empty())
        .collect();
    // Stable row order keeps base and input textually comparable by eye.
    leaves.sort_by_key(|wobj| (wobj.id.parse::<i64>().unwrap_or(i64::MAX), wobj.id.clone()));

    for wobject in leaves {
        let row = flatten_pair(wobject, relevant);
        report.group_mut(wobject.status).push(row);
    }

    if report.new.is_empty() {
        bail!("new work objects are empty; the extraction looks broken");
    }
    Ok(report)
}

fn flatten_pair(wobject: &Wobject, relevant: &HashMap<String, Wobject>) -> WobjReport {
    let is_leaf_type = matches!(wobject.item_type, Some(WobjType::Task) | Some(WobjType::Bug));
    if is_leaf_type {
        let parent = relevant
            .get(&wobject.parent_id)
            .map(WobjRef::from_wobject)
            .unwrap_or_else(WobjRef::placeholder);
        WobjReport::pair(parent, WobjRef::from_wobject(wobject))
    } else {
        WobjReport::pair(WobjRef::from_wobject(wobject), WobjRef::placeholder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::wobject::Status;

    fn wobj(id: &str, item_type: WobjType, status: Status, parent_id: &str) -> Wobject {
        Wobject {
            id: id.to_string(),
            title: format!("title {id}"),
            description: String::new(),
            left_time: None,
            invested_time: None,
            worker_id: "horey".to_string(),
            children_ids: Vec::new(),
            parent_id: parent_id.to_string(),
            priority: None,
            status,
            sprint: "Sprint 7".to_string(),
            item_type: Some(item_type),
        }
    }

    fn as_map(wobjects: Vec<Wobject>) -> HashMap<String, Wobject> {
        wobjects.into_iter().map(|w| (w.id.clone(), w)).collect()
    }

    #[test]
    fn exactly_one_placeholder_in_output() {
        let all = as_map(vec![wobj("1", WobjType::Task, Status::New, "-1")]);
        let relevant = filter_relevant(&all, "horey", "Sprint 7");
        let placeholders = relevant.values().filter(|w| w.is_placeholder()).count();
        assert_eq!(placeholders, 1);
    }

    #[test]
    fn other_workers_and_sprints_are_excluded() {
        let mut other_worker = wobj("2", WobjType::Task, Status::New, "-1");
        other_worker.worker_id = "alice".into();
        let mut other_sprint = wobj("3", WobjType::Task, Status::New, "-1");
        other_sprint.sprint = "Sprint 8".into();
        let all = as_map(vec![
            wobj("1", WobjType::Task, Status::New, "-1"),
            other_worker,
            other_sprint,
        ]);

        let relevant = filter_relevant(&all, "horey", "Sprint 7");
        assert!(relevant.contains_key("1"));
        assert!(!relevant.contains_key("2"));
        assert!(!relevant.contains_key("3"));
    }

    #[test]
    fn parent_is_pulled_in_one_level_only() {
        let mut story = wobj("2", WobjType::UserStory, Status::Active, "9");
        story.worker_id = "alice".into(); // parent owned by someone else still comes along
        let mut feature = wobj("9", WobjType::Feature, Status::Active, "-1");
        feature.worker_id = "alice".into();
        let all = as_map(vec![
            wobj("1", WobjType::Task, Status::New, "2"),
            story,
            feature,
        ]);

        let relevant = filter_relevant(&all, "horey", "Sprint 7");
        assert!(relevant.contains_key("2"));
        assert!(!relevant.contains_key("9"), "grandparent must stay out");
    }

    #[test]
    fn task_under_story_renders_as_pair() {
        let mut story = wobj("2", WobjType::UserStory, Status::New, "-1");
        story.title = "Story".into();
        story.children_ids = vec!["1".into()];
        let mut task = wobj("1", WobjType::Task, Status::New, "2");
        task.title = "T1".into();
        let relevant_input = as_map(vec![story, task, Wobject::placeholder()]);

        let report = generate_report(&relevant_input, "horey").unwrap();
        assert_eq!(report.new.len(), 1);
        assert_eq!(report.new[0].parent, WobjRef::new("UserStory", "2", "Story"));
        assert_eq!(report.new[0].child, WobjRef::new("Task", "1", "T1"));
    }

    #[test]
    fn parentless_task_gets_placeholder_parent() {
        let relevant = as_map(vec![
            wobj("1", WobjType::Task, Status::New, "-1"),
            Wobject::placeholder(),
        ]);
        let report = generate_report(&relevant, "horey").unwrap();
        assert!(report.new[0].parent.is_placeholder());
        assert_eq!(report.new[0].child.id, "1");
    }

    #[test]
    fn childless_story_becomes_the_parent_side() {
        let relevant = as_map(vec![
            wobj("1", WobjType::Task, Status::New, "-1"),
            wobj("2", WobjType::UserStory, Status::Active, "-1"),
            Wobject::placeholder(),
        ]);
        let report = generate_report(&relevant, "horey").unwrap();
        assert_eq!(report.active.len(), 1);
        assert_eq!(report.active[0].parent.id, "2");
        assert!(report.active[0].child.is_placeholder());
    }

    #[test]
    fn items_with_children_are_never_leaf_rows() {
        let mut story = wobj("2", WobjType::UserStory, Status::New, "-1");
        story.children_ids = vec!["1".into()];
        let relevant = as_map(vec![
            story,
            wobj("1", WobjType::Task, Status::New, "2"),
            Wobject::placeholder(),
        ]);
        let report = generate_report(&relevant, "horey").unwrap();
        let child_ids: Vec<&str> = report.new.iter().map(|r| r.child.id.as_str()).collect();
        assert_eq!(child_ids, vec!["1"]);
    }

    #[test]
    fn empty_new_group_is_fatal() {
        let relevant = as_map(vec![
            wobj("1", WobjType::Task, Status::Closed, "-1"),
            Wobject::placeholder(),
        ]);
        assert!(generate_report(&relevant, "horey").is_err());
    }
}
