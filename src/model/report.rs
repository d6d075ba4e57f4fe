use super::wobject::{Status, Wobject, PLACEHOLDER_ID};

/// `(type, id, title)` triple on the parent or child side of a report row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WobjRef {
    pub item_type: String,
    pub id: String,
    pub title: String,
}

impl WobjRef {
    pub fn new(item_type: &str, id: &str, title: &str) -> WobjRef {
        WobjRef {
            item_type: item_type.to_string(),
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    /// The `-1 #-1` side of a row with no real parent or child.
    pub fn placeholder() -> WobjRef {
        WobjRef::new(PLACEHOLDER_ID, PLACEHOLDER_ID, PLACEHOLDER_ID)
    }

    pub fn from_wobject(wobj: &Wobject) -> WobjRef {
        if wobj.is_placeholder() {
            return WobjRef::placeholder();
        }
        WobjRef {
            item_type: wobj
                .item_type
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            id: wobj.id.clone(),
            title: wobj.title.clone(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id == PLACEHOLDER_ID
    }
}

/// One reportable (parent, leaf-child) pair with the user-editable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct WobjReport {
    pub parent: WobjRef,
    pub child: WobjRef,
    pub comment: String,
    pub invested_time: Option<i32>,
    pub left_time: Option<i32>,
}

impl WobjReport {
    pub fn pair(parent: WobjRef, child: WobjRef) -> WobjReport {
        WobjReport {
            parent,
            child,
            comment: String::new(),
            invested_time: None,
            left_time: None,
        }
    }
}

/// One worker's snapshot, partitioned by status. Rebuilt from scratch on
/// every generation or parse, never mutated in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerDailyReport {
    pub worker_id: String,
    pub new: Vec<WobjReport>,
    pub active: Vec<WobjReport>,
    pub blocked: Vec<WobjReport>,
    pub closed: Vec<WobjReport>,
}

impl WorkerDailyReport {
    pub fn new(worker_id: &str) -> WorkerDailyReport {
        WorkerDailyReport {
            worker_id: worker_id.to_string(),
            ..WorkerDailyReport::default()
        }
    }

    pub fn group(&self, status: Status) -> &Vec<WobjReport> {
        match status {
            Status::New => &self.new,
            Status::Active => &self.active,
            Status::Blocked => &self.blocked,
            Status::Closed => &self.closed,
        }
    }

    pub fn group_mut(&mut self, status: Status) -> &mut Vec<WobjReport> {
        match status {
            Status::New => &mut self.new,
            Status::Active => &mut self.active,
            Status::Blocked => &mut self.blocked,
            Status::Closed => &mut self.closed,
        }
    }
}
