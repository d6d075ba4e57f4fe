use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel id for "no parent" / the synthetic placeholder node.
pub const PLACEHOLDER_ID: &str = "-1";

/// Id prefix marking an item that does not exist remotely yet.
pub const CREATE_PREFIX: &str = "CreatePlease:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    New,
    Active,
    Blocked,
    Closed,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::New, Status::Active, Status::Blocked, Status::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "New",
            Status::Active => "Active",
            Status::Blocked => "Blocked",
            Status::Closed => "Closed",
        }
    }

    /// Section header spelling in the report text format.
    pub fn header_name(&self) -> &'static str {
        match self {
            Status::New => "NEW",
            Status::Active => "ACTIVE",
            Status::Blocked => "BLOCKED",
            Status::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WobjType {
    UserStory,
    Task,
    Bug,
    Feature,
    DevOpsSupport,
    EscapedBug,
}

impl WobjType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WobjType::UserStory => "UserStory",
            WobjType::Task => "Task",
            WobjType::Bug => "Bug",
            WobjType::Feature => "Feature",
            WobjType::DevOpsSupport => "DevOpsSupport",
            WobjType::EscapedBug => "EscapedBug",
        }
    }

    /// Remote display name, e.g. `User Story` for the create-item URL.
    pub fn remote_name(&self) -> &'static str {
        match self {
            WobjType::UserStory => "User Story",
            WobjType::DevOpsSupport => "DevOps Support",
            WobjType::EscapedBug => "Escaped Bug",
            other => other.as_str(),
        }
    }

    pub fn parse(s: &str) -> Option<WobjType> {
        match s {
            "UserStory" => Some(WobjType::UserStory),
            "Task" => Some(WobjType::Task),
            "Bug" => Some(WobjType::Bug),
            "Feature" => Some(WobjType::Feature),
            "DevOpsSupport" => Some(WobjType::DevOpsSupport),
            "EscapedBug" => Some(WobjType::EscapedBug),
            _ => None,
        }
    }
}

impl fmt::Display for WobjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized work item. Times and priority use `None` for "unspecified";
/// the literal `-1` appears only in serialized files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wobject {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "LeftTime", with = "sentinel_int", default)]
    pub left_time: Option<i32>,
    #[serde(rename = "InvestedTime", with = "sentinel_int", default)]
    pub invested_time: Option<i32>,
    #[serde(rename = "WorkerID")]
    pub worker_id: String,
    #[serde(rename = "ChildrenIDs", default)]
    pub children_ids: Vec<String>,
    #[serde(rename = "ParentID", with = "sentinel_id", default = "placeholder_id")]
    pub parent_id: String,
    #[serde(rename = "Priority", with = "sentinel_int", default)]
    pub priority: Option<i32>,
    #[serde(rename = "Status")]
    pub status: Status,
    #[serde(rename = "Sprint", default)]
    pub sprint: String,
    #[serde(rename = "Type", with = "type_str", default)]
    pub item_type: Option<WobjType>,
}

impl Wobject {
    /// The synthetic `-1` root every relevance-filtered set carries.
    pub fn placeholder() -> Wobject {
        Wobject {
            id: PLACEHOLDER_ID.to_string(),
            title: PLACEHOLDER_ID.to_string(),
            description: PLACEHOLDER_ID.to_string(),
            left_time: None,
            invested_time: None,
            worker_id: String::new(),
            children_ids: Vec::new(),
            parent_id: PLACEHOLDER_ID.to_string(),
            priority: None,
            status: Status::New,
            sprint: String::new(),
            item_type: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id == PLACEHOLDER_ID
    }

    pub fn is_create(&self) -> bool {
        self.id.starts_with(CREATE_PREFIX)
    }

    pub fn has_parent(&self) -> bool {
        self.parent_id != PLACEHOLDER_ID
    }
}

fn placeholder_id() -> String {
    PLACEHOLDER_ID.to_string()
}

/// `-1` on disk, `None` in memory.
mod sentinel_int {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<i32>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_i32(value.unwrap_or(-1))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i32>, D::Error> {
        let n = i32::deserialize(de)?;
        Ok(if n == -1 { None } else { Some(n) })
    }
}

/// Empty string and `-1` both normalize to the `-1` sentinel.
mod sentinel_id {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &str, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        let s = String::deserialize(de)?;
        if s.is_empty() {
            Ok(super::PLACEHOLDER_ID.to_string())
        } else {
            Ok(s)
        }
    }
}

/// Placeholder entries have no type; serialized as `-1`.
mod type_str {
    use super::WobjType;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<WobjType>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(value.map(|t| t.as_str()).unwrap_or("-1"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<WobjType>, D::Error> {
        let s = String::deserialize(de)?;
        if s.is_empty() || s == "-1" {
            return Ok(None);
        }
        WobjType::parse(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unknown work item type '{s}'")))
    }
}
