pub mod work_item;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use futures::future::try_join_all;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::model::wobject::WobjType;
use work_item::WorkItem;

/// Ids per batch-get request; each chunk is fetched by its own future.
const CHUNK_SIZE: usize = 50;

/// One JSON-patch operation against a work item field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOp {
    pub op: &'static str,
    pub path: String,
    pub value: String,
}

impl PatchOp {
    pub fn add(path: &str, value: impl Into<String>) -> PatchOp {
        PatchOp {
            op: "add",
            path: path.to_string(),
            value: value.into(),
        }
    }
}

/// The remote work-item service as the pipeline needs it. Network detail
/// (chunking, auth, retries) stays behind this seam so tests can substitute
/// a recording mock.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Ids of every work item in the configured project area.
    async fn query_work_item_ids(&self) -> Result<Vec<i64>>;

    /// Fetch items by id, chunked; result order follows the id order.
    async fn get_work_items(&self, ids: &[i64]) -> Result<Vec<WorkItem>>;

    /// Full iteration path for a sprint display name.
    async fn iteration_path(&self, sprint: &str) -> Result<String>;

    async fn create_item(&self, item_type: WobjType, ops: &[PatchOp]) -> Result<()>;

    async fn update_item(&self, id: &str, ops: &[PatchOp]) -> Result<()>;

    async fn fetch_all(&self) -> Result<Vec<WorkItem>> {
        let ids = self.query_work_item_ids().await?;
        info!("fetched {} work item ids", ids.len());
        self.get_work_items(&ids).await
    }
}

pub struct DevOpsClient {
    base_url: String,
    project: String,
    team: String,
    area_path: String,
    auth_header: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct WiqlResponse {
    #[serde(rename = "workItems", default)]
    work_items: Vec<IdRef>,
    #[serde(rename = "workItemRelations", default)]
    work_item_relations: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct IdRef {
    id: i64,
}

#[derive(Deserialize)]
struct ValueList<T> {
    value: Vec<T>,
}

#[derive(Deserialize)]
struct Team {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct Iteration {
    name: String,
    path: String,
}

impl DevOpsClient {
    pub fn new(config: &AppConfig) -> DevOpsClient {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!(":{}", config.access_token));
        DevOpsClient {
            base_url: format!("https://dev.azure.com/{}", config.organization),
            project: config.project.clone(),
            team: config.team.clone(),
            area_path: config.area_path.clone(),
            auth_header: format!("Basic {encoded}"),
            client: reqwest::Client::new(),
        }
    }

    async fn check(&self, resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("{what}: HTTP status error: {status} {body}");
        }
        Ok(resp)
    }

    async fn get_chunk(&self, ids: &[i64]) -> Result<Vec<WorkItem>> {
        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/{}/_apis/wit/workitems?ids={}&$expand=all&api-version=7.0",
            self.base_url, self.project, id_list
        );
        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .context("work item batch request failed")?;
        let resp = self.check(resp, "get work items").await?;
        let batch: ValueList<WorkItem> = resp
            .json()
            .await
            .context("failed to parse work item batch response")?;
        debug!("fetched chunk of {} work items", batch.value.len());
        Ok(batch.value)
    }

    async fn team_id(&self) -> Result<String> {
        let url = format!("{}/_apis/teams?api-version=7.0-preview.3", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .context("teams request failed")?;
        let resp = self.check(resp, "get teams").await?;
        let teams: ValueList<Team> = resp.json().await.context("failed to parse teams response")?;
        teams
            .value
            .into_iter()
            .find(|team| team.name == self.team)
            .map(|team| team.id)
            .with_context(|| format!("no team named '{}'", self.team))
    }

    async fn patch_call(&self, url: &str, ops: &[PatchOp], what: &str, post: bool) -> Result<()> {
        let body = serde_json::to_vec(ops)?;
        let request = if post {
            self.client.post(url)
        } else {
            self.client.patch(url)
        };
        let resp = request
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json-patch+json")
            .body(body)
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;
        self.check(resp, what).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteService for DevOpsClient {
    async fn query_work_item_ids(&self) -> Result<Vec<i64>> {
        let url = format!("{}/{}/_apis/wit/wiql?api-version=7.0", self.base_url, self.project);
        let query = format!(
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = '{}' AND [System.AreaPath] = '{}'",
            self.project, self.area_path
        );
        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .context("work item id query failed")?;
        let resp = self.check(resp, "query work item ids").await?;
        let result: WiqlResponse = resp
            .json()
            .await
            .context("failed to parse work item id query response")?;
        if !result.work_item_relations.is_empty() {
            bail!(
                "work item id query returned {} unexpected relations",
                result.work_item_relations.len()
            );
        }
        Ok(result.work_items.into_iter().map(|r| r.id).collect())
    }

    async fn get_work_items(&self, ids: &[i64]) -> Result<Vec<WorkItem>> {
        let fetches = ids.chunks(CHUNK_SIZE).map(|chunk| self.get_chunk(chunk));
        let chunks = try_join_all(fetches).await?;
        Ok(chunks.into_iter().flatten().collect())
    }

    async fn iteration_path(&self, sprint: &str) -> Result<String> {
        let team_id = self.team_id().await?;
        let url = format!(
            "{}/{}/{}/_apis/work/teamsettings/iterations?api-version=7.0",
            self.base_url, self.project, team_id
        );
        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .context("iterations request failed")?;
        let resp = self.check(resp, "get iterations").await?;
        let iterations: ValueList<Iteration> = resp
            .json()
            .await
            .context("failed to parse iterations response")?;
        iterations
            .value
            .into_iter()
            .find(|iteration| iteration.name == sprint)
            .map(|iteration| iteration.path)
            .with_context(|| format!("was not able to find iteration by name: {sprint}"))
    }

    async fn create_item(&self, item_type: WobjType, ops: &[PatchOp]) -> Result<()> {
        let url = format!(
            "{}/{}/_apis/wit/workitems/${}?api-version=7.0",
            self.base_url,
            self.project,
            urlencoding::encode(item_type.remote_name())
        );
        info!("creating remote {} work item", item_type);
        self.patch_call(&url, ops, "create work item", true).await
    }

    async fn update_item(&self, id: &str, ops: &[PatchOp]) -> Result<()> {
        let url = format!(
            "{}/{}/_apis/wit/workitems/{}?api-version=7.0",
            self.base_url, self.project, id
        );
        info!("updating remote work item {id}");
        self.patch_call(&url, ops, "update work item", false).await
    }
}
