//! Microsoft Graph wire types used by the connector

use crate::error::FetchError;
use serde::{Deserialize, Serialize};

/// Offset of the single search page requested
pub const SEARCH_FROM: u32 = 0;

/// Size of the single search page requested; callers cannot raise it
pub const SEARCH_SIZE: u32 = 10;

/// Body of `POST /search/query`
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub requests: Vec<SearchRequestItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequestItem {
    pub entity_types: Vec<String>,
    pub query: SearchQueryString,
    pub from: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQueryString {
    pub query_string: String,
}

impl SearchRequest {
    /// A one-page query over drive items
    pub fn drive_items(term: impl Into<String>) -> Self {
        Self {
            requests: vec![SearchRequestItem {
                entity_types: vec!["driveItem".to_string()],
                query: SearchQueryString {
                    query_string: term.into(),
                },
                from: SEARCH_FROM,
                size: SEARCH_SIZE,
            }],
        }
    }
}

/// Response of `POST /search/query`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub value: Vec<SearchResponseItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponseItem {
    #[serde(default)]
    pub search_terms: Vec<String>,
    pub hits_containers: Option<Vec<HitsContainer>>,
}

/// A batch of hits with the provider's total count
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitsContainer {
    pub total: Option<u64>,
    #[serde(default)]
    pub more_results_available: bool,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

impl SearchResponse {
    /// Hit containers of the first (and only) query, if any were returned
    pub fn hit_containers(&self) -> &[HitsContainer] {
        self.value
            .first()
            .and_then(|item| item.hits_containers.as_deref())
            .unwrap_or(&[])
    }

    /// True when the provider reported nothing at all: no containers, or a
    /// first container whose total is present and zero
    pub fn has_no_results(&self) -> bool {
        match self.hit_containers().first() {
            None => true,
            Some(container) => container.total == Some(0),
        }
    }

    /// Every hit across containers whose resource is a drive item, in
    /// provider order
    pub fn drive_item_hits(&self) -> Vec<&SearchHit> {
        self.hit_containers()
            .iter()
            .flat_map(|container| container.hits.iter())
            .filter(|hit| hit.resource.kind == ResourceKind::DriveItem)
            .collect()
    }
}

/// One search hit
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub hit_id: Option<String>,
    pub rank: Option<u32>,
    pub summary: Option<String>,
    #[serde(default)]
    pub resource: Resource,
}

/// Known `@odata.type` tags of search hit resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "#microsoft.graph.driveItem")]
    DriveItem,
    #[serde(rename = "#microsoft.graph.listItem")]
    ListItem,
    #[serde(rename = "#microsoft.graph.list")]
    List,
    #[serde(rename = "#microsoft.graph.site")]
    Site,
    #[serde(rename = "#microsoft.graph.drive")]
    Drive,
    #[serde(rename = "#microsoft.graph.message")]
    Message,
    #[serde(rename = "#microsoft.graph.event")]
    Event,
    #[default]
    #[serde(other)]
    Unknown,
}

/// The entity a hit points at
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(rename = "@odata.type", default)]
    pub kind: ResourceKind,
    pub id: Option<String>,
    pub name: Option<String>,
    pub parent_reference: Option<ItemReference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReference {
    pub drive_id: Option<String>,
    pub id: Option<String>,
}

/// Address of a drive item: `(driveId, itemId)` plus the name from the hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveItemRef {
    pub drive_id: String,
    pub item_id: String,
    pub name: String,
}

impl SearchHit {
    /// Name used in logs and error messages
    pub fn display_name(&self) -> String {
        self.resource
            .name
            .clone()
            .or_else(|| self.resource.id.clone())
            .unwrap_or_else(|| "<unnamed item>".to_string())
    }

    /// Resolve the `(driveId, itemId)` pair needed for content retrieval
    pub fn drive_item(&self) -> Result<DriveItemRef, FetchError> {
        let name = self.display_name();
        let item_id = non_empty(self.resource.id.as_deref()).ok_or_else(|| {
            FetchError::MalformedHit {
                name: name.clone(),
                reason: "missing resource id".to_string(),
            }
        })?;
        let drive_id = non_empty(
            self.resource
                .parent_reference
                .as_ref()
                .and_then(|p| p.drive_id.as_deref()),
        )
        .ok_or_else(|| FetchError::MalformedHit {
            name: name.clone(),
            reason: "missing parentReference.driveId".to_string(),
        })?;

        Ok(DriveItemRef {
            drive_id: drive_id.to_string(),
            item_id: item_id.to_string(),
            name,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Metadata of `GET /drives/{driveId}/items/{itemId}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub size: Option<u64>,
    pub file: Option<FileFacet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    pub mime_type: Option<String>,
}

/// Graph's error envelope: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

/// Summarize an error body for inclusion in a message
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<GraphErrorBody>(body) {
        Ok(GraphErrorBody {
            error: GraphErrorDetail { code, message },
        }) => match (code, message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (Some(code), None) => code,
            (None, Some(message)) => message,
            (None, None) => body.to_string(),
        },
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
