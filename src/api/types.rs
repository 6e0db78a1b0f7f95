//! Payloads exchanged with the investigation backend and the identity provider.
//!
//! The backend owns these schemas. Fields default when absent and a few
//! display fields accept either strings or numbers, so that a backend change
//! in representation does not break listing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::actions::Annotated;
use crate::table::{Record, RowId};

/// Accept a string, number, bool or null and keep its display form.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Format unix seconds as "Weekday, DD Month, YYYY".
pub fn format_unix_date(seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|dt| dt.format("%A, %d %B, %Y").to_string())
        .unwrap_or_default()
}

// ============================================================================
// Messages
// ============================================================================

/// An email message extracted from the evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Message {
    pub uuid: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub cc: String,
    #[serde(default)]
    pub bcc: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub received: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub size: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub bookmark: bool,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub headers: String,
    /// `None` when the backend sends `null`.
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

impl Message {
    /// Badge text for the attachments tab: "(0)" when absent.
    pub fn attachment_badge(&self) -> String {
        format!("({})", self.attachments.as_ref().map_or(0, Vec::len))
    }
}

impl Record for Message {
    fn id(&self) -> RowId {
        self.uuid.clone()
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "subject" => self.subject.clone(),
            "from" => self.from.clone(),
            "to" => self.to.clone(),
            "cc" => self.cc.clone(),
            "bcc" => self.bcc.clone(),
            "received" => self.received.clone(),
            "size" => self.size.clone(),
            "tag" => self.tag.clone().unwrap_or_default(),
            "bookmark" => {
                if self.bookmark {
                    "Bookmarked".to_string()
                } else {
                    String::new()
                }
            }
            _ => String::new(),
        }
    }
}

impl Annotated for Message {
    fn bookmarked(&self) -> bool {
        self.bookmark
    }

    fn set_bookmarked(&mut self, bookmarked: bool) {
        self.bookmark = bookmarked;
    }

    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn set_tag(&mut self, tag: Option<String>) {
        self.tag = tag;
    }
}

/// A message attachment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Attachment {
    #[serde(default, alias = "filename", alias = "file_name")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub size: String,
    #[serde(default, alias = "content_type", alias = "mime_type")]
    pub mime: String,
    /// Fields this client does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Attachment {
    /// One-line summary for the attachments tab.
    pub fn summary(&self) -> String {
        let name = if self.name.is_empty() {
            "(unnamed)"
        } else {
            self.name.as_str()
        };
        let mut parts = vec![name.to_string()];
        if !self.mime.is_empty() {
            parts.push(self.mime.clone());
        }
        if !self.size.is_empty() {
            parts.push(format!("{} bytes", self.size));
        }
        parts.join("  ")
    }
}

// ============================================================================
// Projects and evidence
// ============================================================================

/// An investigation project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Project {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    /// Unix seconds.
    #[serde(default)]
    pub creation_date: i64,
}

impl Record for Project {
    fn id(&self) -> RowId {
        self.uuid.clone()
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "name" => self.name.clone(),
            "creation_date" => format_unix_date(self.creation_date),
            _ => String::new(),
        }
    }
}

/// A node of the extracted evidence filesystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TreeNode {
    #[serde(default)]
    pub label: String,
    /// Node UUID used by tree-scoped searches.
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

// ============================================================================
// Contact network
// ============================================================================

/// The contact network of the active project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NetworkGraph {
    #[serde(default)]
    pub nodes: Option<Vec<NetworkNode>>,
    #[serde(default)]
    pub links: Option<Vec<NetworkLink>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_sent_message_data: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_sent_message_date: String,
}

/// A contact in the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NetworkNode {
    pub id: String,
    #[serde(default)]
    pub size: f64,
}

/// A sent-message relation between two contacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NetworkLink {
    pub source: String,
    pub target: String,
}

/// A network node flattened for the contacts table.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub address: String,
    pub size: f64,
    pub links: usize,
}

impl Record for Contact {
    fn id(&self) -> RowId {
        self.address.clone()
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "address" => self.address.clone(),
            "size" => format!("{}", self.size),
            "links" => self.links.to_string(),
            _ => String::new(),
        }
    }
}

impl NetworkGraph {
    /// Whether the backend found no qualifying contacts.
    pub fn is_empty(&self) -> bool {
        self.nodes.as_ref().map_or(true, Vec::is_empty)
    }

    /// Contacts with their number of distinct neighbours.
    pub fn contacts(&self) -> Vec<Contact> {
        self.nodes
            .iter()
            .flatten()
            .map(|node| Contact {
                address: node.id.clone(),
                size: node.size,
                links: self.neighbors(&node.id).len(),
            })
            .collect()
    }

    /// Distinct contacts linked to `id` in either direction, sorted.
    pub fn neighbors(&self, id: &str) -> Vec<String> {
        let mut neighbors: Vec<String> = self
            .links
            .iter()
            .flatten()
            .filter_map(|link| {
                if link.source == id {
                    Some(link.target.clone())
                } else if link.target == id {
                    Some(link.source.clone())
                } else {
                    None
                }
            })
            .filter(|other| other != id)
            .collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }

    /// Human readable form of a timestamp field.
    pub fn describe_timestamp(raw: &str) -> String {
        match raw.trim().parse::<i64>() {
            Ok(seconds) => format_unix_date(seconds),
            Err(_) => raw.to_string(),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /bookmarks`.
#[derive(Debug, Clone, Serialize)]
pub struct BookmarksRequest {
    pub bookmarks: Vec<String>,
}

/// Body of `POST /tag`.
#[derive(Debug, Clone, Serialize)]
pub struct TagRequest {
    pub messages: Vec<String>,
    pub tag: String,
}

/// Body of `POST /search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SearchRequest {
    TreeNodes {
        #[serde(rename = "treeNodeUUIDs")]
        tree_node_uuids: Vec<String>,
    },
    Query {
        query: String,
    },
}

/// Body of `POST /export`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest {
    pub extensions: String,
}

/// Body of `POST /projects`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

/// Body of `POST /setProject`.
#[derive(Debug, Clone, Serialize)]
pub struct SetProjectRequest {
    pub uuid: String,
}

// ============================================================================
// Identity provider
// ============================================================================

/// An identity-provider session as returned by `whoami`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub authenticator_assurance_level: Option<String>,
    pub identity: Identity,
}

/// The identity behind a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub traits: serde_json::Value,
}

impl Session {
    /// The identity's email trait, or its id when there is none.
    pub fn display_name(&self) -> String {
        self.identity
            .traits
            .get("email")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.identity.id.clone())
    }
}
