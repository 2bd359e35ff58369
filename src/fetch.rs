use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, info};

use crate::card::{Card, CardTable, UNKNOWN_PHASE};
use crate::client::{GraphqlClient, envelope_data};
use crate::error::{Error, Result};

const ALL_CARDS_QUERY: &str = r#"
    query AllCards($pipeId: ID!, $first: Int!, $after: String) {
        allCards(pipeId: $pipeId, first: $first, after: $after) {
            edges {
                node {
                    id title created_at
                    current_phase { name }
                    labels { name }
                }
            }
            pageInfo { hasNextPage endCursor }
        }
    }
"#;

// ---------------------------------------------------------------------------
// GraphQL response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AllCardsData {
    #[serde(rename = "allCards")]
    all_cards: Option<CardConnection>,
}

#[derive(Debug, Deserialize)]
struct CardConnection {
    edges: Vec<CardEdge>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct CardEdge {
    node: CardNode,
}

#[derive(Debug, Deserialize)]
struct CardNode {
    id: Option<String>,
    title: Option<String>,
    created_at: Option<String>,
    current_phase: Option<PhaseNode>,
    labels: Option<Vec<LabelNode>>,
}

#[derive(Debug, Deserialize)]
struct PhaseNode {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LabelNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// CardFetcher
// ---------------------------------------------------------------------------

/// Pulls every card of a pipe by walking the `allCards` connection page by page.
pub struct CardFetcher {
    client: Box<dyn GraphqlClient>,
}

impl CardFetcher {
    pub fn new(client: Box<dyn GraphqlClient>) -> Self {
        Self { client }
    }

    /// Fetch all cards of `pipe_id`, requesting `page_size` cards per page.
    ///
    /// Any failure discards the pages already received: a table is only
    /// returned once the service has reported the last page.
    pub fn fetch_all(&self, pipe_id: &str, page_size: u32) -> Result<CardTable> {
        if page_size == 0 {
            return Err(Error::ConfigValidation("page_size must be > 0".to_string()));
        }

        let mut cards = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 0u32;

        loop {
            page += 1;
            let envelope = self.client.execute(
                ALL_CARDS_QUERY,
                serde_json::json!({
                    "pipeId": pipe_id,
                    "first": page_size,
                    "after": cursor,
                }),
            )?;
            let connection = parse_page(envelope_data(envelope)?)?;

            let edges = connection.edges.len();
            for edge in connection.edges {
                cards.push(normalize(edge.node)?);
            }

            let page_info = connection.page_info;
            debug!(
                page,
                edges,
                has_next = page_info.has_next_page,
                "fetched card page"
            );

            if !page_info.has_next_page {
                break;
            }
            cursor = Some(page_info.end_cursor.ok_or_else(|| {
                Error::MalformedResponse(format!(
                    "page {page} reports hasNextPage but no endCursor"
                ))
            })?);
        }

        info!(pipe_id, pages = page, cards = cards.len(), "fetched pipe cards");
        Ok(CardTable::new(cards))
    }
}

fn parse_page(data: serde_json::Value) -> Result<CardConnection> {
    let data: AllCardsData = serde_json::from_value(data)
        .map_err(|e| Error::MalformedResponse(format!("failed to parse allCards page: {e}")))?;
    data.all_cards
        .ok_or_else(|| Error::MalformedResponse("allCards is null".to_string()))
}

fn normalize(node: CardNode) -> Result<Card> {
    let id = node
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::MalformedResponse("card without id".to_string()))?;

    let raw_created = node.created_at.ok_or_else(|| {
        Error::MalformedResponse(format!("card {id} has no created_at"))
    })?;
    let created_at = DateTime::parse_from_rfc3339(&raw_created).map_err(|e| {
        Error::MalformedResponse(format!("card {id} has invalid created_at '{raw_created}': {e}"))
    })?;

    let phase = node
        .current_phase
        .and_then(|p| p.name)
        .unwrap_or_else(|| UNKNOWN_PHASE.to_string());

    // Absent or null label lists are treated as no labels.
    let labels = node
        .labels
        .unwrap_or_default()
        .into_iter()
        .map(|l| l.name)
        .collect();

    Ok(Card {
        id,
        title: node.title.unwrap_or_default(),
        created_at,
        phase,
        labels,
    })
}
