//! PokeAPI client

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::state::{PokemonAbility, PokemonRecord, PokemonStat};

pub const API_BASE: &str = "https://pokeapi.co/api/v2";

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("request failed: {0}")]
    Network(String),
    #[error("response parse error: {0}")]
    Decode(String),
}

/// Upstream the fetch/cache layer reads from.
#[async_trait]
pub trait PokemonSource: Send + Sync {
    /// Names of the first `limit` Pokemon, in dex order.
    async fn list_names(&self, limit: usize) -> Result<Vec<String>, ApiError>;

    async fn pokemon(&self, id_or_name: &str) -> Result<PokemonRecord, ApiError>;

    /// Types dealing double damage to `type_name`.
    async fn type_weaknesses(&self, type_name: &str) -> Result<Vec<String>, ApiError>;
}

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ListResponse {
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct TypeDetailResponse {
    damage_relations: DamageRelations,
}

#[derive(Clone, Debug, Deserialize)]
struct DamageRelations {
    double_damage_from: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    id: u16,
    name: String,
    height: u16,
    weight: u16,
    types: Vec<PokemonTypeSlot>,
    stats: Vec<PokemonStatSlot>,
    abilities: Vec<PokemonAbilitySlot>,
    sprites: serde_json::Value,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonTypeSlot {
    #[serde(rename = "type")]
    type_info: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonStatSlot {
    base_stat: u16,
    stat: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonAbilitySlot {
    ability: NamedResource,
    #[serde(default)]
    is_hidden: bool,
}

pub struct PokeApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for PokeApiClient {
    fn default() -> Self {
        Self::new(API_BASE)
    }
}

impl PokeApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Base URL with `segments` appended, each one percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| ApiError::Network(format!("invalid base url: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("invalid base url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Any non-success status is reported as `NotFound(key)`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        key: &str,
    ) -> Result<T, ApiError> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        if !response.status().is_success() {
            tracing::warn!(%url, status = %response.status(), "upstream rejected request");
            return Err(ApiError::NotFound(key.to_string()));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl PokemonSource for PokeApiClient {
    async fn list_names(&self, limit: usize) -> Result<Vec<String>, ApiError> {
        let mut url = self.url(&["pokemon"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        let response: ListResponse = self.get_json(url, "pokemon list").await?;
        Ok(names_from_list(response))
    }

    async fn pokemon(&self, id_or_name: &str) -> Result<PokemonRecord, ApiError> {
        let url = self.url(&["pokemon", id_or_name])?;
        let response: PokemonResponse = self.get_json(url, id_or_name).await?;
        Ok(record_from_response(response))
    }

    async fn type_weaknesses(&self, type_name: &str) -> Result<Vec<String>, ApiError> {
        let url = self.url(&["type", type_name])?;
        let response: TypeDetailResponse = self.get_json(url, type_name).await?;
        Ok(weaknesses_from_type(response))
    }
}

/// Decode a `/pokemon/{id}` body.
pub fn parse_pokemon(body: &str) -> Result<PokemonRecord, ApiError> {
    let response: PokemonResponse =
        serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))?;
    Ok(record_from_response(response))
}

/// Decode a `/type/{name}` body into its double-damage-from list.
pub fn parse_type_weaknesses(body: &str) -> Result<Vec<String>, ApiError> {
    let response: TypeDetailResponse =
        serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))?;
    Ok(weaknesses_from_type(response))
}

/// Decode a `/pokemon?limit=N` body into names.
pub fn parse_names(body: &str) -> Result<Vec<String>, ApiError> {
    let response: ListResponse =
        serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))?;
    Ok(names_from_list(response))
}

fn names_from_list(response: ListResponse) -> Vec<String> {
    response
        .results
        .into_iter()
        .map(|entry| entry.name)
        .collect()
}

fn weaknesses_from_type(response: TypeDetailResponse) -> Vec<String> {
    response
        .damage_relations
        .double_damage_from
        .into_iter()
        .map(|entry| entry.name)
        .collect()
}

fn record_from_response(response: PokemonResponse) -> PokemonRecord {
    let types = response
        .types
        .into_iter()
        .map(|slot| slot.type_info.name)
        .collect();
    let stats = response
        .stats
        .into_iter()
        .map(|slot| PokemonStat {
            name: slot.stat.name,
            value: slot.base_stat,
        })
        .collect();
    let abilities = response
        .abilities
        .into_iter()
        .map(|slot| PokemonAbility {
            name: slot.ability.name,
            is_hidden: slot.is_hidden,
        })
        .collect();
    let image_url = pointer_string(&response.sprites, "/other/official-artwork/front_default")
        .or_else(|| pointer_string(&response.sprites, "/front_default"));

    PokemonRecord {
        id: response.id,
        name: response.name,
        types,
        stats,
        abilities,
        height: response.height,
        weight: response.weight,
        image_url,
    }
}

fn pointer_string(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}
