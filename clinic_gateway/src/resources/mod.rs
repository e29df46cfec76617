//! Resource endpoint modules.
//!
//! Every module declares its endpoints as [`EndpointDecl`] constants, which
//! drive both the cache tags used at runtime and the [`registry`] checked in
//! tests.

pub mod appointments;
pub mod auth;
pub mod catalog;
pub mod inquiries;
pub mod patients;
pub mod users;

use clinic_core::{ListParams, Paginated, Record};
use serde::de::DeserializeOwned;

use crate::{
    GatewayResult,
    cache::{EndpointDecl, Fetched, QueryCache, QueryKey, ResourceKind, Subscription, Tag, TagGraph},
    gateway::Gateway,
    transport::{ApiRequest, HttpBackend},
};

/// Every endpoint of every resource module.
pub fn registry() -> TagGraph {
    TagGraph::new(
        patients::ENDPOINTS
            .iter()
            .chain(appointments::ENDPOINTS)
            .chain(users::ENDPOINTS)
            .chain(catalog::ENDPOINTS)
            .chain(inquiries::ENDPOINTS),
    )
}

/// One collection on the backend, reached through the shared gateway and
/// cached in the shared query cache.
pub(crate) struct Collection<B> {
    gateway: Gateway<B>,
    cache: QueryCache,
    kind: ResourceKind,
    path: &'static str,
}

impl<B> Clone for Collection<B> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            cache: self.cache.clone(),
            kind: self.kind,
            path: self.path,
        }
    }
}

impl<B: HttpBackend + 'static> Collection<B> {
    pub(crate) fn new(
        gateway: Gateway<B>,
        cache: QueryCache,
        kind: ResourceKind,
        path: &'static str,
    ) -> Self {
        Self {
            gateway,
            cache,
            kind,
            path,
        }
    }

    pub(crate) fn collection_path(&self) -> &'static str {
        self.path
    }

    pub(crate) fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, id)
    }

    /// Paginated listing; every record on the page contributes its item tag.
    pub(crate) fn list<T>(&self, decl: &EndpointDecl, params: &ListParams) -> Subscription<Paginated<T>>
    where
        T: DeserializeOwned + Record + Send + Sync + 'static,
    {
        let query = params.to_query();
        let key = QueryKey::with_query(self.kind, decl.name, &query);
        let request = ApiRequest::get(self.path).with_query(query);
        let gateway = self.gateway.clone();
        let kind = self.kind;

        self.cache.subscribe(key, decl.resolve(None), move || {
            let gateway = gateway.clone();
            let request = request.clone();
            async move {
                let page: Paginated<T> = gateway.send_json(&request).await?;
                let provides = item_tags(kind, &page.data);
                Ok(Fetched::new(page, provides))
            }
        })
    }

    /// Unpaginated listing, for small reference collections.
    pub(crate) fn list_all<T>(&self, decl: &EndpointDecl) -> Subscription<Vec<T>>
    where
        T: DeserializeOwned + Record + Send + Sync + 'static,
    {
        let key = QueryKey::new(self.kind, decl.name, "");
        let request = ApiRequest::get(self.path);
        let gateway = self.gateway.clone();
        let kind = self.kind;

        self.cache.subscribe(key, decl.resolve(None), move || {
            let gateway = gateway.clone();
            let request = request.clone();
            async move {
                let records: Vec<T> = gateway.send_json(&request).await?;
                let provides = item_tags(kind, &records);
                Ok(Fetched::new(records, provides))
            }
        })
    }

    pub(crate) fn get<T>(&self, decl: &EndpointDecl, id: &str) -> Subscription<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let key = QueryKey::new(self.kind, decl.name, id);
        let request = ApiRequest::get(self.item_path(id));
        let gateway = self.gateway.clone();

        self.cache.subscribe(key, decl.resolve(Some(id)), move || {
            let gateway = gateway.clone();
            let request = request.clone();
            async move {
                let record: T = gateway.send_json(&request).await?;
                Ok(Fetched::new(record, Vec::new()))
            }
        })
    }

    /// Sends a write and invalidates the tags `decl` declares for `id`.
    pub(crate) async fn mutate<T>(
        &self,
        decl: &EndpointDecl,
        id: Option<&str>,
        request: ApiRequest,
    ) -> GatewayResult<T>
    where
        T: DeserializeOwned,
    {
        log::debug!("{} {} ({})", request.method, request.path, decl.name);
        self.cache
            .mutate(decl.resolve(id), self.gateway.send_json(&request))
            .await
    }
}

fn item_tags<T: Record>(kind: ResourceKind, records: &[T]) -> Vec<Tag> {
    records
        .iter()
        .map(|record| Tag::item(kind, record.record_id()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::registry;
    use crate::cache::{ResourceKind, TagTemplate};

    #[test]
    fn every_mutation_reaches_a_query() {
        let graph = registry();
        if let Err(violations) = graph.check() {
            let rendered: Vec<String> = violations.iter().map(ToString::to_string).collect();
            panic!("tag graph incomplete:\n{}", rendered.join("\n"));
        }
    }

    #[test]
    fn converting_an_inquiry_refreshes_patient_lists() {
        let graph = registry();
        let names: Vec<&str> = graph
            .invalidators(TagTemplate::List(ResourceKind::Patient))
            .map(|decl| decl.name)
            .collect();
        assert!(names.contains(&"inquiries.convert"), "{names:?}");
    }

    #[test]
    fn endpoint_names_are_unique() {
        let graph = registry();
        let mut names: Vec<&str> = graph.endpoints().iter().map(|decl| decl.name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
