use clinic_core::{Acknowledgement, ListParams, Paginated, Service, ServiceId, ServiceInput, Status};

use crate::{
    GatewayResult,
    cache::{EndpointDecl, QueryCache, ResourceKind, Subscription, TagTemplate},
    gateway::Gateway,
    resources::Collection,
    transport::{ApiRequest, HttpBackend},
};

const SERVICE_LIST: TagTemplate = TagTemplate::List(ResourceKind::Service);
const SERVICE_ITEM: TagTemplate = TagTemplate::Item(ResourceKind::Service);

pub const LIST_SERVICES: EndpointDecl =
    EndpointDecl::query("services.list", &[SERVICE_LIST, SERVICE_ITEM]);
pub const CREATE_SERVICE: EndpointDecl = EndpointDecl::mutation("services.create", &[SERVICE_LIST]);
pub const UPDATE_SERVICE: EndpointDecl =
    EndpointDecl::mutation("services.update", &[SERVICE_LIST, SERVICE_ITEM]);
pub const DELETE_SERVICE: EndpointDecl =
    EndpointDecl::mutation("services.delete", &[SERVICE_LIST, SERVICE_ITEM]);
pub const LIST_STATUSES: EndpointDecl = EndpointDecl::query(
    "statuses.list",
    &[
        TagTemplate::List(ResourceKind::Status),
        TagTemplate::Item(ResourceKind::Status),
    ],
);

pub const ENDPOINTS: &[EndpointDecl] = &[
    LIST_SERVICES,
    CREATE_SERVICE,
    UPDATE_SERVICE,
    DELETE_SERVICE,
    LIST_STATUSES,
];

/// Reference data: billable services and the appointment status vocabulary.
pub struct Catalog<B> {
    services: Collection<B>,
    statuses: Collection<B>,
}

impl<B: HttpBackend + 'static> Catalog<B> {
    pub(crate) fn new(gateway: Gateway<B>, cache: QueryCache) -> Self {
        Self {
            services: Collection::new(
                gateway.clone(),
                cache.clone(),
                ResourceKind::Service,
                "services",
            ),
            statuses: Collection::new(gateway, cache, ResourceKind::Status, "statuses"),
        }
    }

    pub fn services(&self, params: &ListParams) -> Subscription<Paginated<Service>> {
        self.services.list(&LIST_SERVICES, params)
    }

    pub fn statuses(&self) -> Subscription<Vec<Status>> {
        self.statuses.list_all(&LIST_STATUSES)
    }

    pub async fn create_service(&self, input: &ServiceInput) -> GatewayResult<Service> {
        let request = ApiRequest::post(self.services.collection_path()).with_json(input)?;
        self.services.mutate(&CREATE_SERVICE, None, request).await
    }

    pub async fn update_service(&self, id: &ServiceId, input: &ServiceInput) -> GatewayResult<Service> {
        let request = ApiRequest::put(self.services.item_path(id.as_str())).with_json(input)?;
        self.services
            .mutate(&UPDATE_SERVICE, Some(id.as_str()), request)
            .await
    }

    pub async fn delete_service(&self, id: &ServiceId) -> GatewayResult<Acknowledgement> {
        let request = ApiRequest::delete(self.services.item_path(id.as_str()));
        self.services
            .mutate(&DELETE_SERVICE, Some(id.as_str()), request)
            .await
    }
}
