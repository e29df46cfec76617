use clinic_core::{Acknowledgement, ListParams, Paginated, StaffUser, StaffUserInput, UserId};

use crate::{
    GatewayResult,
    cache::{EndpointDecl, QueryCache, ResourceKind, Subscription, TagTemplate},
    gateway::Gateway,
    resources::Collection,
    transport::{ApiRequest, HttpBackend},
};

const LIST: TagTemplate = TagTemplate::List(ResourceKind::User);
const ITEM: TagTemplate = TagTemplate::Item(ResourceKind::User);

pub const LIST_USERS: EndpointDecl = EndpointDecl::query("users.list", &[LIST, ITEM]);
pub const GET_USER: EndpointDecl = EndpointDecl::query("users.get", &[ITEM]);
pub const CREATE_USER: EndpointDecl = EndpointDecl::mutation("users.create", &[LIST]);
pub const UPDATE_USER: EndpointDecl = EndpointDecl::mutation("users.update", &[LIST, ITEM]);
pub const DELETE_USER: EndpointDecl = EndpointDecl::mutation("users.delete", &[LIST, ITEM]);

pub const ENDPOINTS: &[EndpointDecl] = &[LIST_USERS, GET_USER, CREATE_USER, UPDATE_USER, DELETE_USER];

/// Staff accounts, administered under `admin/employee`.
pub struct Users<B> {
    collection: Collection<B>,
}

impl<B: HttpBackend + 'static> Users<B> {
    pub(crate) fn new(gateway: Gateway<B>, cache: QueryCache) -> Self {
        Self {
            collection: Collection::new(gateway, cache, ResourceKind::User, "admin/employee"),
        }
    }

    pub fn list(&self, params: &ListParams) -> Subscription<Paginated<StaffUser>> {
        self.collection.list(&LIST_USERS, params)
    }

    pub fn get(&self, id: &UserId) -> Subscription<StaffUser> {
        self.collection.get(&GET_USER, id.as_str())
    }

    pub async fn create(&self, input: &StaffUserInput) -> GatewayResult<StaffUser> {
        let request = ApiRequest::post(self.collection.collection_path()).with_json(input)?;
        self.collection.mutate(&CREATE_USER, None, request).await
    }

    pub async fn update(&self, id: &UserId, input: &StaffUserInput) -> GatewayResult<StaffUser> {
        let request = ApiRequest::put(self.collection.item_path(id.as_str())).with_json(input)?;
        self.collection
            .mutate(&UPDATE_USER, Some(id.as_str()), request)
            .await
    }

    pub async fn delete(&self, id: &UserId) -> GatewayResult<Acknowledgement> {
        let request = ApiRequest::delete(self.collection.item_path(id.as_str()));
        self.collection
            .mutate(&DELETE_USER, Some(id.as_str()), request)
            .await
    }
}
