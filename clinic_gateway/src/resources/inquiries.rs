use clinic_core::{
    Acknowledgement, Inquiry, InquiryId, InquiryInput, ListParams, Paginated, Patient, StatusChange,
};

use crate::{
    GatewayResult,
    cache::{EndpointDecl, QueryCache, ResourceKind, Subscription, TagTemplate},
    gateway::Gateway,
    resources::Collection,
    transport::{ApiRequest, HttpBackend},
};

const LIST: TagTemplate = TagTemplate::List(ResourceKind::Inquiry);
const ITEM: TagTemplate = TagTemplate::Item(ResourceKind::Inquiry);

pub const LIST_INQUIRIES: EndpointDecl = EndpointDecl::query("inquiries.list", &[LIST, ITEM]);
pub const GET_INQUIRY: EndpointDecl = EndpointDecl::query("inquiries.get", &[ITEM]);
pub const CREATE_INQUIRY: EndpointDecl = EndpointDecl::mutation("inquiries.create", &[LIST]);
pub const UPDATE_INQUIRY_STATUS: EndpointDecl =
    EndpointDecl::mutation("inquiries.update_status", &[LIST, ITEM]);
/// Conversion creates a patient record, so patient lists go stale too.
pub const CONVERT_INQUIRY: EndpointDecl = EndpointDecl::mutation(
    "inquiries.convert",
    &[LIST, ITEM, TagTemplate::List(ResourceKind::Patient)],
);
pub const DELETE_INQUIRY: EndpointDecl = EndpointDecl::mutation("inquiries.delete", &[LIST, ITEM]);

pub const ENDPOINTS: &[EndpointDecl] = &[
    LIST_INQUIRIES,
    GET_INQUIRY,
    CREATE_INQUIRY,
    UPDATE_INQUIRY_STATUS,
    CONVERT_INQUIRY,
    DELETE_INQUIRY,
];

/// Contact requests submitted from outside; converting one turns it into a
/// patient.
pub struct Inquiries<B> {
    collection: Collection<B>,
}

impl<B: HttpBackend + 'static> Inquiries<B> {
    pub(crate) fn new(gateway: Gateway<B>, cache: QueryCache) -> Self {
        Self {
            collection: Collection::new(gateway, cache, ResourceKind::Inquiry, "inquiries"),
        }
    }

    pub fn list(&self, params: &ListParams) -> Subscription<Paginated<Inquiry>> {
        self.collection.list(&LIST_INQUIRIES, params)
    }

    pub fn get(&self, id: &InquiryId) -> Subscription<Inquiry> {
        self.collection.get(&GET_INQUIRY, id.as_str())
    }

    pub async fn create(&self, input: &InquiryInput) -> GatewayResult<Inquiry> {
        let request = ApiRequest::post(self.collection.collection_path()).with_json(input)?;
        self.collection.mutate(&CREATE_INQUIRY, None, request).await
    }

    pub async fn update_status(
        &self,
        id: &InquiryId,
        status: impl Into<String>,
    ) -> GatewayResult<Inquiry> {
        let path = format!("{}/status", self.collection.item_path(id.as_str()));
        let request = ApiRequest::patch(path).with_json(&StatusChange {
            status: status.into(),
        })?;
        self.collection
            .mutate(&UPDATE_INQUIRY_STATUS, Some(id.as_str()), request)
            .await
    }

    pub async fn convert(&self, id: &InquiryId) -> GatewayResult<Patient> {
        let path = format!("{}/convert", self.collection.item_path(id.as_str()));
        self.collection
            .mutate(&CONVERT_INQUIRY, Some(id.as_str()), ApiRequest::post(path))
            .await
    }

    pub async fn delete(&self, id: &InquiryId) -> GatewayResult<Acknowledgement> {
        let request = ApiRequest::delete(self.collection.item_path(id.as_str()));
        self.collection
            .mutate(&DELETE_INQUIRY, Some(id.as_str()), request)
            .await
    }
}
