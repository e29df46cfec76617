use clinic_core::{Acknowledgement, ListParams, Paginated, Patient, PatientId, PatientInput};

use crate::{
    GatewayResult,
    cache::{EndpointDecl, QueryCache, ResourceKind, Subscription, TagTemplate},
    gateway::Gateway,
    resources::Collection,
    transport::{ApiRequest, HttpBackend},
};

const LIST: TagTemplate = TagTemplate::List(ResourceKind::Patient);
const ITEM: TagTemplate = TagTemplate::Item(ResourceKind::Patient);

pub const LIST_PATIENTS: EndpointDecl = EndpointDecl::query("patients.list", &[LIST, ITEM]);
pub const GET_PATIENT: EndpointDecl = EndpointDecl::query("patients.get", &[ITEM]);
pub const CREATE_PATIENT: EndpointDecl = EndpointDecl::mutation("patients.create", &[LIST]);
pub const UPDATE_PATIENT: EndpointDecl = EndpointDecl::mutation("patients.update", &[LIST, ITEM]);
pub const DELETE_PATIENT: EndpointDecl = EndpointDecl::mutation("patients.delete", &[LIST, ITEM]);

pub const ENDPOINTS: &[EndpointDecl] = &[
    LIST_PATIENTS,
    GET_PATIENT,
    CREATE_PATIENT,
    UPDATE_PATIENT,
    DELETE_PATIENT,
];

pub struct Patients<B> {
    collection: Collection<B>,
}

impl<B: HttpBackend + 'static> Patients<B> {
    pub(crate) fn new(gateway: Gateway<B>, cache: QueryCache) -> Self {
        Self {
            collection: Collection::new(gateway, cache, ResourceKind::Patient, "patients"),
        }
    }

    pub fn list(&self, params: &ListParams) -> Subscription<Paginated<Patient>> {
        self.collection.list(&LIST_PATIENTS, params)
    }

    pub fn get(&self, id: &PatientId) -> Subscription<Patient> {
        self.collection.get(&GET_PATIENT, id.as_str())
    }

    pub async fn create(&self, input: &PatientInput) -> GatewayResult<Patient> {
        let request = ApiRequest::post(self.collection.collection_path()).with_json(input)?;
        self.collection.mutate(&CREATE_PATIENT, None, request).await
    }

    pub async fn update(&self, id: &PatientId, input: &PatientInput) -> GatewayResult<Patient> {
        let request = ApiRequest::put(self.collection.item_path(id.as_str())).with_json(input)?;
        self.collection
            .mutate(&UPDATE_PATIENT, Some(id.as_str()), request)
            .await
    }

    pub async fn delete(&self, id: &PatientId) -> GatewayResult<Acknowledgement> {
        let request = ApiRequest::delete(self.collection.item_path(id.as_str()));
        self.collection
            .mutate(&DELETE_PATIENT, Some(id.as_str()), request)
            .await
    }
}
