use clinic_core::{
    Acknowledgement, Appointment, AppointmentId, AppointmentInput, ListParams, Paginated,
    StatusChange,
};

use crate::{
    GatewayResult,
    cache::{EndpointDecl, QueryCache, ResourceKind, Subscription, TagTemplate},
    gateway::Gateway,
    resources::Collection,
    transport::{ApiRequest, HttpBackend},
};

const LIST: TagTemplate = TagTemplate::List(ResourceKind::Appointment);
const ITEM: TagTemplate = TagTemplate::Item(ResourceKind::Appointment);

pub const LIST_APPOINTMENTS: EndpointDecl =
    EndpointDecl::query("appointments.list", &[LIST, ITEM]);
pub const GET_APPOINTMENT: EndpointDecl = EndpointDecl::query("appointments.get", &[ITEM]);
pub const CREATE_APPOINTMENT: EndpointDecl =
    EndpointDecl::mutation("appointments.create", &[LIST]);
pub const UPDATE_APPOINTMENT: EndpointDecl =
    EndpointDecl::mutation("appointments.update", &[LIST, ITEM]);
pub const UPDATE_APPOINTMENT_STATUS: EndpointDecl =
    EndpointDecl::mutation("appointments.update_status", &[LIST, ITEM]);
pub const DELETE_APPOINTMENT: EndpointDecl =
    EndpointDecl::mutation("appointments.delete", &[LIST, ITEM]);

pub const ENDPOINTS: &[EndpointDecl] = &[
    LIST_APPOINTMENTS,
    GET_APPOINTMENT,
    CREATE_APPOINTMENT,
    UPDATE_APPOINTMENT,
    UPDATE_APPOINTMENT_STATUS,
    DELETE_APPOINTMENT,
];

pub struct Appointments<B> {
    collection: Collection<B>,
}

impl<B: HttpBackend + 'static> Appointments<B> {
    pub(crate) fn new(gateway: Gateway<B>, cache: QueryCache) -> Self {
        Self {
            collection: Collection::new(gateway, cache, ResourceKind::Appointment, "appointments"),
        }
    }

    /// Filters such as `patientId` or `doctorId` go through
    /// [`ListParams::with_filter`].
    pub fn list(&self, params: &ListParams) -> Subscription<Paginated<Appointment>> {
        self.collection.list(&LIST_APPOINTMENTS, params)
    }

    pub fn get(&self, id: &AppointmentId) -> Subscription<Appointment> {
        self.collection.get(&GET_APPOINTMENT, id.as_str())
    }

    pub async fn create(&self, input: &AppointmentInput) -> GatewayResult<Appointment> {
        let request = ApiRequest::post(self.collection.collection_path()).with_json(input)?;
        self.collection
            .mutate(&CREATE_APPOINTMENT, None, request)
            .await
    }

    pub async fn update(
        &self,
        id: &AppointmentId,
        input: &AppointmentInput,
    ) -> GatewayResult<Appointment> {
        let request = ApiRequest::put(self.collection.item_path(id.as_str())).with_json(input)?;
        self.collection
            .mutate(&UPDATE_APPOINTMENT, Some(id.as_str()), request)
            .await
    }

    pub async fn update_status(
        &self,
        id: &AppointmentId,
        status: impl Into<String>,
    ) -> GatewayResult<Appointment> {
        let path = format!("{}/status", self.collection.item_path(id.as_str()));
        let request = ApiRequest::patch(path).with_json(&StatusChange {
            status: status.into(),
        })?;
        self.collection
            .mutate(&UPDATE_APPOINTMENT_STATUS, Some(id.as_str()), request)
            .await
    }

    pub async fn delete(&self, id: &AppointmentId) -> GatewayResult<Acknowledgement> {
        let request = ApiRequest::delete(self.collection.item_path(id.as_str()));
        self.collection
            .mutate(&DELETE_APPOINTMENT, Some(id.as_str()), request)
            .await
    }
}
