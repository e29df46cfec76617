pub mod ids;
pub mod listing;
pub mod records;
pub mod time;

pub use ids::{AppointmentId, InquiryId, PatientId, ServiceId, StatusId, UserId};
pub use listing::{Acknowledgement, ListParams, Paginated, Pagination, TimeRange};
pub use records::{
    Appointment, AppointmentInput, Inquiry, InquiryInput, Patient, PatientInput, Record, Service,
    ServiceInput, StaffUser, StaffUserInput, Status, StatusChange,
};
pub use time::Timestamp;
