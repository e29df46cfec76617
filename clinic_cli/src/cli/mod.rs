mod appointments;
mod auth;
mod catalog;
mod common;
mod inquiries;
mod patients;
mod root;
mod users;

pub(crate) use root::get_args;
