//! Inference module: request building, HTTP transport and response handling
//!
//! - `request`: prompt selection and request bodies per modality
//! - `transport`: the HTTP seam (`reqwest` in production)
//! - `client`: deadline, status handling and voice chaining

mod client;
mod protocol;
mod request;
mod transport;

pub use client::{InferenceClient, Reply};
pub use request::{Job, RawInput, RequestBuilder};
