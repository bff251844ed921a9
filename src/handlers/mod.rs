//! HTTP handlers for the OData service.

pub mod odata;
