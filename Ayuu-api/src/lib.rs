// Ayuu-api lib.rs
//
// HTTP surface of the Ayuu clinic front desk: routes, handlers, the public
// request and response shapes, the OpenAPI document, and the desk client
// that talks to it.

// Public modules
pub mod api;
pub mod client;
pub mod config;
pub mod entities;
pub mod openapi;
