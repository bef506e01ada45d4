//! Concrete implementations of the ports.

pub mod reqres;

pub use reqres::ReqresClient;
