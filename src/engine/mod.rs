//! Pure reconciliation and pagination. Nothing here performs I/O.

pub mod reconcile;
pub mod paginate;

pub use reconcile::{overlay_record, reconcile};
pub use paginate::apply;
