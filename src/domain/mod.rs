pub mod credentials;
pub mod user;
pub mod page;

pub use credentials::*;
pub use user::*;
pub use page::*;
