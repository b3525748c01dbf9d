//! Entity services
//!
//! Each service validates raw input, then hands the validated shape to the
//! injected `EntityStore`. Services never branch on the backend.

pub mod cases;
pub mod clients;
pub mod items;
pub mod timing;


pub use cases::CaseService;
pub use clients::ClientService;
pub use items::ItemService;
pub use timing::TimingService;
