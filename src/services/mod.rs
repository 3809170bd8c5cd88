pub mod catalog;
pub mod integrity;
pub mod invitations;
pub mod likes;
pub mod srt;
pub mod viewer;

pub use catalog::CatalogService;
pub use integrity::IntegrityEngine;
pub use invitations::InvitationService;
pub use likes::LikeEngine;
pub use srt::SrtExporter;
pub use viewer::ViewerService;
