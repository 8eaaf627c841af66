pub mod document;
pub mod enums;
pub mod office;
pub mod resolution;
pub mod stamp;
pub mod user;

pub use document::{Attachment, CoExecutors, Document, SignatureEntry, Signatures};
pub use enums::{DocumentStatus, Role};
pub use office::ReceptionOffice;
pub use resolution::ResolutionTemplate;
pub use stamp::{FieldMapping, Stamp};
pub use user::UserProfile;
