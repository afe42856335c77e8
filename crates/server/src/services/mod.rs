//! Collaborator clients: object-storage signing and email delivery.

pub mod email;
pub mod storage;

pub use email::{MailError, Mailer};
pub use storage::{SignedUrlProvider, StorageClient, StorageError};
