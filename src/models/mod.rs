mod document;
mod list_kind;
mod operation;

pub use document::RemoteDocument;
pub use list_kind::ListKind;
pub use operation::{OperationKind, QueueItem};
