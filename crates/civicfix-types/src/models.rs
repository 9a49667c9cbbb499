use uuid::Uuid;

/// Status given to every newly submitted complaint.
pub const DEFAULT_STATUS: &str = "Pending";

/// Display name recorded for complaints submitted without a session.
pub const ANONYMOUS_USERNAME: &str = "Anonymous";

/// Timestamp layout for `created_at`. Zero-padded, so lexicographic order
/// matches chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Kinds of files that can be attached to a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Voice,
}

impl AttachmentKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Image => "img",
            Self::Voice => "voice",
        }
    }

    /// Suffix is fixed per kind and does not follow the uploaded content type.
    fn extension(self) -> &'static str {
        match self {
            Self::Image => "jpg",
            Self::Voice => "webm",
        }
    }

    /// Fresh, collision-free file name for a stored attachment.
    pub fn generate_file_name(self) -> String {
        format!(
            "{}_{}.{}",
            self.prefix(),
            Uuid::new_v4().simple(),
            self.extension()
        )
    }
}
