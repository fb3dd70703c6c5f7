mod naming;
mod writer;

pub use naming::{file_stamp, slugify, ArtifactName, SLUG_MAX_CHARS};
pub use writer::ArtifactWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactCategory {
    ResearchDocs,
    Images,
    Screenshots,
    FeedbackReports,
}

impl ArtifactCategory {
    pub const ALL: [Self; 4] = [
        Self::ResearchDocs,
        Self::FeedbackReports,
        Self::Images,
        Self::Screenshots,
    ];

    pub fn relative_dir(self) -> &'static str {
        match self {
            Self::ResearchDocs => "references",
            Self::FeedbackReports => "references/ai_feedback",
            Self::Images => "images",
            Self::Screenshots => "screenshots",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ResearchDocs => "research documents",
            Self::Images => "images",
            Self::Screenshots => "screenshots",
            Self::FeedbackReports => "feedback reports",
        }
    }
}
