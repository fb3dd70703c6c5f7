use serde::Serialize;

use crate::tools::ToolKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub id: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    #[serde(skip)]
    pub kind: ToolKind,
}

pub const TOOL_CATALOG: &[ToolDescriptor] = &[
    ToolDescriptor {
        id: 1,
        name: "Web Search Agent",
        description: "Search the web and generate research documents",
        icon: "SEARCH",
        kind: ToolKind::WebSearch,
    },
    ToolDescriptor {
        id: 2,
        name: "Image Generation",
        description: "Generate images using OpenAI DALL-E",
        icon: "IMAGE",
        kind: ToolKind::ImageGeneration,
    },
    ToolDescriptor {
        id: 3,
        name: "Design Feedback",
        description: "Screenshot websites and get AI design feedback",
        icon: "STAR",
        kind: ToolKind::DesignFeedback,
    },
];

pub fn descriptor(kind: ToolKind) -> &'static ToolDescriptor {
    match kind {
        ToolKind::WebSearch => &TOOL_CATALOG[0],
        ToolKind::ImageGeneration => &TOOL_CATALOG[1],
        ToolKind::DesignFeedback => &TOOL_CATALOG[2],
    }
}
