use crate::tools::ToolKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Tool(ToolKind),
    WebInterface,
    Exit,
}

#[derive(Clone, Copy, Debug)]
pub struct MenuEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub choice: MenuChoice,
}

pub const MENU_ENTRIES: &[MenuEntry] = &[
    MenuEntry {
        key: "1",
        label: "Web Search Agent",
        choice: MenuChoice::Tool(ToolKind::WebSearch),
    },
    MenuEntry {
        key: "2",
        label: "Image Generation",
        choice: MenuChoice::Tool(ToolKind::ImageGeneration),
    },
    MenuEntry {
        key: "3",
        label: "Design Feedback",
        choice: MenuChoice::Tool(ToolKind::DesignFeedback),
    },
    MenuEntry {
        key: "4",
        label: "Website Interface",
        choice: MenuChoice::WebInterface,
    },
    MenuEntry {
        key: "5",
        label: "Exit",
        choice: MenuChoice::Exit,
    },
];

pub fn parse_menu_choice(raw: &str) -> Option<MenuChoice> {
    let key = raw.trim();
    MENU_ENTRIES
        .iter()
        .find(|entry| entry.key == key)
        .map(|entry| entry.choice)
}
