use serde::{Deserialize, Serialize};
use std::fmt;

/// One screen of the lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Login,
    Engagement,
    Challenge,
    VirtualLab,
    ResourceHub,
    Explanation,
    Collaboration,
    Community,
    ThankYou,
    AdminReport,
}

/// Order of the persistent navigation menu
pub const MENU_ORDER: [Stage; 8] = [
    Stage::Engagement,
    Stage::Challenge,
    Stage::VirtualLab,
    Stage::ResourceHub,
    Stage::Explanation,
    Stage::Collaboration,
    Stage::Community,
    Stage::AdminReport,
];

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Login,
        Stage::Engagement,
        Stage::Challenge,
        Stage::VirtualLab,
        Stage::ResourceHub,
        Stage::Explanation,
        Stage::Collaboration,
        Stage::Community,
        Stage::ThankYou,
        Stage::AdminReport,
    ];

    /// Where the forward button on this stage leads. Free navigation ignores this.
    pub fn canonical_next(&self) -> Option<Stage> {
        match self {
            Stage::Login => Some(Stage::Engagement),
            Stage::Engagement => Some(Stage::Challenge),
            Stage::Challenge => Some(Stage::VirtualLab),
            Stage::VirtualLab => Some(Stage::ResourceHub),
            Stage::ResourceHub => Some(Stage::Explanation),
            Stage::Explanation => Some(Stage::Collaboration),
            Stage::Collaboration => Some(Stage::ThankYou),
            Stage::ThankYou => Some(Stage::Challenge),
            Stage::Community | Stage::AdminReport => None,
        }
    }

    /// Where the back button on this stage leads, if it has one
    pub fn canonical_back(&self) -> Option<Stage> {
        match self {
            Stage::Explanation => Some(Stage::ResourceHub),
            Stage::Collaboration => Some(Stage::Explanation),
            _ => None,
        }
    }

    pub fn in_menu(&self) -> bool {
        MENU_ORDER.contains(self)
    }

    /// 5E phase label shown in the navigation menu
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Engagement => "Engage",
            Stage::Challenge => "Explore",
            Stage::VirtualLab => "Explain",
            Stage::Explanation => "Evaluate",
            Stage::ResourceHub => "Elaborate",
            Stage::Collaboration => "Review",
            Stage::Community => "Community",
            Stage::AdminReport => "Report",
            Stage::Login => "LOGIN",
            Stage::ThankYou => "THANK_YOU",
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Login
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Menu entries visible for the current login state
pub fn visible_menu(logged_in: bool) -> Vec<Stage> {
    if logged_in {
        MENU_ORDER.to_vec()
    } else {
        Vec::new()
    }
}
