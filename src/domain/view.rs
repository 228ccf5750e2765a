use serde::{Deserialize, Serialize};

/// How entries of a feed are presented in the entry column.
///
/// The discriminants are stable: they are persisted in the `feeds.view`
/// column and accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ViewType {
    #[default]
    Articles = 0,
    SocialMedia = 1,
    Pictures = 2,
    Videos = 3,
    Audios = 4,
    Notifications = 5,
}

/// Layout metadata for a view type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub name: &'static str,
    /// Entries are laid out as cells of a grid instead of a vertical list.
    pub grid_mode: bool,
    /// The entry column shares the screen with a wide reading pane.
    pub wide_mode: bool,
}

impl ViewType {
    pub const ALL: [ViewType; 6] = [
        ViewType::Articles,
        ViewType::SocialMedia,
        ViewType::Pictures,
        ViewType::Videos,
        ViewType::Audios,
        ViewType::Notifications,
    ];

    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(ViewType::Articles),
            1 => Some(ViewType::SocialMedia),
            2 => Some(ViewType::Pictures),
            3 => Some(ViewType::Videos),
            4 => Some(ViewType::Audios),
            5 => Some(ViewType::Notifications),
            _ => None,
        }
    }

    pub fn raw(self) -> i64 {
        self as i64
    }

    pub fn descriptor(self) -> ViewDescriptor {
        match self {
            ViewType::Articles => ViewDescriptor {
                name: "Articles",
                grid_mode: false,
                wide_mode: false,
            },
            ViewType::SocialMedia => ViewDescriptor {
                name: "Social Media",
                grid_mode: false,
                wide_mode: true,
            },
            ViewType::Pictures => ViewDescriptor {
                name: "Pictures",
                grid_mode: true,
                wide_mode: true,
            },
            ViewType::Videos => ViewDescriptor {
                name: "Videos",
                grid_mode: true,
                wide_mode: true,
            },
            ViewType::Audios => ViewDescriptor {
                name: "Audios",
                grid_mode: false,
                wide_mode: false,
            },
            ViewType::Notifications => ViewDescriptor {
                name: "Notifications",
                grid_mode: false,
                wide_mode: false,
            },
        }
    }

    pub fn next(self) -> Self {
        let idx = (self.raw() + 1) % Self::ALL.len() as i64;
        Self::from_raw(idx).unwrap_or_default()
    }

    pub fn prev(self) -> Self {
        let len = Self::ALL.len() as i64;
        let idx = (self.raw() + len - 1) % len;
        Self::from_raw(idx).unwrap_or_default()
    }
}

impl std::str::FromStr for ViewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(raw) = s.parse::<i64>() {
            return Self::from_raw(raw).ok_or_else(|| format!("Unknown view type: {}", raw));
        }
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "articles" | "article" => Ok(ViewType::Articles),
            "social-media" | "social" => Ok(ViewType::SocialMedia),
            "pictures" | "picture" => Ok(ViewType::Pictures),
            "videos" | "video" => Ok(ViewType::Videos),
            "audios" | "audio" => Ok(ViewType::Audios),
            "notifications" | "notification" => Ok(ViewType::Notifications),
            _ => Err(format!("Unknown view type: {}", s)),
        }
    }
}
