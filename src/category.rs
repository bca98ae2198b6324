/// Map an app/window name to a coarse category tag by keyword match.
/// Unknown or empty names land in "other".
pub fn map_app_to_category(app_name: &str) -> &'static str {
    if app_name.is_empty() || app_name == "Unknown" {
        return "other";
    }

    let app = app_name.to_lowercase();

    for (category, keywords) in CATEGORY_KEYWORDS {
        for kw in *keywords {
            if app.contains(kw) {
                return category;
            }
        }
    }

    "other"
}

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "editor",
        &[
            "code", "studio", "pycharm", "intellij", "sublime", "notepad", "vim", "terminal",
            "powershell", "cmd",
        ],
    ),
    (
        "browser",
        &["chrome", "firefox", "edge", "brave", "opera", "safari", "explorer"],
    ),
    (
        "messaging",
        &[
            "slack", "discord", "teams", "whatsapp", "telegram", "signal", "messenger", "outlook",
            "mail",
        ],
    ),
    ("video", &["youtube", "netflix", "vlc", "twitch", "player", "movie"]),
    (
        "design",
        &["figma", "photoshop", "illustrator", "blender", "canva", "paint", "gimp"],
    ),
    (
        "game",
        &[
            "steam", "league", "valorant", "minecraft", "roblox", "game", "unity", "unreal",
        ],
    ),
    ("notes", &["notion", "obsidian", "onenote", "evernote", "keep"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_apps() {
        assert_eq!(map_app_to_category("Visual Studio Code"), "editor");
        assert_eq!(map_app_to_category("Google Chrome"), "browser");
        assert_eq!(map_app_to_category("Slack"), "messaging");
        assert_eq!(map_app_to_category("Figma"), "design");
    }

    #[test]
    fn unknown_falls_back_to_other() {
        assert_eq!(map_app_to_category("Unknown"), "other");
        assert_eq!(map_app_to_category(""), "other");
        assert_eq!(map_app_to_category("SomeObscureTool"), "other");
    }

    #[test]
    fn match_is_case_insensitive() {
        assert_eq!(map_app_to_category("DISCORD"), "messaging");
        assert_eq!(map_app_to_category("obsidian"), "notes");
    }
}
