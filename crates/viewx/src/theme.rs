// SPDX-License-Identifier: Apache-2.0
//! Theme roles and page configuration shared by the builders.
//!
//! A [`Theme`] belongs to one builder instance. Components that leave a color
//! unset resolve it against the theme when they are lowered, so overrides
//! applied after a component was added still take effect at export.

use serde::{Deserialize, Serialize};

/// Semantic color roles read by every rendering step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Page background.
    pub background: String,
    /// Body text.
    pub text: String,
    /// Accent used for titles, charts and value boxes.
    pub primary: String,
    /// Card / surface fill behind text blocks.
    pub card: String,
}

impl Theme {
    /// Dark palette used by generated dashboards.
    #[must_use]
    pub fn dark() -> Self {
        Self {
            background: "#0b1220".to_string(),
            text: "#E6EEF3".to_string(),
            primary: "#00E0A8".to_string(),
            card: "#0f1720".to_string(),
        }
    }

    /// Light palette used by static grid reports.
    #[must_use]
    pub fn light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#212529".to_string(),
            primary: "#4C6EF5".to_string(),
            card: "#ffffff".to_string(),
        }
    }

    /// Apply the set fields of `overrides`, leaving the others untouched.
    pub fn apply(&mut self, overrides: &ThemeOverrides) {
        if let Some(background) = &overrides.background {
            self.background.clone_from(background);
        }
        if let Some(text) = &overrides.text {
            self.text.clone_from(text);
        }
        if let Some(primary) = &overrides.primary {
            self.primary.clone_from(primary);
        }
        if let Some(card) = &overrides.card {
            self.card.clone_from(card);
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// Partial theme update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeOverrides {
    pub background: Option<String>,
    pub text: Option<String>,
    pub primary: Option<String>,
    pub card: Option<String>,
}

/// Dashboard page width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageLayout {
    #[default]
    Wide,
    Centered,
}

impl PageLayout {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wide => "wide",
            Self::Centered => "centered",
        }
    }
}

/// Initial dashboard sidebar state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidebarState {
    #[default]
    Auto,
    Expanded,
    Collapsed,
}

impl SidebarState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Expanded => "expanded",
            Self::Collapsed => "collapsed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub layout: PageLayout,
    pub initial_sidebar_state: SidebarState,
}

#[cfg(test)]
mod tests {
    use super::{PageConfig, PageLayout, SidebarState, Theme, ThemeOverrides};

    #[test]
    fn overrides_only_touch_set_roles() {
        let mut theme = Theme::dark();
        theme.apply(&ThemeOverrides {
            primary: Some("#ff0066".to_string()),
            ..ThemeOverrides::default()
        });
        assert_eq!(theme.primary, "#ff0066");
        assert_eq!(theme.background, Theme::dark().background);
        assert_eq!(theme.card, Theme::dark().card);
    }

    #[test]
    fn page_config_reads_snake_case_values() {
        let config: PageConfig = serde_json::from_str(
            r#"{"layout":"centered","initial_sidebar_state":"collapsed"}"#,
        )
        .expect("page config");
        assert_eq!(config.layout, PageLayout::Centered);
        assert_eq!(config.initial_sidebar_state.as_str(), "collapsed");
        assert_eq!(PageConfig::default().initial_sidebar_state, SidebarState::Auto);
    }
}
