//! Centralized CSS selectors for the companion app.
//!
//! The app ships new markup without notice; every selector lives here and
//! can be overridden from configuration instead of hunting through the
//! routines. Defaults reflect the currently deployed markup.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct Selectors {
    pub navigation: NavigationSelectors,
    pub sbc: SbcSelectors,
    pub store: StoreSelectors,
    pub packs: PackSelectors,
    pub login: LoginSelectors,
    pub two_factor: TwoFactorSelectors,
    pub loading: LoadingSelectors,
}

macro_rules! selector_defaults {
    ($struct:ident { $($field:ident : $default:expr),+ $(,)? }) => {
        impl Default for $struct {
            fn default() -> Self {
                Self { $($field: $default.to_string()),+ }
            }
        }
    };
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NavigationSelectors {
    /// Present only when logged in.
    pub tab_bar: String,
    pub sbc_tab: String,
    pub club_tab: String,
    pub store_tab: String,
}

selector_defaults!(NavigationSelectors {
    tab_bar: ".ut-tab-bar",
    sbc_tab: "button.icon-sbc",
    club_tab: "button.icon-club",
    store_tab: "button.icon-store",
});

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SbcSelectors {
    /// Contains "SBC" when the challenges screen is active.
    pub page_title: String,
    pub filter_bar_item: String,
    pub tile: String,
    pub tile_title: String,
    pub toggle_cell: String,
    /// Present inside a toggle cell only when the toggle is ON.
    pub toggled_state: String,
    pub sort_header: String,
    pub dropdown_control: String,
    pub dropdown_list: String,
    pub search_filter_control: String,
    pub filter_label: String,
    pub filter_list: String,
    pub action_tab: String,
    pub squad_slot: String,
    pub detail_panel: String,
    pub button_text: String,
    pub carousel: String,
    pub carousel_next: String,
    pub sidebar: String,
    pub sidebar_nav_button: String,
    pub standard_button: String,
}

selector_defaults!(SbcSelectors {
    page_title: "h1.title",
    filter_bar_item: "button.ea-filter-bar-item-view",
    tile: "div.ut-sbc-set-tile-view",
    tile_title: "h1.tileTitle",
    toggle_cell: "div.ut-toggle-cell-view",
    toggled_state: "div.ut-toggle-control--toggled",
    sort_header: "h4",
    dropdown_control: "div.ut-drop-down-control",
    dropdown_list: "ul.inline-list",
    search_filter_control: "div.ut-search-filter-control",
    filter_label: "span.label",
    filter_list: "ul.inline-list",
    action_tab: "button.icon-action",
    squad_slot: "div.ut-squad-slot-view",
    detail_panel: "div.DetailPanel",
    button_text: "span.btn-text",
    carousel: "div.detail-carousel",
    carousel_next: "a.tapRight",
    sidebar: "div.sidebar-right",
    sidebar_nav_button: "button.ut-navigation-button-control",
    standard_button: "button.btn-standard",
});

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreSelectors {
    pub tile: String,
    pub tile_header: String,
    pub menu_container: String,
    pub filter_bar_item: String,
    pub primary_button: String,
    pub button_text: String,
}

selector_defaults!(StoreSelectors {
    tile: "div.tile",
    tile_header: "h1.tileHeader",
    menu_container: "div.menu-container",
    filter_bar_item: "button.ea-filter-bar-item-view",
    primary_button: "button.primary",
    button_text: "span.text",
});

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PackSelectors {
    pub section_header: String,
    pub title: String,
    pub ellipsis_button: String,
    pub modal: String,
    pub button_text: String,
    pub confirmation_popup: String,
    pub confirmation_button: String,
}

selector_defaults!(PackSelectors {
    section_header: "header.ut-section-header-view",
    title: "h2.title",
    ellipsis_button: "button.ellipsis-btn",
    modal: "div.ea-dialog-view",
    button_text: "span.btn-text",
    confirmation_popup: "div.ut-action-confirmation-popup-view",
    confirmation_button: "button.btn-standard",
});

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoginSelectors {
    pub login_content: String,
    pub show_login_button: String,
    pub email_input: String,
    pub password_input: String,
    /// Clicked twice: once after the email, once after the password.
    pub submit_button: String,
    pub error_message: String,
}

selector_defaults!(LoginSelectors {
    login_content: ".ut-login-content",
    show_login_button: "button.primary",
    email_input: "#email",
    password_input: "#password",
    submit_button: ".otkbtn-primary",
    error_message: ".error-message",
});

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TwoFactorSelectors {
    pub verification_form: String,
    pub code_input: String,
    pub submit_button: String,
}

selector_defaults!(TwoFactorSelectors {
    verification_form: "#verification-form",
    code_input: "#twoFactorCode",
    submit_button: "#btnSubmit",
});

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoadingSelectors {
    pub click_shield: String,
    pub spinner: String,
}

selector_defaults!(LoadingSelectors {
    click_shield: ".ut-click-shield",
    spinner: ".loading-spinner",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let s = Selectors::default();
        assert_eq!(s.navigation.tab_bar, ".ut-tab-bar");
        assert_eq!(s.sbc.filter_bar_item, "button.ea-filter-bar-item-view");
        assert_eq!(s.packs.confirmation_popup, "div.ut-action-confirmation-popup-view");
        assert_eq!(s.login.submit_button, ".otkbtn-primary");
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let s: Selectors =
            serde_json::from_str(r#"{ "sbc": { "tile": "div.new-tile" } }"#).unwrap();
        assert_eq!(s.sbc.tile, "div.new-tile");
        assert_eq!(s.sbc.tile_title, "h1.tileTitle");
        assert_eq!(s.navigation.sbc_tab, "button.icon-sbc");
    }
}
