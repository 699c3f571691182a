//! Conversation menu enhancement.
//!
//! A kebab pointer-down arms an interaction: detect the menu root
//! ([`detect`]), inject the "Move to Project" item ([`inject`]), watch it
//! briefly, and open the project submenu ([`submenu`]) on hover or click.
//! [`MenuEnhancer`] owns the interaction and its teardown.

pub mod detect;
pub mod enhancer;
pub mod inject;
pub mod overlay;
pub mod submenu;
pub mod theme;

pub use detect::{wait_for_menu_root, FirstWins};
pub use enhancer::{cleanup_menu_artifacts, ClickOutcome, MenuCommand, MenuEnhancer};
pub use inject::{inject_move_item, inject_with_retries, InjectedItem, InjectionOutcome};
pub use overlay::{build_overlay_menu, place_beside, OverlayEntry, OverlayMenuSpec};
pub use submenu::{open_submenu, submenu_choice, SubmenuChoice};
pub use theme::MenuTheme;
