use dialoguer::FuzzySelect;
use dialoguer::theme::ColorfulTheme;

use crate::error::Result;

pub const BROWSER_MODES: [&str; 2] = [
    "Headless (background, faster)",
    "Visible (you can see the browser)",
];

/// Asks whether the browser should run headless. Headless is the default.
pub fn select_headless() -> Result<bool> {
    let choice = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Select browser mode")
        .items(&BROWSER_MODES)
        .default(0)
        .interact_opt()?;
    Ok(headless_from_choice(choice))
}

/// Maps a picker selection to the headless flag; no selection means headless.
pub fn headless_from_choice(choice: Option<usize>) -> bool {
    !matches!(choice.and_then(|i| BROWSER_MODES.get(i)), Some(mode) if mode.starts_with("Visible"))
}

/// Resolves the headless flag, prompting only when it was not given. A prompt
/// that cannot run (no terminal) falls back to headless.
pub fn resolve_headless(explicit: Option<bool>) -> bool {
    explicit.unwrap_or_else(|| {
        select_headless().unwrap_or_else(|err| {
            log::warn!("Browser mode prompt unavailable ({err}); running headless");
            true
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_choice_disables_headless() {
        assert!(!headless_from_choice(Some(1)));
    }

    #[test]
    fn test_headless_is_the_default() {
        assert!(headless_from_choice(Some(0)));
        assert!(headless_from_choice(None));
        assert!(headless_from_choice(Some(7)));
    }

    #[test]
    fn test_explicit_flag_skips_the_prompt() {
        assert!(!resolve_headless(Some(false)));
        assert!(resolve_headless(Some(true)));
    }
}
