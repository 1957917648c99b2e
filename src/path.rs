/// Expand `~` and environment-variable references (`$HOME`, `${VAR}`) in a
/// manifest-supplied path string, the way workspace labels and worktree
/// `dir` entries are written by hand.
///
/// Returned borrowed when no expansion was needed.
pub fn expand_user_vars(raw: &str) -> std::borrow::Cow<'_, str> {
    shellexpand::full(raw).unwrap_or(std::borrow::Cow::Borrowed(raw))
}

#[cfg(test)]
mod tests {
    #[test]
    fn expand_user_vars_handles_tilde() {
        if let Some(home) = home::home_dir() {
            let expanded = super::expand_user_vars("~/code");
            assert_eq!(expanded, home.join("code").display().to_string());
        }
    }
}
