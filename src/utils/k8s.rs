// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Convert an operation or pipeline name into a name that is safe to use for a
/// container or scheduler resource.
///
/// Lower-cases the input, replaces every run of characters outside `[-0-9a-z]`
/// with a single `-`, collapses repeated `-` and trims them from both ends.
///
/// # Example
/// ```
/// use pipewright::utils::sanitize_k8s_name;
///
/// assert_eq!(sanitize_k8s_name("Build_Greeting"), "build-greeting");
/// assert_eq!(sanitize_k8s_name("--my  pipeline--"), "my-pipeline");
/// ```
pub fn sanitize_k8s_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());

    for c in name.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' };
        if c == '-' && sanitized.ends_with('-') {
            continue;
        }
        sanitized.push(c);
    }

    sanitized.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_is_unchanged() {
        assert_eq!(sanitize_k8s_name("train"), "train");
    }

    #[test]
    fn test_underscores_and_case() {
        assert_eq!(sanitize_k8s_name("Adjust_Greeting_2"), "adjust-greeting-2");
    }

    #[test]
    fn test_runs_collapse_and_trim() {
        assert_eq!(sanitize_k8s_name("__a!!--b__"), "a-b");
        assert_eq!(sanitize_k8s_name("simples - dev"), "simples-dev");
    }

    #[test]
    fn test_only_invalid_characters() {
        assert_eq!(sanitize_k8s_name("___"), "");
    }
}
