//! Display links for deployed repositories.

pub const DEFAULT_LINK_DOMAIN: &str = "hostit.app";

/// Lower-cases `name` and collapses every run of non-alphanumeric characters
/// into a single `-`, trimming dashes at both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// The public link shown for a deployed repository. Purely derived from the
/// name; nothing confirms that the address is live.
pub fn deployment_link(repo_name: &str, domain: &str) -> String {
    let slug = slugify(repo_name);
    let slug = if slug.is_empty() { "app".to_string() } else { slug };
    format!("https://{}.{}", slug, domain.trim_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        let cases = vec![
            ("demo-app", "demo-app"),
            ("Hello-World", "hello-world"),
            ("my_cool.project", "my-cool-project"),
            ("  Spaced   Out  ", "spaced-out"),
            ("--weird__", "weird"),
            ("v2.0", "v2-0"),
            ("Ünïcode", "n-code"),
            ("", ""),
        ];
        for (input, expected) in cases {
            assert_eq!(slugify(input), expected, "slugify({:?})", input);
        }
    }

    #[test]
    fn test_deployment_link() {
        assert_eq!(
            deployment_link("demo-app", DEFAULT_LINK_DOMAIN),
            "https://demo-app.hostit.app"
        );
        assert_eq!(
            deployment_link("Next.js Portfolio", "preview.example.com"),
            "https://next-js-portfolio.preview.example.com"
        );
    }

    #[test]
    fn test_deployment_link_is_stable_under_normalization() {
        let a = deployment_link("My_App", DEFAULT_LINK_DOMAIN);
        let b = deployment_link("my-app", DEFAULT_LINK_DOMAIN);
        let c = deployment_link("MY APP", DEFAULT_LINK_DOMAIN);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_deployment_link_for_symbol_only_name() {
        assert_eq!(
            deployment_link("___", DEFAULT_LINK_DOMAIN),
            "https://app.hostit.app"
        );
    }
}
