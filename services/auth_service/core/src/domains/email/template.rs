//! Mustache-style `{{key}}` template rendering

use std::collections::HashMap;

/// Substitute `{{key}}` placeholders against a values map
///
/// Unknown placeholders are left in place; keys are trimmed so `{{ name }}`
/// and `{{name}}` behave the same.
pub fn render_template(template: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match values.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(&after[..end]);
                        out.push_str("}}");
                    },
                }
                rest = &after[end + 2..];
            },
            None => {
                out.push_str("{{");
                rest = after;
            },
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_keys() {
        let rendered = render_template(
            "Hello {{name}}, confirm at {{link}}",
            &values(&[("name", "Jane"), ("link", "https://x.io/c?t=abc")]),
        );
        assert_eq!(rendered, "Hello Jane, confirm at https://x.io/c?t=abc");
    }

    #[test]
    fn test_render_tolerates_whitespace() {
        let rendered = render_template("Hi {{ name }}", &values(&[("name", "Jane")]));
        assert_eq!(rendered, "Hi Jane");
    }

    #[test]
    fn test_unknown_keys_left_in_place() {
        let rendered = render_template("Hi {{missing}}", &values(&[]));
        assert_eq!(rendered, "Hi {{missing}}");
    }

    #[test]
    fn test_unterminated_placeholder() {
        let rendered = render_template("Hi {{name", &values(&[("name", "Jane")]));
        assert_eq!(rendered, "Hi {{name");
    }

    #[test]
    fn test_repeated_key() {
        let rendered =
            render_template("{{a}} and {{a}}", &values(&[("a", "x")]));
        assert_eq!(rendered, "x and x");
    }
}
