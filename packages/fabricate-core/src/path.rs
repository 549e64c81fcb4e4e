//! Path and identity derivation (§4.5).

/// Converts a `PascalCase`/`camelCase`/`snake_case` label into `kebab-case`, used for both fiber
/// path segments and instance ids.
pub fn kebab_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len() + 4);
    let mut prev_lower_or_digit = false;
    for ch in label.chars() {
        if ch == '_' || ch == ' ' {
            if !out.ends_with('-') && !out.is_empty() {
                out.push('-');
            }
            prev_lower_or_digit = false;
            continue;
        }
        if ch.is_uppercase() {
            if prev_lower_or_digit && !out.ends_with('-') {
                out.push('-');
            }
            out.extend(ch.to_lowercase());
            prev_lower_or_digit = false;
        } else {
            out.push(ch);
            prev_lower_or_digit = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

pub fn id_from_path(path: &[String]) -> String {
    path.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_case_conversions() {
        assert_eq!(kebab_case("PolicyAttachment"), "policy-attachment");
        assert_eq!(kebab_case("server"), "server");
        assert_eq!(kebab_case("loadBalancerArn"), "load-balancer-arn");
        assert_eq!(kebab_case("s3_bucket"), "s3-bucket");
    }

    #[test]
    fn id_joins_path_with_dots() {
        let path = vec!["server".to_string(), "policy-attachment-a1".to_string()];
        assert_eq!(id_from_path(&path), "server.policy-attachment-a1");
    }
}
