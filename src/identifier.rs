//! Package identifier grammar: `name + "@" + exactVersion`, unambiguous
//! under "split on the last `@`" even for scoped names (spec §3).

/// Build a package identifier from a name and an exact version.
pub fn make(name: &str, version: &str) -> String {
    format!("{name}@{version}")
}

/// Split a package identifier into `(name, version)` by locating the
/// *last* `@` character. Everything before is the name, everything after
/// is the version.
///
/// A bare `@scope/name` with no trailing version is not a valid
/// identifier for this function's purposes — callers that accept
/// "name or name@range" (the `add` CLI grammar) use
/// [`parse_spec`] instead, which applies the "index > 0" rule.
pub fn parse(id: &str) -> Option<(&str, &str)> {
    let at = id.rfind('@')?;
    if at == 0 {
        return None;
    }
    Some((&id[..at], &id[at + 1..]))
}

/// Parse the CLI `add <spec>` grammar: `name` or `name@rangeOrTag`.
/// The `@` must be at an index greater than 0 so a leading `@` (the start
/// of a scope) is never mistaken for the name/range separator. Absent a
/// separator, the range defaults to `"latest"`.
pub fn parse_spec(spec: &str) -> Option<(&str, &str)> {
    match spec.rfind('@') {
        Some(at) if at > 0 => Some((&spec[..at], &spec[at + 1..])),
        _ => Some((spec, "latest")),
    }
}

/// The scope directory component of a name, if scoped (`@scope/foo` ->
/// `Some("@scope")`), else `None`.
pub fn scope_of(name: &str) -> Option<&str> {
    if name.starts_with('@') {
        name.split_once('/').map(|(scope, _)| scope)
    } else {
        None
    }
}

/// The filename-safe encoding used by the content cache: `/` -> `-`.
pub fn cache_safe_name(name: &str) -> String {
    name.replace('/', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_bare_name() {
        let id = make("is-thirteen", "2.0.0");
        assert_eq!(parse(&id), Some(("is-thirteen", "2.0.0")));
    }

    #[test]
    fn roundtrips_scoped_name() {
        let id = make("@scope/x", "1.0.0");
        assert_eq!(id, "@scope/x@1.0.0");
        assert_eq!(parse(&id), Some(("@scope/x", "1.0.0")));
    }

    #[test]
    fn rejects_scoped_name_without_version() {
        assert_eq!(parse("@scope/x"), None);
    }

    #[test]
    fn spec_defaults_to_latest() {
        assert_eq!(parse_spec("lodash"), Some(("lodash", "latest")));
        assert_eq!(parse_spec("lodash@^4.0.0"), Some(("lodash", "^4.0.0")));
        assert_eq!(parse_spec("@scope/x"), Some(("@scope/x", "latest")));
        assert_eq!(parse_spec("@scope/x@1.2.3"), Some(("@scope/x", "1.2.3")));
    }

    #[test]
    fn scope_of_bare_and_scoped() {
        assert_eq!(scope_of("lodash"), None);
        assert_eq!(scope_of("@scope/foo"), Some("@scope"));
    }

    #[test]
    fn cache_safe_name_flattens_slash() {
        assert_eq!(cache_safe_name("@scope/x"), "@scope-x");
        assert_eq!(cache_safe_name("lodash"), "lodash");
    }
}
