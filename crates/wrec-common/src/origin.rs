use url::Url;

/// Strict same-origin equality between two origin strings.
///
/// Both sides are parsed as URLs and compared by their resolved origin
/// (scheme + host + port). Anything unparseable, or an opaque origin, never
/// matches: the caller drops the message.
pub fn same_origin(a: &str, b: &str) -> bool {
    let (Ok(a), Ok(b)) = (Url::parse(a), Url::parse(b)) else {
        return false;
    };
    let (a, b) = (a.origin(), b.origin());
    a.is_tuple() && b.is_tuple() && a == b
}
