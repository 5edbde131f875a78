//! Entity-tag parsing and the conditional-response gate.

/// Outcome of comparing client and upstream validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// A validator matched; skip block fetches and answer 304
    NotModified,
    /// No match (or a side is missing); deliver the file
    Proceed,
}

/// Extract the opaque token of each entity tag in a validator header.
///
/// Per RFC 7232 each tag is quote-delimited and cannot itself contain a
/// quote, so the odd-indexed segments of a split on `"` are the tokens.
/// Weak-validator prefixes end up in the even segments and fall away.
pub fn parse_validators(header: &str) -> Vec<&str> {
    header
        .split('"')
        .enumerate()
        .filter_map(|(i, token)| (i % 2 == 1).then_some(token))
        .collect()
}

/// Decide whether the client's cached entity is still current.
///
/// `NotModified` iff both sides carry validators and their token sets
/// intersect. Runs after the bundle header fetch (which supplies the
/// upstream side) and before any block fetch.
pub fn check(client: Option<&str>, upstream: Option<&str>) -> Gate {
    let (Some(client), Some(upstream)) = (client, upstream) else {
        return Gate::Proceed;
    };

    let wanted = parse_validators(client);
    if parse_validators(upstream)
        .iter()
        .any(|token| wanted.contains(token))
    {
        Gate::NotModified
    } else {
        Gate::Proceed
    }
}
