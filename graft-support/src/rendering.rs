//! Diagnostic text: construction paths, short type names and
//! "did you mean?" hints.

/// Separator placed between hops of a rendered construction path.
pub const CHAIN_SEPARATOR: &str = " -> ";

/// Joins the hops of a construction path.
///
/// ```
/// use graft_support::rendering::render_chain;
///
/// let path = ["Checkout", "Cart", "Checkout"];
/// assert_eq!(render_chain(&path), "Checkout -> Cart -> Checkout");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    let mut rendered = String::new();
    for (position, hop) in chain.iter().enumerate() {
        if position > 0 {
            rendered.push_str(CHAIN_SEPARATOR);
        }
        rendered.push_str(hop.as_ref());
    }
    rendered
}

fn is_delimiter(ch: char) -> bool {
    matches!(ch, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' | '*')
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Drops module paths from every type mentioned in `full_name`.
///
/// ```
/// use graft_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("shop::billing::Invoice"), "Invoice");
/// assert_eq!(
///     shorten_type_name("graft_container::provider::Capability<dyn shop::Clock>"),
///     "Capability<dyn Clock>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut short = String::with_capacity(full_name.len());
    let mut start = 0;
    for (at, ch) in full_name.char_indices().filter(|&(_, ch)| is_delimiter(ch)) {
        short.push_str(last_segment(&full_name[start..at]));
        short.push(ch);
        start = at + ch.len_utf8();
    }
    short.push_str(last_segment(&full_name[start..]));
    short
}

/// Returns the module path that declares a type, derived from its full name.
///
/// Generic arguments are ignored. A name without any `::` yields an
/// empty string.
///
/// ```
/// use graft_support::rendering::module_of;
///
/// assert_eq!(module_of("shop::billing::Invoice"), "shop::billing");
/// assert_eq!(module_of("shop::Batch<other::Item>"), "shop");
/// assert_eq!(module_of("u32"), "");
/// ```
pub fn module_of(full_name: &str) -> &str {
    let head = full_name
        .find(['<', ' ', '('])
        .map_or(full_name, |end| &full_name[..end]);

    head.rsplit_once("::").map_or("", |(module, _)| module)
}

/// Scores how close two lowercase short names are; `None` if unrelated.
fn similarity(wanted: &str, candidate: &str) -> Option<usize> {
    if wanted.is_empty() || candidate.is_empty() {
        return None;
    }
    if wanted == candidate {
        return Some(120);
    }
    if wanted.contains(candidate) || candidate.contains(wanted) {
        return Some(80);
    }

    let shared_prefix = wanted
        .chars()
        .zip(candidate.chars())
        .position(|(left, right)| left != right)
        .unwrap_or_else(|| wanted.len().min(candidate.len()));

    (shared_prefix >= 3).then_some(shared_prefix * 10)
}

/// Picks up to `limit` names from `known` that resemble `requested`,
/// best match first. `requested` itself is never suggested.
pub fn suggest_similar(requested: &str, known: &[&str], limit: usize) -> Vec<String> {
    let wanted = shorten_type_name(requested).to_lowercase();

    let mut ranked: Vec<(usize, &str)> = known
        .iter()
        .copied()
        .filter(|&name| name != requested)
        .filter_map(|name| {
            let candidate = shorten_type_name(name).to_lowercase();
            similarity(&wanted, &candidate).map(|score| (score, name))
        })
        .collect();

    ranked.sort_by(|(left_score, left), (right_score, right)| {
        right_score.cmp(left_score).then_with(|| left.cmp(right))
    });
    ranked.truncate(limit);
    ranked.into_iter().map(|(_, name)| name.to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_with_cycle() {
        assert_eq!(render_chain(&["Ledger", "Audit", "Ledger"]), "Ledger -> Audit -> Ledger");
    }

    #[test]
    fn chain_edge_sizes() {
        assert_eq!(render_chain(&["Solo"]), "Solo");
        let empty: [&str; 0] = [];
        assert_eq!(render_chain(&empty), "");
    }

    #[test]
    fn chain_of_owned_names() {
        let hops = vec![String::from("Left"), String::from("Right")];
        assert_eq!(render_chain(&hops), "Left -> Right");
    }

    #[test]
    fn short_names() {
        assert_eq!(shorten_type_name("shop::billing::Invoice"), "Invoice");
        assert_eq!(shorten_type_name("Invoice"), "Invoice");
        assert_eq!(
            shorten_type_name("std::collections::HashMap<alloc::string::String, shop::Item>"),
            "HashMap<String, Item>"
        );
        assert_eq!(shorten_type_name("&[shop::Item]"), "&[Item]");
    }

    #[test]
    fn module_prefixes() {
        assert_eq!(module_of("a::b::c::D"), "a::b::c");
        assert_eq!(module_of("a::D<b::E, c::F>"), "a");
        assert_eq!(module_of("dyn a::Trait"), "");
    }

    #[test]
    fn typo_is_suggested() {
        let known = ["shop::Inventory", "shop::Invoice", "shop::Courier"];
        let suggestions = suggest_similar("shop::Invocie", &known, 3);
        assert_eq!(suggestions.first().map(String::as_str), Some("shop::Invoice"));
    }

    #[test]
    fn identical_short_name_ranks_first() {
        let known = ["a::Storage", "b::Store"];
        let suggestions = suggest_similar("c::Store", &known, 2);
        assert_eq!(suggestions[0], "b::Store");
    }

    #[test]
    fn requested_and_unrelated_are_skipped() {
        let known = ["shop::Courier"];
        assert!(suggest_similar("shop::Courier", &known, 3).is_empty());
        assert!(suggest_similar("Zzyzx", &known, 3).is_empty());
    }

    #[test]
    fn limit_is_respected() {
        let known = ["x::Cart", "y::Cart", "z::Cart"];
        assert_eq!(suggest_similar("w::Cart", &known, 2), vec!["x::Cart", "y::Cart"]);
    }
}
