use reqlog_core::HeaderCapture;
use std::collections::BTreeMap;

/// Pick the request headers to log, sorted by name.
///
/// `All` keeps everything; `List` keeps headers whose names match an entry
/// case-insensitively; `None` keeps nothing.
pub fn select_headers(
    headers: &BTreeMap<String, String>,
    capture: &HeaderCapture,
) -> BTreeMap<String, String> {
    match capture {
        HeaderCapture::None => BTreeMap::new(),
        HeaderCapture::All => headers.clone(),
        HeaderCapture::List(wanted) => headers
            .iter()
            .filter(|(name, _)| wanted.iter().any(|w| w.eq_ignore_ascii_case(name)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}
