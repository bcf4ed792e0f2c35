//! Reduce a URL field to its network location.

use crate::record::Record;
use crate::stream::Stage;

/// Prefixes after which a network location starts.
const NETLOC_INTRODUCERS: [&str; 3] = ["https://", "http://", "//"];

/// Network-location component of `url`: the text after the `//` introducer
/// up to the first `/`, `?` or `#`.
///
/// Strings without an introducer are read as scheme-relative (`//` assumed),
/// so bare `host/path` values still yield their host. Userinfo and port are
/// kept. Never fails.
///
/// ```
/// use corpus_stream::stages::network_location;
///
/// assert_eq!(network_location("https://a.b:8080/p?q"), "a.b:8080");
/// assert_eq!(network_location("a.b/p"), "a.b");
/// ```
#[must_use]
pub fn network_location(url: &str) -> &str {
    let rest = NETLOC_INTRODUCERS
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))
        .unwrap_or(url);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

/// Rewrites one field to its domain; disabled when no field is set.
#[derive(Clone, Copy, Debug, Default)]
pub struct UrlDomain {
    field: Option<usize>,
}

impl UrlDomain {
    #[must_use]
    pub const fn new(field: Option<usize>) -> Self {
        Self { field }
    }

    /// Signed form used on the command line: any negative index disables.
    #[must_use]
    pub fn from_signed(field: i64) -> Self {
        Self::new(usize::try_from(field).ok())
    }
}

impl Stage for UrlDomain {
    fn name(&self) -> &'static str {
        "url_domain"
    }

    fn apply(&mut self, mut record: Record) -> Record {
        if let Some(field) = self.field.and_then(|idx| record.get_mut(idx)) {
            let domain = network_location(field).to_string();
            *field = domain;
        }
        record
    }
}
