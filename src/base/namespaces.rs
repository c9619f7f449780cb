//! Namespace URIs and preferred prefixes for the vocabularies atomext knows.

/// Atom syndication format.
pub const ATOM: &str = "http://www.w3.org/2005/Atom";
/// Google data common elements (`gd:`).
pub const GD: &str = "http://schemas.google.com/g/2005";
/// Google Calendar elements (`gCal:`).
pub const GCAL: &str = "http://schemas.google.com/gCal/2005";
/// Media RSS.
pub const MEDIA: &str = "http://search.yahoo.com/mrss/";
/// GeoRSS simple encoding.
pub const GEORSS: &str = "http://www.georss.org/georss";
/// Picasa photo elements (`gphoto:`).
pub const GPHOTO: &str = "http://schemas.google.com/photos/2007";

/// The XML namespace, always bound to the reserved `xml` prefix.
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// Category scheme carrying kind markers.
pub const KIND_SCHEME: &str = "http://schemas.google.com/g/2005#kind";

/// Preferred prefixes, in declaration order.
///
/// The Atom namespace is written as the default namespace and has no entry here.
pub const PREFIXES: &[(&str, &str)] = &[
    ("gd", GD),
    ("gCal", GCAL),
    ("media", MEDIA),
    ("georss", GEORSS),
    ("gphoto", GPHOTO),
];

/// Look up the preferred prefix for a namespace URI.
pub fn preferred_prefix(uri: &str) -> Option<&'static str> {
    PREFIXES
        .iter()
        .find(|(_, ns)| *ns == uri)
        .map(|(prefix, _)| *prefix)
}
