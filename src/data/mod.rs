//! Domain types built on the extension model.
//!
//! ```text
//! Feed ── Entry* ─┬─ EventEntry ── CalendarEventEntry
//!                 ├─ ContactEntry
//!                 └─ PhotoEntry ── MediaGroup ── MediaContent*, MediaThumbnail*, ...
//! ```
//!
//! Kinds are views over [`Entry`]. Parse a feed with [`feed_profile`], then
//! narrow its entries with [`Feed::adapt_entries`] and
//! [`standard_registry`].

mod atom;
mod calendar;
mod contacts;
mod geo;
mod kinds;
mod media;
mod photos;
mod value;

pub use atom::{Entry, Feed, TextElement};
pub use calendar::{
    CalendarEventEntry, Comments, EntryLink, EventData, EventEntry, EventStatus, FeedLink,
    OriginalEvent, Recurrence, RecurrenceException, Reminder, Sequence, Transparency, Uid,
    Visibility, When, Where, Who,
};
pub use contacts::{ContactEntry, Im};
pub use geo::{GeoRssPoint, geo_location, set_geo_location};
pub use kinds::{feed_profile, standard_feed_profile, standard_registry, terms};
pub use media::{MediaContent, MediaCredit, MediaGroup, MediaKeywords, MediaThumbnail, MediaTitle};
pub use photos::{GphotoAlbumId, GphotoId, PhotoEntry};
