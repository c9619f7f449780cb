//! The parse/generate driver.
//!
//! ```text
//!  bytes ──► QuickXmlSource ──► XmlEvent stream ──► Parser ──► value tree
//!                                                     │
//!                                            ExtensionProfile
//!                                                     │
//!  bytes ◄── QuickXmlSink ◄──── XmlEvent stream ◄── Generator ◄── value tree
//! ```
//!
//! The drivers only see [`XmlEvent`]s, so any tokenizer can feed them.
//! [`EventBuffer`] is the in-memory source and sink; the quick-xml adapters
//! live behind the `xml` feature.
//!
//! ## Usage
//!
//! ```ignore
//! use atomext::data::EventEntry;
//! use atomext::model::ExtensionProfile;
//! use atomext::xml;
//!
//! let profile = ExtensionProfile::for_root::<EventEntry>()?;
//! let event: EventEntry = xml::from_slice(&profile, bytes)?;
//! let out = xml::to_vec(&profile, &event, &Default::default())?;
//! ```

mod batch;
mod event;
mod generate;
mod options;
mod parse;
#[cfg(feature = "xml")]
mod quick;

pub use batch::parse_many;
pub use event::{EventBuffer, EventSource, StartTag, XmlEvent, XmlSink, replay};
pub use generate::{Generator, generate};
pub use options::{GenerateOptions, ParseOptions};
pub use parse::{ParseState, Parser, parse};
#[cfg(feature = "xml")]
pub use quick::{QuickXmlSink, QuickXmlSource, from_slice, from_str, to_string, to_vec};
