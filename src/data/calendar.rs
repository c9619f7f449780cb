//! Calendar events.
//!
//! ```text
//! <entry>
//!   <category scheme="...#kind" term="...#event"/>
//!   <gd:when startTime="..." endTime="...">      (repeatable)
//!     <gd:reminder minutes="10"/>                (repeatable)
//!   </gd:when>
//!   <gd:where valueString="..."/>                (repeatable)
//!   <gd:who email="..."/>                        (repeatable)
//!   <gd:eventStatus value="...#event.confirmed"/>
//!   <gd:recurrence>DTSTART...</gd:recurrence>
//!   <gd:reminder minutes="10"/>                  (recurring events only)
//!   <gd:recurrenceException specialized="true">  (repeatable)
//!     <gd:entryLink><entry>...</entry></gd:entryLink>
//!   </gd:recurrenceException>
//!   <gd:originalEvent id="..." href="...">
//!     <gd:when startTime="..."/>
//!   </gd:originalEvent>
//!   <gd:comments><gd:feedLink href="..."/></gd:comments>
//! </entry>
//! ```

use crate::base::{QName, TypeKey, namespaces};
use crate::model::{
    Attribute, Content, EntityKind, Extension, ExtensionKind, ExtensionPoint, ExtensionProfile,
    ModelError, downcast,
};

use super::atom::Entry;
use super::kinds::{entry_kind, terms};
use super::value::{parse_bool, parse_number, text_construct, value_construct};

// ============================================================================
// VALUE CONSTRUCTS
// ============================================================================

value_construct! {
    /// `gd:eventStatus`
    EventStatus: namespaces::GD, "eventStatus";
    CANCELED = "http://schemas.google.com/g/2005#event.canceled",
    CONFIRMED = "http://schemas.google.com/g/2005#event.confirmed",
    TENTATIVE = "http://schemas.google.com/g/2005#event.tentative",
}

value_construct! {
    /// `gd:visibility`
    Visibility: namespaces::GD, "visibility";
    DEFAULT = "http://schemas.google.com/g/2005#event.default",
    CONFIDENTIAL = "http://schemas.google.com/g/2005#event.confidential",
    PRIVATE = "http://schemas.google.com/g/2005#event.private",
    PUBLIC = "http://schemas.google.com/g/2005#event.public",
}

value_construct! {
    /// `gd:transparency`
    Transparency: namespaces::GD, "transparency";
    OPAQUE = "http://schemas.google.com/g/2005#event.opaque",
    TRANSPARENT = "http://schemas.google.com/g/2005#event.transparent",
}

value_construct! {
    /// `gCal:uid`, the iCalendar UID of an event.
    Uid: namespaces::GCAL, "uid";
}

text_construct! {
    /// `gd:recurrence`, an RFC 2445 recurrence in its text content.
    Recurrence: namespaces::GD, "recurrence"
}

/// `gCal:sequence`, the iCalendar revision number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sequence {
    value: u32,
}

impl Sequence {
    pub fn new(value: u32) -> Self {
        Self { value }
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

impl Extension for Sequence {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        vec![Attribute::new("value", self.value.to_string())]
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.is("value") {
            self.value = parse_number("gCal:sequence", attribute)?;
        }
        Ok(())
    }
}

impl ExtensionKind for Sequence {
    const NAMESPACE: &'static str = namespaces::GCAL;
    const LOCAL_NAME: &'static str = "sequence";
}

// ============================================================================
// REMINDER
// ============================================================================

/// `gd:reminder`: a lead time or an absolute time, plus a delivery method.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reminder {
    days: Option<u32>,
    hours: Option<u32>,
    minutes: Option<u32>,
    absolute_time: Option<String>,
    method: Option<String>,
}

impl Reminder {
    pub const ALERT: &'static str = "alert";
    pub const EMAIL: &'static str = "email";
    pub const SMS: &'static str = "sms";

    pub fn minutes(minutes: u32) -> Self {
        Self {
            minutes: Some(minutes),
            ..Self::default()
        }
    }

    pub fn hours(hours: u32) -> Self {
        Self {
            hours: Some(hours),
            ..Self::default()
        }
    }

    pub fn days(days: u32) -> Self {
        Self {
            days: Some(days),
            ..Self::default()
        }
    }

    pub fn at(absolute_time: &str) -> Self {
        Self {
            absolute_time: Some(absolute_time.to_string()),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    /// The lead time in minutes, if given relative to the event and it
    /// fits in a `u32`.
    pub fn lead_minutes(&self) -> Option<u32> {
        match (self.minutes, self.hours, self.days) {
            (Some(minutes), _, _) => Some(minutes),
            (None, Some(hours), _) => hours.checked_mul(60),
            (None, None, Some(days)) => days.checked_mul(24 * 60),
            (None, None, None) => None,
        }
    }

    pub fn absolute_time(&self) -> Option<&str> {
        self.absolute_time.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    fn time_count(&self) -> usize {
        [
            self.days.is_some(),
            self.hours.is_some(),
            self.minutes.is_some(),
            self.absolute_time.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

impl Extension for Reminder {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        let numbers = [
            ("days", self.days),
            ("hours", self.hours),
            ("minutes", self.minutes),
        ];
        let mut attributes: Vec<Attribute> = numbers
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| Attribute::new(name, value.to_string())))
            .collect();
        if let Some(time) = &self.absolute_time {
            attributes.push(Attribute::new("absoluteTime", time.as_str()));
        }
        if let Some(method) = &self.method {
            attributes.push(Attribute::new("method", method.as_str()));
        }
        attributes
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.name.is_qualified() {
            return Ok(());
        }
        match attribute.name.local_name() {
            "days" => self.days = Some(parse_number("gd:reminder", attribute)?),
            "hours" => self.hours = Some(parse_number("gd:reminder", attribute)?),
            "minutes" => self.minutes = Some(parse_number("gd:reminder", attribute)?),
            "absoluteTime" => self.absolute_time = Some(attribute.value.clone()),
            "method" => self.method = Some(attribute.value.clone()),
            _ => {}
        }
        Ok(())
    }

    fn process_end(&mut self) -> Result<(), ModelError> {
        match self.time_count() {
            0 => Err(ModelError::missing_attribute(
                Self::qname(),
                "days|hours|minutes|absoluteTime",
            )),
            1 => Ok(()),
            _ => Err(ModelError::invalid_attribute(
                "gd:reminder takes exactly one of days, hours, minutes and absoluteTime",
            )),
        }
    }
}

impl ExtensionKind for Reminder {
    const NAMESPACE: &'static str = namespaces::GD;
    const LOCAL_NAME: &'static str = "reminder";
    const REPEATABLE: bool = true;
}

// ============================================================================
// WHEN
// ============================================================================

/// `gd:when`: one occurrence of an event, holding its own reminders.
#[derive(Clone, Debug, Default)]
pub struct When {
    start_time: String,
    end_time: Option<String>,
    value_string: Option<String>,
    point: ExtensionPoint,
}

impl When {
    pub fn new(start_time: &str) -> Self {
        Self {
            start_time: start_time.to_string(),
            ..Self::default()
        }
    }

    pub fn with_end(mut self, end_time: &str) -> Self {
        self.end_time = Some(end_time.to_string());
        self
    }

    pub fn with_value_string(mut self, value: &str) -> Self {
        self.value_string = Some(value.to_string());
        self
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }

    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    pub fn value_string(&self) -> Option<&str> {
        self.value_string.as_deref()
    }

    pub fn reminders(&self) -> impl Iterator<Item = &Reminder> {
        self.point.repeating_extension::<Reminder>()
    }

    pub fn add_reminder(&mut self, reminder: Reminder) -> Result<(), ModelError> {
        self.point.add_extension(reminder)
    }
}

impl PartialEq for When {
    fn eq(&self, other: &Self) -> bool {
        self.start_time == other.start_time
            && self.end_time == other.end_time
            && self.value_string == other.value_string
            && self.reminders().eq(other.reminders())
    }
}

impl Extension for When {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = vec![Attribute::new("startTime", self.start_time.as_str())];
        if let Some(end) = &self.end_time {
            attributes.push(Attribute::new("endTime", end.as_str()));
        }
        if let Some(value) = &self.value_string {
            attributes.push(Attribute::new("valueString", value.as_str()));
        }
        attributes
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.is("startTime") {
            self.start_time = attribute.value.clone();
        } else if attribute.is("endTime") {
            self.end_time = Some(attribute.value.clone());
        } else if attribute.is("valueString") {
            self.value_string = Some(attribute.value.clone());
        }
        Ok(())
    }

    fn process_end(&mut self) -> Result<(), ModelError> {
        if self.start_time.is_empty() {
            return Err(ModelError::missing_attribute(Self::qname(), "startTime"));
        }
        Ok(())
    }

    fn extension_point(&self) -> Option<&ExtensionPoint> {
        Some(&self.point)
    }

    fn extension_point_mut(&mut self) -> Result<Option<&mut ExtensionPoint>, ModelError> {
        self.point.unlocked().map(Some)
    }
}

impl ExtensionKind for When {
    const NAMESPACE: &'static str = namespaces::GD;
    const LOCAL_NAME: &'static str = "when";
    const REPEATABLE: bool = true;

    fn declare_extensions(profile: &mut ExtensionProfile) -> Result<(), ModelError> {
        profile.declare_for::<When, Reminder>()
    }
}

// ============================================================================
// WHERE / WHO
// ============================================================================

/// `gd:where`: a place associated with the event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Where {
    value_string: Option<String>,
    label: Option<String>,
    rel: Option<String>,
}

impl Where {
    pub fn new(value_string: &str) -> Self {
        Self {
            value_string: Some(value_string.to_string()),
            ..Self::default()
        }
    }

    pub fn with_rel(mut self, rel: &str) -> Self {
        self.rel = Some(rel.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn value_string(&self) -> Option<&str> {
        self.value_string.as_deref()
    }

    pub fn rel(&self) -> Option<&str> {
        self.rel.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Extension for Where {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        optional_attributes([
            ("valueString", &self.value_string),
            ("label", &self.label),
            ("rel", &self.rel),
        ])
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        let slot = match attribute.name.local_name() {
            "valueString" => &mut self.value_string,
            "label" => &mut self.label,
            "rel" => &mut self.rel,
            _ => return Ok(()),
        };
        if !attribute.name.is_qualified() {
            *slot = Some(attribute.value.clone());
        }
        Ok(())
    }
}

impl ExtensionKind for Where {
    const NAMESPACE: &'static str = namespaces::GD;
    const LOCAL_NAME: &'static str = "where";
    const REPEATABLE: bool = true;
}

/// `gd:who`: a participant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Who {
    email: Option<String>,
    value_string: Option<String>,
    rel: Option<String>,
}

impl Who {
    pub const ATTENDEE: &'static str = "http://schemas.google.com/g/2005#event.attendee";
    pub const ORGANIZER: &'static str = "http://schemas.google.com/g/2005#event.organizer";

    pub fn new(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.value_string = Some(name.to_string());
        self
    }

    pub fn with_rel(mut self, rel: &str) -> Self {
        self.rel = Some(rel.to_string());
        self
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.value_string.as_deref()
    }

    pub fn rel(&self) -> Option<&str> {
        self.rel.as_deref()
    }
}

impl Extension for Who {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        optional_attributes([
            ("email", &self.email),
            ("valueString", &self.value_string),
            ("rel", &self.rel),
        ])
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        let slot = match attribute.name.local_name() {
            "email" => &mut self.email,
            "valueString" => &mut self.value_string,
            "rel" => &mut self.rel,
            _ => return Ok(()),
        };
        if !attribute.name.is_qualified() {
            *slot = Some(attribute.value.clone());
        }
        Ok(())
    }
}

impl ExtensionKind for Who {
    const NAMESPACE: &'static str = namespaces::GD;
    const LOCAL_NAME: &'static str = "who";
    const REPEATABLE: bool = true;
}

fn optional_attributes<const N: usize>(fields: [(&str, &Option<String>); N]) -> Vec<Attribute> {
    fields
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .map(|value| Attribute::new(name, value))
        })
        .collect()
}

// ============================================================================
// LINKED EVENTS
// ============================================================================

/// `gd:entryLink`: a reference to an entry, optionally carrying it inline.
///
/// The inline entry is parsed as an [`EventEntry`] through the link's
/// extension point, so its own extensions resolve against the profile.
#[derive(Clone, Debug, Default)]
pub struct EntryLink {
    href: Option<String>,
    rel: Option<String>,
    read_only: Option<bool>,
    point: ExtensionPoint,
}

impl EntryLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    pub fn with_rel(mut self, rel: &str) -> Self {
        self.rel = Some(rel.to_string());
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn rel(&self) -> Option<&str> {
        self.rel.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.unwrap_or(false)
    }

    pub fn entry(&self) -> Option<&EventEntry> {
        self.point.extension::<EventEntry>()
    }

    /// Replace the inline entry.
    pub fn set_entry(&mut self, entry: EventEntry) -> Result<(), ModelError> {
        self.point.remove_extension::<EventEntry>()?;
        self.point.add_extension(entry)
    }

    pub fn point(&self) -> &ExtensionPoint {
        &self.point
    }
}

impl Extension for EntryLink {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = optional_attributes([("href", &self.href), ("rel", &self.rel)]);
        if let Some(read_only) = self.read_only {
            attributes.push(Attribute::new("readOnly", read_only.to_string()));
        }
        attributes
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.name.is_qualified() {
            return Ok(());
        }
        match attribute.name.local_name() {
            "href" => self.href = Some(attribute.value.clone()),
            "rel" => self.rel = Some(attribute.value.clone()),
            "readOnly" => self.read_only = Some(parse_bool("gd:entryLink", attribute)?),
            _ => {}
        }
        Ok(())
    }

    fn extension_point(&self) -> Option<&ExtensionPoint> {
        Some(&self.point)
    }

    fn extension_point_mut(&mut self) -> Result<Option<&mut ExtensionPoint>, ModelError> {
        self.point.unlocked().map(Some)
    }
}

impl ExtensionKind for EntryLink {
    const NAMESPACE: &'static str = namespaces::GD;
    const LOCAL_NAME: &'static str = "entryLink";

    fn declare_extensions(profile: &mut ExtensionProfile) -> Result<(), ModelError> {
        profile.declare(TypeKey::of::<EntryLink>(), EventEntry::descriptor().single())
    }
}

/// `gd:recurrenceException`: one instance of a recurring event that
/// differs from the series.
#[derive(Clone, Debug, Default)]
pub struct RecurrenceException {
    specialized: Option<bool>,
    point: ExtensionPoint,
}

impl RecurrenceException {
    /// `specialized` is false when only the instance's time was changed.
    pub fn new(specialized: bool, link: EntryLink) -> Result<Self, ModelError> {
        let mut exception = Self {
            specialized: Some(specialized),
            point: ExtensionPoint::new(),
        };
        exception.point.set_extension(link)?;
        Ok(exception)
    }

    pub fn is_specialized(&self) -> bool {
        self.specialized.unwrap_or(false)
    }

    pub fn entry_link(&self) -> Option<&EntryLink> {
        self.point.extension::<EntryLink>()
    }
}

impl Extension for RecurrenceException {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        vec![Attribute::new("specialized", self.is_specialized().to_string())]
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.is("specialized") {
            self.specialized = Some(parse_bool("gd:recurrenceException", attribute)?);
        }
        Ok(())
    }

    fn process_end(&mut self) -> Result<(), ModelError> {
        if self.specialized.is_none() {
            return Err(ModelError::missing_attribute(Self::qname(), "specialized"));
        }
        Ok(())
    }

    fn extension_point(&self) -> Option<&ExtensionPoint> {
        Some(&self.point)
    }

    fn extension_point_mut(&mut self) -> Result<Option<&mut ExtensionPoint>, ModelError> {
        self.point.unlocked().map(Some)
    }
}

impl ExtensionKind for RecurrenceException {
    const NAMESPACE: &'static str = namespaces::GD;
    const LOCAL_NAME: &'static str = "recurrenceException";
    const REPEATABLE: bool = true;

    fn declare_extensions(profile: &mut ExtensionProfile) -> Result<(), ModelError> {
        profile.declare(
            TypeKey::of::<RecurrenceException>(),
            EntryLink::descriptor().required(),
        )
    }
}

/// `gd:originalEvent`: on an exception entry, the recurring event it came
/// from and the start time of the replaced instance.
#[derive(Clone, Debug, Default)]
pub struct OriginalEvent {
    id: String,
    href: String,
    point: ExtensionPoint,
}

impl OriginalEvent {
    pub fn new(id: &str, href: &str, original_time: When) -> Result<Self, ModelError> {
        let mut event = Self {
            id: id.to_string(),
            href: href.to_string(),
            point: ExtensionPoint::new(),
        };
        event.point.add_extension(original_time)?;
        Ok(event)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn original_time(&self) -> Option<&When> {
        self.point.extension::<When>()
    }
}

impl Extension for OriginalEvent {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            Attribute::new("id", self.id.as_str()),
            Attribute::new("href", self.href.as_str()),
        ]
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.is("id") {
            self.id = attribute.value.clone();
        } else if attribute.is("href") {
            self.href = attribute.value.clone();
        }
        Ok(())
    }

    fn process_end(&mut self) -> Result<(), ModelError> {
        if self.id.is_empty() {
            return Err(ModelError::missing_attribute(Self::qname(), "id"));
        }
        if self.href.is_empty() {
            return Err(ModelError::missing_attribute(Self::qname(), "href"));
        }
        Ok(())
    }

    fn extension_point(&self) -> Option<&ExtensionPoint> {
        Some(&self.point)
    }

    fn extension_point_mut(&mut self) -> Result<Option<&mut ExtensionPoint>, ModelError> {
        self.point.unlocked().map(Some)
    }
}

impl ExtensionKind for OriginalEvent {
    const NAMESPACE: &'static str = namespaces::GD;
    const LOCAL_NAME: &'static str = "originalEvent";

    fn declare_extensions(profile: &mut ExtensionProfile) -> Result<(), ModelError> {
        profile.declare(
            TypeKey::of::<OriginalEvent>(),
            When::descriptor().single().required(),
        )
    }
}

/// `gd:feedLink`: a reference to a feed. Inline feeds are not read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedLink {
    href: Option<String>,
    rel: Option<String>,
    read_only: Option<bool>,
    count_hint: Option<u32>,
}

impl FeedLink {
    pub fn new(href: &str) -> Self {
        Self {
            href: Some(href.to_string()),
            ..Self::default()
        }
    }

    pub fn with_count_hint(mut self, count_hint: u32) -> Self {
        self.count_hint = Some(count_hint);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn rel(&self) -> Option<&str> {
        self.rel.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.unwrap_or(false)
    }

    pub fn count_hint(&self) -> Option<u32> {
        self.count_hint
    }
}

impl Extension for FeedLink {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = optional_attributes([("href", &self.href), ("rel", &self.rel)]);
        if let Some(read_only) = self.read_only {
            attributes.push(Attribute::new("readOnly", read_only.to_string()));
        }
        if let Some(count_hint) = self.count_hint {
            attributes.push(Attribute::new("countHint", count_hint.to_string()));
        }
        attributes
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.name.is_qualified() {
            return Ok(());
        }
        match attribute.name.local_name() {
            "href" => self.href = Some(attribute.value.clone()),
            "rel" => self.rel = Some(attribute.value.clone()),
            "readOnly" => self.read_only = Some(parse_bool("gd:feedLink", attribute)?),
            "countHint" => self.count_hint = Some(parse_number("gd:feedLink", attribute)?),
            _ => {}
        }
        Ok(())
    }
}

impl ExtensionKind for FeedLink {
    const NAMESPACE: &'static str = namespaces::GD;
    const LOCAL_NAME: &'static str = "feedLink";
}

/// `gd:comments`: where the discussion of an event lives.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comments {
    rel: Option<String>,
    feed_link: Option<FeedLink>,
}

impl Comments {
    pub fn new(feed_link: FeedLink) -> Self {
        Self {
            rel: None,
            feed_link: Some(feed_link),
        }
    }

    pub fn rel(&self) -> Option<&str> {
        self.rel.as_deref()
    }

    pub fn feed_link(&self) -> Option<&FeedLink> {
        self.feed_link.as_ref()
    }
}

impl Extension for Comments {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        optional_attributes([("rel", &self.rel)])
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.is("rel") {
            self.rel = Some(attribute.value.clone());
        }
        Ok(())
    }

    fn content(&self) -> Vec<Content<'_>> {
        self.feed_link
            .iter()
            .map(|link| Content::Child(link as &dyn Extension))
            .collect()
    }

    fn child_element(&self, name: &QName) -> Option<Box<dyn Extension>> {
        (*name == FeedLink::qname()).then(|| Box::new(FeedLink::default()) as Box<dyn Extension>)
    }

    fn accept_child(&mut self, child: Box<dyn Extension>) -> Result<(), ModelError> {
        if self.feed_link.is_some() {
            return Err(ModelError::cardinality(
                Self::qname().to_string(),
                "more than one gd:feedLink",
            ));
        }
        let link = downcast::<FeedLink>(child)
            .ok_or_else(|| ModelError::invalid_content("gd:comments only holds gd:feedLink"))?;
        self.feed_link = Some(link);
        Ok(())
    }
}

impl ExtensionKind for Comments {
    const NAMESPACE: &'static str = namespaces::GD;
    const LOCAL_NAME: &'static str = "comments";
}

// ============================================================================
// EVENT KINDS
// ============================================================================

fn declare_event_extensions(
    profile: &mut ExtensionProfile,
    parent: TypeKey,
) -> Result<(), ModelError> {
    profile.declare(parent, When::descriptor())?;
    profile.declare(parent, Where::descriptor())?;
    profile.declare(parent, Who::descriptor())?;
    profile.declare(parent, EventStatus::descriptor())?;
    profile.declare(parent, Visibility::descriptor())?;
    profile.declare(parent, Transparency::descriptor())?;
    profile.declare(parent, Recurrence::descriptor())?;
    profile.declare(parent, Reminder::descriptor())?;
    profile.declare(parent, RecurrenceException::descriptor())?;
    profile.declare(parent, OriginalEvent::descriptor())?;
    profile.declare(parent, Comments::descriptor())
}

fn declare_calendar_extensions(
    profile: &mut ExtensionProfile,
    parent: TypeKey,
) -> Result<(), ModelError> {
    declare_event_extensions(profile, parent)?;
    profile.declare(parent, Sequence::descriptor())?;
    profile.declare(parent, Uid::descriptor())
}

entry_kind! {
    /// An entry marked with the event kind.
    EventEntry, term = terms::EVENT, declare = declare_event_extensions
}

entry_kind! {
    /// An event in a calendar feed, adding iCalendar identity.
    CalendarEventEntry,
    term = terms::EVENT,
    declare = declare_calendar_extensions,
    specializes = EventEntry
}

impl EventData for EventEntry {}

impl EventData for CalendarEventEntry {}

impl CalendarEventEntry {
    pub fn sequence(&self) -> Option<u32> {
        self.point().extension::<Sequence>().map(Sequence::value)
    }

    pub fn set_sequence(&mut self, sequence: u32) -> Result<(), ModelError> {
        self.point_mut()?.set_extension(Sequence::new(sequence))
    }

    pub fn uid(&self) -> Option<&str> {
        self.point().extension::<Uid>().map(Uid::value)
    }

    pub fn set_uid(&mut self, uid: &str) -> Result<(), ModelError> {
        self.point_mut()?.set_extension(Uid::new(uid))
    }
}

// ============================================================================
// EVENT ACCESSORS
// ============================================================================

/// Typed accessors shared by every event kind.
pub trait EventData: EntityKind<Entry> + Sized {
    fn times(&self) -> impl Iterator<Item = &When> {
        self.base().point().repeating_extension::<When>()
    }

    fn add_time(&mut self, when: When) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.add_extension(when)
    }

    fn locations(&self) -> impl Iterator<Item = &Where> {
        self.base().point().repeating_extension::<Where>()
    }

    fn add_location(&mut self, location: Where) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.add_extension(location)
    }

    fn participants(&self) -> impl Iterator<Item = &Who> {
        self.base().point().repeating_extension::<Who>()
    }

    fn add_participant(&mut self, participant: Who) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.add_extension(participant)
    }

    fn status(&self) -> Option<&EventStatus> {
        self.base().point().extension::<EventStatus>()
    }

    fn set_status(&mut self, status: EventStatus) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.set_extension(status)
    }

    fn visibility(&self) -> Option<&Visibility> {
        self.base().point().extension::<Visibility>()
    }

    fn set_visibility(&mut self, visibility: Visibility) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.set_extension(visibility)
    }

    fn transparency(&self) -> Option<&Transparency> {
        self.base().point().extension::<Transparency>()
    }

    fn set_transparency(&mut self, transparency: Transparency) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.set_extension(transparency)
    }

    fn recurrence(&self) -> Option<&Recurrence> {
        self.base().point().extension::<Recurrence>()
    }

    fn set_recurrence(&mut self, recurrence: Recurrence) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.set_extension(recurrence)
    }

    fn is_recurring(&self) -> bool {
        self.recurrence().is_some()
    }

    fn recurrence_exceptions(&self) -> impl Iterator<Item = &RecurrenceException> {
        self.base().point().repeating_extension::<RecurrenceException>()
    }

    fn add_recurrence_exception(
        &mut self,
        exception: RecurrenceException,
    ) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.add_extension(exception)
    }

    fn original_event(&self) -> Option<&OriginalEvent> {
        self.base().point().extension::<OriginalEvent>()
    }

    fn set_original_event(&mut self, original: OriginalEvent) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.set_extension(original)
    }

    fn comments(&self) -> Option<&Comments> {
        self.base().point().extension::<Comments>()
    }

    fn set_comments(&mut self, comments: Comments) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.set_extension(comments)
    }

    /// Reminders of the event: the entry's own for a recurring event,
    /// otherwise those of its first `gd:when`.
    fn reminders(&self) -> Vec<&Reminder> {
        if self.is_recurring() {
            return self
                .base()
                .point()
                .repeating_extension::<Reminder>()
                .collect();
        }
        self.times()
            .next()
            .map(|when| when.reminders().collect())
            .unwrap_or_default()
    }

    /// Add a reminder where [`EventData::reminders`] reads it from.
    fn add_reminder(&mut self, reminder: Reminder) -> Result<(), ModelError> {
        if self.is_recurring() {
            return self.base_mut().point_mut()?.add_extension(reminder);
        }
        match self
            .base_mut()
            .point_mut()?
            .repeating_extension_mut::<When>()?
            .next()
        {
            Some(when) => when.add_reminder(reminder),
            None => Err(ModelError::invalid_content(
                "a single event needs a gd:when before reminders can be added",
            )),
        }
    }
}
