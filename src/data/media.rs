//! Media RSS.
//!
//! `media:group` is itself extensible: its children are declared on the
//! group type and parsed through the same profile.

use std::borrow::Cow;

use crate::base::{QName, namespaces};
use crate::model::{
    Attribute, Content, Extension, ExtensionKind, ExtensionPoint, ExtensionProfile, ModelError,
};

use super::value::{parse_bool, parse_number, text_construct};

text_construct! {
    /// `media:keywords`, a comma separated list.
    MediaKeywords: namespaces::MEDIA, "keywords"
}

impl MediaKeywords {
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.text()
            .split(',')
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
    }
}

// ============================================================================
// MEDIA CONTENT
// ============================================================================

/// `media:content`: one rendition of the media object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaContent {
    url: Option<String>,
    file_size: Option<u64>,
    content_type: Option<String>,
    medium: Option<String>,
    is_default: Option<bool>,
    expression: Option<String>,
    bitrate: Option<u32>,
    framerate: Option<f64>,
    sampling_rate: Option<f64>,
    channels: Option<u32>,
    duration: Option<u32>,
    height: Option<u32>,
    width: Option<u32>,
    lang: Option<String>,
}

impl MediaContent {
    pub const MEDIUMS: &'static [&'static str] =
        &["image", "audio", "video", "document", "executable"];
    pub const EXPRESSIONS: &'static [&'static str] = &["sample", "full", "nonstop"];

    pub fn new(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_medium(mut self, medium: &str) -> Self {
        self.medium = Some(medium.to_string());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_file_size(mut self, bytes: u64) -> Self {
        self.file_size = Some(bytes);
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = Some(true);
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn medium(&self) -> Option<&str> {
        self.medium.as_deref()
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    pub fn is_default(&self) -> bool {
        self.is_default.unwrap_or(false)
    }

    pub fn duration(&self) -> Option<u32> {
        self.duration
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }
}

fn push_text(attributes: &mut Vec<Attribute>, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        attributes.push(Attribute::new(name, value.as_str()));
    }
}

fn push_display<T: ToString>(attributes: &mut Vec<Attribute>, name: &str, value: Option<T>) {
    if let Some(value) = value {
        attributes.push(Attribute::new(name, value.to_string()));
    }
}

fn check_enumerated(
    element: &str,
    attribute: &str,
    value: &Option<String>,
    allowed: &[&str],
) -> Result<(), ModelError> {
    match value {
        Some(value) if !allowed.contains(&value.as_str()) => Err(ModelError::invalid_attribute(
            format!("{element}/@{attribute}: '{value}' is not one of {allowed:?}"),
        )),
        _ => Ok(()),
    }
}

impl Extension for MediaContent {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        push_text(&mut attributes, "url", &self.url);
        push_display(&mut attributes, "fileSize", self.file_size);
        push_text(&mut attributes, "type", &self.content_type);
        push_text(&mut attributes, "medium", &self.medium);
        push_display(&mut attributes, "isDefault", self.is_default);
        push_text(&mut attributes, "expression", &self.expression);
        push_display(&mut attributes, "bitrate", self.bitrate);
        push_display(&mut attributes, "framerate", self.framerate);
        push_display(&mut attributes, "samplingrate", self.sampling_rate);
        push_display(&mut attributes, "channels", self.channels);
        push_display(&mut attributes, "duration", self.duration);
        push_display(&mut attributes, "height", self.height);
        push_display(&mut attributes, "width", self.width);
        push_text(&mut attributes, "lang", &self.lang);
        attributes
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        const ELEMENT: &str = "media:content";
        if attribute.name.is_qualified() {
            return Ok(());
        }
        let text = || Some(attribute.value.clone());
        match attribute.name.local_name() {
            "url" => self.url = text(),
            "fileSize" => self.file_size = Some(parse_number(ELEMENT, attribute)?),
            "type" => self.content_type = text(),
            "medium" => self.medium = text(),
            "isDefault" => self.is_default = Some(parse_bool(ELEMENT, attribute)?),
            "expression" => self.expression = text(),
            "bitrate" => self.bitrate = Some(parse_number(ELEMENT, attribute)?),
            "framerate" => self.framerate = Some(parse_number(ELEMENT, attribute)?),
            "samplingrate" => self.sampling_rate = Some(parse_number(ELEMENT, attribute)?),
            "channels" => self.channels = Some(parse_number(ELEMENT, attribute)?),
            "duration" => self.duration = Some(parse_number(ELEMENT, attribute)?),
            "height" => self.height = Some(parse_number(ELEMENT, attribute)?),
            "width" => self.width = Some(parse_number(ELEMENT, attribute)?),
            "lang" => self.lang = text(),
            _ => {}
        }
        Ok(())
    }

    fn process_end(&mut self) -> Result<(), ModelError> {
        check_enumerated("media:content", "medium", &self.medium, Self::MEDIUMS)?;
        check_enumerated(
            "media:content",
            "expression",
            &self.expression,
            Self::EXPRESSIONS,
        )
    }
}

impl ExtensionKind for MediaContent {
    const NAMESPACE: &'static str = namespaces::MEDIA;
    const LOCAL_NAME: &'static str = "content";
    const REPEATABLE: bool = true;
}

// ============================================================================
// TITLE / THUMBNAIL / CREDIT
// ============================================================================

/// `media:title`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaTitle {
    text: String,
    content_type: Option<String>,
}

impl MediaTitle {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            content_type: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

impl Extension for MediaTitle {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        push_text(&mut attributes, "type", &self.content_type);
        attributes
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.is("type") {
            self.content_type = Some(attribute.value.clone());
        }
        Ok(())
    }

    fn process_text(&mut self, text: &str) -> Result<(), ModelError> {
        self.text.push_str(text);
        Ok(())
    }

    fn content(&self) -> Vec<Content<'_>> {
        vec![Content::Text(Cow::Borrowed(&self.text))]
    }

    fn process_end(&mut self) -> Result<(), ModelError> {
        check_enumerated(
            "media:title",
            "type",
            &self.content_type,
            &["plain", "html"],
        )
    }
}

impl ExtensionKind for MediaTitle {
    const NAMESPACE: &'static str = namespaces::MEDIA;
    const LOCAL_NAME: &'static str = "title";
}

/// `media:thumbnail`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaThumbnail {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
    time: Option<String>,
}

impl MediaThumbnail {
    pub fn new(url: &str, width: u32, height: u32) -> Self {
        Self {
            url: url.to_string(),
            width: Some(width),
            height: Some(height),
            time: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }
}

impl Extension for MediaThumbnail {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = vec![Attribute::new("url", self.url.as_str())];
        push_display(&mut attributes, "width", self.width);
        push_display(&mut attributes, "height", self.height);
        push_text(&mut attributes, "time", &self.time);
        attributes
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.name.is_qualified() {
            return Ok(());
        }
        match attribute.name.local_name() {
            "url" => self.url = attribute.value.clone(),
            "width" => self.width = Some(parse_number("media:thumbnail", attribute)?),
            "height" => self.height = Some(parse_number("media:thumbnail", attribute)?),
            "time" => self.time = Some(attribute.value.clone()),
            _ => {}
        }
        Ok(())
    }

    fn process_end(&mut self) -> Result<(), ModelError> {
        if self.url.is_empty() {
            return Err(ModelError::missing_attribute(Self::qname(), "url"));
        }
        Ok(())
    }
}

impl ExtensionKind for MediaThumbnail {
    const NAMESPACE: &'static str = namespaces::MEDIA;
    const LOCAL_NAME: &'static str = "thumbnail";
    const REPEATABLE: bool = true;
}

/// `media:credit`: an entity that contributed to the media object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaCredit {
    name: String,
    role: Option<String>,
    scheme: Option<String>,
}

impl MediaCredit {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }
}

impl Extension for MediaCredit {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        push_text(&mut attributes, "role", &self.role);
        push_text(&mut attributes, "scheme", &self.scheme);
        attributes
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.is("role") {
            self.role = Some(attribute.value.clone());
        } else if attribute.is("scheme") {
            self.scheme = Some(attribute.value.clone());
        }
        Ok(())
    }

    fn process_text(&mut self, text: &str) -> Result<(), ModelError> {
        self.name.push_str(text);
        Ok(())
    }

    fn content(&self) -> Vec<Content<'_>> {
        vec![Content::Text(Cow::Borrowed(&self.name))]
    }
}

impl ExtensionKind for MediaCredit {
    const NAMESPACE: &'static str = namespaces::MEDIA;
    const LOCAL_NAME: &'static str = "credit";
    const REPEATABLE: bool = true;
}

// ============================================================================
// MEDIA GROUP
// ============================================================================

/// `media:group`: alternate renditions of one media object.
#[derive(Clone, Debug, Default)]
pub struct MediaGroup {
    point: ExtensionPoint,
}

impl MediaGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> impl Iterator<Item = &MediaContent> {
        self.point.repeating_extension::<MediaContent>()
    }

    pub fn add_content(&mut self, content: MediaContent) -> Result<(), ModelError> {
        self.point.add_extension(content)
    }

    /// The content flagged `isDefault`, or the first one.
    pub fn default_content(&self) -> Option<&MediaContent> {
        self.contents()
            .find(|content| content.is_default())
            .or_else(|| self.contents().next())
    }

    pub fn title(&self) -> Option<&MediaTitle> {
        self.point.extension::<MediaTitle>()
    }

    pub fn set_title(&mut self, title: MediaTitle) -> Result<(), ModelError> {
        self.point.set_extension(title)
    }

    pub fn thumbnails(&self) -> impl Iterator<Item = &MediaThumbnail> {
        self.point.repeating_extension::<MediaThumbnail>()
    }

    pub fn add_thumbnail(&mut self, thumbnail: MediaThumbnail) -> Result<(), ModelError> {
        self.point.add_extension(thumbnail)
    }

    pub fn keywords(&self) -> Option<&MediaKeywords> {
        self.point.extension::<MediaKeywords>()
    }

    pub fn set_keywords(&mut self, keywords: MediaKeywords) -> Result<(), ModelError> {
        self.point.set_extension(keywords)
    }

    pub fn credits(&self) -> impl Iterator<Item = &MediaCredit> {
        self.point.repeating_extension::<MediaCredit>()
    }

    pub fn add_credit(&mut self, credit: MediaCredit) -> Result<(), ModelError> {
        self.point.add_extension(credit)
    }
}

impl Extension for MediaGroup {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn extension_point(&self) -> Option<&ExtensionPoint> {
        Some(&self.point)
    }

    fn extension_point_mut(&mut self) -> Result<Option<&mut ExtensionPoint>, ModelError> {
        self.point.unlocked().map(Some)
    }
}

impl ExtensionKind for MediaGroup {
    const NAMESPACE: &'static str = namespaces::MEDIA;
    const LOCAL_NAME: &'static str = "group";

    fn declare_extensions(profile: &mut ExtensionProfile) -> Result<(), ModelError> {
        profile.declare_for::<MediaGroup, MediaContent>()?;
        profile.declare_for::<MediaGroup, MediaTitle>()?;
        profile.declare_for::<MediaGroup, MediaThumbnail>()?;
        profile.declare_for::<MediaGroup, MediaKeywords>()?;
        profile.declare_for::<MediaGroup, MediaCredit>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::TypeKey;

    #[test]
    fn test_content_numeric_attributes() {
        let mut content = MediaContent::default();
        for (name, value) in [
            ("url", "http://example.com/a.jpg"),
            ("width", "640"),
            ("height", "480"),
            ("fileSize", "123456"),
            ("isDefault", "true"),
            ("framerate", "29.97"),
        ] {
            content
                .process_attribute(&Attribute::new(name, value))
                .unwrap();
        }
        content.process_end().unwrap();
        assert_eq!(content.dimensions(), Some((640, 480)));
        assert_eq!(content.file_size(), Some(123456));
        assert!(content.is_default());
    }

    #[test]
    fn test_content_rejects_bad_values() {
        let mut content = MediaContent::default();
        assert!(
            content
                .process_attribute(&Attribute::new("width", "-1"))
                .is_err()
        );
        assert!(
            content
                .process_attribute(&Attribute::new("isDefault", "maybe"))
                .is_err()
        );

        let mut content = MediaContent::new("u").with_medium("hologram");
        assert!(content.process_end().is_err());
    }

    #[test]
    fn test_keywords_split() {
        let keywords = MediaKeywords::new("kitten, cute , ,cat");
        assert_eq!(
            keywords.keywords().collect::<Vec<_>>(),
            vec!["kitten", "cute", "cat"]
        );
    }

    #[test]
    fn test_group_default_content() {
        let mut group = MediaGroup::new();
        group.add_content(MediaContent::new("a")).unwrap();
        group
            .add_content(MediaContent::new("b").as_default())
            .unwrap();
        assert_eq!(group.default_content().and_then(MediaContent::url), Some("b"));
        assert_eq!(group.contents().count(), 2);
    }

    #[test]
    fn test_group_profile() {
        let profile = ExtensionProfile::for_root::<MediaGroup>().unwrap();
        let group = TypeKey::of::<MediaGroup>();
        assert!(profile.is_declared(group, &MediaThumbnail::qname()));
        assert!(profile.is_declared(group, &MediaKeywords::qname()));
        assert!(!profile.accepts_arbitrary(group));
    }
}
