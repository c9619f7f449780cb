//! The parse driver.
//!
//! Walks a token stream depth first and builds the value tree. Each child
//! element passes through these states:
//!
//! ```text
//! AwaitingStartTag ─► ResolvingDescriptor ─► ConstructingChild ─► RecursingIntoChild
//!        ▲                    │ miss                                     │ end tag
//!        │                    ▼                                          ▼
//! AwaitingNextSibling ◄── Failed                               AttachingToParent
//!        ▲                                                               │
//!        └───────────────────────────────────────────────────────────────┤
//!                                                                        ▼
//!                                                                      Done (root closed)
//! ```
//!
//! A child is resolved in two steps: the parent may claim it as an
//! intrinsic child ([`Extension::child_element`]); otherwise, if the parent
//! has an extension point, the profile is asked for a descriptor under the
//! parent's type. Any failure aborts the whole document.

use std::sync::Arc;
use tracing::{debug, trace};

use super::event::{EventSource, StartTag, XmlEvent};
use super::options::ParseOptions;
use crate::base::QName;
use crate::model::{
    Extension, ExtensionDescriptor, ExtensionKind, ExtensionProfile, ModelError, downcast,
};

/// Where the parser is within the current element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    AwaitingStartTag,
    ResolvingDescriptor,
    ConstructingChild,
    RecursingIntoChild,
    AttachingToParent,
    AwaitingNextSibling,
    Done,
    Failed,
}

/// How a finished child joins its parent.
enum Attach {
    /// Claimed by the parent through `child_element`.
    Intrinsic,
    /// Dispatched through the profile.
    Extension(Arc<ExtensionDescriptor>),
}

struct Frame {
    /// Name as it appeared in the start tag.
    name: QName,
    value: Box<dyn Extension>,
    attach: Attach,
}

/// Parses documents against one profile.
pub struct Parser<'p> {
    profile: &'p ExtensionProfile,
    options: ParseOptions,
    state: ParseState,
}

impl<'p> Parser<'p> {
    pub fn new(profile: &'p ExtensionProfile) -> Self {
        Self::with_options(profile, ParseOptions::default())
    }

    pub fn with_options(profile: &'p ExtensionProfile, options: ParseOptions) -> Self {
        Self {
            profile,
            options,
            state: ParseState::AwaitingStartTag,
        }
    }

    /// State after the last call. `Done` on success, `Failed` on error.
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Parse a document whose root is a `T`.
    pub fn parse<T: ExtensionKind>(&mut self, source: impl EventSource) -> Result<T, ModelError> {
        let value = self.parse_into(source, Box::new(T::default()))?;
        downcast::<T>(value).ok_or_else(|| {
            ModelError::invalid_document(format!("root did not parse into {}", T::qname()))
        })
    }

    /// Parse a document into `root`, an empty value of the root type.
    pub fn parse_into(
        &mut self,
        mut source: impl EventSource,
        root: Box<dyn Extension>,
    ) -> Result<Box<dyn Extension>, ModelError> {
        self.state = ParseState::AwaitingStartTag;
        let result = self.run(&mut source, root);
        if result.is_err() {
            self.transition(ParseState::Failed);
        }
        result
    }

    fn transition(&mut self, next: ParseState) {
        trace!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn run(
        &mut self,
        source: &mut impl EventSource,
        mut root: Box<dyn Extension>,
    ) -> Result<Box<dyn Extension>, ModelError> {
        let tag = self.root_tag(source)?;
        if self.options.check_root_name && tag.name != root.element_name() {
            return Err(ModelError::invalid_document(format!(
                "expected root {}, found {}",
                root.element_name(),
                tag.name
            )));
        }
        for attribute in &tag.attributes {
            root.process_attribute(attribute)?;
        }
        let root_name = tag.name;
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            let Some(event) = source.next_event()? else {
                let open = stack.last().map_or(&root_name, |frame| &frame.name);
                return Err(ModelError::UnexpectedEof(open.clone()));
            };

            match event {
                XmlEvent::Start(tag) => {
                    if stack.len() + 1 >= self.options.max_depth {
                        return Err(ModelError::DepthExceeded(self.options.max_depth));
                    }
                    let frame = self.open_child(current(&mut root, &mut stack), tag)?;
                    stack.push(frame);
                }
                XmlEvent::Text(text) => {
                    let target = current(&mut root, &mut stack);
                    match target.process_text(&text) {
                        Err(ModelError::Invalid { kind: "content", .. })
                            if self.options.allow_text_in_containers =>
                        {
                            trace!("dropping text in {}", target.element_name());
                        }
                        other => other?,
                    }
                }
                XmlEvent::End(name) => match stack.pop() {
                    Some(frame) => {
                        self.close_child(current(&mut root, &mut stack), frame, &name)?;
                    }
                    None => {
                        check_end_tag(&root_name, &name)?;
                        self.finish(&mut *root)?;
                        self.trailing(source)?;
                        self.transition(ParseState::Done);
                        return Ok(root);
                    }
                },
            }
        }
    }

    /// Skip leading whitespace and return the root start tag.
    fn root_tag(&mut self, source: &mut impl EventSource) -> Result<StartTag, ModelError> {
        loop {
            match source.next_event()? {
                Some(XmlEvent::Start(tag)) => return Ok(tag),
                Some(XmlEvent::Text(text)) if text.trim().is_empty() => continue,
                Some(other) => {
                    return Err(ModelError::invalid_document(format!(
                        "expected a start tag, found {other:?}"
                    )));
                }
                None => return Err(ModelError::invalid_document("empty document")),
            }
        }
    }

    fn open_child(
        &mut self,
        parent: &dyn Extension,
        tag: StartTag,
    ) -> Result<Frame, ModelError> {
        self.transition(ParseState::ResolvingDescriptor);
        let (mut value, attach) = self.resolve_child(parent, &tag.name)?;

        self.transition(ParseState::ConstructingChild);
        for attribute in &tag.attributes {
            value.process_attribute(attribute)?;
        }

        self.transition(ParseState::RecursingIntoChild);
        Ok(Frame {
            name: tag.name,
            value,
            attach,
        })
    }

    fn resolve_child(
        &self,
        parent: &dyn Extension,
        name: &QName,
    ) -> Result<(Box<dyn Extension>, Attach), ModelError> {
        if let Some(child) = parent.child_element(name) {
            trace!("{name} claimed by {}", parent.element_name());
            return Ok((child, Attach::Intrinsic));
        }
        if parent.extension_point().is_some() {
            if let Some(descriptor) = self.profile.resolve(parent.type_key(), name) {
                if descriptor.is_opaque() {
                    debug!("capturing {name} in {} as opaque content", parent.type_key());
                }
                return Ok((descriptor.construct(name), Attach::Extension(descriptor)));
            }
        }
        Err(ModelError::undeclared(parent.type_key().to_string(), name.clone()))
    }

    fn close_child(
        &mut self,
        parent: &mut dyn Extension,
        mut frame: Frame,
        end: &QName,
    ) -> Result<(), ModelError> {
        check_end_tag(&frame.name, end)?;
        self.finish(&mut *frame.value)?;

        self.transition(ParseState::AttachingToParent);
        match frame.attach {
            Attach::Intrinsic => parent.accept_child(frame.value)?,
            Attach::Extension(descriptor) => {
                let parent_name = parent.element_name();
                let point = parent.extension_point_mut()?.ok_or_else(|| {
                    ModelError::invalid_content(format!("{parent_name} has no extension point"))
                })?;
                point.attach(&descriptor, frame.value)?;
            }
        }
        self.transition(ParseState::AwaitingNextSibling);
        Ok(())
    }

    /// End-of-element validation: the value's own checks, then required
    /// extensions from the profile.
    fn finish(&self, value: &mut dyn Extension) -> Result<(), ModelError> {
        value.process_end()?;
        if let Some(point) = value.extension_point() {
            if let Some(missing) = self
                .profile
                .required(value.type_key())
                .find(|descriptor| !point.contains_key(descriptor.target()))
            {
                return Err(ModelError::missing_element(
                    value.element_name(),
                    missing.name(),
                ));
            }
        }
        Ok(())
    }

    fn trailing(&self, source: &mut impl EventSource) -> Result<(), ModelError> {
        while let Some(event) = source.next_event()? {
            match event {
                XmlEvent::Text(text) if text.trim().is_empty() => {}
                other => {
                    return Err(ModelError::invalid_document(format!(
                        "content after root element: {other:?}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn current<'a>(root: &'a mut Box<dyn Extension>, stack: &'a mut [Frame]) -> &'a mut dyn Extension {
    match stack.last_mut() {
        Some(frame) => &mut *frame.value,
        None => &mut **root,
    }
}

fn check_end_tag(open: &QName, end: &QName) -> Result<(), ModelError> {
    if open == end {
        Ok(())
    } else {
        Err(ModelError::invalid_document(format!(
            "end tag {end} does not close {open}"
        )))
    }
}

/// Parse a document rooted at `T` with default options.
pub fn parse<T: ExtensionKind>(
    profile: &ExtensionProfile,
    source: impl EventSource,
) -> Result<T, ModelError> {
    Parser::new(profile).parse(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::TypeKey;
    use crate::model::{Attribute, Content, ExtensionPoint};
    use crate::xml::event::EventBuffer;
    use std::borrow::Cow;

    const NS: &str = "urn:test";

    fn q(local: &str) -> QName {
        QName::new(NS, local)
    }

    #[derive(Clone, Debug, Default)]
    struct Doc {
        point: ExtensionPoint,
    }

    impl Extension for Doc {
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

    impl ExtensionKind for Doc {
        const NAMESPACE: &'static str = NS;
        const LOCAL_NAME: &'static str = "doc";

        fn declare_extensions(profile: &mut ExtensionProfile) -> Result<(), ModelError> {
            profile.declare_for::<Doc, Note>()?;
            profile.declare_for::<Doc, Tag>()
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Note {
        text: String,
    }

    impl Extension for Note {
        fn element_name(&self) -> QName {
            Self::qname()
        }

        fn process_text(&mut self, text: &str) -> Result<(), ModelError> {
            self.text.push_str(text);
            Ok(())
        }

        fn content(&self) -> Vec<Content<'_>> {
            vec![Content::Text(Cow::Borrowed(&self.text))]
        }
    }

    impl ExtensionKind for Note {
        const NAMESPACE: &'static str = NS;
        const LOCAL_NAME: &'static str = "note";
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Tag {
        value: String,
    }

    impl Extension for Tag {
        fn element_name(&self) -> QName {
            Self::qname()
        }

        fn attributes(&self) -> Vec<Attribute> {
            vec![Attribute::new("v", self.value.as_str())]
        }

        fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
            if attribute.is("v") {
                self.value = attribute.value.clone();
            }
            Ok(())
        }

        fn process_end(&mut self) -> Result<(), ModelError> {
            if self.value.is_empty() {
                return Err(ModelError::missing_attribute(Self::qname(), "v"));
            }
            Ok(())
        }
    }

    impl ExtensionKind for Tag {
        const NAMESPACE: &'static str = NS;
        const LOCAL_NAME: &'static str = "tag";
        const REPEATABLE: bool = true;
    }

    fn profile() -> ExtensionProfile {
        ExtensionProfile::for_root::<Doc>().unwrap()
    }

    fn document(children: Vec<XmlEvent>) -> EventBuffer {
        std::iter::once(XmlEvent::start(q("doc")))
            .chain(children)
            .chain(std::iter::once(XmlEvent::end(q("doc"))))
            .collect()
    }

    fn tag(value: &str) -> Vec<XmlEvent> {
        vec![
            XmlEvent::Start(StartTag::new(q("tag")).with_attribute("v", value)),
            XmlEvent::end(q("tag")),
        ]
    }

    #[test]
    fn test_parse_declared_children() {
        let profile = profile();
        let mut events = vec![
            XmlEvent::start(q("note")),
            XmlEvent::text("hello"),
            XmlEvent::end(q("note")),
        ];
        events.extend(tag("a"));
        events.extend(tag("b"));

        let mut parser = Parser::new(&profile);
        let doc: Doc = parser.parse(document(events)).unwrap();

        assert_eq!(parser.state(), ParseState::Done);
        assert_eq!(doc.point.extension::<Note>().unwrap().text, "hello");
        let tags: Vec<_> = doc
            .point
            .repeating_extension::<Tag>()
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(tags, vec!["a", "b"]);
    }

    #[test]
    fn test_undeclared_element_fails() {
        let profile = profile();
        let events = vec![XmlEvent::start(q("mystery")), XmlEvent::end(q("mystery"))];

        let mut parser = Parser::new(&profile);
        let err = parser.parse::<Doc>(document(events)).unwrap_err();

        assert!(matches!(
            err,
            ModelError::UndeclaredExtension { ref name, .. } if name == &q("mystery")
        ));
        assert_eq!(parser.state(), ParseState::Failed);
    }

    #[test]
    fn test_arbitrary_extension_captured_as_opaque() {
        let mut profile = profile();
        profile.declare_arbitrary_extension(TypeKey::of::<Doc>());
        let other = QName::new("urn:other", "thing");
        let events = vec![
            XmlEvent::Start(StartTag::new(other.clone()).with_attribute("k", "v")),
            XmlEvent::text("body"),
            XmlEvent::end(other.clone()),
        ];

        let doc: Doc = parse(&profile, document(events)).unwrap();
        let captured: Vec<_> = doc.point.opaque().collect();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].name(), &other);
        assert_eq!(captured[0].text(), "body");
    }

    #[test]
    fn test_missing_attribute_reported() {
        let profile = profile();
        let events = vec![XmlEvent::start(q("tag")), XmlEvent::end(q("tag"))];
        let err = parse::<Doc>(&profile, document(events)).unwrap_err();
        assert!(matches!(err, ModelError::RequiredFieldMissing { .. }));
    }

    #[test]
    fn test_repeated_singleton_rejected() {
        let profile = profile();
        let note = || vec![XmlEvent::start(q("note")), XmlEvent::end(q("note"))];
        let events = note().into_iter().chain(note()).collect();
        let err = parse::<Doc>(&profile, document(events)).unwrap_err();
        assert!(matches!(err, ModelError::Cardinality { .. }));
    }

    #[test]
    fn test_truncated_document() {
        let profile = profile();
        let events: EventBuffer = vec![XmlEvent::start(q("doc")), XmlEvent::start(q("note"))]
            .into_iter()
            .collect();
        let err = parse::<Doc>(&profile, events).unwrap_err();
        assert!(matches!(err, ModelError::UnexpectedEof(ref name) if name == &q("note")));
    }

    #[test]
    fn test_mismatched_end_tag() {
        let profile = profile();
        let events = vec![XmlEvent::start(q("note")), XmlEvent::end(q("tag"))];
        assert!(parse::<Doc>(&profile, document(events)).is_err());
    }

    #[test]
    fn test_depth_limit() {
        let profile = profile();
        let mut parser = Parser::with_options(&profile, ParseOptions::default().with_max_depth(1));
        let err = parser.parse::<Doc>(document(tag("a"))).unwrap_err();
        assert!(matches!(err, ModelError::DepthExceeded(1)));
    }

    #[test]
    fn test_root_name_checked() {
        let profile = profile();
        let events: EventBuffer = vec![XmlEvent::start(q("other")), XmlEvent::end(q("other"))]
            .into_iter()
            .collect();
        assert!(parse::<Doc>(&profile, events.clone()).is_err());

        let mut lenient = Parser::with_options(&profile, ParseOptions::lenient());
        assert!(lenient.parse::<Doc>(events).is_ok());
    }

    #[test]
    fn test_stray_text_in_container() {
        let profile = profile();
        let events = vec![XmlEvent::text("stray")];
        assert!(parse::<Doc>(&profile, document(events.clone())).is_err());

        let mut lenient = Parser::with_options(&profile, ParseOptions::lenient());
        assert!(lenient.parse::<Doc>(document(events)).is_ok());
    }
}
