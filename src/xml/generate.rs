//! The generate driver.
//!
//! A direct recursive walk, mirroring the parser:
//!
//! ```text
//! write(value)
//!   start tag (element name + attributes)
//!   content          (text and intrinsic children, in order)
//!   attached extensions, in extension-point order, each via write()
//!   end tag
//! ```

use super::event::{EventBuffer, XmlSink};
use super::options::GenerateOptions;
use crate::model::{Content, Extension, ExtensionProfile, ModelError, OpaqueElement};

/// Writes value trees as token streams.
pub struct Generator<'p> {
    profile: &'p ExtensionProfile,
    options: GenerateOptions,
}

impl<'p> Generator<'p> {
    pub fn new(profile: &'p ExtensionProfile) -> Self {
        Self::with_options(profile, GenerateOptions::default())
    }

    pub fn with_options(profile: &'p ExtensionProfile, options: GenerateOptions) -> Self {
        Self { profile, options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Write `root` and everything attached below it to `sink`.
    pub fn generate(&self, root: &dyn Extension, sink: &mut impl XmlSink) -> Result<(), ModelError> {
        self.write(root, sink)
    }

    /// Write `root` into a fresh [`EventBuffer`].
    pub fn to_events(&self, root: &dyn Extension) -> Result<EventBuffer, ModelError> {
        let mut buffer = EventBuffer::new();
        self.generate(root, &mut buffer)?;
        Ok(buffer)
    }

    fn write(&self, value: &dyn Extension, sink: &mut impl XmlSink) -> Result<(), ModelError> {
        let name = value.element_name();
        sink.start_element(&name, &value.attributes())?;

        for content in value.content() {
            match content {
                Content::Text(text) if text.is_empty() => {}
                Content::Text(text) => sink.text(&text)?,
                Content::Child(child) => self.write(child, sink)?,
            }
        }

        if let Some(point) = value.extension_point() {
            for extension in point.extensions() {
                if self.options.validate_declarations {
                    self.check_declared(value, extension)?;
                }
                self.write(extension, sink)?;
            }
        }

        sink.end_element(&name)
    }

    /// Whether the profile would parse `extension` back under `parent`.
    fn check_declared(
        &self,
        parent: &dyn Extension,
        extension: &dyn Extension,
    ) -> Result<(), ModelError> {
        let name = extension.element_name();
        let declared = self
            .profile
            .resolve(parent.type_key(), &name)
            .is_some_and(|descriptor| {
                descriptor.target() == extension.type_key()
                    || (descriptor.is_opaque() && extension.as_any().is::<OpaqueElement>())
            });
        if declared {
            Ok(())
        } else {
            Err(ModelError::undeclared(parent.type_key().to_string(), name))
        }
    }
}

/// Generate `root` into an [`EventBuffer`] with default options.
pub fn generate(profile: &ExtensionProfile, root: &dyn Extension) -> Result<EventBuffer, ModelError> {
    Generator::new(profile).to_events(root)
}
