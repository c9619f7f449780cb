//! Declaration macros for small leaf extensions.
//!
//! - `value_construct!` - one required `value` attribute, e.g.
//!   `<gd:eventStatus value="...#event.confirmed"/>`
//! - `text_construct!` - required text content, e.g.
//!   `<gphoto:id>5312</gphoto:id>`

/// Define a singleton extension carrying one required `value` attribute.
macro_rules! value_construct {
    (
        $(#[$meta:meta])*
        $name:ident: $ns:expr, $local:literal;
        $($(#[$cmeta:meta])* $constant:ident = $value:literal),* $(,)?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name {
            value: String,
        }

        impl $name {
            $($(#[$cmeta])* pub const $constant: &'static str = $value;)*

            pub fn new(value: impl Into<String>) -> Self {
                Self {
                    value: value.into(),
                }
            }

            pub fn value(&self) -> &str {
                &self.value
            }
        }

        impl $crate::model::Extension for $name {
            fn element_name(&self) -> $crate::base::QName {
                <Self as $crate::model::ExtensionKind>::qname()
            }

            fn attributes(&self) -> Vec<$crate::model::Attribute> {
                vec![$crate::model::Attribute::new("value", self.value.as_str())]
            }

            fn process_attribute(
                &mut self,
                attribute: &$crate::model::Attribute,
            ) -> Result<(), $crate::model::ModelError> {
                if attribute.is("value") {
                    self.value = attribute.value.clone();
                }
                Ok(())
            }

            fn process_end(&mut self) -> Result<(), $crate::model::ModelError> {
                if self.value.is_empty() {
                    return Err($crate::model::ModelError::missing_attribute(
                        <Self as $crate::model::ExtensionKind>::qname(),
                        "value",
                    ));
                }
                Ok(())
            }
        }

        impl $crate::model::ExtensionKind for $name {
            const NAMESPACE: &'static str = $ns;
            const LOCAL_NAME: &'static str = $local;
        }
    };
}

/// Define a singleton extension whose payload is its text content.
macro_rules! text_construct {
    (
        $(#[$meta:meta])*
        $name:ident: $ns:expr, $local:literal
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name {
            text: String,
        }

        impl $name {
            pub fn new(text: impl Into<String>) -> Self {
                Self { text: text.into() }
            }

            pub fn text(&self) -> &str {
                &self.text
            }
        }

        impl $crate::model::Extension for $name {
            fn element_name(&self) -> $crate::base::QName {
                <Self as $crate::model::ExtensionKind>::qname()
            }

            fn process_text(&mut self, text: &str) -> Result<(), $crate::model::ModelError> {
                self.text.push_str(text);
                Ok(())
            }

            fn content(&self) -> Vec<$crate::model::Content<'_>> {
                vec![$crate::model::Content::Text(std::borrow::Cow::Borrowed(&self.text))]
            }

            fn process_end(&mut self) -> Result<(), $crate::model::ModelError> {
                if self.text.trim().is_empty() {
                    return Err($crate::model::ModelError::RequiredFieldMissing {
                        element: <Self as $crate::model::ExtensionKind>::qname(),
                        field: "text content".to_string(),
                    });
                }
                Ok(())
            }
        }

        impl $crate::model::ExtensionKind for $name {
            const NAMESPACE: &'static str = $ns;
            const LOCAL_NAME: &'static str = $local;
        }
    };
}

pub(crate) use {text_construct, value_construct};

/// Parse a numeric attribute value.
pub(crate) fn parse_number<T: std::str::FromStr>(
    element: &str,
    attribute: &crate::model::Attribute,
) -> Result<T, crate::model::ModelError> {
    attribute.value.trim().parse().map_err(|_| {
        crate::model::ModelError::invalid_attribute(format!(
            "{element}/@{}: '{}' is not a valid number",
            attribute.name.local_name(),
            attribute.value
        ))
    })
}

/// Parse an `xs:boolean` attribute value.
pub(crate) fn parse_bool(
    element: &str,
    attribute: &crate::model::Attribute,
) -> Result<bool, crate::model::ModelError> {
    match attribute.value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(crate::model::ModelError::invalid_attribute(format!(
            "{element}/@{}: '{other}' is not a boolean",
            attribute.name.local_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attribute, Extension, ExtensionKind, ModelError};

    value_construct! {
        Mode: "urn:test", "mode";
        ON = "urn:test#on",
    }

    text_construct! {
        Label: "urn:test", "label"
    }

    #[test]
    fn test_value_construct() {
        let mut mode = Mode::default();
        mode.process_attribute(&Attribute::new("value", Mode::ON))
            .unwrap();
        mode.process_end().unwrap();
        assert_eq!(mode.value(), "urn:test#on");
        assert_eq!(mode.attributes(), vec![Attribute::new("value", Mode::ON)]);
        assert_eq!(Mode::qname().local_name(), "mode");
    }

    #[test]
    fn test_value_construct_requires_value() {
        assert!(matches!(
            Mode::default().process_end(),
            Err(ModelError::RequiredFieldMissing { .. })
        ));
    }

    #[test]
    fn test_text_construct() {
        let mut label = Label::default();
        assert!(label.process_end().is_err());
        label.process_text("hello").unwrap();
        label.process_end().unwrap();
        assert_eq!(label.text(), "hello");
    }

    #[test]
    fn test_parse_helpers() {
        let good = Attribute::new("width", " 42 ");
        assert_eq!(parse_number::<u32>("media:thumbnail", &good).unwrap(), 42);
        let bad = Attribute::new("width", "wide");
        assert!(parse_number::<u32>("media:thumbnail", &bad).is_err());
        assert!(parse_bool("x", &Attribute::new("isDefault", "true")).unwrap());
        assert!(parse_bool("x", &Attribute::new("isDefault", "yes")).is_err());
    }
}
