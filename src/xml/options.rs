//! Parse and generate options

/// Options for [`Parser`](super::Parser)
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Maximum element nesting, root included
    pub max_depth: usize,
    /// Require the root element name to match the root type
    pub check_root_name: bool,
    /// Drop stray text inside elements that do not take text (instead of failing)
    pub allow_text_in_containers: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            check_root_name: true,
            allow_text_in_containers: false,
        }
    }
}

impl ParseOptions {
    /// Options that accept any root element and ignore stray text
    pub fn lenient() -> Self {
        Self {
            check_root_name: false,
            allow_text_in_containers: true,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Options for [`Generator`](super::Generator) and the XML writer
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Fail on attached extensions the profile does not declare for their parent
    pub validate_declarations: bool,
    /// Spaces per indentation level (`None` = no pretty printing)
    pub indent: Option<usize>,
    /// Write an `<?xml ...?>` declaration
    pub xml_declaration: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            validate_declarations: false,
            indent: Some(2),
            xml_declaration: true,
        }
    }
}

impl GenerateOptions {
    /// Options that check every extension against the profile
    pub fn strict() -> Self {
        Self {
            validate_declarations: true,
            ..Self::default()
        }
    }

    /// Single-line output without declaration
    pub fn compact() -> Self {
        Self {
            indent: None,
            xml_declaration: false,
            ..Self::default()
        }
    }
}
