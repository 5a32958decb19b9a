/// Parser options for limits and page-tree hardening.
///
/// # Example
///
/// ```
/// use pdf_skeleton::parser_config::ParserOptions;
///
/// // Strict mode - cycle detection on (default)
/// let strict = ParserOptions::strict();
///
/// // Lenient mode - page tree walked without cycle detection
/// let lenient = ParserOptions::lenient();
///
/// // Custom configuration
/// let custom = ParserOptions::default().with_max_nesting(32);
/// assert_eq!(custom.max_nesting, 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Maximum array/dictionary nesting depth (stack overflow protection)
    ///
    /// PDF Spec: ISO 32000-1:2008, Section H.1 - Implementation Limits
    pub max_nesting: usize,

    /// Maximum entry count accepted in one xref subsection header
    pub max_xref_subsection_count: u32,

    /// Maximum page tree depth walked by `resolve_pages`
    pub max_page_tree_depth: u32,

    /// Fail with `CircularReference` when a page tree node is its own ancestor
    pub detect_page_tree_cycles: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl ParserOptions {
    /// Strict mode: all limits and cycle detection enabled.
    pub fn strict() -> Self {
        Self {
            max_nesting: 100, // ISO 32000-1 Annex H recommendation
            max_xref_subsection_count: 1_000_000,
            max_page_tree_depth: 100,
            detect_page_tree_cycles: true,
        }
    }

    /// Lenient mode: no cycle detection, higher limits.
    ///
    /// A cyclic page tree then fails only when `max_page_tree_depth` is hit.
    pub fn lenient() -> Self {
        Self {
            max_nesting: 200,
            max_xref_subsection_count: 10_000_000,
            max_page_tree_depth: 200,
            detect_page_tree_cycles: false,
        }
    }

    /// Set the maximum nesting depth.
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Set the maximum xref subsection entry count.
    pub fn with_max_xref_subsection_count(mut self, count: u32) -> Self {
        self.max_xref_subsection_count = count;
        self
    }

    /// Set the maximum page tree depth.
    pub fn with_max_page_tree_depth(mut self, depth: u32) -> Self {
        self.max_page_tree_depth = depth;
        self
    }

    /// Enable or disable page tree cycle detection.
    pub fn with_cycle_detection(mut self, enable: bool) -> Self {
        self.detect_page_tree_cycles = enable;
        self
    }
}
