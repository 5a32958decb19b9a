//! Document model and resolver.
//!
//! [`Parser::parse_document`] reads every indirect object into an
//! [`ObjectTable`] until the input ends or an `xref` keyword appears, in which
//! case the xref section and trailer are parsed and reading stops. The catalog
//! and the flat page list are then derived on request with
//! [`Document::resolve_catalog`] and [`Document::resolve_pages`].

use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::object::{Dictionary, IndirectObject, ObjectRef, Value};
use crate::object_table::ObjectTable;
use crate::parser::Parser;
use crate::parser_config::ParserOptions;
use crate::token::{keywords, markers, Token};
use crate::xref::CrossRefTable;
use std::collections::HashSet;
use std::io::Read;

/// A parsed document.
///
/// # Example
///
/// ```
/// use pdf_skeleton::document::Document;
///
/// let input = b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
/// 2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj
/// 3 0 obj << /Type /Page /Parent 2 0 R >> endobj
/// xref
/// 0 1
/// 0000000000 65535 f
/// trailer
/// << /Size 4 /Root 1 0 R >>";
///
/// let mut doc = Document::parse(&input[..])?;
/// doc.resolve_catalog()?;
/// doc.resolve_pages()?;
/// assert_eq!(doc.page_count(), 1);
/// # Ok::<(), pdf_skeleton::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// All indirect objects read from the input
    objects: ObjectTable,
    /// Cross-reference table, if the input had an xref section
    xref: Option<CrossRefTable>,
    /// Trailer dictionary, if the input had an xref section
    trailer: Option<Dictionary>,
    /// Catalog reference, set by `resolve_catalog`
    catalog: Option<ObjectRef>,
    /// Page objects in document order, set by `resolve_pages`
    pages: Vec<ObjectRef>,
    /// Options the document was parsed with
    options: ParserOptions,
}

impl<R: Read> Parser<R> {
    /// Parse a whole document: indirect objects, then an optional xref section
    /// and trailer.
    ///
    /// Reading stops after the trailer. Anything following it is logged and
    /// ignored.
    ///
    /// # Errors
    ///
    /// Any error from [`parse_indirect_object`](Self::parse_indirect_object),
    /// [`parse_xref_table`](Self::parse_xref_table) or
    /// [`parse_trailer`](Self::parse_trailer) aborts the parse.
    pub fn parse_document(&mut self) -> Result<Document> {
        let mut objects = ObjectTable::new();

        loop {
            let (tok, offset) = self.next()?;
            match tok {
                Token::Eof => {
                    log::debug!("End of input after {} objects, no xref section", objects.len());
                    return Ok(Document::new(objects, None, None, *self.options()));
                },
                Token::Keyword(k) if k == keywords::XREF => {
                    log::debug!(
                        "Found xref at byte {} after {} objects, switching to xref mode",
                        offset,
                        objects.len()
                    );
                    self.unread(Token::Keyword(k), offset);
                    break;
                },
                tok => {
                    let object = self.parse_indirect_object_from(tok, offset, &objects)?;
                    objects.add(object);
                },
            }
        }

        let xref = self.parse_xref_table()?;
        let trailer = self.parse_trailer()?;
        self.log_trailing_data();

        Ok(Document::new(objects, Some(xref), Some(trailer), *self.options()))
    }

    fn log_trailing_data(&mut self) {
        match self.next() {
            Ok((Token::Eof, _)) => {},
            Ok((tok, offset)) if tok.is_keyword(keywords::STARTXREF) => {
                log::debug!("Ignoring startxref footer at byte {}", offset);
            },
            Ok((tok, offset)) => {
                log::warn!("Ignoring data after trailer at byte {}: {}", offset, tok);
            },
            Err(e) => log::warn!("Ignoring unreadable data after trailer: {}", e),
        }
    }
}

impl Document {
    pub(crate) fn new(
        objects: ObjectTable,
        xref: Option<CrossRefTable>,
        trailer: Option<Dictionary>,
        options: ParserOptions,
    ) -> Self {
        Self {
            objects,
            xref,
            trailer,
            catalog: None,
            pages: Vec::new(),
            options,
        }
    }

    /// Parse a document from any byte source with default options.
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        Self::parse_with_options(reader, ParserOptions::default())
    }

    /// Parse a document from any byte source with custom options.
    pub fn parse_with_options<R: Read>(reader: R, options: ParserOptions) -> Result<Self> {
        Parser::with_options(Lexer::new(reader), options).parse_document()
    }

    /// All parsed indirect objects.
    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    /// The cross-reference table, if present.
    pub fn xref(&self) -> Option<&CrossRefTable> {
        self.xref.as_ref()
    }

    /// The trailer dictionary, if present.
    pub fn trailer(&self) -> Option<&Dictionary> {
        self.trailer.as_ref()
    }

    /// Options used for parsing and resolution.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// The catalog reference, once resolved.
    pub fn catalog(&self) -> Option<ObjectRef> {
        self.catalog
    }

    /// Page object references in document order, once resolved.
    pub fn pages(&self) -> &[ObjectRef] {
        &self.pages
    }

    /// Number of resolved pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Resolved page objects in document order.
    ///
    /// Yields one object per entry of [`Document::pages`]. Every page reference
    /// was looked up in the object table by [`Document::resolve_pages`], and the
    /// table never shrinks, so no entry is skipped. Empty until pages are resolved.
    pub fn page_objects(&self) -> impl Iterator<Item = &IndirectObject> + '_ {
        self.pages.iter().filter_map(|r| self.objects.get_ref(*r))
    }

    /// Look up an indirect object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ObjectNotFound`] if no object has this number and generation.
    pub fn get(&self, obj_ref: ObjectRef) -> Result<&IndirectObject> {
        self.objects
            .get_ref(obj_ref)
            .ok_or(Error::ObjectNotFound(obj_ref.id, obj_ref.gen))
    }

    /// Follow a chain of references to a direct value.
    ///
    /// Non-reference values are returned unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::ObjectNotFound`] for a dangling reference
    /// - [`Error::CircularReference`] if the chain loops
    pub fn resolve<'a>(&'a self, value: &'a Value) -> Result<&'a Value> {
        let mut current = value;
        let mut visited = HashSet::new();

        while let Value::Reference(obj_ref) = current {
            if !visited.insert(*obj_ref) {
                return Err(Error::CircularReference(*obj_ref));
            }
            current = &self.get(*obj_ref)?.value;
        }

        Ok(current)
    }

    /// Resolve the trailer's `/Root` to the catalog.
    ///
    /// The document is only modified on success.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingTrailer`] if the input had no trailer
    /// - [`Error::MissingRoot`] if the trailer has no `/Root`
    /// - [`Error::InvalidRoot`] if `/Root` is not an indirect reference
    /// - [`Error::ObjectNotFound`] if the referenced object was never parsed
    pub fn resolve_catalog(&mut self) -> Result<ObjectRef> {
        let trailer = self.trailer.as_ref().ok_or(Error::MissingTrailer)?;

        let root = match trailer.get("Root") {
            Some(Value::Reference(r)) => *r,
            Some(other) => {
                return Err(Error::InvalidRoot {
                    found: other.type_name(),
                })
            },
            None => return Err(Error::MissingRoot),
        };

        self.get(root)?;
        log::debug!("Resolved catalog {}", root);
        self.catalog = Some(root);
        Ok(root)
    }

    /// Flatten the page tree into the ordered page list.
    ///
    /// Resolves the catalog first if that has not happened yet. Kids are
    /// visited depth-first in `/Kids` order, so the result is in document
    /// order. The document is only modified on success.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidObjectType`] if the catalog or a node is not a
    ///   dictionary, `/Pages` is not a reference, or `/Kids` is not an array of
    ///   references
    /// - [`Error::InvalidPageTreeNode`] if a node's `/Type` is missing or is
    ///   neither `/Pages` nor `/Page`
    /// - [`Error::CircularReference`] if a node is its own ancestor (with cycle
    ///   detection enabled)
    /// - [`Error::RecursionLimitExceeded`] past `max_page_tree_depth`
    pub fn resolve_pages(&mut self) -> Result<&[ObjectRef]> {
        let catalog_ref = match self.catalog {
            Some(r) => r,
            None => self.resolve_catalog()?,
        };

        let catalog = self.get(catalog_ref)?;
        let catalog_dict = catalog.value.as_dict().ok_or_else(|| Error::InvalidObjectType {
            expected: "Dictionary for catalog".to_string(),
            found: catalog.value.type_name().to_string(),
        })?;

        let root = match catalog_dict.get("Pages") {
            Some(Value::Reference(r)) => *r,
            other => {
                return Err(Error::InvalidObjectType {
                    expected: "Reference for /Pages".to_string(),
                    found: other.map_or("nothing", Value::type_name).to_string(),
                })
            },
        };

        log::debug!("Walking page tree from {}", root);
        let mut pages = Vec::new();
        let mut ancestors = HashSet::new();
        self.collect_pages(root, 0, &mut ancestors, &mut pages)?;
        log::debug!("Page tree walk found {} pages", pages.len());

        self.pages = pages;
        Ok(&self.pages)
    }

    fn collect_pages(
        &self,
        node_ref: ObjectRef,
        depth: u32,
        ancestors: &mut HashSet<ObjectRef>,
        pages: &mut Vec<ObjectRef>,
    ) -> Result<()> {
        if depth >= self.options.max_page_tree_depth {
            return Err(Error::RecursionLimitExceeded(self.options.max_page_tree_depth));
        }
        if self.options.detect_page_tree_cycles && !ancestors.insert(node_ref) {
            return Err(Error::CircularReference(node_ref));
        }

        let node = self.get(node_ref)?;
        let node_dict = node.value.as_dict().ok_or_else(|| Error::InvalidObjectType {
            expected: "Dictionary for page tree node".to_string(),
            found: node.value.type_name().to_string(),
        })?;

        match node_dict.get("Type") {
            Some(Value::Name(t)) if t == markers::PAGES => {
                let kids = match node_dict.get("Kids") {
                    Some(Value::Array(kids)) => kids,
                    other => {
                        return Err(Error::InvalidObjectType {
                            expected: format!("Array for /Kids of {}", node_ref),
                            found: other.map_or("nothing", Value::type_name).to_string(),
                        })
                    },
                };

                for kid in kids {
                    let kid_ref = kid.as_reference().ok_or_else(|| Error::InvalidObjectType {
                        expected: format!("Reference in /Kids of {}", node_ref),
                        found: kid.type_name().to_string(),
                    })?;
                    self.collect_pages(kid_ref, depth + 1, ancestors, pages)?;
                }
            },
            Some(Value::Name(t)) if t == markers::PAGE => {
                log::trace!("Page {} at depth {}", node_ref, depth);
                pages.push(node_ref);
            },
            Some(Value::Name(t)) => {
                return Err(Error::InvalidPageTreeNode {
                    node: node_ref,
                    found: format!("/{}", t),
                })
            },
            Some(other) => {
                return Err(Error::InvalidPageTreeNode {
                    node: node_ref,
                    found: other.type_name().to_string(),
                })
            },
            None => {
                return Err(Error::InvalidPageTreeNode {
                    node: node_ref,
                    found: "missing".to_string(),
                })
            },
        }

        if self.options.detect_page_tree_cycles {
            ancestors.remove(&node_ref);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn parse(input: &[u8]) -> Document {
        Document::parse(input).unwrap()
    }

    fn r(id: u32) -> ObjectRef {
        ObjectRef::new(id, 0)
    }

    const TWO_PAGES: &[u8] = b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R >> endobj
4 0 obj << /Type /Page /Parent 2 0 R >> endobj
xref
0 5
0000000000 65535 f
0000000010 00000 n
0000000060 00000 n
0000000130 00000 n
0000000180 00000 n
trailer
<< /Size 5 /Root 1 0 R >>
startxref
230
%%EOF
";

    // ========================================================================
    // Document Parsing
    // ========================================================================

    #[test]
    fn test_parse_document_with_xref() {
        let doc = parse(TWO_PAGES);
        assert_eq!(doc.objects().len(), 4);
        assert_eq!(doc.xref().unwrap().len(), 5);
        assert_eq!(doc.trailer().unwrap()["Root"], Value::Reference(r(1)));
        assert!(doc.catalog().is_none());
        assert!(doc.pages().is_empty());
    }

    #[test]
    fn test_parse_document_without_xref() {
        let doc = parse(b"1 0 obj null endobj 2 0 obj true endobj");
        assert_eq!(doc.objects().len(), 2);
        assert!(doc.xref().is_none());
        assert!(doc.trailer().is_none());
    }

    #[test]
    fn test_parse_empty_document() {
        let doc = parse(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        assert!(doc.objects().is_empty());
    }

    #[test]
    fn test_parse_document_stops_after_trailer() {
        let doc = parse(b"1 0 obj null endobj xref 0 0 trailer << /Root 1 0 R >> 2 0 obj null endobj");
        assert_eq!(doc.objects().len(), 1);
    }

    #[test]
    fn test_parse_document_error_aborts() {
        let err = Document::parse(&b"1 0 obj [1 2 endobj"[..]).unwrap_err();
        assert!(matches!(err, Error::Object { id: 1, .. }));
    }

    #[test]
    fn test_parse_document_forward_length_reference() {
        let input = b"1 0 obj << /Length 2 0 R >> stream\nabc\nendstream endobj 2 0 obj 3 endobj";
        let err = Document::parse(&input[..]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Resolution);
    }

    #[test]
    fn test_parse_document_backward_length_reference() {
        let input = b"2 0 obj 3 endobj 1 0 obj << /Length 2 0 R >> stream\nabc\nendstream endobj";
        let doc = parse(input);
        let stream = doc.get(r(1)).unwrap().value.as_stream().unwrap();
        assert_eq!(&stream.data[..], b"abc");
    }

    #[test]
    fn test_parse_document_redefined_object_last_wins() {
        let doc = parse(b"1 0 obj 1 endobj 1 0 obj 2 endobj");
        assert_eq!(doc.get(r(1)).unwrap().value, Value::Number(2.0));
    }

    // ========================================================================
    // Catalog Resolution
    // ========================================================================

    #[test]
    fn test_resolve_catalog() {
        let mut doc = parse(TWO_PAGES);
        assert_eq!(doc.resolve_catalog().unwrap(), r(1));
        assert_eq!(doc.catalog(), Some(r(1)));
    }

    #[test]
    fn test_resolve_catalog_missing_trailer() {
        let mut doc = parse(b"1 0 obj << /Type /Catalog >> endobj");
        assert!(matches!(doc.resolve_catalog(), Err(Error::MissingTrailer)));
    }

    #[test]
    fn test_resolve_catalog_missing_root_leaves_state() {
        let mut doc = parse(b"1 0 obj << >> endobj xref 0 0 trailer << /Size 2 >>");
        assert!(matches!(doc.resolve_catalog(), Err(Error::MissingRoot)));
        assert!(doc.catalog().is_none());
    }

    #[test]
    fn test_resolve_catalog_root_not_reference() {
        let mut doc = parse(b"1 0 obj << >> endobj xref 0 0 trailer << /Root 1 >>");
        assert!(matches!(doc.resolve_catalog(), Err(Error::InvalidRoot { found: "Number" })));
        assert!(doc.catalog().is_none());
    }

    #[test]
    fn test_resolve_catalog_dangling_root() {
        let mut doc = parse(b"1 0 obj << >> endobj xref 0 0 trailer << /Root 9 0 R >>");
        assert!(matches!(doc.resolve_catalog(), Err(Error::ObjectNotFound(9, 0))));
    }

    // ========================================================================
    // Page Tree Resolution
    // ========================================================================

    #[test]
    fn test_resolve_pages_in_kids_order() {
        let mut doc = parse(TWO_PAGES);
        doc.resolve_catalog().unwrap();
        assert_eq!(doc.resolve_pages().unwrap(), &[r(3), r(4)]);
        assert_eq!(doc.page_count(), 2);

        let types: Vec<_> = doc
            .page_objects()
            .map(|p| p.value.as_dict().unwrap()["Type"].clone())
            .collect();
        assert_eq!(types, vec![Value::Name("Page".into()), Value::Name("Page".into())]);
    }

    #[test]
    fn test_page_objects_match_page_refs() {
        let mut doc = parse(TWO_PAGES);
        assert_eq!(doc.page_objects().count(), 0);

        let refs = doc.resolve_pages().unwrap().to_vec();
        let ids: Vec<ObjectRef> = doc.page_objects().map(|p| ObjectRef::new(p.id, p.gen)).collect();
        assert_eq!(ids, refs);
        assert_eq!(doc.page_objects().count(), doc.page_count());
    }

    #[test]
    fn test_resolve_pages_resolves_catalog_on_demand() {
        let mut doc = parse(TWO_PAGES);
        assert_eq!(doc.resolve_pages().unwrap().len(), 2);
        assert_eq!(doc.catalog(), Some(r(1)));
    }

    #[test]
    fn test_resolve_pages_nested_depth_first() {
        let input = b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [5 0 R 3 0 R 6 0 R] >> endobj
3 0 obj << /Type /Pages /Kids [7 0 R 4 0 R] >> endobj
4 0 obj << /Type /Page >> endobj
5 0 obj << /Type /Page >> endobj
6 0 obj << /Type /Page >> endobj
7 0 obj << /Type /Page >> endobj
xref 0 0 trailer << /Root 1 0 R >>";
        let mut doc = parse(input);
        assert_eq!(doc.resolve_pages().unwrap(), &[r(5), r(7), r(4), r(6)]);
    }

    #[test]
    fn test_resolve_pages_shared_kid_is_not_a_cycle() {
        let input = b"1 0 obj << /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R 3 0 R] >> endobj
3 0 obj << /Type /Page >> endobj
xref 0 0 trailer << /Root 1 0 R >>";
        let mut doc = parse(input);
        assert_eq!(doc.resolve_pages().unwrap(), &[r(3), r(3)]);
    }

    #[test]
    fn test_resolve_pages_unknown_type() {
        let input = b"1 0 obj << /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R] >> endobj
3 0 obj << /Type /Font >> endobj
xref 0 0 trailer << /Root 1 0 R >>";
        let mut doc = parse(input);
        let err = doc.resolve_pages().unwrap_err();
        assert!(matches!(err, Error::InvalidPageTreeNode { node, ref found } if node == r(3) && found == "/Font"));
        assert!(doc.pages().is_empty());
    }

    #[test]
    fn test_resolve_pages_missing_type() {
        let input = b"1 0 obj << /Pages 2 0 R >> endobj
2 0 obj << /Kids [] >> endobj
xref 0 0 trailer << /Root 1 0 R >>";
        let mut doc = parse(input);
        assert!(matches!(
            doc.resolve_pages(),
            Err(Error::InvalidPageTreeNode { found, .. }) if found == "missing"
        ));
    }

    #[test]
    fn test_resolve_pages_kids_not_references() {
        let input = b"1 0 obj << /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3] >> endobj
xref 0 0 trailer << /Root 1 0 R >>";
        let mut doc = parse(input);
        assert!(matches!(doc.resolve_pages(), Err(Error::InvalidObjectType { .. })));
    }

    #[test]
    fn test_resolve_pages_dangling_kid() {
        let input = b"1 0 obj << /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R] >> endobj
xref 0 0 trailer << /Root 1 0 R >>";
        let mut doc = parse(input);
        assert!(matches!(doc.resolve_pages(), Err(Error::ObjectNotFound(3, 0))));
    }

    #[test]
    fn test_resolve_pages_catalog_pages_not_reference() {
        let input = b"1 0 obj << /Pages << /Type /Pages >> >> endobj
xref 0 0 trailer << /Root 1 0 R >>";
        let mut doc = parse(input);
        assert!(matches!(doc.resolve_pages(), Err(Error::InvalidObjectType { .. })));
    }

    const CYCLIC: &[u8] = b"1 0 obj << /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R] >> endobj
3 0 obj << /Type /Pages /Kids [2 0 R] >> endobj
xref 0 0 trailer << /Root 1 0 R >>";

    #[test]
    fn test_resolve_pages_cycle_detected() {
        let mut doc = parse(CYCLIC);
        assert!(matches!(doc.resolve_pages(), Err(Error::CircularReference(node)) if node == r(2)));
    }

    #[test]
    fn test_resolve_pages_cycle_without_detection_hits_depth_limit() {
        let opts = ParserOptions::lenient().with_max_page_tree_depth(10);
        let mut doc = Document::parse_with_options(CYCLIC, opts).unwrap();
        assert!(matches!(doc.resolve_pages(), Err(Error::RecursionLimitExceeded(10))));
    }

    #[test]
    fn test_resolve_pages_failure_keeps_previous_pages() {
        let mut doc = parse(TWO_PAGES);
        doc.resolve_pages().unwrap();

        // Break the tree, then check the earlier result survives a failed walk
        doc.objects.add(IndirectObject::new(4, 0, Value::Null));
        assert!(doc.resolve_pages().is_err());
        assert_eq!(doc.pages(), &[r(3), r(4)]);
    }

    // ========================================================================
    // Reference Resolution
    // ========================================================================

    #[test]
    fn test_resolve_reference_chain() {
        let doc = parse(b"1 0 obj 2 0 R endobj 2 0 obj /Target endobj");
        let value = Value::Reference(r(1));
        assert_eq!(doc.resolve(&value).unwrap(), &Value::Name("Target".into()));

        let direct = Value::Number(1.0);
        assert_eq!(doc.resolve(&direct).unwrap(), &direct);
    }

    #[test]
    fn test_resolve_reference_cycle() {
        let doc = parse(b"1 0 obj 2 0 R endobj 2 0 obj 1 0 R endobj");
        let value = Value::Reference(r(1));
        assert!(matches!(doc.resolve(&value), Err(Error::CircularReference(_))));
    }

    #[test]
    fn test_resolve_dangling_reference() {
        let doc = parse(b"1 0 obj null endobj");
        assert!(matches!(doc.resolve(&Value::Reference(r(5))), Err(Error::ObjectNotFound(5, 0))));
    }
}
