//! XML namespace and relationship-type constants for XLSX packages.
//!
//! Both Transitional and Strict relationship URIs are recognized when
//! reading. New parts are always written with the Transitional URIs.

// =============================================================================
// Spreadsheet namespaces
// =============================================================================

/// Office document relationships namespace, bound to the `r:` prefix
pub const NS_OFFICE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

// =============================================================================
// Package namespaces
// =============================================================================

/// Relationships namespace
pub const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

// =============================================================================
// Drawing namespaces
// =============================================================================

/// DrawingML main namespace
pub const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// DrawingML spreadsheet drawing namespace
pub const NS_DRAWING_SPREADSHEET: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";

// =============================================================================
// Relationship types
// =============================================================================

/// Relationship type for the workbook (from root .rels)
pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Relationship type for worksheets
pub const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

/// Relationship type for shared strings
pub const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

/// Relationship type for a worksheet's drawing part
pub const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";

/// Relationship type for images referenced from a drawing
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const REL_WORKSHEET_STRICT: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/worksheet";
const REL_SHARED_STRINGS_STRICT: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/sharedStrings";
const REL_DRAWING_STRICT: &str = "http://purl.oclc.org/ooxml/officeDocument/relationships/drawing";

// =============================================================================
// Content types
// =============================================================================

/// Content type of a spreadsheet drawing part
pub const CT_DRAWING: &str = "application/vnd.openxmlformats-officedocument.drawing+xml";

/// Content type of relationship parts
pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

// =============================================================================
// Relationship type matching
// =============================================================================

pub fn is_worksheet_relationship(rel_type: &str) -> bool {
    rel_type == REL_WORKSHEET || rel_type == REL_WORKSHEET_STRICT || rel_type.ends_with("/worksheet")
}

pub fn is_shared_strings_relationship(rel_type: &str) -> bool {
    rel_type == REL_SHARED_STRINGS
        || rel_type == REL_SHARED_STRINGS_STRICT
        || rel_type.ends_with("/sharedStrings")
}

/// Matches only the DrawingML drawing relationship, not `vmlDrawing`.
pub fn is_drawing_relationship(rel_type: &str) -> bool {
    rel_type == REL_DRAWING || rel_type == REL_DRAWING_STRICT || rel_type.ends_with("/drawing")
}
