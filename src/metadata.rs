//! Metadata mapping from indexed fields to IIIF metadata blocks.
//!
//! The field tables below control both which fields appear and their order in
//! the emitted `metadata` array. Order follows the table, never the row.

use serde::Serialize;

use crate::solr::pager::search_all;
use crate::solr::{BackendError, Row, SearchBackend, SolrQuery};

/// Indexed field name to display label, in display order.
pub const FIELD_CONFIG: &[(&str, &str)] = &[
    ("title_s", "Title"),
    ("other_titles_sm", "Other Titles"),
    ("volume_s", "Volume"),
    // person roles
    ("creators_sm", "Creator"),
    ("contributors_sm", "Contributor"),
    ("authors_sm", "Author"),
    ("composers_sm", "Composer"),
    ("artists_sm", "Artist"),
    ("attributed_artists_sm", "Attributed Artist"),
    ("follower_of_artists_sm", "Artist (Follower of)"),
    ("studio_of_artists_sm", "Artist (Studio of)"),
    ("school_of_artists_sm", "Artist (School of)"),
    ("art_copyists_sm", "Copy by"),
    ("after_artists_sm", "After"),
    ("formerly_attributed_artists_sm", "Formerly Attributed Artist"),
    ("architects_sm", "Architect"),
    ("draughtsmen_sm", "Draughtsman"),
    ("sitters_sm", "Sitter"),
    ("illustrators_sm", "Illustrator"),
    ("publishers_sm", "Publisher"),
    ("printers_sm", "Printer"),
    ("translators_sm", "Translator"),
    ("editors_sm", "Editors"),
    ("scribes_sm", "Scribe"),
    ("commentators_sm", "Commentators"),
    ("annotators_sm", "Annotator"),
    ("arrangers_sm", "Arranger"),
    ("compilers_sm", "Compiler"),
    ("engravers_sm", "Engraver"),
    ("cartographers_sm", "Cartographer"),
    ("surveyors_sm", "Surveyor"),
    ("former_owners_sm", "Former Owner"),
    ("patrons_sm", "Patron"),
    ("photographers_sm", "Photographer"),
    ("photography_studios_sm", "Photography Studio"),
    ("witnesses_sm", "Witness"),
    // end person roles
    ("languages_sm", "Language"),
    ("date_statement_sm", "Date Statement"),
    ("origins_sm", "Place of Origin"),
    ("description_sm", "Description"),
    ("contents_sm", "Contents"),
    ("contents_note_sm", "Contents Note"),
    ("format_sm", "Format"),
    ("materials_sm", "Materials"),
    ("layout_sm", "Layout"),
    ("hands_sm", "Hand"),
    ("inscriptions_sm", "Inscription"),
    ("signed_sm", "Signed"),
    ("counties_sm", "County"),
    ("watermarks_sm", "Watermark"),
    ("musical_notation_sm", "Musical Notation"),
    ("extent_sm", "Extent"),
    ("collation_sm", "Collation"),
    ("scale_sm", "Scale"),
    ("dimensions_sm", "Dimensions"),
    ("decoration_sm", "Decoration"),
    ("binding_sm", "Binding"),
    ("incipits_sm", "Incipit"),
    ("provenance_sm", "Provenance"),
    ("bod_accession_date_sm", "Accession Date"),
    ("bod_accession_source_sm", "Accession Source"),
    ("bod_accession_type_sm", "Accession Type"),
    ("origin_note_sm", "Origin Note"),
    ("exhibition_history_sm", "Exhibited"),
    ("location_note_sm", "Location Note"),
    ("record_origin_sm", "Record Origin"),
    ("collections_sm", "Collection"),
    ("subjects_sm", "Subject"),
    ("catalogue_description_sm", "Catalogue Description"),
    ("catalogue_identifiers_sm", "Catalogue Identifier"),
    ("catalogue_url_smni", "Catalogue Link"),
    ("other_identifiers_sm", "Other Identifier"),
    ("related_items_sm", "Related Items"),
    ("digitization_note_sm", "Digitization note"),
    ("digitization_project_s", "Digitization Project"),
    ("acknowledgements_sm", "Acknowledgements"),
    ("sponsors_sm", "Digitization Sponsor"),
    ("accessioned_dt", "Record Created"),
    ("holding_institution_s", "Holding Institution"),
];

/// Which table a metadata block is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTable {
    /// Manifest-level metadata.
    Object,
    /// Canvases lead with the titles of works on the surface.
    Canvas,
    /// Ranges lead with the image range.
    Works,
}

impl FieldTable {
    fn prefix(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Object => &[],
            Self::Canvas => &[("work_titles_sm", "Title")],
            Self::Works => &[("image_range_s", "Image Range")],
        }
    }

    pub fn entries(self) -> impl Iterator<Item = &'static (&'static str, &'static str)> {
        self.prefix().iter().chain(FIELD_CONFIG.iter())
    }
}

/// Fields fetched for work (range) rows.
pub fn works_field_list() -> Vec<String> {
    ["work_id", "parent_work_id", "work_title_s", "surfaces_sm", "object_id"]
        .into_iter()
        .chain(FieldTable::Works.entries().map(|(field, _)| *field))
        .map(str::to_string)
        .collect()
}

/// Map a row to ordered `(label, value)` pairs, one pair per value.
///
/// Absent or falsy fields are skipped; multi-valued fields keep their value order.
pub fn metadata_pairs(row: &Row, table: FieldTable) -> Vec<(&'static str, String)> {
    table
        .entries()
        .filter(|(field, _)| row.is_truthy(field))
        .flat_map(|(field, label)| row.values(field).into_iter().map(move |v| (*label, v)))
        .collect()
}

/// A single-language value container, serialized as `{"en": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageMap {
    en: Vec<String>,
}

impl LanguageMap {
    pub fn en(value: impl Into<String>) -> Self {
        Self {
            en: vec![value.into()],
        }
    }

    pub fn values(&self) -> &[String] {
        &self.en
    }
}

/// v2 metadata entry: plain string label and value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V2MetadataEntry {
    pub label: String,
    pub value: String,
}

impl V2MetadataEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// v3 metadata entry: language-wrapped label and value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V3MetadataEntry {
    pub label: LanguageMap,
    pub value: LanguageMap,
}

impl V3MetadataEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: LanguageMap::en(label),
            value: LanguageMap::en(value),
        }
    }
}

pub fn v2_metadata_block(row: &Row, table: FieldTable) -> Vec<V2MetadataEntry> {
    metadata_pairs(row, table)
        .into_iter()
        .map(|(label, value)| V2MetadataEntry::new(label, value))
        .collect()
}

pub fn v3_metadata_block(row: &Row, table: FieldTable) -> Vec<V3MetadataEntry> {
    metadata_pairs(row, table)
        .into_iter()
        .map(|(label, value)| V3MetadataEntry::new(label, value))
        .collect()
}

/// An auxiliary external link attached to an object.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub target: String,
    pub label: String,
}

impl Link {
    fn from_row(row: &Row) -> Self {
        Self {
            target: row.str("target_s").unwrap_or_default().to_string(),
            label: row.str("label_s").unwrap_or_default().to_string(),
        }
    }

    /// Anchor markup used as the metadata value.
    pub fn anchor(&self) -> String {
        format!("<a href=\"{}\">{}</a>", self.target, self.label)
    }
}

pub const LINK_LABEL: &str = "Additional Information";

/// All link rows for an object, in backend order.
pub async fn fetch_links(backend: &dyn SearchBackend, object_id: &str) -> Result<Vec<Link>, BackendError> {
    let query = SolrQuery::new("*:*")
        .filter("type:link")
        .filter(format!("object_id:{}", object_id));

    let rows = search_all(backend, query).await?;
    Ok(rows.iter().map(Link::from_row).collect())
}

pub fn v2_link_entries(links: &[Link]) -> Vec<V2MetadataEntry> {
    links
        .iter()
        .map(|l| V2MetadataEntry::new(LINK_LABEL, l.anchor()))
        .collect()
}

pub fn v3_link_entries(links: &[Link]) -> Vec<V3MetadataEntry> {
    links
        .iter()
        .map(|l| V3MetadataEntry::new(LINK_LABEL, l.anchor()))
        .collect()
}

/// `None` for an empty block, so the field is omitted rather than emitted as `[]`.
pub fn non_empty<T>(entries: Vec<T>) -> Option<Vec<T>> {
    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}
