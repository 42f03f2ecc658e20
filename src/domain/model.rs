use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unmodified base a modification is derived from, keyed by the one-letter
/// `baseid` used in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nucleobase {
    Adenine,
    Cytosine,
    Guanine,
    Thymine,
    Uracil,
    Other,
}

impl Nucleobase {
    /// 所有鹼基，依首頁未驗證區塊的順序
    pub const ALL: [Nucleobase; 6] = [
        Nucleobase::Adenine,
        Nucleobase::Cytosine,
        Nucleobase::Guanine,
        Nucleobase::Thymine,
        Nucleobase::Uracil,
        Nucleobase::Other,
    ];

    /// Bases that get a verified section on the homepage. Uracil is shown
    /// under thymine.
    pub const VERIFIED_SECTIONS: [Nucleobase; 5] = [
        Nucleobase::Adenine,
        Nucleobase::Cytosine,
        Nucleobase::Guanine,
        Nucleobase::Thymine,
        Nucleobase::Other,
    ];

    pub fn from_base_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Nucleobase::Adenine),
            "C" => Some(Nucleobase::Cytosine),
            "G" => Some(Nucleobase::Guanine),
            "T" => Some(Nucleobase::Thymine),
            "U" => Some(Nucleobase::Uracil),
            "O" => Some(Nucleobase::Other),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Nucleobase::Adenine => "Adenine",
            Nucleobase::Cytosine => "Cytosine",
            Nucleobase::Guanine => "Guanine",
            Nucleobase::Thymine => "Thymine",
            Nucleobase::Uracil => "Uracil",
            Nucleobase::Other => "Other",
        }
    }

    /// ChEBI identifier of the unmodified base; `Other` has none.
    pub fn chebi_id(self) -> Option<&'static str> {
        match self {
            Nucleobase::Adenine => Some("CHEBI:16708"),
            Nucleobase::Cytosine => Some("CHEBI:16040"),
            Nucleobase::Guanine => Some("CHEBI:16235"),
            Nucleobase::Thymine => Some("CHEBI:17821"),
            Nucleobase::Uracil => Some("CHEBI:17568"),
            Nucleobase::Other => None,
        }
    }

    /// Canonical hierarchy root. Uracil folds into thymine and `Other` into
    /// the configured shared base.
    pub fn canonical(self, other_shared: CanonicalBase) -> CanonicalBase {
        match self {
            Nucleobase::Adenine => CanonicalBase::Adenine,
            Nucleobase::Cytosine => CanonicalBase::Cytosine,
            Nucleobase::Guanine => CanonicalBase::Guanine,
            Nucleobase::Thymine | Nucleobase::Uracil => CanonicalBase::Thymine,
            Nucleobase::Other => other_shared,
        }
    }
}

impl fmt::Display for Nucleobase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalBase {
    Adenine,
    Cytosine,
    Guanine,
    Thymine,
}

impl CanonicalBase {
    pub const ALL: [CanonicalBase; 4] = [
        CanonicalBase::Adenine,
        CanonicalBase::Cytosine,
        CanonicalBase::Guanine,
        CanonicalBase::Thymine,
    ];

    pub fn nucleobase(self) -> Nucleobase {
        match self {
            CanonicalBase::Adenine => Nucleobase::Adenine,
            CanonicalBase::Cytosine => Nucleobase::Cytosine,
            CanonicalBase::Guanine => Nucleobase::Guanine,
            CanonicalBase::Thymine => Nucleobase::Thymine,
        }
    }
}

impl fmt::Display for CanonicalBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nucleobase().name())
    }
}

impl FromStr for CanonicalBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adenine" | "a" => Ok(CanonicalBase::Adenine),
            "cytosine" | "c" => Ok(CanonicalBase::Cytosine),
            "guanine" | "g" => Ok(CanonicalBase::Guanine),
            "thymine" | "t" => Ok(CanonicalBase::Thymine),
            other => Err(format!(
                "unknown canonical base '{}', expected adenine, cytosine, guanine or thymine",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub citation_id: String,
    pub title: String,
    pub pub_date: String,
    pub authors: String,
    pub journal: String,
    pub volume: String,
    pub issue: String,
}

/// One annotation (a sequencing method, a natural origin, ...) together with
/// the references backing it. Columns keep the order of the source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationGroup {
    pub fields: Vec<(String, String)>,
    pub citations: Vec<Citation>,
}

impl AnnotationGroup {
    pub fn value(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value.as_str())
    }
}

/// Row of the expanded alphabet (custom nomenclature) table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NomenclatureEntry {
    pub chebi_id: String,
    pub chebi_name: String,
    pub fields: Vec<(String, String)>,
}

impl NomenclatureEntry {
    pub fn value(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value.as_str())
    }

    pub fn abbreviation(&self) -> Option<&str> {
        self.value("Abbreviation").filter(|v| !v.trim().is_empty())
    }
}

/// A modification as stored: several values still carry their SQL quoting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModificationRecord {
    pub chebi_id: String,
    pub chebi_name: String,
    pub base: Nucleobase,
    pub common_name: String,
    pub verified: bool,
    pub formula: String,
    pub net_charge: String,
    pub average_mass: String,
    pub definition: String,
    pub iupac_name: String,
    pub synonyms: String,
    pub smiles: String,
    pub inchi: String,
    pub inchikey: String,
    pub citations: Vec<Citation>,
    pub sequencing: Vec<AnnotationGroup>,
    pub nature: Vec<AnnotationGroup>,
    pub expanded_alphabet: Option<NomenclatureEntry>,
}

impl ModificationRecord {
    /// Natural origin recorded for the modification (first nature annotation).
    pub fn origin(&self) -> Option<&str> {
        self.nature
            .first()
            .and_then(|group| group.value("Origin"))
            .filter(|origin| !origin.is_empty())
    }
}

/// `derived-from` edge of the modification ontology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentLink {
    pub child_id: String,
    pub parent_id: String,
}

impl ParentLink {
    pub fn new(child_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            child_id: child_id.into(),
            parent_id: parent_id.into(),
        }
    }
}

/// Everything read from the database in one extraction.
#[derive(Debug, Clone)]
pub struct Catalogue {
    pub modifications: Vec<ModificationRecord>,
    pub links: Vec<ParentLink>,
    pub nomenclature: Vec<NomenclatureEntry>,
    pub database_modified: NaiveDate,
}

impl Catalogue {
    pub fn count_for(&self, base: Nucleobase, verified: bool) -> usize {
        self.modifications
            .iter()
            .filter(|m| m.base == base && m.verified == verified)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    /// Path relative to the output directory.
    pub path: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct SiteBundle {
    pub files: Vec<SiteFile>,
    pub pages: usize,
    pub images: usize,
    pub missing_images: Vec<String>,
}

impl SiteBundle {
    pub fn push(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.push(SiteFile {
            path: path.into(),
            contents: contents.into(),
        });
    }

    pub fn file(&self, path: &str) -> Option<&SiteFile> {
        self.files.iter().find(|f| f.path == path)
    }
}
