// Page models rendered with Askama. Templates live in `templates/`.

use crate::app::navigation::{NavEntry, NavEvent, NavIndex};
use crate::core::hierarchy::VerifiedHierarchy;
use crate::core::nomenclature::{
    file_href, format_curated_name, is_synthetic, parse_synonyms, sort_case_insensitive,
    strip_sql_quotes,
};
use crate::domain::model::{
    AnnotationGroup, CanonicalBase, Citation, ModificationRecord, NomenclatureEntry, Nucleobase,
};
use askama::Template;

/// Values shared by every page.
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub updated: String,
    pub dnamod_version: String,
    pub chebi_version: String,
}

/// Nomenclature row ready for display; `label` is HTML.
#[derive(Debug, Clone)]
pub struct NomenclatureView {
    pub chebi_id: String,
    pub chebi_name: String,
    pub label: String,
    pub fields: Vec<(String, String)>,
}

impl NomenclatureView {
    pub fn from_entry(entry: &NomenclatureEntry) -> Self {
        let label = match entry.value("Name") {
            Some(name) if !name.is_empty() => format_curated_name(name),
            _ => format_curated_name(&entry.chebi_name),
        };
        Self {
            chebi_id: entry.chebi_id.clone(),
            chebi_name: entry.chebi_name.clone(),
            label,
            fields: entry
                .fields
                .iter()
                .filter(|(column, _)| !column.eq_ignore_ascii_case("Name"))
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationTab {
    pub title: String,
    pub anchor: String,
    pub columns: Vec<String>,
    pub groups: Vec<AnnotationGroup>,
}

impl AnnotationTab {
    fn new(title: &str, anchor: &str, groups: &[AnnotationGroup]) -> Self {
        let columns = groups
            .first()
            .map(|g| g.fields.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default();
        Self {
            title: title.to_string(),
            anchor: anchor.to_string(),
            columns,
            groups: groups.to_vec(),
        }
    }
}

#[derive(Template)]
#[template(path = "modification.html")]
pub struct ModificationPage {
    /// HTML: curated name with its locant formatted.
    pub title: String,
    pub chebi_name: String,
    pub chebi_id: String,
    pub definition: String,
    pub formula: String,
    pub net_charge: String,
    pub average_mass: String,
    pub iupac_name: String,
    pub smiles: String,
    pub inchi: String,
    pub inchikey: String,
    pub synonyms: Vec<String>,
    pub common_name: String,
    pub parent_link: Option<String>,
    pub image: Option<String>,
    pub citations: Vec<Citation>,
    pub tabs: Vec<AnnotationTab>,
    pub expanded_alphabet: Option<NomenclatureView>,
    pub synthetic: bool,
    pub updated: String,
    pub dnamod_version: String,
    pub chebi_version: String,
}

impl ModificationPage {
    /// Builds the page from a stored record, cleaning quoted values.
    pub fn from_record(
        record: &ModificationRecord,
        image: Option<String>,
        context: &SiteContext,
    ) -> Self {
        let tabs = [
            ("Mapping techniques", "mapping", &record.sequencing),
            ("Nature", "nature", &record.nature),
        ]
        .into_iter()
        .filter(|(_, _, groups)| !groups.is_empty())
        .map(|(title, anchor, groups)| AnnotationTab::new(title, anchor, groups))
        .collect();

        Self {
            title: format_curated_name(&record.chebi_name),
            chebi_name: record.chebi_name.clone(),
            chebi_id: record.chebi_id.clone(),
            definition: record.definition.trim().to_string(),
            formula: strip_sql_quotes(&record.formula).to_string(),
            net_charge: strip_sql_quotes(&record.net_charge).to_string(),
            average_mass: strip_sql_quotes(&record.average_mass).to_string(),
            iupac_name: strip_sql_quotes(&record.iupac_name).to_string(),
            smiles: strip_sql_quotes(&record.smiles).to_string(),
            inchi: strip_sql_quotes(&record.inchi).to_string(),
            inchikey: strip_sql_quotes(&record.inchikey).to_string(),
            synonyms: parse_synonyms(&record.synonyms),
            common_name: record.common_name.clone(),
            parent_link: record.base.chebi_id().map(str::to_string),
            image: image.as_deref().map(file_href),
            citations: record.citations.clone(),
            tabs,
            expanded_alphabet: record.expanded_alphabet.as_ref().map(NomenclatureView::from_entry),
            synthetic: record.origin().is_some_and(is_synthetic),
            updated: context.updated.clone(),
            dnamod_version: context.dnamod_version.clone(),
            chebi_version: context.chebi_version.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BaseSection {
    pub name: String,
    pub anchor: String,
    pub chebi_id: Option<String>,
    pub links: Vec<NavEntry>,
    pub navigation: Vec<NavEvent>,
    pub is_other: bool,
}

#[derive(Template)]
#[template(path = "homepage.html")]
pub struct HomePage {
    pub verified_sections: Vec<BaseSection>,
    pub unverified_sections: Vec<BaseSection>,
    pub nomenclature: Vec<NomenclatureView>,
    pub other_ratio: usize,
    pub other_base: String,
    pub updated: String,
    pub dnamod_version: String,
    pub chebi_version: String,
}

/// Homepage inputs that come from configuration.
#[derive(Debug, Clone)]
pub struct HomepageOptions<'a> {
    pub shade_origins: &'a [String],
    pub other_ratio: usize,
    pub other_shared_base: CanonicalBase,
}

impl HomePage {
    pub fn build(
        records: &[ModificationRecord],
        nomenclature: &[NomenclatureEntry],
        hierarchy: &VerifiedHierarchy,
        options: &HomepageOptions<'_>,
        context: &SiteContext,
    ) -> Self {
        let index = NavIndex::new(records, nomenclature, options.shade_origins);

        let verified_sections = Nucleobase::VERIFIED_SECTIONS
            .iter()
            .map(|&base| {
                // 尿嘧啶的已驗證修飾列於胸腺嘧啶之下
                let members: Vec<&ModificationRecord> = records
                    .iter()
                    .filter(|r| r.verified)
                    .filter(|r| {
                        r.base == base
                            || (base == Nucleobase::Thymine && r.base == Nucleobase::Uracil)
                    })
                    .collect();
                let navigation = CanonicalBase::ALL
                    .iter()
                    .find(|c| c.nucleobase() == base)
                    .map(|&c| index.flatten(hierarchy.roots(c)))
                    .unwrap_or_default();
                section(base, sorted_links(&index, &members), navigation)
            })
            .collect();

        let unverified_sections = Nucleobase::ALL
            .iter()
            .map(|&base| {
                let members: Vec<&ModificationRecord> = records
                    .iter()
                    .filter(|r| !r.verified && r.base == base)
                    .collect();
                section(base, sorted_links(&index, &members), Vec::new())
            })
            .collect();

        Self {
            verified_sections,
            unverified_sections,
            nomenclature: nomenclature.iter().map(NomenclatureView::from_entry).collect(),
            other_ratio: options.other_ratio,
            other_base: options.other_shared_base.to_string(),
            updated: context.updated.clone(),
            dnamod_version: context.dnamod_version.clone(),
            chebi_version: context.chebi_version.clone(),
        }
    }
}

fn section(base: Nucleobase, links: Vec<NavEntry>, navigation: Vec<NavEvent>) -> BaseSection {
    BaseSection {
        name: base.name().to_string(),
        anchor: base.name().to_lowercase(),
        chebi_id: base.chebi_id().map(str::to_string),
        links,
        navigation,
        is_other: base == Nucleobase::Other,
    }
}

fn sorted_links(index: &NavIndex<'_>, members: &[&ModificationRecord]) -> Vec<NavEntry> {
    let mut members = members.to_vec();
    sort_case_insensitive(&mut members, |r| &r.chebi_name);
    members.into_iter().map(|record| index.link(record)).collect()
}
