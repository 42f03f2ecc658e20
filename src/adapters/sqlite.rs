use crate::domain::model::{
    AnnotationGroup, Catalogue, Citation, ModificationRecord, NomenclatureEntry, Nucleobase,
    ParentLink,
};
use crate::domain::settings::{DatabaseSettings, TableNames};
use crate::utils::error::{Result, SiteError};
use crate::utils::validation::validate_distinct_copy;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags, Row};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Tables natural-joined into one row per modification.
const MODIFICATION_TABLES: [&str; 4] = ["modbase", "baseprops", "covmod", "base"];

/// Working copy of the database, removed again when dropped.
#[derive(Debug)]
pub struct DatabaseCopy {
    path: PathBuf,
}

impl DatabaseCopy {
    pub fn create(original: &Path, copy: &Path) -> Result<Self> {
        if !original.is_file() {
            return Err(SiteError::DatabaseNotFound {
                path: original.display().to_string(),
            });
        }
        validate_distinct_copy(
            "database.copy_path",
            &original.display().to_string(),
            &copy.display().to_string(),
        )?;
        if let Some(parent) = copy.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::copy(original, copy)?;
        tracing::debug!("Copied {} to {}", original.display(), copy.display());
        Ok(Self {
            path: copy.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DatabaseCopy {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!("Could not remove database copy {}: {}", self.path.display(), e);
        }
    }
}

/// Read-only view over the modification database.
pub struct SqliteSource {
    // 連線必須先於副本釋放
    conn: Connection,
    tables: TableNames,
    original: PathBuf,
    _copy: DatabaseCopy,
}

impl SqliteSource {
    pub fn open(settings: &DatabaseSettings) -> Result<Self> {
        settings.tables.validate("tables")?;
        let copy = DatabaseCopy::create(&settings.path, &settings.copy_path)?;
        let conn = Connection::open_with_flags(
            copy.path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::info!("📂 Opened modification database {}", settings.path.display());

        Ok(Self {
            conn,
            tables: settings.tables.clone(),
            original: settings.path.clone(),
            _copy: copy,
        })
    }

    pub fn load_catalogue(&self) -> Result<Catalogue> {
        let references = self.load_references()?;
        let nomenclature = self.load_nomenclature()?;
        let by_id: HashMap<&str, &NomenclatureEntry> = nomenclature
            .iter()
            .map(|entry| (entry.chebi_id.as_str(), entry))
            .collect();

        let mut modifications = self.load_modifications()?;
        for record in &mut modifications {
            record.citations = self.load_citations(&record.chebi_id, &references)?;
            record.sequencing = self.load_annotations(
                &self.tables.sequencing_annotations,
                &record.chebi_id,
                &references,
            )?;
            record.nature = self.load_annotations(
                &self.tables.nature_annotations,
                &record.chebi_id,
                &references,
            )?;
            record.expanded_alphabet = by_id.get(record.chebi_id.as_str()).map(|e| (*e).clone());
        }

        let links = self.load_parent_links()?;
        let database_modified = self.database_modified()?;

        tracing::info!(
            "📊 Loaded {} modifications, {} ontology links, {} nomenclature entries",
            modifications.len(),
            links.len(),
            nomenclature.len()
        );

        Ok(Catalogue {
            modifications,
            links,
            nomenclature,
            database_modified,
        })
    }

    pub fn load_modifications(&self) -> Result<Vec<ModificationRecord>> {
        let sql = format!(
            "SELECT * FROM {} NATURAL JOIN {} NATURAL JOIN {} NATURAL JOIN {} NATURAL JOIN {} \
             ORDER BY baseid, chebiname",
            MODIFICATION_TABLES[0],
            MODIFICATION_TABLES[1],
            MODIFICATION_TABLES[2],
            self.tables.names,
            MODIFICATION_TABLES[3],
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                text(row, "baseid")?,
                ModificationRecord {
                    chebi_id: text(row, "nameid")?,
                    chebi_name: text(row, "chebiname")?,
                    base: Nucleobase::Other,
                    common_name: text(row, "commonname")?,
                    verified: flag(row, "verifiedstatus")?,
                    formula: text(row, "formula")?,
                    net_charge: text(row, "netcharge")?,
                    average_mass: text(row, "avgmass")?,
                    definition: text(row, "definition")?,
                    iupac_name: text(row, "iupacname")?,
                    synonyms: text(row, "synonyms")?,
                    smiles: text(row, "smiles")?,
                    inchi: text(row, "inchi")?,
                    inchikey: text(row, "inchikey")?,
                    citations: Vec::new(),
                    sequencing: Vec::new(),
                    nature: Vec::new(),
                    expanded_alphabet: None,
                },
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (base_id, mut record) = row?;
            match Nucleobase::from_base_id(&base_id) {
                Some(base) => {
                    record.base = base;
                    records.push(record);
                }
                None => tracing::warn!(
                    "Skipping {} ({}): unknown base id '{}'",
                    record.chebi_name,
                    record.chebi_id,
                    base_id
                ),
            }
        }
        Ok(records)
    }

    /// Every reference, keyed by citation id. Columns are read by position
    /// since their names changed across releases.
    pub fn load_references(&self) -> Result<HashMap<String, Citation>> {
        let sql = format!("SELECT * FROM {}", self.tables.references);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(Citation {
                citation_id: text_at(row, 0)?,
                title: text_at(row, 1)?,
                pub_date: text_at(row, 2)?,
                authors: text_at(row, 3)?,
                journal: text_at(row, 4)?,
                volume: text_at(row, 5)?,
                issue: text_at(row, 6)?,
            })
        })?;

        let mut references = HashMap::new();
        for citation in rows {
            let citation = citation?;
            references.insert(citation.citation_id.clone(), citation);
        }
        Ok(references)
    }

    pub fn load_citations(
        &self,
        name_id: &str,
        references: &HashMap<String, Citation>,
    ) -> Result<Vec<Citation>> {
        let sql = format!(
            "SELECT citationid FROM {} WHERE nameid = ?1",
            self.tables.citation_lookup
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt.query_map(params![name_id], |row| text_at(row, 0))?;

        let mut citations: Vec<Citation> = Vec::new();
        for id in ids {
            let id = id?;
            match references.get(&id) {
                Some(citation) if !citations.iter().any(|c| c.citation_id == id) => {
                    citations.push(citation.clone())
                }
                Some(_) => {}
                None => tracing::debug!("Citation {} of {} has no reference entry", id, name_id),
            }
        }
        citations.sort_by(|a, b| a.authors.cmp(&b.authors));
        Ok(citations)
    }

    /// Annotation rows for one modification, merged per distinct annotation.
    ///
    /// The first column of the table holds the modification id and the last
    /// one the citation ids backing the row.
    pub fn load_annotations(
        &self,
        table: &str,
        name_id: &str,
        references: &HashMap<String, Citation>,
    ) -> Result<Vec<AnnotationGroup>> {
        if !self.table_exists(table)? {
            tracing::debug!("Annotation table {} is absent", table);
            return Ok(Vec::new());
        }

        let sql = format!("SELECT * FROM {} WHERE nameid = ?1", table);
        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        if columns.len() < 2 {
            return Err(SiteError::ProcessingError {
                message: format!(
                    "annotation table {} needs an id and a reference column",
                    table
                ),
            });
        }
        let field_names = columns[1..columns.len() - 1].to_vec();
        let reference_idx = columns.len() - 1;

        let rows = stmt.query_map(params![name_id], |row| {
            let mut values = Vec::with_capacity(field_names.len());
            for idx in 1..reference_idx {
                values.push(text_at(row, idx)?);
            }
            Ok((values, text_at(row, reference_idx)?))
        })?;

        let mut groups: Vec<AnnotationGroup> = Vec::new();
        for row in rows {
            let (values, reference_field) = row?;
            let fields: Vec<(String, String)> =
                field_names.iter().cloned().zip(values).collect();
            let cited = split_citation_ids(&reference_field)
                .filter_map(|id| references.get(id))
                .cloned();

            match groups.iter_mut().find(|g| g.fields == fields) {
                Some(group) => group.citations.extend(cited),
                None => groups.push(AnnotationGroup {
                    fields,
                    citations: cited.collect(),
                }),
            }
        }

        for group in &mut groups {
            group.citations.sort_by_key(citation_sort_key);
            let mut seen = std::collections::HashSet::new();
            group.citations.retain(|c| seen.insert(c.citation_id.clone()));
        }
        groups.sort_by_cached_key(|group| {
            (
                group.fields.first().map(|(_, v)| v.clone()).unwrap_or_default(),
                group.citations.first().map(citation_sort_key),
            )
        });

        Ok(groups)
    }

    /// The expanded alphabet, keyed by its id column (the first column whose
    /// name mentions `id`).
    pub fn load_nomenclature(&self) -> Result<Vec<NomenclatureEntry>> {
        let table = &self.tables.expanded_alphabet;
        if !self.table_exists(table)? {
            tracing::warn!("Nomenclature table {} is absent", table);
            return Ok(Vec::new());
        }

        let names = self.load_chebi_names()?;

        let sql = format!("SELECT * FROM {}", table);
        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let id_idx = columns
            .iter()
            .position(|c| c.to_lowercase().contains("id"))
            .ok_or_else(|| SiteError::ProcessingError {
                message: format!("nomenclature table {} has no id column", table),
            })?;

        let rows = stmt.query_map([], |row| {
            let mut fields = Vec::with_capacity(columns.len().saturating_sub(1));
            let mut chebi_id = String::new();
            for (idx, column) in columns.iter().enumerate() {
                let value = text_at(row, idx)?;
                if idx == id_idx {
                    chebi_id = value;
                } else {
                    fields.push((column.clone(), value));
                }
            }
            Ok((chebi_id, fields))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (chebi_id, fields) = row?;
            let chebi_name = match names.get(&chebi_id) {
                Some(name) => name.clone(),
                None => {
                    tracing::warn!("Nomenclature entry {} has no ChEBI name", chebi_id);
                    String::new()
                }
            };
            entries.push(NomenclatureEntry {
                chebi_id,
                chebi_name,
                fields,
            });
        }
        entries.sort_by(|a, b| a.chebi_id.cmp(&b.chebi_id));
        Ok(entries)
    }

    pub fn load_parent_links(&self) -> Result<Vec<ParentLink>> {
        let table = &self.tables.parents;
        if !self.table_exists(table)? {
            tracing::warn!("Ontology table {} is absent, hierarchy will be flat", table);
            return Ok(Vec::new());
        }

        let sql = format!("SELECT nameid, parentid FROM {} ORDER BY parentid, nameid", table);
        let mut stmt = self.conn.prepare(&sql)?;
        let links = stmt
            .query_map([], |row| Ok(ParentLink::new(text_at(row, 0)?, text_at(row, 1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(links)
    }

    /// UTC calendar date of the original database's last modification.
    pub fn database_modified(&self) -> Result<NaiveDate> {
        let modified = std::fs::metadata(&self.original)?.modified()?;
        Ok(DateTime::<Utc>::from(modified).date_naive())
    }

    fn load_chebi_names(&self) -> Result<HashMap<String, String>> {
        let sql = format!("SELECT nameid, chebiname FROM {}", self.tables.names);
        let mut stmt = self.conn.prepare(&sql)?;
        let names = stmt
            .query_map([], |row| Ok((text_at(row, 0)?, text_at(row, 1)?)))?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(names)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

fn text(row: &Row<'_>, column: &str) -> rusqlite::Result<String> {
    row.get::<_, Value>(column).map(value_to_text)
}

fn text_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    if idx >= row.as_ref().column_count() {
        return Ok(String::new());
    }
    row.get::<_, Value>(idx).map(value_to_text)
}

fn flag(row: &Row<'_>, column: &str) -> rusqlite::Result<bool> {
    Ok(match row.get::<_, Value>(column)? {
        Value::Null => false,
        Value::Integer(i) => i != 0,
        Value::Real(f) => f != 0.0,
        Value::Text(s) => matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
        Value::Blob(_) => false,
    })
}

/// Citation ids listed in an annotation's reference column.
fn split_citation_ids(field: &str) -> impl Iterator<Item = &str> {
    field
        .split(|c: char| c == ';' || c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// Publication date when it is an ISO date, otherwise the author list.
fn citation_sort_key(citation: &Citation) -> String {
    match NaiveDate::parse_from_str(citation.pub_date.trim(), "%Y-%m-%d") {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => citation.authors.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir) -> DatabaseSettings {
        let path = dir.path().join("mods.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE base (baseid TEXT, commonname TEXT);
            CREATE TABLE modbase (nameid TEXT, baseid TEXT, verifiedstatus INTEGER);
            CREATE TABLE baseprops (nameid TEXT, formula TEXT, netcharge TEXT, avgmass TEXT);
            CREATE TABLE covmod (nameid TEXT, definition TEXT);
            CREATE TABLE names (nameid TEXT, chebiname TEXT, iupacname TEXT, synonyms TEXT,
                                smiles TEXT, inchi TEXT, inchikey TEXT);
            CREATE TABLE citations (citationid TEXT, title TEXT, pubdate TEXT, authors TEXT,
                                    journalnameorpublishername TEXT,
                                    volumeorpublisherlocation TEXT, issue TEXT);
            CREATE TABLE citation_lookup (nameid TEXT, citationid TEXT);
            CREATE TABLE sequencing_citations (nameid TEXT, Method TEXT, Resolution TEXT,
                                               citationid TEXT);
            CREATE TABLE nature_citations (nameid TEXT, Origin TEXT, citationid TEXT);
            CREATE TABLE expanded_alphabet (nameid TEXT, Abbreviation TEXT, Name TEXT);
            CREATE TABLE modbase_parents (nameid TEXT, parentid TEXT);

            INSERT INTO base VALUES ('C', 'cytosine'), ('X', 'mystery');
            INSERT INTO modbase VALUES ('CHEBI:27551', 'C', 1), ('CHEBI:76792', 'C', 0),
                                       ('CHEBI:0001', 'X', 1);
            INSERT INTO baseprops VALUES ('CHEBI:27551', '''C5H7N3O''', '''0''', 125.13),
                                         ('CHEBI:76792', '''C5H7N3O2''', '''0''', '''141.13'''),
                                         ('CHEBI:0001', '''C''', '''0''', '''1''');
            INSERT INTO covmod VALUES ('CHEBI:27551', 'A methylcytosine.'),
                                      ('CHEBI:76792', 'A hydroxymethylcytosine.'),
                                      ('CHEBI:0001', 'Nothing.');
            INSERT INTO names VALUES
                ('CHEBI:27551', '5-methylcytosine', '''5-methylpyrimidine''',
                 '[''5mC'', ''5-Methylcytosine'']', '''CC1=CNC(=O)N=C1N''', '''InChI=1S''',
                 '''LRSASMSXMSNRBT''');
            INSERT INTO names VALUES
                ('CHEBI:76792', '5-hydroxymethylcytosine', '''x''', '[]', '''OCC1=CNC(=O)N=C1N''',
                 '''InChI=1S''', '''RYVNIFSIEDRLSJ''');
            INSERT INTO names VALUES
                ('CHEBI:0001', 'unknown', '''x''', '[]', '''C''', '''x''', '''x''');

            INSERT INTO citations VALUES
                ('100', 'Old paper', '1990-01-01', 'Zed A', 'J1', '1', '2'),
                ('200', 'New paper', '2015-06-01', 'Adams B', 'J2', '3', '4'),
                ('300', 'Undated', 'in press', 'Brown C', 'J3', '', '');
            INSERT INTO citation_lookup VALUES ('CHEBI:27551', '200'), ('CHEBI:27551', '100'),
                                               ('CHEBI:27551', '999'), ('CHEBI:27551', '200');
            INSERT INTO sequencing_citations VALUES
                ('CHEBI:27551', 'Bisulfite sequencing', 'single base', '200;100'),
                ('CHEBI:27551', 'Bisulfite sequencing', 'single base', '300'),
                ('CHEBI:27551', 'Anti-5mC IP', 'low', '100'),
                ('CHEBI:27551', 'SMRT', 'single base', '');
            INSERT INTO nature_citations VALUES ('CHEBI:27551', 'natural', '100');
            INSERT INTO expanded_alphabet VALUES ('CHEBI:27551', 'm', 'N(5)-methylcytosine'),
                                                 ('CHEBI:55555', 'z', 'N(9)-unnamed');
            INSERT INTO modbase_parents VALUES ('CHEBI:76792', 'CHEBI:27551');
            "#,
        )
        .unwrap();

        DatabaseSettings {
            copy_path: dir.path().join("mods.db.copy"),
            path,
            tables: TableNames::default(),
        }
    }

    #[test]
    fn test_load_catalogue_reads_records_by_column_name() {
        let dir = TempDir::new().unwrap();
        let settings = fixture(&dir);
        let source = SqliteSource::open(&settings).unwrap();
        let catalogue = source.load_catalogue().unwrap();

        // 未知 baseid 的紀錄會被略過
        assert_eq!(catalogue.modifications.len(), 2);
        let five_mc = catalogue
            .modifications
            .iter()
            .find(|m| m.chebi_id == "CHEBI:27551")
            .unwrap();
        assert_eq!(five_mc.base, Nucleobase::Cytosine);
        assert!(five_mc.verified);
        assert_eq!(five_mc.common_name, "cytosine");
        assert_eq!(five_mc.formula, "'C5H7N3O'");
        assert_eq!(five_mc.average_mass, "125.13");
        assert_eq!(
            five_mc.expanded_alphabet.as_ref().and_then(|e| e.abbreviation()),
            Some("m")
        );
        assert_eq!(five_mc.origin(), Some("natural"));

        assert_eq!(catalogue.links, vec![ParentLink::new("CHEBI:76792", "CHEBI:27551")]);
        assert_eq!(catalogue.nomenclature.len(), 2);
        assert_eq!(catalogue.nomenclature[0].chebi_name, "5-methylcytosine");
    }

    #[test]
    fn test_nomenclature_without_chebi_name_keeps_empty_name() {
        let dir = TempDir::new().unwrap();
        let source = SqliteSource::open(&fixture(&dir)).unwrap();

        let entries = source.load_nomenclature().unwrap();
        let unnamed = entries
            .iter()
            .find(|e| e.chebi_id == "CHEBI:55555")
            .unwrap();
        assert_eq!(unnamed.chebi_name, "");
        assert_eq!(unnamed.abbreviation(), Some("z"));
    }

    #[test]
    fn test_citations_skip_dangling_and_sort_by_authors() {
        let dir = TempDir::new().unwrap();
        let source = SqliteSource::open(&fixture(&dir)).unwrap();
        let references = source.load_references().unwrap();

        let citations = source.load_citations("CHEBI:27551", &references).unwrap();
        let ids: Vec<&str> = citations.iter().map(|c| c.citation_id.as_str()).collect();
        assert_eq!(ids, vec!["200", "100"]);
        assert_eq!(citations[1].journal, "J1");
    }

    #[test]
    fn test_annotations_merge_rows_and_order_citations() {
        let dir = TempDir::new().unwrap();
        let source = SqliteSource::open(&fixture(&dir)).unwrap();
        let references = source.load_references().unwrap();

        let groups = source
            .load_annotations("sequencing_citations", "CHEBI:27551", &references)
            .unwrap();

        let methods: Vec<&str> = groups.iter().filter_map(|g| g.value("Method")).collect();
        assert_eq!(methods, vec!["Anti-5mC IP", "Bisulfite sequencing", "SMRT"]);

        let bisulfite = &groups[1];
        assert_eq!(bisulfite.value("Resolution"), Some("single base"));
        let ids: Vec<&str> = bisulfite
            .citations
            .iter()
            .map(|c| c.citation_id.as_str())
            .collect();
        // ISO 日期優先排序，無法解析者以作者排序
        assert_eq!(ids, vec!["100", "200", "300"]);

        assert!(groups[2].citations.is_empty());
    }

    #[test]
    fn test_missing_optional_tables_yield_empty_results() {
        let dir = TempDir::new().unwrap();
        let mut settings = fixture(&dir);
        settings.tables.parents = "no_such_parents".to_string();
        settings.tables.expanded_alphabet = "no_such_alphabet".to_string();

        let source = SqliteSource::open(&settings).unwrap();
        assert!(source.load_parent_links().unwrap().is_empty());
        assert!(source.load_nomenclature().unwrap().is_empty());
        assert!(source
            .load_annotations("no_such_table", "CHEBI:27551", &HashMap::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_copy_is_removed_when_source_drops() {
        let dir = TempDir::new().unwrap();
        let settings = fixture(&dir);
        {
            let _source = SqliteSource::open(&settings).unwrap();
            assert!(settings.copy_path.exists());
        }
        assert!(!settings.copy_path.exists());
        assert!(settings.path.exists());
    }

    #[test]
    fn test_copy_onto_original_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut settings = fixture(&dir);
        let before = std::fs::read(&settings.path).unwrap();
        settings.copy_path = settings.path.clone();

        assert!(matches!(
            SqliteSource::open(&settings),
            Err(SiteError::InvalidConfigValueError { .. })
        ));
        assert_eq!(std::fs::read(&settings.path).unwrap(), before);

        // 同一檔案的另一種寫法
        settings.copy_path = dir.path().join(".").join("mods.db");
        assert!(DatabaseCopy::create(&settings.path, &settings.copy_path).is_err());
        assert_eq!(std::fs::read(&settings.path).unwrap(), before);
    }

    #[test]
    fn test_missing_database_is_reported() {
        let dir = TempDir::new().unwrap();
        let settings = DatabaseSettings {
            path: dir.path().join("absent.db"),
            copy_path: dir.path().join("absent.db.copy"),
            tables: TableNames::default(),
        };
        assert!(matches!(
            SqliteSource::open(&settings),
            Err(SiteError::DatabaseNotFound { .. })
        ));
    }

    #[test]
    fn test_split_citation_ids() {
        let ids: Vec<&str> = split_citation_ids("12; 34,56 78").collect();
        assert_eq!(ids, vec!["12", "34", "56", "78"]);
        assert_eq!(split_citation_ids("").count(), 0);
    }
}
