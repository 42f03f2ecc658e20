use dnamod_site::core::StructureRenderer;
use dnamod_site::{Result, SiteError};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Builds a small modification database covering every base section.
pub fn build_fixture_database(dir: &Path) -> PathBuf {
    let path = dir.join("DNA_mod_database.db");
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

        INSERT INTO base VALUES ('A', 'adenine'), ('C', 'cytosine'), ('U', 'uracil'),
                                ('O', 'other');
        INSERT INTO modbase VALUES
            ('CHEBI:21891', 'A', 1),
            ('CHEBI:77777', 'A', 1),
            ('CHEBI:27551', 'C', 1),
            ('CHEBI:76792', 'C', 0),
            ('CHEBI:16964', 'U', 1),
            ('CHEBI:99999', 'O', 1);
        INSERT INTO baseprops VALUES
            ('CHEBI:21891', '''C6H7N5''', '''0''', '''149.15'''),
            ('CHEBI:77777', '''C6H7N5O''', '''0''', '''165.15'''),
            ('CHEBI:27551', '''C5H7N3O''', '''0''', '''125.13'''),
            ('CHEBI:76792', '''C5H7N3O2''', '''0''', '''141.13'''),
            ('CHEBI:16964', '''C5H6N2O3''', '''0''', '''142.11'''),
            ('CHEBI:99999', '''C''', '''0''', '''12.01''');
        INSERT INTO covmod VALUES
            ('CHEBI:21891', 'A methyladenine.'),
            ('CHEBI:77777', 'A hydroxymethyladenine.'),
            ('CHEBI:27551', 'A methylcytosine.'),
            ('CHEBI:76792', 'A hydroxymethylcytosine.'),
            ('CHEBI:16964', 'A hydroxymethyluracil.'),
            ('CHEBI:99999', 'Something else.');
        INSERT INTO names VALUES
            ('CHEBI:21891', 'N(6)-methyladenine', '''N-methyl-7H-purin-6-amine''',
             '[''6mA'']', '''CNc1ncnc2[nH]cnc12''', '''InChI=1S/C6H7N5''', '''CKOMXBHMKXXTNW'''),
            ('CHEBI:77777', 'N(6)-hydroxymethyladenine', '''x''', '[]', '''BROKEN''',
             '''InChI=1S''', '''x'''),
            ('CHEBI:27551', '5-methylcytosine', '''5-methylpyrimidine''',
             '[''5mC'', ''5-Methylcytosine'']', '''CC1=CNC(=O)N=C1N''', '''InChI=1S''',
             '''LRSASMSXMSNRBT'''),
            ('CHEBI:76792', '5-hydroxymethylcytosine', '''x''', '[]', '''OCC1=CNC(=O)N=C1N''',
             '''InChI=1S''', '''RYVNIFSIEDRLSJ'''),
            ('CHEBI:16964', '5-hydroxymethyluracil', '''x''', '[]', '''OCc1c[nH]c(=O)[nH]c1=O''',
             '''InChI=1S''', '''JDBGXEHEIRGOBU'''),
            ('CHEBI:99999', 'mysterine', '''x''', '[]', '', '''x''', '''x''');

        INSERT INTO citations VALUES
            ('100', 'Old paper', '1990-01-01', 'Zed A', 'J1', '1', '2'),
            ('200', 'New paper', '2015-06-01', 'Adams B', 'J2', '3', '4');
        INSERT INTO citation_lookup VALUES ('CHEBI:27551', '200'), ('CHEBI:27551', '100');
        INSERT INTO sequencing_citations VALUES
            ('CHEBI:27551', 'Bisulfite sequencing', 'single base', '200;100');
        INSERT INTO nature_citations VALUES
            ('CHEBI:27551', 'natural', '100'),
            ('CHEBI:77777', 'synthetic', '');
        INSERT INTO expanded_alphabet VALUES ('CHEBI:27551', 'm', 'N(5)-methylcytosine');
        INSERT INTO modbase_parents VALUES
            ('CHEBI:77777', 'CHEBI:21891'),
            ('CHEBI:76792', 'CHEBI:27551');
        "#,
    )
    .unwrap();
    path
}

pub fn site_toml(database: &Path, output: &Path, images: bool) -> String {
    format!(
        r#"
[site]
dnamod_version = "1.4"
chebi_version = "160"
output_path = "{}"

[database]
path = "{}"

[images]
enabled = {}
"#,
        output.display(),
        database.display(),
        images
    )
}

/// Renders every SMILES except `BROKEN`, without running Open Babel.
pub struct FakeRenderer;

impl StructureRenderer for FakeRenderer {
    async fn render_svg(&self, smiles: &str) -> Result<Option<String>> {
        if smiles == "BROKEN" {
            return Err(SiteError::RenderError {
                smiles: smiles.to_string(),
                message: "unparsable SMILES".to_string(),
            });
        }
        Ok(Some(format!("<svg><desc>{}</desc></svg>", smiles)))
    }
}
