//! Flat-file (CSV) record store.
//!
//! Three record kinds live in delimited files with a header row: personas and
//! keywords (read-only inputs) and articles (the pipeline's output). The
//! [`ArticleStore`] owns article state on disk:
//! - [`ArticleStore::append`] assigns `max(id) + 1` to records without an id
//! - [`ArticleStore::update`] merges a partial update and rewrites the whole file
//!
//! **Access rules:** one writer per process, strictly sequential. The whole-file
//! rewrite is not safe under concurrent writers.

mod catalog;
mod codec;

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use articlesmith_shared::{
    ArticleRecord, ArticleSmithError, ArticleStatus, ArticleUpdate, CategoryId, KeywordRecord,
    PersonaRecord, Result,
};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

pub use catalog::load_catalog;
pub use codec::Framing;

/// Column order of the article file.
pub const ARTICLE_COLUMNS: [&str; 9] = [
    "id",
    "category_id",
    "title",
    "body",
    "slug",
    "status",
    "meta_title",
    "meta_description",
    "api_posted",
];

// ---------------------------------------------------------------------------
// Record mapping
// ---------------------------------------------------------------------------

/// A record kind that can be read from a CSV file with a header row.
pub trait CsvRecord: Sized {
    /// Columns that must be present in the header.
    const COLUMNS: &'static [&'static str];
    /// How rows are delimited in this kind of file.
    const FRAMING: Framing;

    fn from_row(row: &Row<'_>) -> Result<Self>;
}

/// One parsed data row, addressed by header column name.
pub struct Row<'a> {
    index: &'a HashMap<&'static str, usize>,
    cells: &'a [String],
}

impl Row<'_> {
    /// Cell value for `column`; short rows yield an empty string.
    pub fn get(&self, column: &str) -> &str {
        self.index
            .get(column)
            .and_then(|&i| self.cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl CsvRecord for PersonaRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Category",
        "Persona_Detail",
        "Worry_Description",
        "Tone_Instruction",
        "Context_Scenario",
    ];
    const FRAMING: Framing = Framing::Line;

    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            category: row.get("Category").trim().to_string(),
            persona_detail: row.get("Persona_Detail").to_string(),
            worry_description: row.get("Worry_Description").to_string(),
            tone_instruction: row.get("Tone_Instruction").to_string(),
            context_scenario: row.get("Context_Scenario").to_string(),
        })
    }
}

impl CsvRecord for KeywordRecord {
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Category",
        "Main_Keyword",
        "Sub_Keywords",
        "User_Intent",
        "Title_Idea",
    ];
    const FRAMING: Framing = Framing::Line;

    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: row.get("ID").trim().to_string(),
            category: row.get("Category").trim().to_string(),
            main_keyword: row.get("Main_Keyword").to_string(),
            sub_keywords: row.get("Sub_Keywords").to_string(),
            user_intent: row.get("User_Intent").to_string(),
            title_idea: row.get("Title_Idea").to_string(),
        })
    }
}

impl CsvRecord for ArticleRecord {
    const COLUMNS: &'static [&'static str] = &ARTICLE_COLUMNS;
    const FRAMING: Framing = Framing::Record;

    fn from_row(row: &Row<'_>) -> Result<Self> {
        let raw_id = row.get("id").trim();
        let id = match raw_id.parse::<u64>() {
            Ok(id) if id > 0 => Some(id),
            _ if raw_id.is_empty() => None,
            _ => {
                warn!(raw_id, "article id is not a positive integer, treating as missing");
                None
            }
        };

        let raw_status = row.get("status");
        let status = raw_status.parse().unwrap_or_else(|e| {
            warn!(raw_status, error = %e, "unknown article status, reading as draft");
            ArticleStatus::Draft
        });

        Ok(Self {
            id,
            category_id: CategoryId::parse(row.get("category_id")),
            title: row.get("title").to_string(),
            body: row.get("body").to_string(),
            slug: row.get("slug").to_string(),
            status,
            meta_title: row.get("meta_title").to_string(),
            meta_description: row.get("meta_description").to_string(),
            api_posted: parse_bool(row.get("api_posted")),
        })
    }
}

fn parse_bool(raw: &str) -> bool {
    let raw = raw.trim();
    raw == "1" || raw.eq_ignore_ascii_case("true")
}

fn article_cells(record: &ArticleRecord) -> [String; 9] {
    [
        record.id.map(|id| id.to_string()).unwrap_or_default(),
        record.category_id.to_string(),
        record.title.clone(),
        record.body.clone(),
        record.slug.clone(),
        record.status.as_str().to_string(),
        record.meta_title.clone(),
        record.meta_description.clone(),
        if record.api_posted { "1" } else { "0" }.to_string(),
    ]
}

/// Serialize one article as a CSV row (with trailing newline) in file column order.
pub fn encode_article(record: &ArticleRecord) -> String {
    codec::encode_row(&article_cells(record))
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read every record of kind `R` from `path`.
///
/// A missing file or a header-only file yields an empty vec.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_all<R: CsvRecord>(path: &Path) -> Result<Vec<R>> {
    match read_content(path)? {
        Some(content) => parse_records(path, &content),
        None => Ok(Vec::new()),
    }
}

fn read_content(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("file does not exist, treating as empty");
            Ok(None)
        }
        Err(e) => Err(ArticleSmithError::io(path, e)),
    }
}

fn parse_records<R: CsvRecord>(path: &Path, content: &str) -> Result<Vec<R>> {
    let rows = codec::parse(content, R::FRAMING);
    let Some((header, data)) = rows.split_first() else {
        return Ok(Vec::new());
    };

    let mut index = HashMap::new();
    for &column in R::COLUMNS {
        let position = header
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| {
                ArticleSmithError::validation(format!(
                    "{}: header is missing column '{column}'",
                    path.display()
                ))
            })?;
        index.insert(column, position);
    }

    data.iter()
        .enumerate()
        .map(|(i, cells)| {
            R::from_row(&Row {
                index: &index,
                cells,
            })
            .map_err(|e| match e {
                ArticleSmithError::Validation { message } => ArticleSmithError::validation(
                    format!("{}: record {}: {message}", path.display(), i + 1),
                ),
                other => other,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ArticleStore
// ---------------------------------------------------------------------------

/// Handle to the article file. Sole durable owner of article state.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    path: PathBuf,
}

impl ArticleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored article, in file order.
    pub fn read_all(&self) -> Result<Vec<ArticleRecord>> {
        read_all(&self.path)
    }

    /// Articles not yet accepted by the publishing API, in file order.
    pub fn unposted(&self) -> Result<Vec<ArticleRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|a| !a.api_posted)
            .collect())
    }

    /// Look up one article by id.
    pub fn get(&self, id: u64) -> Result<Option<ArticleRecord>> {
        Ok(self.read_all()?.into_iter().find(|a| a.id == Some(id)))
    }

    /// Append one article, assigning `max(existing ids) + 1` when it has no id.
    ///
    /// Returns the record as stored.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn append(&self, mut record: ArticleRecord) -> Result<ArticleRecord> {
        check_category(&record)?;
        let content = read_content(&self.path)?;
        let existing: Vec<ArticleRecord> = match &content {
            Some(c) => parse_records(&self.path, c)?,
            None => Vec::new(),
        };

        let id = match record.id {
            Some(id) if existing.iter().any(|a| a.id == Some(id)) => {
                return Err(ArticleSmithError::validation(format!(
                    "article {id} already exists in {}",
                    self.path.display()
                )));
            }
            Some(id) => id,
            None => existing.iter().filter_map(|a| a.id).max().unwrap_or(0) + 1,
        };
        record.id = Some(id);

        let mut out = String::new();
        match content.as_deref() {
            None => out.push_str(&codec::encode_row(&ARTICLE_COLUMNS)),
            Some(c) if c.trim().is_empty() => out.push_str(&codec::encode_row(&ARTICLE_COLUMNS)),
            Some(c) if !c.ends_with('\n') => out.push_str(codec::LINE_END),
            Some(_) => {}
        }
        out.push_str(&encode_article(&record));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ArticleSmithError::io(parent, e))?;
        }

        // A whitespace-only file is replaced so the header lands on the first line.
        let truncate = content.as_deref().is_some_and(|c| c.trim().is_empty());
        let mut file = OpenOptions::new()
            .create(true)
            .append(!truncate)
            .write(true)
            .truncate(truncate)
            .open(&self.path)
            .map_err(|e| ArticleSmithError::io(&self.path, e))?;
        file.write_all(out.as_bytes())
            .map_err(|e| ArticleSmithError::io(&self.path, e))?;

        debug!(id, title = %record.title, "appended article");
        Ok(record)
    }

    /// Merge `update` over the article with `id` and rewrite the file.
    ///
    /// Fails with [`ArticleSmithError::NotFound`] without touching the file
    /// when no article has `id`.
    #[instrument(skip_all, fields(path = %self.path.display(), id = id))]
    pub fn update(&self, id: u64, update: ArticleUpdate) -> Result<()> {
        let mut records = self.read_all()?;
        let record = records
            .iter_mut()
            .find(|a| a.id == Some(id))
            .ok_or(ArticleSmithError::NotFound { id })?;

        update.apply_to(record);
        check_category(record)?;
        self.write_all(&records)?;

        debug!(id, "updated article");
        Ok(())
    }

    /// Replace the file with header + `records`, via a synced temp file in the
    /// same directory that is then renamed over the target.
    fn write_all(&self, records: &[ArticleRecord]) -> Result<()> {
        let mut out = codec::encode_row(&ARTICLE_COLUMNS);
        for record in records {
            out.push_str(&encode_article(record));
        }

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ArticleSmithError::io(dir, e))?;
        tmp.write_all(out.as_bytes())
            .map_err(|e| ArticleSmithError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| ArticleSmithError::io(tmp.path(), e))?;
        tmp.persist(&self.path).map_err(|e| {
            ArticleSmithError::Storage(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        info!(records = records.len(), "rewrote article file");
        Ok(())
    }
}

/// A label made only of digits would be read back as an `Id`.
fn check_category(record: &ArticleRecord) -> Result<()> {
    match &record.category_id {
        label @ CategoryId::Label(_) if label.is_numeric_label() => {
            Err(ArticleSmithError::validation(format!(
                "category label '{label}' is numeric and would be stored as a catalog id"
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use articlesmith_shared::ArticleStatus;
    use uuid::Uuid;

    /// Unique path under the system temp dir.
    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("as_test_{}", Uuid::now_v7()))
            .join(name)
    }

    fn write_file(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn article(title: &str, body: &str) -> ArticleRecord {
        ArticleRecord {
            id: None,
            category_id: CategoryId::Id(3),
            title: title.into(),
            body: body.into(),
            slug: "slug".into(),
            status: ArticleStatus::Draft,
            meta_title: format!("{title} | meta"),
            meta_description: "description".into(),
            api_posted: false,
        }
    }

    #[test]
    fn missing_and_header_only_files_are_empty() {
        let path = temp_file("missing.csv");
        let personas: Vec<PersonaRecord> = read_all(&path).unwrap();
        assert!(personas.is_empty());

        let path = temp_file("keywords.csv");
        write_file(
            &path,
            "ID,Category,Main_Keyword,Sub_Keywords,User_Intent,Title_Idea\n",
        );
        let keywords: Vec<KeywordRecord> = read_all(&path).unwrap();
        assert!(keywords.is_empty());
    }

    #[test]
    fn reads_personas_and_keywords() {
        let path = temp_file("personas.csv");
        write_file(
            &path,
            "Category,Persona_Detail,Worry_Description,Tone_Instruction,Context_Scenario\n\
             現役施設介護士,\"30代, 夜勤あり\",腰痛,やさしく,夜勤明け\n",
        );
        let personas: Vec<PersonaRecord> = read_all(&path).unwrap();
        assert_eq!(personas.len(), 1);
        assert_eq!(personas[0].category, "現役施設介護士");
        assert_eq!(personas[0].persona_detail, "30代, 夜勤あり");

        let path = temp_file("keywords.csv");
        write_file(
            &path,
            "ID,Category,Main_Keyword,Sub_Keywords,User_Intent,Title_Idea\n\
             k1,現役施設介護士,介護 腰痛,\"予防,ストレッチ\",対策を知りたい,腰痛対策\n",
        );
        let keywords: Vec<KeywordRecord> = read_all(&path).unwrap();
        assert_eq!(keywords[0].id, "k1");
        assert_eq!(keywords[0].sub_keywords, "予防,ストレッチ");
    }

    #[test]
    fn columns_located_by_header_name() {
        let path = temp_file("personas.csv");
        write_file(
            &path,
            "Persona_Detail,Category,Worry_Description,Tone_Instruction,Context_Scenario\n\
             detail,A,worry,tone,scene\n",
        );
        let personas: Vec<PersonaRecord> = read_all(&path).unwrap();
        assert_eq!(personas[0].category, "A");
        assert_eq!(personas[0].persona_detail, "detail");
    }

    #[test]
    fn missing_column_is_validation_error() {
        let path = temp_file("personas.csv");
        write_file(&path, "Category,Persona_Detail\nA,detail\n");
        let err = read_all::<PersonaRecord>(&path).unwrap_err();
        assert!(err.to_string().contains("Worry_Description"));
    }

    #[test]
    fn append_assigns_sequential_ids() {
        let store = ArticleStore::new(temp_file("articles.csv"));

        let first = store.append(article("one", "body")).unwrap();
        assert_eq!(first.id, Some(1));

        let second = store.append(article("two", "body")).unwrap();
        assert_eq!(second.id, Some(2));

        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].title, "two");
    }

    #[test]
    fn append_uses_max_id_not_count() {
        let path = temp_file("articles.csv");
        write_file(
            &path,
            "id,category_id,title,body,slug,status,meta_title,meta_description,api_posted\n\
             3,3,a,b,s,draft,m,d,0\n\
             7,3,a,b,s,draft,m,d,1\n",
        );
        let store = ArticleStore::new(&path);
        let appended = store.append(article("next", "body")).unwrap();
        assert_eq!(appended.id, Some(8));
    }

    #[test]
    fn append_rejects_duplicate_explicit_id() {
        let store = ArticleStore::new(temp_file("articles.csv"));
        store.append(article("one", "body")).unwrap();

        let mut dup = article("dup", "body");
        dup.id = Some(1);
        assert!(store.append(dup).is_err());
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn append_to_file_without_trailing_newline() {
        let path = temp_file("articles.csv");
        write_file(
            &path,
            "id,category_id,title,body,slug,status,meta_title,meta_description,api_posted\n\
             1,3,a,b,s,draft,m,d,0",
        );
        let store = ArticleStore::new(&path);
        store.append(article("two", "body")).unwrap();
        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, Some(2));
    }

    #[test]
    fn roundtrip_is_stable_with_awkward_bodies() {
        let store = ArticleStore::new(temp_file("articles.csv"));
        store
            .append(article("comma, title", "line one\nline two, with comma"))
            .unwrap();
        store
            .append(article("quote \"title\"", "He said \"hello\"\r\nthen left"))
            .unwrap();
        let mut labelled = article("label", "");
        labelled.category_id = CategoryId::Label("現役施設介護士".into());
        labelled.api_posted = true;
        store.append(labelled).unwrap();

        let first = store.read_all().unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].body, "line one\nline two, with comma");
        assert_eq!(first[1].title, "quote \"title\"");
        assert_eq!(first[2].category_id, CategoryId::Label("現役施設介護士".into()));
        assert!(first[2].api_posted);

        let copy = ArticleStore::new(temp_file("copy.csv"));
        for record in &first {
            copy.append(record.clone()).unwrap();
        }
        let second = copy.read_all().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn update_missing_id_leaves_file_untouched() {
        let store = ArticleStore::new(temp_file("articles.csv"));
        store.append(article("one", "body\nwith newline")).unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let err = store.update(99, ArticleUpdate::posted()).unwrap_err();
        assert!(matches!(err, ArticleSmithError::NotFound { id: 99 }));

        let after = std::fs::read(store.path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn update_changes_only_target() {
        let store = ArticleStore::new(temp_file("articles.csv"));
        store.append(article("one", "body")).unwrap();
        store.append(article("two", "multi\nline")).unwrap();
        store.append(article("three", "body")).unwrap();
        let before = store.read_all().unwrap();

        store
            .update(
                2,
                ArticleUpdate {
                    status: Some(ArticleStatus::Published),
                    api_posted: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let after = store.read_all().unwrap();
        assert_eq!(after.len(), 3);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert_eq!(after[1].id, Some(2));
        assert_eq!(after[1].body, "multi\nline");
        assert_eq!(after[1].status, ArticleStatus::Published);
        assert!(after[1].api_posted);
        let leftovers: Vec<_> = std::fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("articles.csv")]);
    }

    #[test]
    fn unposted_filters_in_store_order() {
        let store = ArticleStore::new(temp_file("articles.csv"));
        store.append(article("one", "b")).unwrap();
        store.append(article("two", "b")).unwrap();
        store.append(article("three", "b")).unwrap();
        store.update(2, ArticleUpdate::posted()).unwrap();

        let pending = store.unposted().unwrap();
        let ids: Vec<_> = pending.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![Some(1), Some(3)]);
        assert!(store.get(2).unwrap().unwrap().api_posted);
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn booleans_and_status_parse() {
        let path = temp_file("articles.csv");
        write_file(
            &path,
            "id,category_id,title,body,slug,status,meta_title,meta_description,api_posted\n\
             1,3,a,b,s,published,m,d,true\n\
             2,3,a,b,s,,m,d,\n",
        );
        let all = ArticleStore::new(&path).read_all().unwrap();
        assert!(all[0].api_posted);
        assert_eq!(all[0].status, ArticleStatus::Published);
        assert!(!all[1].api_posted);
        assert_eq!(all[1].status, ArticleStatus::Draft);
    }

    #[test]
    fn update_leaves_unrelated_tmp_sibling_alone() {
        let store = ArticleStore::new(temp_file("articles.csv"));
        store.append(article("one", "body")).unwrap();
        let sibling = store.path().with_file_name("articles.csv.tmp");
        std::fs::write(&sibling, "USER DATA").unwrap();

        store.update(1, ArticleUpdate::posted()).unwrap();

        assert_eq!(std::fs::read_to_string(&sibling).unwrap(), "USER DATA");
        assert!(store.get(1).unwrap().unwrap().api_posted);
    }

    #[test]
    fn odd_status_and_id_cells_do_not_block_the_store() {
        let path = temp_file("articles.csv");
        write_file(
            &path,
            "id,category_id,title,body,slug,status,meta_title,meta_description,api_posted\n\
             1,3,a,b,s,Published,m,d,1\n\
             2,3,a,b,s,draft,m,d,0\n\
             x,3,c,b,s,archived,m,d,0\n",
        );
        let store = ArticleStore::new(&path);

        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].status, ArticleStatus::Published);
        assert_eq!(all[2].id, None);
        assert_eq!(all[2].status, ArticleStatus::Draft);

        let unposted = store.unposted().unwrap();
        assert_eq!(unposted.len(), 2);

        let appended = store.append(article("next", "body")).unwrap();
        assert_eq!(appended.id, Some(3));
        store.update(2, ArticleUpdate::posted()).unwrap();
        assert!(store.get(2).unwrap().unwrap().api_posted);
        assert_eq!(store.read_all().unwrap().len(), 4);
    }

    #[test]
    fn numeric_label_is_rejected_before_writing() {
        let store = ArticleStore::new(temp_file("articles.csv"));
        let mut numeric = article("numeric", "body");
        numeric.category_id = CategoryId::Label("12".into());
        assert!(matches!(
            store.append(numeric).unwrap_err(),
            ArticleSmithError::Validation { .. }
        ));
        assert!(!store.path().exists());

        store.append(article("one", "body")).unwrap();
        let before = std::fs::read(store.path()).unwrap();
        let err = store
            .update(
                1,
                ArticleUpdate {
                    category_id: Some(CategoryId::Label("7".into())),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.to_string().contains("numeric"));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    /// Record kind whose rows fail to decode when `value` is "bad".
    #[derive(Debug)]
    struct Strict;

    impl CsvRecord for Strict {
        const COLUMNS: &'static [&'static str] = &["value"];
        const FRAMING: Framing = Framing::Line;

        fn from_row(row: &Row<'_>) -> Result<Self> {
            match row.get("value") {
                "bad" => Err(ArticleSmithError::validation("value is bad")),
                _ => Ok(Self),
            }
        }
    }

    #[test]
    fn row_error_names_file_and_record_once() {
        let path = temp_file("strict.csv");
        write_file(&path, "value\nok\nbad\n");
        let err = read_all::<Strict>(&path).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("validation error: "));
        assert!(msg.ends_with("strict.csv: record 2: value is bad"), "{msg}");
        assert_eq!(msg.matches("validation error").count(), 1);
    }
}
