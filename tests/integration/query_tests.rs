use anyhow::Result;

use symdex::symbol::SearchOptions;
use symdex::{QueryError, SymbolDescriptor, SymbolKind};

use crate::helpers::test_harness::TestHarness;

async fn indexed_project() -> Result<TestHarness> {
    let harness = TestHarness::new()?;
    harness.write(
        "app/models.py",
        "class User:\n    def save(self): pass\n\nclass UserGroup:\n    def save(self): pass\n",
    )?;
    harness.write(
        "app/views.ts",
        "export class UserView {\n  render(): void {}\n}\nexport function parseUser(raw: string) {}\n",
    )?;
    harness.write(
        "core/lib.rs",
        "pub struct User;\nimpl User {\n    pub fn save(&self) {}\n}\n",
    )?;
    harness.session.trigger_reindex().await?;
    Ok(harness)
}

fn locations(results: &[SymbolDescriptor]) -> Vec<(String, usize)> {
    results
        .iter()
        .map(|s| (s.file_path.clone(), s.line_range.start))
        .collect()
}

#[tokio::test]
async fn test_exact_name_ordered_by_file_then_line() -> Result<()> {
    let harness = indexed_project().await?;

    let results = harness.session.find_by_name("save")?;
    assert_eq!(
        locations(&results),
        vec![
            ("app/models.py".to_string(), 2),
            ("app/models.py".to_string(), 5),
            ("core/lib.rs".to_string(), 3),
        ]
    );
    assert!(results.iter().all(|s| s.kind == SymbolKind::Method));

    Ok(())
}

#[tokio::test]
async fn test_qualified_path_collisions_across_files() -> Result<()> {
    let harness = indexed_project().await?;

    let results = harness.session.find_by_qualified_path("User.save")?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].file_path, "app/models.py");
    assert_eq!(results[1].file_path, "core/lib.rs");

    let group = harness.session.find_by_qualified_path("UserGroup.save")?;
    assert_eq!(group.len(), 1);
    assert_eq!(group[0].line_range.start, 5);

    assert!(harness.session.find_by_qualified_path("User.missing")?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_substring_search_prefers_earlier_matches() -> Result<()> {
    let harness = indexed_project().await?;

    let results = harness.session.search("User")?;
    let names: Vec<&str> = results.iter().map(|s| s.name.as_str()).collect();

    // Matches at position 0 come first in location order, then `parseUser`
    assert_eq!(names.last(), Some(&"parseUser"));
    assert_eq!(names.len(), 5);
    assert_eq!(&names[..3], &["User", "UserGroup", "UserView"]);

    Ok(())
}

#[tokio::test]
async fn test_search_options() -> Result<()> {
    let harness = indexed_project().await?;

    let strict = harness.session.search("user")?;
    assert!(strict.is_empty());

    let options = SearchOptions {
        case_sensitive: false,
        limit: Some(2),
    };
    let relaxed = harness.session.search_with("user", &options)?;
    assert_eq!(relaxed.len(), 2);
    assert_eq!(relaxed[0].name, "User");

    Ok(())
}

#[tokio::test]
async fn test_file_symbols_in_source_order() -> Result<()> {
    let harness = indexed_project().await?;

    let symbols = harness.session.file_symbols("./app/models.py")?;
    let outline: Vec<(&str, &str)> = symbols
        .iter()
        .map(|s| (s.qualified_path.as_str(), s.kind.as_str()))
        .collect();
    assert_eq!(
        outline,
        vec![
            ("User", "class"),
            ("User.save", "method"),
            ("UserGroup", "class"),
            ("UserGroup.save", "method"),
        ]
    );

    assert!(harness.session.file_symbols("app/unknown.py")?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_results_are_deterministic() -> Result<()> {
    let harness = indexed_project().await?;

    let first = harness.session.search("e")?;
    for _ in 0..5 {
        harness.write("app/models.py", "class User:\n    def save(self): pass\n")?;
        harness.session.trigger_reindex().await?;
        harness.write(
            "app/models.py",
            "class User:\n    def save(self): pass\n\nclass UserGroup:\n    def save(self): pass\n",
        )?;
        harness.session.trigger_reindex().await?;

        assert_eq!(harness.session.search("e")?, first);
    }

    Ok(())
}

#[tokio::test]
async fn test_empty_queries_are_rejected() -> Result<()> {
    let harness = indexed_project().await?;

    assert_eq!(
        harness.session.find_by_name("  "),
        Err(QueryError::EmptyQuery { query_kind: "name" })
    );
    assert!(harness.session.find_by_qualified_path("").is_err());
    assert!(harness.session.search("").is_err());
    assert!(harness.session.file_symbols("").is_err());

    // Absent symbols are not errors
    assert_eq!(harness.session.find_by_name("Nope")?, Vec::new());
    Ok(())
}
