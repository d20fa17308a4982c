//! The extractor driving a marker index over templates on disk.

use marker_extractor::I18nAttributeExtractor;
use marker_indexer::{
    DocumentFilter, FsDocumentSource, IndexerConfig, MarkerIndex, OccurrenceState,
    HTML_TAG_MESSAGE, MISMATCH_MESSAGE,
};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;

async fn index_for(root: &Path) -> MarkerIndex {
    let config = IndexerConfig::load_for_root(root).await.unwrap();
    let filter = DocumentFilter::from_config(&config).unwrap();
    let source = FsDocumentSource::new(root, filter.clone())
        .unwrap()
        .respect_gitignore(config.respect_gitignore);
    MarkerIndex::new(Arc::new(source), Arc::new(I18nAttributeExtractor::new()), filter)
}

#[tokio::test]
async fn editing_one_template_flags_the_shared_id_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::write(root.join("a.html"), r#"<h1 i18n="@@welcome">Hello {{name}}</h1>"#).unwrap();
    std::fs::write(root.join("b.html"), r#"<h2 i18n="@@welcome">Hello {{other}}</h2>"#).unwrap();

    let index = index_for(root).await;
    index.initialize().wait().await.expect("scan succeeds");
    let snapshot = index.snapshot();
    assert_eq!(snapshot.validated_of("welcome").len(), 2);
    assert_eq!(snapshot.summary().success, 2);

    std::fs::write(root.join("b.html"), r#"<h2 i18n="@@welcome">Hi {{other}}</h2>"#).unwrap();
    index.notify_saved("b.html").unwrap();
    index.flush().await.unwrap();

    let snapshot = index.snapshot();
    let validated: Vec<_> = snapshot
        .validated_of("welcome")
        .iter()
        .map(|t| (t.document.as_str(), t.occurrence.state, t.occurrence.error.as_deref()))
        .collect();
    assert_eq!(
        validated,
        vec![
            ("a.html", OccurrenceState::Error, Some(MISMATCH_MESSAGE)),
            ("b.html", OccurrenceState::Error, Some(MISMATCH_MESSAGE)),
        ]
    );
}

#[tokio::test]
async fn markup_in_a_lone_translation_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.html"),
        r#"<p i18n="@@bold"><b>Hello</b></p>"#,
    )
    .unwrap();

    let index = index_for(dir.path()).await;
    index.initialize().wait().await.unwrap();
    let snapshot = index.snapshot();
    let bold = &snapshot.validated_of("bold")[0].occurrence;
    assert_eq!(bold.state, OccurrenceState::Warning);
    assert_eq!(bold.error.as_deref(), Some(HTML_TAG_MESSAGE));
}

#[tokio::test]
async fn corpus_config_narrows_the_eligible_documents() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("app")).unwrap();
    std::fs::create_dir_all(root.join("legacy")).unwrap();
    std::fs::write(
        root.join(".marker-index.toml"),
        "include = [\"app/**/*.html\"]\n",
    )
    .unwrap();
    std::fs::write(root.join("app/a.html"), r#"<p i18n="@@k">A</p>"#).unwrap();
    std::fs::write(root.join("legacy/b.html"), r#"<p i18n="@@k">B</p>"#).unwrap();

    let index = index_for(root).await;
    let stats = index.initialize().wait().await.unwrap();
    assert_eq!(stats.documents, 1);

    // saves outside the configured corpus are ignored
    index.notify_saved("legacy/b.html").unwrap();
    index.flush().await.unwrap();
    let snapshot = index.snapshot();
    assert_eq!(snapshot.validated_of("k").len(), 1);
    assert!(snapshot.validated_of("k")[0].occurrence.is_success());
}

#[tokio::test]
async fn deleted_templates_leave_the_index() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::write(root.join("a.html"), r#"<p i18n="@@k">A</p>"#).unwrap();
    std::fs::write(root.join("b.html"), r#"<p i18n="@@k">B</p>"#).unwrap();

    let index = index_for(root).await;
    index.initialize().wait().await.unwrap();
    assert_eq!(index.snapshot().summary().error, 2);

    std::fs::remove_file(root.join("b.html")).unwrap();
    // a save for a vanished file is stale and changes nothing
    index.notify_saved("b.html").unwrap();
    assert_eq!(index.flush().await, Some(1));

    index.notify_removed("b.html").unwrap();
    index.flush().await.unwrap();
    let snapshot = index.snapshot();
    assert!(!snapshot.by_file.contains_key("b.html"));
    assert_eq!(snapshot.summary().success, 1);
    assert_eq!(snapshot.summary().error, 0);
}
