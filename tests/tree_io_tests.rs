use std::fs;
use std::rc::Rc;

use indoc::indoc;
use propsync::{DEFAULT_LANGUAGE, Error, LanguageFile, LanguageTree};
use tempfile::TempDir;

fn write_file(dir: &TempDir, relative: &str, content: &str) {
    let path = dir.path().join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn read_file(dir: &TempDir, relative: &str) -> String {
    fs::read_to_string(dir.path().join(relative)).unwrap()
}

#[test]
fn test_bundle_discovery_with_default_language() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "msgs_en.properties", "a = 1\n");
    write_file(&dir, "msgs_fr.properties", "a = un\n");
    write_file(&dir, "msgs.properties", "a = one\n");

    let tree = LanguageTree::new(dir.path(), "en").unwrap();

    let bundle = tree.bundle("msgs").expect("bundle catalogued");
    let languages: Vec<&str> = bundle.languages().iter().map(String::as_str).collect();
    assert_eq!(languages, vec![DEFAULT_LANGUAGE, "en", "fr"]);

    // The unsuffixed file is the default language, never the reference.
    assert!(tree.available_languages().contains(DEFAULT_LANGUAGE));
    assert!(tree.available_languages().contains("en"));
    assert!(tree.available_languages().contains("fr"));
}

#[test]
fn test_bundles_in_nested_directories() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "app/ui/labels_en.properties", "ok = OK\n");
    write_file(&dir, "app/ui/labels_sv.properties", "ok = OK\n");
    write_file(&dir, "app/errors_en.properties", "oops = Oops\n");

    let tree = LanguageTree::new(dir.path(), "en").unwrap();

    assert!(tree.bundle("app/ui/labels").is_some());
    assert!(tree.bundle("app/errors").is_some());
    assert_eq!(tree.bundles().count(), 2);
}

#[test]
fn test_anchor_only_bundle_has_just_the_reference_language() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "lonely_en.properties", "k = v\n");

    let tree = LanguageTree::new(dir.path(), "en").unwrap();
    let bundle = tree.bundle("lonely").unwrap();
    assert_eq!(bundle.languages().len(), 1);
    assert!(bundle.has_language("en"));
}

#[test]
fn test_files_without_reference_anchor_are_not_bundles() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "config.properties", "not = localization\n");
    write_file(&dir, "other_fr.properties", "no = anchor\n");

    let tree = LanguageTree::new(dir.path(), "en").unwrap();
    assert_eq!(tree.bundles().count(), 0);
    assert!(tree.available_languages().is_empty());
}

#[test]
fn test_load_file_decodes_escapes_in_order() {
    let dir = TempDir::new().unwrap();
    write_file(
        &dir,
        "msgs_en.properties",
        indoc! {"
            # greetings
            zebra = last by alphabet, first by line
            greeting = caf\\u00E9
            multiline = one\\ntwo
        "},
    );

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();
    let file = tree.load_file("msgs", "en").unwrap().expect("file exists");
    let file = file.borrow();

    let pairs: Vec<(String, String)> = file
        .pairs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("zebra".to_string(), "last by alphabet, first by line".to_string()),
            ("greeting".to_string(), "café".to_string()),
            ("multiline".to_string(), "one\ntwo".to_string()),
        ]
    );
}

#[test]
fn test_load_file_missing_is_none() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "msgs_en.properties", "a = 1\n");

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();
    assert!(tree.load_file("msgs", "xx").unwrap().is_none());
}

#[test]
fn test_pack_and_file_caches_share_instances() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "a/msgs_en.properties", "k = v\n");
    write_file(&dir, "b/labels_en.properties", "k = v\n");

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();

    let first = tree.load_language("en").unwrap();
    let second = tree.load_language("en").unwrap();
    assert!(Rc::ptr_eq(&first, &second));

    let from_pack = first.file_for_bundle("a/msgs").unwrap().clone();
    let from_loader = tree.load_file("a/msgs", "en").unwrap().unwrap();
    assert!(Rc::ptr_eq(&from_pack, &from_loader));

    tree.clear_cache();
    let third = tree.load_language("en").unwrap();
    assert!(!Rc::ptr_eq(&first, &third));
}

#[test]
fn test_update_rescans_and_reflects_filesystem_changes() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "msgs_en.properties", "a = 1\n");

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();
    let stale = tree.load_language("en").unwrap();
    assert!(!tree.available_languages().contains("de"));

    write_file(&dir, "msgs_de.properties", "a = eins\n");
    tree.update().unwrap();

    assert!(tree.available_languages().contains("de"));
    let fresh = tree.load_language("en").unwrap();
    assert!(!Rc::ptr_eq(&stale, &fresh));
    assert_eq!(tree.load_language("de").unwrap().len(), 1);
}

#[test]
fn test_load_language_skips_catalogued_but_missing_files() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "msgs_en.properties", "a = 1\n");
    write_file(&dir, "msgs_fr.properties", "a = un\n");

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();
    fs::remove_file(dir.path().join("msgs_fr.properties")).unwrap();

    let pack = tree.load_language("fr").unwrap();
    assert!(pack.is_empty());
    assert_eq!(tree.load_language("en").unwrap().len(), 1);
}

#[test]
fn test_save_creates_fresh_file_in_insertion_order() {
    let dir = TempDir::new().unwrap();
    let tree = LanguageTree::new(dir.path(), "en").unwrap();

    let mut file = LanguageFile::new("fresh", "sv");
    file.set("zulu", "sista");
    file.set("alpha", "första");
    assert!(!tree.exists(&file));

    tree.save(&file).unwrap();
    assert!(tree.exists(&file));
    assert_eq!(
        read_file(&dir, "fresh_sv.properties"),
        "zulu = sista\nalpha = f\\u00F6rsta\n"
    );
}

#[test]
fn test_fresh_save_round_trips_latin1_keys() {
    let dir = TempDir::new().unwrap();
    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();

    // Keys are written unescaped, so a fresh file and a later load must
    // agree on the byte encoding of non-ASCII key text.
    let mut file = LanguageFile::new("menu", "fr");
    file.set("café.greeting", "hello");
    file.set("entrée", "première");
    tree.save(&file).unwrap();

    let loaded = tree.load_file("menu", "fr").unwrap().unwrap();
    let loaded = loaded.borrow();
    assert_eq!(loaded.get("café.greeting"), Some("hello"));
    assert_eq!(loaded.get("entrée"), Some("première"));
}

#[test]
fn test_unmappable_key_fails_merge_save_and_leaves_target_untouched() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "msgs_en.properties", "a = 1\n");

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();
    let handle = tree.load_file("msgs", "en").unwrap().unwrap();
    handle.borrow_mut().set("日本語", "value");

    let err = tree.save(&handle.borrow()).unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));
    assert_eq!(read_file(&dir, "msgs_en.properties"), "a = 1\n");
}

#[test]
fn test_unmappable_key_fails_fresh_save_too() {
    let dir = TempDir::new().unwrap();
    let tree = LanguageTree::new(dir.path(), "en").unwrap();

    let mut file = LanguageFile::new("msgs", "ja");
    file.set("日本語", "value");

    assert!(matches!(tree.save(&file), Err(Error::Encoding(_))));
    assert!(!tree.exists(&file));
}

#[test]
fn test_save_preserves_untouched_content() {
    let dir = TempDir::new().unwrap();
    write_file(
        &dir,
        "msgs_en.properties",
        indoc! {"
            # header
            ! note

            a = 1
            b = 2
            c = 3
        "},
    );

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();
    let handle = tree.load_file("msgs", "en").unwrap().unwrap();
    {
        let mut file = handle.borrow_mut();
        file.remove("b");
        file.set("c", "9");
    }
    tree.save(&handle.borrow()).unwrap();

    assert_eq!(
        read_file(&dir, "msgs_en.properties"),
        indoc! {"
            # header
            ! note

            a = 1
            c = 9
        "}
    );
}

#[test]
fn test_save_appends_new_keys_after_preserved_content() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "msgs_en.properties", "a = 1\n# trailing comment\n");

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();
    let handle = tree.load_file("msgs", "en").unwrap().unwrap();
    handle.borrow_mut().set("d", "4");
    tree.save(&handle.borrow()).unwrap();

    assert_eq!(
        read_file(&dir, "msgs_en.properties"),
        "a = 1\n# trailing comment\nd = 4\n"
    );
}

#[test]
fn test_save_unchanged_file_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let content = indoc! {"
        # comment block

        first = one
        second = two words
        malformed line stays
        third = three
    "};
    write_file(&dir, "msgs_en.properties", content);

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();
    let handle = tree.load_file("msgs", "en").unwrap().unwrap();
    tree.save(&handle.borrow()).unwrap();

    assert_eq!(read_file(&dir, "msgs_en.properties"), content);
}

#[test]
fn test_merge_path_round_trips_latin1_comment_bytes() {
    let dir = TempDir::new().unwrap();
    let original: &[u8] = b"# caf\xE9 notes\ngreeting = hello\n";
    fs::write(dir.path().join("msgs_en.properties"), original).unwrap();

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();
    let handle = tree.load_file("msgs", "en").unwrap().unwrap();
    tree.save(&handle.borrow()).unwrap();

    let written = fs::read(dir.path().join("msgs_en.properties")).unwrap();
    assert_eq!(written, original);
}

#[test]
fn test_mutation_through_pack_is_visible_to_save() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "msgs_en.properties", "a = 1\n");

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();
    let pack = tree.load_language("en").unwrap();
    let handle = pack.file_for_bundle("msgs").unwrap().clone();
    handle.borrow_mut().set("a", "changed");

    // The cache hands back the same object the pack mutated.
    let cached = tree.load_file("msgs", "en").unwrap().unwrap();
    tree.save(&cached.borrow()).unwrap();

    assert_eq!(read_file(&dir, "msgs_en.properties"), "a = changed\n");
}

#[test]
fn test_default_language_pack_loads_unsuffixed_files() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "msgs_en.properties", "a = 1\n");
    write_file(&dir, "msgs.properties", "a = fallback\n");

    let mut tree = LanguageTree::new(dir.path(), "en").unwrap();
    let pack = tree.load_language(DEFAULT_LANGUAGE).unwrap();
    assert_eq!(pack.len(), 1);

    let file = pack.file_for_bundle("msgs").unwrap().borrow();
    assert_eq!(file.get("a"), Some("fallback"));
    assert_eq!(file.filename(), "msgs.properties");
}

#[test]
fn test_export_catalog_json() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "msgs_en.properties", "a = 1\n");
    write_file(&dir, "msgs_fr.properties", "a = un\n");

    let tree = LanguageTree::new(dir.path(), "en").unwrap();
    let out = dir.path().join("catalog.json");
    tree.export_catalog_json(&out).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let languages = json["msgs"]["languages"].as_array().unwrap();
    assert!(languages.iter().any(|l| l == "en"));
    assert!(languages.iter().any(|l| l == "fr"));
}

#[test]
fn test_scan_of_missing_root_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    assert!(LanguageTree::new(&missing, "en").is_err());
}
