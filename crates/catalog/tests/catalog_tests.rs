use std::path::PathBuf;

use numismat_catalog::{
    Catalog, CatalogError, CatalogWarning, Message, PluralRule, TranslateParams, Translation,
    TranslationStatus,
};
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(name: &str) -> Catalog {
    Catalog::load(fixture(name)).expect("fixture catalog")
}

#[test]
fn ukrainian_coin_selection_uses_four_forms() {
    let catalog = load("lang_uk.ts");
    assert_eq!(catalog.language(), "uk");
    assert_eq!(catalog.plural_rule(), PluralRule::EastSlavic);

    let cases = [
        (1, "1 монета обрана"),
        (2, "2 монети обрано"),
        (5, "5 монет обрано"),
        (21, "21 монета обрана"),
    ];
    for (count, expected) in cases {
        assert_eq!(
            catalog.translate_plural("BaseTableView", "%n coin(s) selected", count),
            expected,
            "count {count}"
        );
    }
}

#[test]
fn spanish_cancel_is_translated() {
    let catalog = load("lang_es.ts");
    assert_eq!(catalog.lookup("Collection", "Cancel"), "Cancelar");
}

#[test]
fn italian_unfinished_entry_returns_source() {
    let catalog = load("lang_it.ts");
    let message = catalog
        .find("CollectionFieldsBase", "Category", None)
        .expect("entry present");
    assert_eq!(message.status, TranslationStatus::Unfinished);
    assert_eq!(catalog.lookup("CollectionFieldsBase", "Category"), "Category");
}

#[test]
fn unknown_context_and_source_return_source() {
    let catalog = load("lang_es.ts");
    assert_eq!(catalog.lookup("NoSuchContext", "Cancel"), "Cancel");
    assert_eq!(catalog.lookup("Collection", "No such text"), "No such text");
    assert_eq!(
        catalog.translate_plural("NoSuchContext", "%n coin(s) selected", 3),
        "3 coin(s) selected"
    );
}

#[test]
fn unfinished_plural_falls_back_to_source() {
    let catalog = load("lang_cs.ts");
    assert_eq!(catalog.plural_rule().form_count(), 4);
    assert_eq!(
        catalog.translate_plural("BaseTableView", "%n coin(s) selected", 2),
        "2 coin(s) selected"
    );
}

#[test]
fn repeated_context_blocks_are_merged() {
    let catalog = load("lang_uk.ts");
    assert_eq!(catalog.contexts().len(), 72);
    assert_eq!(catalog.message_count(), 745);
    assert!(catalog.context("YearCalculatorDialog").is_some());
}

#[test]
fn fixture_statistics_match_documents() {
    let expected = [
        ("lang_uk.ts", 745, 0),
        ("lang_es.ts", 570, 9),
        ("lang_it.ts", 570, 53),
        ("lang_cs.ts", 530, 147),
    ];
    for (name, messages, unfinished) in expected {
        let catalog = load(name);
        let stats = catalog.stats();
        assert_eq!(stats.messages, messages, "{name}");
        assert_eq!(stats.unfinished, unfinished, "{name}");
        assert_eq!(stats.translated, messages - unfinished, "{name}");
        assert_eq!(stats.obsolete, 0, "{name}");
        assert_eq!(stats.plural, 2, "{name}");
        assert!(catalog.warnings().is_empty(), "{name}: {:?}", catalog.warnings());
        assert_eq!(catalog.untranslated().count(), unfinished, "{name}");
    }
}

#[test]
fn encoding_attribute_is_preserved() {
    let catalog = load("lang_uk.ts");
    let message = catalog
        .contexts()
        .iter()
        .flat_map(|context| context.messages())
        .find(|message| message.source == "PLN - Polish złoty")
        .expect("message present");
    assert_eq!(message.encoding.as_deref(), Some("UTF-8"));
    assert!(message.is_translated());
}

#[test]
fn fixtures_survive_write_and_reload() {
    for name in ["lang_uk.ts", "lang_es.ts", "lang_it.ts", "lang_cs.ts"] {
        let original = load(name);
        let xml = original.to_ts_string().expect("encode");
        let reparsed = Catalog::from_ts_str(&xml).expect("reparse");

        assert_eq!(reparsed.language(), original.language(), "{name}");
        assert_eq!(reparsed.contexts().len(), original.contexts().len(), "{name}");
        for (before, after) in original.contexts().iter().zip(reparsed.contexts()) {
            assert_eq!(before.name(), after.name());
            assert_eq!(before.messages(), after.messages(), "{name} / {}", before.name());
        }
    }
}

#[test]
fn write_to_path_replaces_file() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("nested").join("lang_es.ts");

    let mut catalog = Catalog::new("es");
    catalog.push_message("Collection", Message::new("Cancel", "Cancelar"));
    catalog.write_to_path(&path).expect("write");
    assert!(!path.with_extension("ts.tmp").exists());

    let reloaded = Catalog::load(&path).expect("reload");
    assert_eq!(reloaded.lookup("Collection", "Cancel"), "Cancelar");
}

#[test]
fn translate_renders_positional_and_count() {
    let xml = r#"<?xml version="1.0" ?><!DOCTYPE TS><TS version="2.0" language="uk">
<context>
    <name>ImportDialog</name>
    <message numerus="yes">
        <source>Imported %n coin(s) from %1</source>
        <translation><numerusform>Імпортовано %n монету з %1</numerusform><numerusform>Імпортовано %n монети з %1</numerusform><numerusform>Імпортовано %n монет з %1</numerusform><numerusform>Імпортовано %n монет з %1</numerusform></translation>
    </message>
</context>
</TS>"#;
    let catalog = Catalog::from_ts_str(xml).expect("parse");
    let values = ["Colnect"];
    let rendered = catalog.translate(
        "ImportDialog",
        "Imported %n coin(s) from %1",
        &TranslateParams::with_count(&values, 3),
    );
    assert_eq!(rendered, "Імпортовано 3 монети з Colnect");
}

#[test]
fn optional_elements_are_kept() {
    let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="es" sourcelanguage="en">
<context>
    <name>ListView</name>
    <message id="open.state">
        <location filename="ListView.py" line="10"/>
        <location line="+5"/>
        <source>Open</source>
        <oldsource>Opened</oldsource>
        <comment>state</comment>
        <extracomment>Shown in the status column</extracomment>
        <translatorcomment>Adjective</translatorcomment>
        <translation>Abierto</translation>
    </message>
    <message>
        <source>Old</source>
        <translation type="vanished">Viejo</translation>
    </message>
</context>
</TS>
"#;
    let catalog = Catalog::from_ts_str(xml).expect("parse");
    assert_eq!(catalog.version(), "2.1");
    assert_eq!(catalog.source_language(), Some("en"));

    let message = catalog.find("ListView", "Open", Some("state")).expect("message");
    assert_eq!(message.id.as_deref(), Some("open.state"));
    assert_eq!(message.old_source.as_deref(), Some("Opened"));
    assert_eq!(message.extra_comment.as_deref(), Some("Shown in the status column"));
    assert_eq!(message.translator_comment.as_deref(), Some("Adjective"));
    assert_eq!(message.locations[1].filename, "ListView.py");
    assert_eq!(message.locations[1].line, Some(15));

    assert_eq!(catalog.lookup_with_comment("ListView", "Open", "state"), "Abierto");
    assert_eq!(catalog.lookup("ListView", "Open"), "Open");
    assert_eq!(catalog.lookup("ListView", "Old"), "Old");
    assert_eq!(catalog.stats().obsolete, 1);

    let reparsed = Catalog::from_ts_str(&catalog.to_ts_string().expect("encode")).expect("reparse");
    assert_eq!(reparsed.contexts()[0].messages(), catalog.contexts()[0].messages());
    assert_eq!(reparsed.version(), "2.1");
}

#[test]
fn diagnostics_are_collected() {
    let xml = r#"<TS version="2.0" language="uk">
<context>
    <name>BaseTableView</name>
    <message numerus="yes">
        <source>%n row(s)</source>
        <translation><numerusform>%n рядок</numerusform><numerusform>%n рядки</numerusform></translation>
    </message>
    <message>
        <location filename="ListView.py" line="abc"/>
        <source>Delete</source>
        <translation type="draft">Видалити</translation>
    </message>
</context>
</TS>"#;
    let catalog = Catalog::from_ts_str(xml).expect("parse");
    let warnings = catalog.warnings();
    assert_eq!(warnings.len(), 3, "{warnings:?}");
    assert!(warnings.iter().any(|warning| matches!(
        warning,
        CatalogWarning::PluralFormMismatch { expected: 4, found: 2, .. }
    )));
    assert!(warnings
        .iter()
        .any(|warning| matches!(warning, CatalogWarning::InvalidLocation { value, .. } if value == "abc")));
    assert!(warnings
        .iter()
        .any(|warning| matches!(warning, CatalogWarning::UnknownStatus { value, .. } if value == "draft")));

    // Unknown type values keep the entry usable.
    assert_eq!(catalog.lookup("BaseTableView", "Delete"), "Видалити");
    assert_eq!(catalog.translate_plural("BaseTableView", "%n row(s)", 2), "2 рядки");
    assert_eq!(catalog.translate_plural("BaseTableView", "%n row(s)", 5), "5 row(s)");
}

#[test]
fn surplus_plural_forms_are_reported_and_never_selected() {
    let xml = r#"<TS version="2.0" language="uk">
<context>
    <name>BaseTableView</name>
    <message numerus="yes">
        <source>%n row(s)</source>
        <translation><numerusform>%n рядок</numerusform><numerusform>%n рядки</numerusform><numerusform>%n рядків</numerusform><numerusform>%n рядка</numerusform><numerusform>%n зайвий</numerusform></translation>
    </message>
</context>
</TS>"#;
    let catalog = Catalog::from_ts_str(xml).expect("parse");
    assert!(matches!(
        catalog.warnings(),
        [CatalogWarning::PluralFormMismatch { expected: 4, found: 5, .. }]
    ));

    let message = &catalog.context("BaseTableView").expect("context").messages()[0];
    assert_eq!(message.translation.form(4), Some("%n зайвий"));
    for count in -50..=1000 {
        let rendered = catalog.translate_plural("BaseTableView", "%n row(s)", count);
        assert!(!rendered.contains("зайвий"), "count {count} picked {rendered}");
    }
    assert_eq!(catalog.translate_plural("BaseTableView", "%n row(s)", 11), "11 рядків");
}

#[test]
fn malformed_document_reports_line() {
    let xml = "<TS version=\"2.0\" language=\"es\">\n<context>\n    <name>A</name>\n    <message>\n        <source>Open</source>\n    </context>\n</TS>";
    let err = Catalog::from_ts_str(xml).unwrap_err();
    assert!(err.line >= 4, "{err}");
    assert!(err.to_string().contains("<memory>"));
}

#[test]
fn missing_file_is_read_error() {
    let temp = tempdir().expect("tempdir");
    let err = Catalog::load(temp.path().join("lang_xx.ts")).unwrap_err();
    assert!(matches!(err, CatalogError::Read { .. }));
}

#[test]
fn single_form_plural_answers_every_count() {
    let mut catalog = Catalog::new("ja");
    catalog.push_message(
        "BaseTableView",
        Message::plural("%n coin(s) selected", vec!["%n 枚選択".into()]),
    );
    assert_eq!(
        catalog.translate_plural("BaseTableView", "%n coin(s) selected", 1),
        "1 枚選択"
    );
    assert_eq!(
        catalog.translate_plural("BaseTableView", "%n coin(s) selected", 40),
        "40 枚選択"
    );
    assert_eq!(
        catalog.find("BaseTableView", "%n coin(s) selected", None).map(|m| &m.translation),
        Some(&Translation::Plural(vec!["%n 枚選択".into()]))
    );
}
