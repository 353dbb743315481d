use notention_core::{filter_notes, Note, Property};

fn note(id: &str, title: &str, content: &str, tags: &[&str], status: &str) -> Note {
    let mut note = Note::new(title, content);
    note.id = id.to_string();
    note.tags = tags.iter().map(|tag| tag.to_string()).collect();
    note.properties = vec![Property::new("status", "is", vec![status.to_string()])];
    note
}

fn fixtures() -> Vec<Note> {
    vec![
        note(
            "1",
            "First Note",
            "<p>This is a test note about React.</p>",
            &["react", "testing"],
            "draft",
        ),
        note(
            "2",
            "Second Note",
            "<p>Another note, this one is about TypeScript.</p>",
            &["typescript"],
            "published",
        ),
        note(
            "3",
            "Third Note about React",
            "<p>A final note on testing strategies.</p>",
            &["react", "testing"],
            "published",
        ),
    ]
}

fn ids(found: Vec<&Note>) -> Vec<&str> {
    found.into_iter().map(|note| note.id.as_str()).collect()
}

#[test]
fn blank_term_returns_everything() {
    let notes = fixtures();
    assert_eq!(filter_notes(&notes, "").len(), 3);
    assert_eq!(filter_notes(&notes, "   ").len(), 3);
}

#[test]
fn text_terms_search_title_and_body() {
    let notes = fixtures();
    assert_eq!(ids(filter_notes(&notes, "Second")), vec!["2"]);
    assert_eq!(ids(filter_notes(&notes, "TypeScript")), vec!["2"]);
    assert_eq!(ids(filter_notes(&notes, "note React")), vec!["1", "3"]);
    assert_eq!(ids(filter_notes(&notes, r#""testing strategies""#)), vec!["3"]);
}

#[test]
fn tag_and_property_terms() {
    let notes = fixtures();
    assert_eq!(ids(filter_notes(&notes, "#typescript")), vec!["2"]);
    assert_eq!(ids(filter_notes(&notes, "#react #testing")), vec!["1", "3"]);
    assert_eq!(ids(filter_notes(&notes, "status:draft")), vec!["1"]);
    assert_eq!(ids(filter_notes(&notes, r#"status:"published""#)), vec!["2", "3"]);
}

#[test]
fn combined_terms_are_case_insensitive() {
    let notes = fixtures();
    assert_eq!(
        ids(filter_notes(&notes, "NOTE #tEsTiNg sTaTuS:pUbLiShEd")),
        vec!["3"]
    );
}
