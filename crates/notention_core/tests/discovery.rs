use notention_core::{CoreConfig, DiscoveryService, Note};

const BUDGET_QUERY: &str = r#"<p>Need a site <span class="widget property" data-key="budget" data-operator="less than" data-values='["100"]'></span></p>"#;

#[test]
fn finds_matching_candidates_except_own_notes() {
    let mut discovery = DiscoveryService::from_config(&CoreConfig::default());
    let query = Note::new("Need a website", BUDGET_QUERY);
    let own = Note::new("My offer", "<p>[price: 50]</p>");
    let cheap = Note::new("Cheap design", "<p>Web design [price: 90]</p>");
    let pricey = Note::new("Agency", "<p>[price: 200]</p>");
    let candidates = vec![own.clone(), cheap.clone(), pricey, query.clone()];

    let found = discovery.search(&query, &candidates, &[own]);
    let ids: Vec<&str> = found.iter().map(|note| note.id.as_str()).collect();
    assert_eq!(ids, vec![cheap.id.as_str()]);
}

#[test]
fn note_without_usable_criteria_finds_nothing() {
    let mut discovery = DiscoveryService::from_config(&CoreConfig::default());
    let query = Note::new("Just tags", "<p>#idea and prose</p>");
    let candidates = vec![Note::new("Any", "<p>[price: 1]</p>")];
    assert!(discovery.criteria(&query).is_empty());
    assert!(discovery.search(&query, &candidates, &[]).is_empty());
}

#[test]
fn repeated_searches_reuse_cached_semantics() {
    let mut discovery = DiscoveryService::from_config(&CoreConfig::default());
    let query = Note::new("q", BUDGET_QUERY);
    let candidates = vec![Note::new("c", "<p>[price: 90]</p>")];

    assert_eq!(discovery.search(&query, &candidates, &[]).len(), 1);
    let after_first = discovery.cache_stats();
    assert_eq!(discovery.search(&query, &candidates, &[]).len(), 1);
    let after_second = discovery.cache_stats();
    assert_eq!(after_second.misses, after_first.misses);
    assert_eq!(after_second.hits, after_first.hits + 2);
}
