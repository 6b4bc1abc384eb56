// CLASSIFICATION: COMMUNITY
// Filename: section_registry.rs v0.2
// Author: Lukas Bower
// Date Modified: 2027-02-12

//! Section table and registry behaviour visible to embedding code.

use serial_test::serial;

use hostkern::registry::StaticRegistry;
use hostkern::section::{self, TestSectionGuard};

#[derive(Debug, PartialEq)]
struct Probe(u32);

#[test]
#[serial]
fn unresolved_name_is_an_empty_range_not_an_error() {
    let _guard = TestSectionGuard::new();
    let range = section::resolve("no_such_section");
    assert_eq!(range.begin(), range.end());
    assert!(range.is_empty());
    assert_eq!(range.name(), "no_such_section");
}

#[test]
#[serial]
fn registry_over_an_empty_range_yields_zero_elements() {
    let _guard = TestSectionGuard::new();
    static PROBES: StaticRegistry<Probe> = StaticRegistry::new("probe_section_empty");
    let view = PROBES.view();
    assert!(view.is_empty());
    assert_eq!(view.iter().count(), 0);
}

#[test]
#[serial]
fn registered_probes_come_back_in_declaration_order() {
    let _guard = TestSectionGuard::new();
    static PROBES: StaticRegistry<Probe> = StaticRegistry::new("probe_section_order");
    PROBES.register(Probe(7));
    PROBES.register(Probe(5));
    PROBES.register(Probe(9));
    let view = PROBES.view();
    assert_eq!(view.len(), 3);
    let values: Vec<u32> = view.iter().map(|p| p.0).collect();
    assert_eq!(values, vec![7, 5, 9]);
}

#[test]
#[serial]
fn guard_resets_the_table_between_tests() {
    {
        let _guard = TestSectionGuard::new();
        static PROBES: StaticRegistry<Probe> = StaticRegistry::new("probe_section_guarded");
        PROBES.register(Probe(1));
        assert_eq!(PROBES.view().len(), 1);
    }
    // the previous scope froze the section; the guard's reset reopened it
    let _guard = TestSectionGuard::new();
    static PROBES: StaticRegistry<Probe> = StaticRegistry::new("probe_section_guarded");
    PROBES.register(Probe(2));
    assert_eq!(PROBES.view().len(), 1);
}
