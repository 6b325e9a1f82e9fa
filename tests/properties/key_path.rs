//! Property tests for key path parsing.

use proptest::prelude::*;

use tessera::KeyPath;

fn atom() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,8}"
}

proptest! {
    /// PROPERTY: parsing never panics, whatever the input.
    #[test]
    fn property_parse_never_panics(text in "\\PC{0,40}") {
        let _ = KeyPath::parse(&text);
    }

    /// PROPERTY: a rendered path parses back to itself.
    #[test]
    fn property_display_parse_round_trip(
        section in proptest::option::of(atom()),
        atoms in proptest::collection::vec(atom(), 1..5),
    ) {
        let mut key = KeyPath::new(atoms.clone()).unwrap();
        if let Some(section) = &section {
            key = key.with_section(section.clone());
        }

        let parsed = KeyPath::parse(&key.to_string()).unwrap();
        prop_assert_eq!(parsed.section(), section.as_deref());
        prop_assert_eq!(parsed.atoms(), atoms.as_slice());
    }

    /// PROPERTY: empty atoms are always rejected.
    #[test]
    fn property_empty_atom_rejected(
        before in proptest::collection::vec(atom(), 0..3),
        after in proptest::collection::vec(atom(), 0..3),
    ) {
        let mut atoms = before;
        atoms.push(String::new());
        atoms.extend(after);
        prop_assert!(KeyPath::new(atoms).is_err());
    }
}
