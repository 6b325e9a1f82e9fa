//! Property tests for dependency resolution.

use proptest::prelude::*;

use tessera::Params;

use crate::common::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a dependency chain is created bottom-up, each type once.
    #[test]
    fn property_chain_created_in_dependency_order(depth in 1usize..8, target in 0usize..8) {
        let target = target % depth;
        let env = TestEnv::new(&chain_schema(depth));

        env.dispatcher
            .create(&format!("t{target}"), Params::new())
            .unwrap();

        let expected: Vec<String> = (0..=target).map(|i| format!("t{i}")).collect();
        prop_assert_eq!(env.created_types(), expected);
    }

    /// PROPERTY: the shared network is created once however often servers are built.
    #[test]
    fn property_shared_dependency_once_per_request(requests in 1usize..5) {
        let env = TestEnv::new(&network_schema());
        for _ in 0..requests {
            env.dispatcher.create("server", Params::new()).unwrap();
        }
        prop_assert_eq!(
            env.controller.count(tessera::Operation::Create, "network"),
            requests
        );
    }
}
