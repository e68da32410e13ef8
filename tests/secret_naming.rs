//! Properties of SDS secret names

use listener_translator::xds::{sds_secret_name, TlsSecret};
use proptest::prelude::*;

#[test]
fn test_secret_name_format() {
    let secret = TlsSecret::new("dummy-namespace", "dummy-secret-1");
    assert_eq!(
        sds_secret_name("dummy-secret-namespace", &secret),
        "dummy-secret-namespace/dummy-namespace-dummy-secret-1"
    );
}

proptest! {
    #[test]
    fn secret_name_is_stable(hosting in "[a-z0-9-]{1,20}", ns in "[a-z0-9-]{1,20}", name in "[a-z0-9-]{1,20}") {
        let secret = TlsSecret::new(ns, name);
        prop_assert_eq!(sds_secret_name(&hosting, &secret), sds_secret_name(&hosting, &secret.clone()));
        let prefix = format!("{}/", hosting);
        prop_assert!(sds_secret_name(&hosting, &secret).starts_with(&prefix));
    }

    #[test]
    fn distinct_secrets_get_distinct_names(
        hosting in "[a-z0-9]{1,12}",
        a in ("[a-z0-9]{1,12}", "[a-z0-9]{1,12}"),
        b in ("[a-z0-9]{1,12}", "[a-z0-9]{1,12}"),
    ) {
        // Without dashes in the parts the derived name is injective
        prop_assume!(a != b);
        let first = TlsSecret::new(a.0, a.1);
        let second = TlsSecret::new(b.0, b.1);
        prop_assert_ne!(sds_secret_name(&hosting, &first), sds_secret_name(&hosting, &second));
    }
}
