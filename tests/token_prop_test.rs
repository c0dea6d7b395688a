use payum_token::*;

use proptest::prelude::*;

fn param_name() -> impl Strategy<Value = String> {
    prop_oneof![Just(TOKEN_PARAMETER.to_string()), "[a-z]{1,6}"]
}

fn params() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((param_name(), "[a-zA-Z0-9 &=]{0,8}"), 0..6)
}

fn factory() -> UrlTokenFactory<MemoryTokenStorage, SimpleStorageRegistry, PlainUrlGenerator> {
    UrlTokenFactory::new(
        MemoryTokenStorage::new(),
        SimpleStorageRegistry::new(),
        PlainUrlGenerator::new(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]
    #[test]
    fn test_target_url_has_single_token_parameter(
        existing in params(),
        target in params(),
        absolute in any::<bool>(),
    ) {
        let existing: QueryParams = existing.into_iter().collect();
        let base = if absolute { "http://example.com/capture" } else { "capture" };
        let path = if existing.is_empty() {
            base.to_string()
        } else {
            format!("{}?{}", base, existing)
        };

        let token = factory()
            .create_token(
                TokenRequest::builder()
                    .payment_name("paypal")
                    .target_path(path)
                    .target_parameters(target.into_iter().collect())
                    .build(),
            )
            .unwrap();

        let query = token.target_url().split_once('?').map(|(_, q)| q).unwrap_or("");
        let values: Vec<String> = url::form_urlencoded::parse(query.as_bytes())
            .filter(|(name, _)| name == TOKEN_PARAMETER)
            .map(|(_, value)| value.into_owned())
            .collect();
        prop_assert_eq!(values, vec![token.hash().to_string()]);
    }

    #[test]
    fn test_after_url_keeps_existing_token_parameter(
        value in "[a-zA-Z0-9]{1,10}",
        after in params(),
    ) {
        let after: Vec<(String, String)> = after
            .into_iter()
            .filter(|(name, _)| name != TOKEN_PARAMETER)
            .collect();

        let token = factory()
            .create_token(
                TokenRequest::builder()
                    .payment_name("paypal")
                    .target_path("capture")
                    .after_path(format!("http://example.com/done?{}={}", TOKEN_PARAMETER, value))
                    .after_parameters(after.into_iter().collect())
                    .build(),
            )
            .unwrap();

        let after_url = url::Url::parse(token.after_url().unwrap()).unwrap();
        let values: Vec<String> = after_url
            .query_pairs()
            .filter(|(name, _)| name == TOKEN_PARAMETER)
            .map(|(_, value)| value.into_owned())
            .collect();
        prop_assert_eq!(values, vec![value]);
    }
}
