use eprel::{AssetResponse, Client, Error, ProductLookup, SearchQuery};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(server.uri())
        .assets_url(format!("{}/assets/", server.uri()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn product_with_legacy_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "eprelRegistrationNumber": "12345",
            "supplierOrTrademark": "Acme Corp",
            "energyClass": "A",
            "powerSupplyType": "INTERNAL",
            "contactDetails": {"city": "Berlin"},
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/REFRIGERATORS/999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "registrationNumber": "999",
            "brandName": "Brand Y",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let product = client.product("12345", None).await.unwrap();
    assert_eq!(product.registration_number.as_deref(), Some("12345"));
    assert_eq!(product.brand_name.as_deref(), Some("Acme Corp"));
    assert_eq!(product.energy_class.as_deref(), Some("A"));
    assert!(!product.blocked);
    assert_eq!(
        product.technical_parameter("powerSupplyType"),
        Some(&json!("INTERNAL"))
    );
    assert_eq!(
        product.technical_parameter("contactDetails"),
        Some(&json!({"city": "Berlin"}))
    );

    let product = client.product("999", Some("REFRIGERATORS")).await.unwrap();
    assert_eq!(product.registration_number.as_deref(), Some("999"));
    assert_eq!(product.brand_name.as_deref(), Some("Brand Y"));
    assert!(product.technical_parameters.is_none());
}

#[tokio::test]
async fn product_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "registrationNumber": "42",
            "blocked": 1,
            "noise": 38,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let first = client.product("42", None).await.unwrap();
    let second = client.product("42", None).await.unwrap();
    assert_eq!(first, second);
    assert!(first.blocked);
}

#[tokio::test]
async fn product_with_and_without_group_are_cached_apart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"brandName": "Plain"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/ovens/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"brandName": "Oven"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let plain = client.product("7", None).await.unwrap();
    let oven = client.product("7", Some("ovens")).await.unwrap();
    assert_eq!(plain.brand_name.as_deref(), Some("Plain"));
    assert_eq!(oven.brand_name.as_deref(), Some("Oven"));
}

#[tokio::test]
async fn cache_expires_after_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product-groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .cache_ttl(Duration::ZERO)
        .build()
        .unwrap();

    client.product_groups().await.unwrap();
    client.product_groups().await.unwrap();
}

#[tokio::test]
async fn product_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/99999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.product("99999", None).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err, Error::NotFound("Product not found: 99999".into()));
}

#[tokio::test]
async fn server_error_is_api_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let err = client.product("1", None).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 503, .. }));

    // Listing operations do not address a single resource.
    let err = client.products(&SearchQuery::new()).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 404, .. }));
}

#[tokio::test]
async fn malformed_json_is_api_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{oops", "application/json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.product("1", None).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn product_groups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product-groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "code": "AIR_CONDITIONER",
                "url_code": "airconditioners",
                "name": "Air conditioners",
                "regulation": "Regulation (EU) 626/2011",
            },
            {
                "code": "DOMESTIC_OVEN",
                "url_code": "ovens",
                "name": "Domestic Ovens",
                "regulation": "Regulation (EU) 65/2014",
            },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let groups = client.product_groups().await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].code.as_deref(), Some("AIR_CONDITIONER"));
    assert_eq!(groups[0].url_code.as_deref(), Some("airconditioners"));
    assert_eq!(groups[1].name.as_deref(), Some("Domestic Ovens"));

    assert_eq!(client.product_groups().await.unwrap(), groups);
}

#[tokio::test]
async fn product_groups_wrong_shape_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product-groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "maintenance"})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.product_groups().await.is_err());
    assert!(client.product_groups().await.is_err());
}

#[tokio::test]
async fn products_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("productGroup", "REFRIGERATORS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"registrationNumber": "111", "brandName": "Brand A"},
                {"registrationNumber": "222", "brandName": "Brand B"},
            ],
            "totalElements": 2,
            "totalPages": 1,
            "size": 20,
            "number": 0,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = SearchQuery::new().with_filter("productGroup", "REFRIGERATORS");
    let page = client.products(&query).await.unwrap();
    assert_eq!(page.content.len(), 2);
    assert_eq!(page.content[0].registration_number.as_deref(), Some("111"));
    assert_eq!(page.content[0].brand_name.as_deref(), Some("Brand A"));
    assert_eq!(page.total_elements, Some(2));
    assert_eq!(page.page_number, Some(0));

    // An equal query is served from the cache.
    let same = SearchQuery::from(query.to_params());
    assert_eq!(client.products(&same).await.unwrap(), page);
}

#[tokio::test]
async fn products_by_group_sends_search_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/ovens"))
        .and(query_param("_page", "2"))
        .and(query_param("_limit", "10"))
        .and(query_param("modelIdentifier", "test-id"))
        .and(query_param("includeOldProducts", "true"))
        .and(query_param("sort0", "energyClass"))
        .and(query_param("order0", "DESC"))
        .and(query_param("heatSourceGas", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "size": 10,
            "offset": 0,
            "hits": [{"registrationNumber": "ABC", "brandName": "Brand X"}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = SearchQuery::new()
        .page(2)
        .limit(10)
        .model_identifier("test-id")
        .include_old_products(true)
        .sort(0, "energyClass", "desc")
        .unwrap()
        .with_filter("heatSourceGas", true);

    let page = client.products_by_group("ovens", &query).await.unwrap();
    assert_eq!(page.hits.len(), 1);
    assert_eq!(page.hits[0].registration_number.as_deref(), Some("ABC"));
    assert_eq!(page.size, Some(10));
}

#[tokio::test]
async fn labels_binary_and_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/12345/labels"))
        .and(query_param("noRedirect", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": "https://eprel.ec.europa.eu/label/12345.png",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/12345/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("fake-binary-data", "image/png"))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let query = SearchQuery::new().with_filter("noRedirect", true);
    let result = client.labels("12345", None, &query).await.unwrap();
    assert_eq!(
        result.address(),
        Some("https://eprel.ec.europa.eu/label/12345.png")
    );

    let result = client.labels("12345", None, &SearchQuery::new()).await.unwrap();
    assert_eq!(result, AssetResponse::Raw(b"fake-binary-data".to_vec()));
}

#[tokio::test]
async fn labels_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/1/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("png", "image/png"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.labels("1", None, &SearchQuery::new()).await.unwrap();
    client.labels("1", None, &SearchQuery::new()).await.unwrap();
}

#[tokio::test]
async fn fiches_binary_and_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/REFRIGERATORS/12345/fiches"))
        .and(query_param("language", "EN"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("fake-pdf-data", "application/pdf"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/12345/fiches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": "https://eprel.ec.europa.eu/fiche/12345.pdf",
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let query = SearchQuery::new().with_filter("language", "EN");
    let result = client
        .fiches("12345", Some("REFRIGERATORS"), &query)
        .await
        .unwrap();
    assert_eq!(result.as_bytes(), Some(&b"fake-pdf-data"[..]));

    let result = client.fiches("12345", None, &SearchQuery::new()).await.unwrap();
    assert_eq!(
        result.address(),
        Some("https://eprel.ec.europa.eu/fiche/12345.pdf")
    );
}

#[tokio::test]
async fn fiches_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/0/fiches"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fiches("0", None, &SearchQuery::new()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn nested_label_and_class_arrow() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/12345/nested-label"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<svg>label</svg>", "image/svg+xml"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/12345/class-arrow-with-scale"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<svg>arrow_with_scale</svg>", "image/svg+xml"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/404/nested-label"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/403/class-arrow-with-scale"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.nested_label("12345").await.unwrap(),
        b"<svg>label</svg>".to_vec()
    );
    assert_eq!(
        client.class_arrow_with_scale("12345").await.unwrap(),
        b"<svg>arrow_with_scale</svg>".to_vec()
    );
    assert!(client.nested_label("404").await.unwrap_err().is_not_found());

    let err = client.class_arrow_with_scale("403").await.unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn product_by_gtin_single_and_many() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/gtin/111"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "eprelRegistrationNumber": "GTIN1",
            "supplierOrTrademark": "Brand GTIN",
            "modelIdentifier": "MOD1",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/gtin/222"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"eprelRegistrationNumber": "A1"},
            {"eprelRegistrationNumber": "A2", "colour": "white"},
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);

    match client.product_by_gtin("111").await.unwrap() {
        ProductLookup::Single(product) => {
            assert_eq!(product.registration_number.as_deref(), Some("GTIN1"));
            assert_eq!(product.brand_name.as_deref(), Some("Brand GTIN"));
            assert_eq!(product.model_identifier.as_deref(), Some("MOD1"));
        }
        other => panic!("expected a single product, got {:?}", other),
    }

    match client.product_by_gtin("222").await.unwrap() {
        ProductLookup::Many(products) => {
            assert_eq!(products.len(), 2);
            assert_eq!(products[0].registration_number.as_deref(), Some("A1"));
            assert_eq!(
                products[1].technical_parameter("colour"),
                Some(&json!("white"))
            );
        }
        other => panic!("expected several products, got {:?}", other),
    }
}

#[tokio::test]
async fn product_by_gtin_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/gtin/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/gtin/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("nope")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/gtin/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("", "application/json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.product_by_gtin("404").await.unwrap_err().is_not_found());

    let err = client.product_by_gtin("garbage").await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 500, .. }));

    let err = client.product_by_gtin("empty").await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 500, .. }));
}

#[tokio::test]
async fn export_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exportProducts/ovens"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("PK\u{3}\u{4}", "application/zip"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/exportProducts/unknown"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.export_products("ovens").await.unwrap(),
        b"PK\x03\x04".to_vec()
    );

    let err = client.export_products("unknown").await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 404, .. }));
}

#[tokio::test]
async fn energy_class_image_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/A.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("png-bytes", "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.energy_class_image("A.png").await.unwrap();
    let second = client.energy_class_image("A.png").await.unwrap();
    assert_eq!(first, b"png-bytes".to_vec());
    assert_eq!(first, second);
}

#[tokio::test]
async fn ping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.ping().await);

    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&down)
        .await;
    assert!(!client_for(&down).ping().await);

    let unreachable = Client::builder()
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();
    assert!(!unreachable.ping().await);
}

#[tokio::test]
async fn sends_configured_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("x-api-key", "secret-key"))
        .and(header("x-api-version", "1.6.3"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .api_key("secret-key")
        .version("1.6.3")
        .build()
        .unwrap();
    assert!(client.ping().await);
}

#[tokio::test]
async fn configuration_change_rebuilds_transport() {
    let old = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&old)
        .await;

    let new = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("x-api-key", "rotated"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&new)
        .await;

    let mut client = client_for(&old);
    assert!(client.ping().await);

    client.set_base_url(new.uri()).set_api_key("rotated");
    assert!(client.ping().await);
}
